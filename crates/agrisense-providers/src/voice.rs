//! Text-to-speech through an external speech program (`espeak` by default).
//!
//! Playback happens on the host running the server, one utterance at a time.
//! The "loop" is the child process of the utterance in flight.

use std::{
  io,
  process::{Child, Command, Stdio},
};

use agrisense_core::{AudioError, speech::Synthesizer};

pub struct CommandSynthesizer {
  program: String,
  /// Words per minute, passed as `-s`.
  rate:    u32,
  child:   Option<Child>,
}

impl CommandSynthesizer {
  pub fn new(program: impl Into<String>, rate: u32) -> Self {
    Self { program: program.into(), rate, child: None }
  }

  /// `<program> -s <rate> -- <text>`; the `--` keeps a reply that starts
  /// with `-` from being read as an option.
  fn command(&self, text: &str) -> Command {
    let mut cmd = Command::new(&self.program);
    cmd
      .arg("-s")
      .arg(self.rate.to_string())
      .arg("--")
      .arg(text)
      .stdin(Stdio::null())
      .stdout(Stdio::null())
      .stderr(Stdio::null());
    cmd
  }

  fn spawn(&self, text: &str) -> Result<Child, AudioError> {
    self
      .command(text)
      .spawn()
      .map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => {
          AudioError::DeviceUnavailable(format!("speech program {:?} not found", self.program))
        }
        _ => AudioError::Playback(e.to_string()),
      })
  }
}

impl Synthesizer for CommandSynthesizer {
  fn in_loop(&self) -> bool { self.child.is_some() }

  fn end_loop(&mut self) {
    if let Some(mut child) = self.child.take() {
      // The process may already have exited; both calls are best-effort.
      let _ = child.kill();
      let _ = child.wait();
    }
  }

  fn say(&mut self, text: &str) -> Result<(), AudioError> {
    if self.child.is_some() {
      return Err(AudioError::Playback("run loop already started".to_owned()));
    }

    let child = self.spawn(text)?;
    let child = self.child.insert(child);
    let status = child.wait().map_err(|e| AudioError::Playback(e.to_string()))?;
    self.child = None;

    if status.success() {
      Ok(())
    } else {
      Err(AudioError::Playback(format!("{} exited with {status}", self.program)))
    }
  }
}

impl Drop for CommandSynthesizer {
  fn drop(&mut self) { self.end_loop(); }
}

#[cfg(all(test, unix))]
mod tests {
  use agrisense_core::speech::SpeechEngine;

  use super::*;

  #[test]
  fn successful_program_speaks() {
    let mut voice = CommandSynthesizer::new("true", 150);
    voice.say("hello").unwrap();
    assert!(!voice.in_loop());
  }

  #[test]
  fn text_is_never_read_as_an_option() {
    let voice = CommandSynthesizer::new("espeak", 120);
    let cmd = voice.command("-5 degrees tonight, cover seedlings");
    let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
    assert_eq!(args, ["-s", "120", "--", "-5 degrees tonight, cover seedlings"]);

    // `true` ignores its arguments; a leading dash must still reach it as text.
    let mut voice = CommandSynthesizer::new("true", 150);
    voice.say("--help").unwrap();
  }

  #[test]
  fn failing_program_is_a_playback_error() {
    let mut voice = CommandSynthesizer::new("false", 150);
    assert!(matches!(voice.say("hello"), Err(AudioError::Playback(_))));
    assert!(!voice.in_loop());
  }

  #[test]
  fn missing_program_is_device_unavailable() {
    let mut voice = CommandSynthesizer::new("agrisense-no-such-speech-program", 150);
    assert!(matches!(voice.say("hello"), Err(AudioError::DeviceUnavailable(_))));
  }

  #[test]
  fn engine_recovers_a_stuck_loop() {
    let mut voice = CommandSynthesizer::new("true", 150);
    voice.child = Some(Command::new("sleep").arg("30").spawn().unwrap());
    assert!(voice.in_loop());

    let engine = SpeechEngine::new(voice);
    engine.speak("hello").unwrap();
    engine.close();
  }
}
