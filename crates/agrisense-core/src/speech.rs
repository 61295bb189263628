//! Text-to-speech engine handle.
//!
//! One engine is initialised at process start and shared by every request.
//! Each call holds the engine exclusively for the duration of playback.

use std::sync::{Mutex, PoisonError};

use crate::AudioError;

/// A blocking speech backend with a playback loop.
pub trait Synthesizer: Send + 'static {
  /// Whether a previous utterance left the playback loop running.
  fn in_loop(&self) -> bool;

  /// Stop any running playback loop. Must be safe to call when idle.
  fn end_loop(&mut self);

  /// Speak `text` and block until playback finishes.
  fn say(&mut self, text: &str) -> Result<(), AudioError>;
}

/// Process-wide speech engine.
pub struct SpeechEngine<V> {
  voice: Mutex<V>,
}

impl<V: Synthesizer> SpeechEngine<V> {
  pub fn new(voice: V) -> Self { Self { voice: Mutex::new(voice) } }

  /// Speak `text`, blocking the caller.
  ///
  /// A loop left running by an earlier call is ended first. If playback
  /// fails, the loop is ended and the call is retried exactly once before
  /// the error is returned.
  pub fn speak(&self, text: &str) -> Result<(), AudioError> {
    let mut voice = self.voice.lock().unwrap_or_else(PoisonError::into_inner);

    if voice.in_loop() {
      voice.end_loop();
    }

    match voice.say(text) {
      Ok(()) => Ok(()),
      Err(first) => {
        tracing::warn!(error = %first, "text-to-speech failed, retrying once");
        voice.end_loop();
        voice.say(text)
      }
    }
  }

  /// Release the engine, stopping any playback still in progress.
  pub fn close(self) {
    let mut voice = self.voice.into_inner().unwrap_or_else(PoisonError::into_inner);
    voice.end_loop();
  }
}
