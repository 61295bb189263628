//! Prompt templates sent to the language model.

use agrisense_core::provider::Language;
use chrono::{DateTime, FixedOffset, Offset, Utc};

/// India Standard Time, UTC+05:30.
fn ist() -> FixedOffset {
  FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap_or_else(|| Utc.fix())
}

/// The assistant persona wrapped around a user's question.
pub fn advice(question: &str, language: Language, now: DateTime<Utc>) -> String {
  let local = now.with_timezone(&ist()).format("%I:%M %p IST, %b %d, %Y");
  format!(
    "You are AgriSense, an advanced AI farming assistant. Provide detailed, expert advice on \
     crops, weather impacts, soil health, pest control, market trends, and general agriculture \
     queries. Include practical remedies and local context (e.g., India, {local}). Respond in \
     {language} with a friendly, authoritative tone.\nUser: {question}"
  )
}

pub fn diagnosis(language: Language) -> String {
  format!(
    "Analyze this crop image for diseases, pests, or issues. Provide detailed diagnosis, \
     remedies, and prevention tips as AgriSense. Respond in {language}."
  )
}

pub const TRANSCRIPTION: &str = "Transcribe the speech in this audio clip verbatim. Reply with \
                                 the transcript only. If there is no intelligible speech, reply \
                                 with nothing.";

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn advice_carries_language_local_time_and_question() {
    let now = Utc.with_ymd_and_hms(2025, 9, 15, 16, 10, 0).unwrap();
    let text = advice("Best fertilizer for paddy?", Language::Malayalam, now);
    assert!(text.contains("Respond in Malayalam"), "{text}");
    assert!(text.contains("09:40 PM IST, Sep 15, 2025"), "{text}");
    assert!(text.ends_with("\nUser: Best fertilizer for paddy?"), "{text}");
  }

  #[test]
  fn diagnosis_names_language() {
    assert!(diagnosis(Language::Hindi).ends_with("Respond in Hindi."));
  }
}
