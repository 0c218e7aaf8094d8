//! Emotion tag for the assistant avatar, derived from reply text.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Neutral,
    Happy,
    Thinking,
    Confused,
}

const THINKING_CUES: &[&str] = &["?", "don't understand", "could you", "how to"];
const HAPPY_CUES: &[&str] = &["great", "thank", "yes", "good"];
const CONFUSED_CUES: &[&str] = &["error", "wrong", "cannot", "sorry"];

/// Pick an emotion from keyword cues. Rules are checked in order and the
/// first hit wins.
pub fn detect_emotion(text: &str) -> Emotion {
    let lower = text.to_lowercase();
    let hit = |cues: &[&str]| cues.iter().any(|cue| lower.contains(cue));

    if hit(THINKING_CUES) {
        Emotion::Thinking
    } else if hit(HAPPY_CUES) {
        Emotion::Happy
    } else if hit(CONFUSED_CUES) {
        Emotion::Confused
    } else {
        Emotion::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_mark_is_thinking() {
        assert_eq!(detect_emotion("What would you like to know?"), Emotion::Thinking);
    }

    #[test]
    fn test_thinking_beats_happy() {
        assert_eq!(detect_emotion("Great, could you say more"), Emotion::Thinking);
    }

    #[test]
    fn test_happy_and_confused() {
        assert_eq!(detect_emotion("Yes, you can apply."), Emotion::Happy);
        assert_eq!(detect_emotion("Sorry, that went wrong."), Emotion::Confused);
    }

    #[test]
    fn test_neutral_default() {
        assert_eq!(detect_emotion("Carry your I-20 when traveling."), Emotion::Neutral);
    }

    #[test]
    fn test_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Emotion::Thinking).unwrap(),
            "\"thinking\""
        );
    }
}
