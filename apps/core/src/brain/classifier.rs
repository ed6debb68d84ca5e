//! Topic relevance classifier.
//!
//! Decides whether a chat message may be forwarded to the assistant. Rules
//! are evaluated in a fixed order on a trimmed, lowercased copy of the input:
//!
//! 1. fewer than [`SHORT_FOLLOW_UP_CHARS`] characters: accepted (follow-up)
//! 2. contains a dictionary keyword: accepted
//! 3. first matching question pattern: rejected if a veto term is present,
//!    accepted otherwise
//! 4. shorter than [`NUMERIC_READING_CHARS`] and starting with a digit:
//!    accepted (a bare reading such as `120/80` or `6.1 mmol`)
//! 5. rejected

use serde::Serialize;
use tracing::debug;

use super::patterns::{find_off_topic_term, first_question_pattern};
use super::terms::find_term;

/// Messages shorter than this are presumed to continue the conversation.
pub const SHORT_FOLLOW_UP_CHARS: usize = 5;
/// Upper bound for the bare numeric reading rule.
pub const NUMERIC_READING_CHARS: usize = 15;

/// Which rule decided the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", content = "matched", rename_all = "snake_case")]
pub enum TopicReason {
    ShortFollowUp,
    Keyword(&'static str),
    QuestionPattern(&'static str),
    OffTopic(&'static str),
    NumericReading,
    NoMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TopicVerdict {
    pub related: bool,
    pub reason: TopicReason,
}

impl TopicVerdict {
    fn accept(reason: TopicReason) -> Self {
        Self {
            related: true,
            reason,
        }
    }

    fn reject(reason: TopicReason) -> Self {
        Self {
            related: false,
            reason,
        }
    }
}

/// Classify a raw user message.
pub fn classify(message: &str) -> TopicVerdict {
    let text = message.trim().to_lowercase();
    let length = text.chars().count();

    let verdict = if length < SHORT_FOLLOW_UP_CHARS {
        TopicVerdict::accept(TopicReason::ShortFollowUp)
    } else if let Some(term) = find_term(&text) {
        TopicVerdict::accept(TopicReason::Keyword(term))
    } else if let Some(pattern) = first_question_pattern(&text) {
        match find_off_topic_term(&text) {
            Some(veto) => TopicVerdict::reject(TopicReason::OffTopic(veto)),
            None => TopicVerdict::accept(TopicReason::QuestionPattern(pattern.name)),
        }
    } else if length < NUMERIC_READING_CHARS && starts_with_digit(&text) {
        TopicVerdict::accept(TopicReason::NumericReading)
    } else {
        TopicVerdict::reject(TopicReason::NoMatch)
    };

    debug!(related = verdict.related, reason = ?verdict.reason, "Topic classified");
    verdict
}

/// `true` when the message may be forwarded to the health assistant.
pub fn is_health_related(message: &str) -> bool {
    classify(message).related
}

fn starts_with_digit(text: &str) -> bool {
    text.chars().next().is_some_and(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_messages_are_follow_ups() {
        for text in ["", "ok", "yes", "ct 5", "  why?  ", "lol!"] {
            assert_eq!(
                classify(text).reason,
                TopicReason::ShortFollowUp,
                "'{}' should be a follow-up",
                text
            );
            assert!(is_health_related(text));
        }
    }

    #[test]
    fn test_length_is_measured_after_trimming() {
        assert!(is_health_related("     tv?     "));
        assert!(!is_health_related("   tv show   "));
    }

    #[test]
    fn test_keyword_wins_over_veto() {
        let verdict = classify("Is my blood pressure affected by playing video games?");
        assert!(verdict.related);
        assert!(matches!(verdict.reason, TopicReason::Keyword(_)));
    }

    #[test]
    fn test_keyword_is_case_insensitive() {
        assert_eq!(classify("ASTHMA attack").reason, TopicReason::Keyword("asthma"));
    }

    #[test]
    fn test_question_pattern_accepts() {
        let verdict = classify("Why does my knee click");
        assert_eq!(verdict, TopicVerdict::accept(TopicReason::QuestionPattern("why_does")));
    }

    #[test]
    fn test_question_with_veto_is_rejected() {
        let verdict = classify("what is a normal bitcoin price");
        assert_eq!(verdict, TopicVerdict::reject(TopicReason::OffTopic("bitcoin")));
    }

    #[test]
    fn test_normal_blood_pressure_is_accepted() {
        assert!(is_health_related("what is a normal blood pressure"));
    }

    #[test]
    fn test_numeric_reading() {
        assert_eq!(classify("120/80").reason, TopicReason::NumericReading);
        assert_eq!(classify("6.1 today").reason, TopicReason::NumericReading);
        // Starts with letters: no rule applies.
        assert_eq!(classify("bp 120").reason, TopicReason::NoMatch);
        assert!(!is_health_related("bp 120"));
        // Too long for the numeric rule.
        assert!(!is_health_related("42 is the answer to everything"));
    }

    #[test]
    fn test_follow_up_threshold() {
        // Four characters is a follow-up, five goes through the other rules.
        assert_eq!(classify("hell").reason, TopicReason::ShortFollowUp);
        assert_eq!(classify("hello").reason, TopicReason::NoMatch);
        assert!(!is_health_related("hello"));
    }

    #[test]
    fn test_numeric_reading_threshold() {
        assert_eq!(classify("12345678901234").reason, TopicReason::NumericReading);
        assert_eq!(classify("123456789012345").reason, TopicReason::NoMatch);
    }

    #[test]
    fn test_unrelated_statement_is_rejected() {
        assert_eq!(
            classify("tell me a joke about cats").reason,
            TopicReason::NoMatch
        );
    }
}
