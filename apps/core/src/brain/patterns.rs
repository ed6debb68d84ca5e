//! Question patterns and the off-topic veto list.
//!
//! A message with no dictionary keyword is still accepted when it reads like
//! a question, unless it mentions one of the veto terms.

use regex::Regex;
use std::sync::LazyLock;

/// A named question pattern.
pub struct QuestionPattern {
    pub name: &'static str,
    pub regex: Regex,
}

// Compile patterns once at startup
// NOTE: expect() is fine here, the patterns are constants and covered by tests.
pub static QUESTION_PATTERNS: LazyLock<Vec<QuestionPattern>> = LazyLock::new(|| {
    vec![
        QuestionPattern {
            name: "what_is",
            regex: Regex::new(r"(?i)\bwhat\s+(is|are)\b").expect("Invalid regex: what-is pattern"),
        },
        QuestionPattern {
            name: "how_to",
            regex: Regex::new(r"(?i)\bhow\s+(to|do|does|can|should|much|many|often|long)\b")
                .expect("Invalid regex: how-to pattern"),
        },
        QuestionPattern {
            name: "why_does",
            regex: Regex::new(r"(?i)\bwhy\s+(does|do|did|is|am|are)\b")
                .expect("Invalid regex: why-does pattern"),
        },
        QuestionPattern {
            name: "can_you_explain",
            regex: Regex::new(r"(?i)\bcan\s+you\s+(explain|describe|tell\s+me)\b")
                .expect("Invalid regex: can-you-explain pattern"),
        },
        QuestionPattern {
            name: "is_it_normal",
            regex: Regex::new(r"(?i)\bis\s+it\s+(normal|safe|ok|okay|bad|common)\b")
                .expect("Invalid regex: is-it-normal pattern"),
        },
        QuestionPattern {
            name: "should_i",
            regex: Regex::new(r"(?i)\bshould\s+i\b").expect("Invalid regex: should-I pattern"),
        },
    ]
});

/// Terms that veto a question-pattern match.
pub const OFF_TOPIC_TERMS: &[&str] = &[
    "game",
    "movie",
    "film",
    "sport",
    "team",
    "play",
    "music",
    "song",
    "politics",
    "election",
    "vote",
    "president",
    "government",
    "stock",
    "market",
    "invest",
    "bitcoin",
    "crypto",
    "finance",
    "hack",
    "crack",
    "illegal",
    "weapon",
    "porn",
    "gambling",
];

/// First question pattern matching `text`, in declaration order.
pub fn first_question_pattern(text: &str) -> Option<&'static QuestionPattern> {
    QUESTION_PATTERNS.iter().find(|p| p.regex.is_match(text))
}

/// First veto term contained in `lowercase_text`.
pub fn find_off_topic_term(lowercase_text: &str) -> Option<&'static str> {
    OFF_TOPIC_TERMS
        .iter()
        .copied()
        .find(|term| lowercase_text.contains(term))
}
