//! # Brain Module
//!
//! Fast, non-LLM analysis of user input, run BEFORE anything is sent to the
//! chat backend.
//!
//! ## Components
//! - `terms`: categorized health keyword dictionary
//! - `patterns`: question patterns and the off-topic veto list
//! - `classifier`: the accept/reject decision built from both tables

pub mod classifier;
pub mod patterns;
pub mod terms;

pub use classifier::{classify, is_health_related, TopicReason, TopicVerdict};
