//! Core data models used throughout the support bot.
//!
//! These types represent the sections, retrievals, and conversation turns
//! that flow through the retrieval and answering pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One paragraph of the source document, the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub index: usize,
    pub text: String,
}

/// The section chosen as context for a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Retrieval {
    pub index: usize,
    pub text: String,
    pub similarity: f32,
}

/// An answer plus the section it was grounded on.
///
/// `retrieval` is `None` when the fallback answer was returned.
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub answer: String,
    pub retrieval: Option<Retrieval>,
}

/// Who said a [`Turn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the conversation history.
#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            at: Utc::now(),
        }
    }
}
