//! Answer adjustment from coarse user feedback.
//!
//! Two labels are understood. `"too vague"` appends the retrieved section
//! to the previous answer as extra context. `"not helpful"` rephrases the
//! question as a request for details and answers it from scratch. Any
//! other label leaves the answer unchanged.

use anyhow::Result;

use crate::agent::SupportBot;

/// Phrase dropped from a question when rephrasing it.
const HOW_DO_I: &str = "how do i";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    TooVague,
    NotHelpful,
    Other(String),
}

impl Feedback {
    /// Parse a feedback label. Labels match exactly, whitespace and case
    /// included.
    pub fn parse(label: &str) -> Self {
        match label {
            "too vague" => Feedback::TooVague,
            "not helpful" => Feedback::NotHelpful,
            other => Feedback::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Feedback::TooVague => "too vague",
            Feedback::NotHelpful => "not helpful",
            Feedback::Other(label) => label,
        }
    }
}

/// Lower-case `query`, drop the first `"how do i"`, and ask for details.
///
/// Whitespace left around the removed phrase is kept.
pub fn rephrase_for_details(query: &str) -> String {
    let lowered = query.to_lowercase();
    let topic = lowered.replacen(HOW_DO_I, "", 1);
    format!("Can you give me more details about {}?", topic)
}

/// `"{answer} (For more context: {section})"`.
pub fn with_context(answer: &str, section: &str) -> String {
    format!("{} (For more context: {})", answer, section)
}

impl SupportBot {
    /// Rework `original_answer` to `query` according to `feedback`.
    pub async fn adjust(
        &self,
        query: &str,
        original_answer: &str,
        feedback: &Feedback,
    ) -> Result<String> {
        tracing::debug!(feedback = feedback.label(), "adjusting answer");
        match feedback {
            Feedback::TooVague => match self.find_context(query).await? {
                Some(section) => Ok(with_context(original_answer, &section.text)),
                None => Ok(original_answer.to_string()),
            },
            Feedback::NotHelpful => {
                let new_query = rephrase_for_details(query);
                tracing::debug!(%new_query, "re-asking");
                self.answer(&new_query).await
            }
            Feedback::Other(_) => Ok(original_answer.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labels() {
        assert_eq!(Feedback::parse("too vague"), Feedback::TooVague);
        assert_eq!(Feedback::parse("not helpful"), Feedback::NotHelpful);
        assert_eq!(
            Feedback::parse(" too vague "),
            Feedback::Other(" too vague ".to_string())
        );
        assert_eq!(
            Feedback::parse("Too Vague"),
            Feedback::Other("Too Vague".to_string())
        );
        assert_eq!(Feedback::parse("great"), Feedback::Other("great".to_string()));
    }

    #[test]
    fn test_label_round_trip() {
        for label in ["too vague", "not helpful", "meh"] {
            assert_eq!(Feedback::parse(label).label(), label);
        }
    }

    #[test]
    fn test_rephrase_removes_how_do_i_case_insensitively() {
        assert_eq!(
            rephrase_for_details("How do I reset my password"),
            "Can you give me more details about  reset my password?"
        );
    }

    #[test]
    fn test_rephrase_removes_only_first_occurrence() {
        assert_eq!(
            rephrase_for_details("HOW DO I return? how do i ship?"),
            "Can you give me more details about  return? how do i ship??"
        );
    }

    #[test]
    fn test_rephrase_without_phrase() {
        assert_eq!(
            rephrase_for_details("Shipping Times"),
            "Can you give me more details about shipping times?"
        );
    }

    #[test]
    fn test_with_context() {
        assert_eq!(
            with_context("5 days", "Refunds are processed within 5 days."),
            "5 days (For more context: Refunds are processed within 5 days.)"
        );
    }
}
