//! Deterministic model doubles shared by the integration tests.
//!
//! No model weights are downloaded: embeddings are keyword counts and the
//! QA double answers with its whole context.

#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use support_bot::agent::SupportBot;
use support_bot::document::Corpus;
use support_bot::embedding::Embedder;
use support_bot::qa::{QaAnswer, QaModel};

pub const FAQ: &str = "Refunds are processed within 5 business days.\n\n\
Shipping takes 3-7 days depending on your location.\n\n\
To reset your password, click Forgot password on the login page.";

const KEYWORDS: [&str; 3] = ["refund", "ship", "password"];

/// One dimension per keyword; a text's vector counts keyword occurrences.
pub struct KeywordEmbedder;

#[async_trait]
impl Embedder for KeywordEmbedder {
    fn model_name(&self) -> &str {
        "keyword"
    }

    fn dims(&self) -> usize {
        KEYWORDS.len()
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| {
                let lower = t.to_lowercase();
                KEYWORDS
                    .iter()
                    .map(|k| lower.matches(k).count() as f32)
                    .collect()
            })
            .collect())
    }
}

/// Answers with the full context and records every question it was asked.
#[derive(Clone, Default)]
pub struct EchoQa {
    pub asked: Arc<Mutex<Vec<String>>>,
}

impl EchoQa {
    pub fn questions(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

#[async_trait]
impl QaModel for EchoQa {
    fn model_name(&self) -> &str {
        "echo"
    }

    async fn answer(&self, question: &str, context: &str) -> Result<QaAnswer> {
        self.asked.lock().unwrap().push(question.to_string());
        Ok(QaAnswer {
            answer: context.to_string(),
            score: 1.0,
            start: 0,
            end: context.len(),
        })
    }
}

/// Always fails, as an unreachable inference endpoint would.
pub struct FailingQa;

#[async_trait]
impl QaModel for FailingQa {
    fn model_name(&self) -> &str {
        "failing"
    }

    async fn answer(&self, _question: &str, _context: &str) -> Result<QaAnswer> {
        bail!("qa backend unavailable")
    }
}

pub async fn bot_from_text(text: &str, qa: Box<dyn QaModel>) -> SupportBot {
    SupportBot::build(
        Corpus::from_text("faq.txt", text),
        Box::new(KeywordEmbedder),
        qa,
        0.5,
    )
    .await
    .unwrap()
}

/// A bot over [`FAQ`] plus a handle on its QA double.
pub async fn faq_bot() -> (SupportBot, EchoQa) {
    let qa = EchoQa::default();
    let bot = bot_from_text(FAQ, Box::new(qa.clone())).await;
    (bot, qa)
}
