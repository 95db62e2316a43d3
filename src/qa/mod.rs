//! Extractive question-answering backends.
//!
//! A [`QaModel`] takes a question and a context passage and returns the
//! span of the context that best answers the question. Implementations:
//! - **`LocalQaModel`** - DistilBERT SQuAD ONNX export run in-process with tract.
//! - **[`HttpQaModel`]** - a Hugging Face inference-style JSON endpoint.
//!
//! Use [`create_qa_model`] to build the one named by `qa.provider`.

#[cfg(feature = "local-qa")]
mod local_tract;

#[cfg(feature = "local-qa")]
pub use local_tract::LocalQaModel;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use crate::config::QaConfig;
use crate::embedding::backoff;

/// The top answer span for one (question, context) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QaAnswer {
    /// The answer text, a verbatim slice of the context.
    pub answer: String,
    /// Model confidence in `[0.0, 1.0]`.
    pub score: f32,
    /// Byte offset of the span start in the context.
    pub start: usize,
    /// Byte offset one past the span end in the context.
    pub end: usize,
}

/// An extractive question-answering model.
#[async_trait]
pub trait QaModel: Send + Sync {
    /// Returns the model identifier.
    fn model_name(&self) -> &str;
    /// Answer `question` from `context`.
    async fn answer(&self, question: &str, context: &str) -> Result<QaAnswer>;
}

/// Create the [`QaModel`] named by `qa.provider` (`local` or `http`).
///
/// The local model is downloaded (first run only) and loaded here.
pub async fn create_qa_model(config: &QaConfig) -> Result<Box<dyn QaModel>> {
    match config.provider.as_str() {
        "http" => Ok(Box::new(HttpQaModel::new(config)?)),
        #[cfg(feature = "local-qa")]
        "local" => Ok(Box::new(LocalQaModel::load(config).await?)),
        #[cfg(not(feature = "local-qa"))]
        "local" => bail!("Local QA provider requires --features local-qa"),
        other => bail!("Unknown qa provider: {}", other),
    }
}

// ============ HTTP Provider ============

/// QA over HTTP.
///
/// Sends `POST {url}` with `{"inputs": {"question", "context"}}` and reads
/// `{"answer", "score", "start", "end"}` (or a one-element array of it),
/// the shape served by the Hugging Face inference API. A bearer token is
/// taken from `HF_API_TOKEN` when set.
pub struct HttpQaModel {
    model: String,
    url: String,
    token: Option<String>,
    max_retries: u32,
    client: reqwest::Client,
}

impl HttpQaModel {
    pub fn new(config: &QaConfig) -> Result<Self> {
        let url = config.url.clone().unwrap_or_else(|| {
            format!(
                "https://api-inference.huggingface.co/models/{}",
                config.model
            )
        });

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            model: config.model.clone(),
            url,
            token: std::env::var("HF_API_TOKEN").ok(),
            max_retries: config.max_retries,
            client,
        })
    }
}

#[async_trait]
impl QaModel for HttpQaModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn answer(&self, question: &str, context: &str) -> Result<QaAnswer> {
        let body = serde_json::json!({
            "inputs": {
                "question": question,
                "context": context,
            }
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tokio::time::sleep(backoff(attempt)).await;
            }

            let mut req = self
                .client
                .post(&self.url)
                .header("Content-Type", "application/json")
                .json(&body);
            if let Some(token) = &self.token {
                req = req.header("Authorization", format!("Bearer {}", token));
            }

            match req.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        return parse_qa_response(&json);
                    }

                    // 503 is returned while a hosted model is still loading.
                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        tracing::warn!(%status, attempt, "QA request failed, retrying");
                        last_err = Some(anyhow::anyhow!("QA API error {}: {}", status, body_text));
                        continue;
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    bail!("QA API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(anyhow::anyhow!(
                        "QA connection error ({}): {}",
                        self.url,
                        e
                    ));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("QA request failed after retries")))
    }
}

fn parse_qa_response(json: &serde_json::Value) -> Result<QaAnswer> {
    let item = match json.as_array() {
        Some(items) => items
            .first()
            .ok_or_else(|| anyhow::anyhow!("Invalid QA response: empty array"))?,
        None => json,
    };

    let answer = item
        .get("answer")
        .and_then(|a| a.as_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid QA response: missing answer"))?;

    Ok(QaAnswer {
        answer: answer.to_string(),
        score: item.get("score").and_then(|s| s.as_f64()).unwrap_or(0.0) as f32,
        start: item.get("start").and_then(|s| s.as_u64()).unwrap_or(0) as usize,
        end: item.get("end").and_then(|s| s.as_u64()).unwrap_or(0) as usize,
    })
}
