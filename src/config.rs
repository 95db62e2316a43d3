//! TOML configuration for the support bot.
//!
//! Every section is optional. A missing `[embedding]` or `[qa]` table
//! selects the local models; a missing `[document]` table points at
//! `faq.txt` in the working directory.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file picked up when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "./config/bot.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub document: DocumentConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub qa: QaConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocumentConfig {
    #[serde(default = "default_document_path")]
    pub path: PathBuf,
    /// Fail initialization instead of degrading to an empty corpus
    /// when the document does not exist.
    #[serde(default)]
    pub required: bool,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            path: default_document_path(),
            required: false,
        }
    }
}

fn default_document_path() -> PathBuf {
    PathBuf::from("faq.txt")
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// A section is only used as context when its cosine similarity to
    /// the query is strictly greater than this value.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

fn default_similarity_threshold() -> f32 {
    0.5
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: None,
            dims: None,
            url: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_embedding_provider() -> String {
    "local".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct QaConfig {
    #[serde(default = "default_qa_provider")]
    pub provider: String,
    #[serde(default = "default_qa_model")]
    pub model: String,
    /// Endpoint for the `http` provider. Defaults to the Hugging Face
    /// inference URL for `model`.
    #[serde(default)]
    pub url: Option<String>,
    /// Token budget for question + context; longer contexts are truncated.
    #[serde(default = "default_max_seq_len")]
    pub max_seq_len: usize,
    #[serde(default = "default_max_answer_tokens")]
    pub max_answer_tokens: usize,
    #[serde(default = "default_qa_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            provider: default_qa_provider(),
            model: default_qa_model(),
            url: None,
            max_seq_len: default_max_seq_len(),
            max_answer_tokens: default_max_answer_tokens(),
            max_retries: default_qa_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_qa_provider() -> String {
    "local".to_string()
}
fn default_qa_model() -> String {
    "distilbert-base-uncased-distilled-squad".to_string()
}
fn default_max_seq_len() -> usize {
    384
}
fn default_max_answer_tokens() -> usize {
    15
}
fn default_qa_max_retries() -> u32 {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Config {
    /// All defaults: `faq.txt`, local models, threshold 0.5.
    pub fn minimal() -> Self {
        Self::default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;

    Ok(config)
}

/// Load `path` if given, else [`DEFAULT_CONFIG_PATH`] if it exists, else
/// [`Config::minimal`].
pub fn resolve_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => load_config(p),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                load_config(default_path)
            } else {
                tracing::debug!("no config file found, using built-in defaults");
                Ok(Config::minimal())
            }
        }
    }
}

pub fn validate(config: &Config) -> Result<()> {
    if !(-1.0..=1.0).contains(&config.retrieval.similarity_threshold) {
        anyhow::bail!("retrieval.similarity_threshold must be in [-1.0, 1.0]");
    }

    match config.embedding.provider.as_str() {
        "local" | "openai" | "ollama" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be local, openai, or ollama.",
            other
        ),
    }
    if config.embedding.dims == Some(0) {
        anyhow::bail!("embedding.dims must be > 0");
    }
    if config.embedding.batch_size == 0 {
        anyhow::bail!("embedding.batch_size must be > 0");
    }
    if config.embedding.provider != "local" && config.embedding.model.is_none() {
        anyhow::bail!(
            "embedding.model must be specified when provider is '{}'",
            config.embedding.provider
        );
    }

    match config.qa.provider.as_str() {
        "local" | "http" => {}
        other => anyhow::bail!("Unknown qa provider: '{}'. Must be local or http.", other),
    }
    if config.qa.max_seq_len < 32 {
        anyhow::bail!("qa.max_seq_len must be >= 32");
    }
    if config.qa.max_answer_tokens == 0 {
        anyhow::bail!("qa.max_answer_tokens must be > 0");
    }

    Ok(())
}
