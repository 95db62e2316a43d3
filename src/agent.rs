//! The support bot: retrieval plus extractive answering.
//!
//! [`SupportBot::initialize`] is the one-time setup: it loads the document,
//! loads both models, and embeds every section. The resulting bot is
//! immutable and shared by reference with every query handler.

use anyhow::Result;
use serde::Serialize;

use crate::config::Config;
use crate::document::{load_corpus, Corpus, CorpusStatus};
use crate::embedding::{create_embedder, Embedder};
use crate::feedback::Feedback;
use crate::models::{Reply, Retrieval};
use crate::qa::{create_qa_model, QaModel};
use crate::retriever::Retriever;

/// Returned whenever no section clears the similarity threshold.
pub const FALLBACK_ANSWER: &str =
    "I don't have enough information to answer that. Please try rephrasing your question.";

pub struct SupportBot {
    corpus: Corpus,
    retriever: Retriever,
    qa: Box<dyn QaModel>,
}

impl SupportBot {
    /// Load the document and models named by `config` and build the index.
    pub async fn initialize(config: &Config) -> Result<Self> {
        tracing::info!("initializing support bot");
        let corpus = load_corpus(config)?;
        let embedder = create_embedder(&config.embedding).await?;
        let qa = create_qa_model(&config.qa).await?;
        tracing::info!(
            embedding_model = embedder.model_name(),
            qa_model = qa.model_name(),
            "models loaded"
        );

        Self::build(corpus, embedder, qa, config.retrieval.similarity_threshold).await
    }

    /// Assemble a bot from already-constructed parts.
    pub async fn build(
        corpus: Corpus,
        embedder: Box<dyn Embedder>,
        qa: Box<dyn QaModel>,
        threshold: f32,
    ) -> Result<Self> {
        if corpus.status() == CorpusStatus::Missing {
            tracing::warn!(
                path = %corpus.source().display(),
                "empty corpus: every question will get the fallback answer"
            );
        }

        let retriever = Retriever::build(corpus.sections().to_vec(), embedder, threshold).await?;
        tracing::info!(
            path = %corpus.source().display(),
            sections = corpus.sections().len(),
            "document loaded and processed"
        );

        Ok(Self {
            corpus,
            retriever,
            qa,
        })
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// The section most similar to `query`, if it clears the threshold.
    pub async fn find_relevant_section(&self, query: &str) -> Result<Option<Retrieval>> {
        self.retriever.find_relevant_section(query).await
    }

    /// Like [`Self::find_relevant_section`], but a blank section counts as
    /// no match since there is nothing to answer or quote from.
    pub(crate) async fn find_context(&self, query: &str) -> Result<Option<Retrieval>> {
        Ok(self
            .find_relevant_section(query)
            .await?
            .filter(|r| !r.text.trim().is_empty()))
    }

    /// Answer `query` and report which section grounded the answer.
    pub async fn respond(&self, query: &str) -> Result<Reply> {
        let Some(retrieval) = self.find_context(query).await? else {
            tracing::debug!("no relevant section, using fallback answer");
            return Ok(Reply {
                answer: FALLBACK_ANSWER.to_string(),
                retrieval: None,
            });
        };

        let result = self.qa.answer(query, &retrieval.text).await?;
        tracing::debug!(
            section = retrieval.index,
            similarity = retrieval.similarity,
            qa_score = result.score,
            "answered from section"
        );

        Ok(Reply {
            answer: result.answer,
            retrieval: Some(retrieval),
        })
    }

    /// Answer `query` from the document, or return [`FALLBACK_ANSWER`].
    pub async fn answer(&self, query: &str) -> Result<String> {
        Ok(self.respond(query).await?.answer)
    }
}

#[derive(Serialize)]
struct AskResponse<'a> {
    query: &'a str,
    answer: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    feedback: Option<&'a str>,
    retrieval: Option<&'a Retrieval>,
}

/// CLI entry point for `support-bot ask`.
pub async fn run_ask(
    config: &Config,
    query: &str,
    feedback: Option<&str>,
    json: bool,
) -> Result<()> {
    let bot = SupportBot::initialize(config).await?;
    let reply = bot.respond(query).await?;

    let answer = match feedback {
        Some(label) => {
            bot.adjust(query, &reply.answer, &Feedback::parse(label))
                .await?
        }
        None => reply.answer.clone(),
    };

    if json {
        let resp = AskResponse {
            query,
            answer: &answer,
            feedback,
            retrieval: reply.retrieval.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&resp)?);
    } else {
        println!("{}", answer);
    }

    Ok(())
}
