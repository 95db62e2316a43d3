//! Section index and nearest-section retrieval.
//!
//! Every section is embedded once, when the [`Retriever`] is built. A query
//! is embedded with the same [`Embedder`] and compared against all section
//! vectors by cosine similarity; the best section is returned only if it
//! clears the similarity threshold.

use anyhow::{bail, Result};

use crate::embedding::{cosine_similarity, embed_one, Embedder};
use crate::models::{Retrieval, Section};

/// Sections, their embeddings (same order, same length), and the embedder
/// used to build them.
pub struct Retriever {
    sections: Vec<Section>,
    embeddings: Vec<Vec<f32>>,
    embedder: Box<dyn Embedder>,
    threshold: f32,
}

impl Retriever {
    /// Embed `sections` and build the index.
    ///
    /// An empty section list is valid and skips the embedder entirely.
    ///
    /// # Errors
    ///
    /// Fails if the embedder errors, returns a different number of vectors
    /// than sections, or returns vectors of differing dimensionality.
    pub async fn build(
        sections: Vec<Section>,
        embedder: Box<dyn Embedder>,
        threshold: f32,
    ) -> Result<Self> {
        let embeddings = if sections.is_empty() {
            Vec::new()
        } else {
            let texts: Vec<String> = sections.iter().map(|s| s.text.clone()).collect();
            embedder.embed(&texts).await?
        };

        if embeddings.len() != sections.len() {
            bail!(
                "embedder returned {} vectors for {} sections",
                embeddings.len(),
                sections.len()
            );
        }
        if let Some(first) = embeddings.first() {
            if let Some(bad) = embeddings.iter().position(|e| e.len() != first.len()) {
                bail!(
                    "section {} embedding has {} dims, expected {}",
                    bad,
                    embeddings[bad].len(),
                    first.len()
                );
            }
        }

        tracing::info!(
            sections = sections.len(),
            model = embedder.model_name(),
            "section index built"
        );

        Ok(Self {
            sections,
            embeddings,
            embedder,
            threshold,
        })
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    /// Find the section most similar to `query`.
    ///
    /// Returns `None` without embedding the query when there are no
    /// sections, and `None` when the best similarity does not exceed the
    /// threshold.
    pub async fn find_relevant_section(&self, query: &str) -> Result<Option<Retrieval>> {
        if self.sections.is_empty() {
            return Ok(None);
        }

        let query_vec = embed_one(self.embedder.as_ref(), query).await?;

        let Some((index, similarity)) = best_match(&query_vec, &self.embeddings) else {
            return Ok(None);
        };

        tracing::debug!(index, similarity, threshold = self.threshold, "best section");

        if similarity > self.threshold {
            Ok(Some(Retrieval {
                index,
                text: self.sections[index].text.clone(),
                similarity,
            }))
        } else {
            Ok(None)
        }
    }
}

/// Stable argmax of cosine similarity: the first index attaining the
/// maximum wins. NaN similarities are skipped. `None` for an empty set.
pub fn best_match(query_vec: &[f32], embeddings: &[Vec<f32>]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, emb) in embeddings.iter().enumerate() {
        let sim = cosine_similarity(query_vec, emb);
        if sim.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, b)| sim > b) {
            best = Some((i, sim));
        }
    }
    best
}
