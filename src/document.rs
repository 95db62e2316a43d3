//! Document store: load the FAQ file and split it into sections.
//!
//! Sections are the blank-line separated paragraphs of the document,
//! in source order. A missing file is not fatal by default: the corpus
//! comes back empty with [`CorpusStatus::Missing`] so every query falls
//! through to the fallback answer, and the status stays observable.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::models::Section;

/// Paragraph separator.
const SECTION_SEPARATOR: &str = "\n\n";

/// How the source document was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CorpusStatus {
    Loaded,
    Missing,
}

/// The loaded document, split into sections. Immutable after load.
#[derive(Debug, Clone)]
pub struct Corpus {
    source: PathBuf,
    status: CorpusStatus,
    sections: Vec<Section>,
}

impl Corpus {
    /// Read `path` as UTF-8 and split it.
    ///
    /// A file that does not exist yields an empty `Missing` corpus and an
    /// error log line. Other I/O failures are returned.
    pub fn load(path: &Path) -> Result<Self> {
        tracing::info!(path = %path.display(), "loading document");
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Self::from_text(path, &text)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::error!(
                    path = %path.display(),
                    "document not found, continuing with an empty corpus"
                );
                Ok(Self {
                    source: path.to_path_buf(),
                    status: CorpusStatus::Missing,
                    sections: Vec::new(),
                })
            }
            Err(e) => {
                Err(e).with_context(|| format!("Failed to read document: {}", path.display()))
            }
        }
    }

    /// Build a corpus from text already in memory.
    pub fn from_text(source: impl Into<PathBuf>, text: &str) -> Self {
        Self {
            source: source.into(),
            status: CorpusStatus::Loaded,
            sections: split_sections(text),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn status(&self) -> CorpusStatus {
        self.status
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Load the document named by the config, honouring `document.required`.
pub fn load_corpus(config: &Config) -> Result<Corpus> {
    let corpus = Corpus::load(&config.document.path)?;
    if corpus.status() == CorpusStatus::Missing && config.document.required {
        bail!(
            "document not found: {} (document.required = true)",
            config.document.path.display()
        );
    }
    Ok(corpus)
}

/// Split a document into sections on blank lines.
///
/// The whole text is trimmed first, so surrounding whitespace never
/// produces an empty leading or trailing section. Text that is empty
/// after trimming has no sections. Interior paragraphs are kept exactly
/// as split, indices contiguous from 0.
pub fn split_sections(text: &str) -> Vec<Section> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    trimmed
        .split(SECTION_SEPARATOR)
        .enumerate()
        .map(|(index, part)| Section {
            index,
            text: part.to_string(),
        })
        .collect()
}

#[derive(Serialize)]
struct SectionsResponse<'a> {
    source: String,
    status: CorpusStatus,
    sections: &'a [Section],
}

/// CLI entry point for `support-bot sections`.
pub fn run_sections(config: &Config, json: bool) -> Result<()> {
    let corpus = load_corpus(config)?;

    if json {
        let resp = SectionsResponse {
            source: corpus.source().display().to_string(),
            status: corpus.status(),
            sections: corpus.sections(),
        };
        println!("{}", serde_json::to_string_pretty(&resp)?);
        return Ok(());
    }

    match corpus.status() {
        CorpusStatus::Loaded => println!(
            "document: {} ({} sections)",
            corpus.source().display(),
            corpus.sections().len()
        ),
        CorpusStatus::Missing => println!(
            "document: {} (missing, empty corpus)",
            corpus.source().display()
        ),
    }

    for section in corpus.sections() {
        println!();
        println!("--- section {} ---", section.index);
        println!("{}", section.text);
    }

    Ok(())
}
