//! # Support Bot
//!
//! A local-first FAQ question-answering bot.
//!
//! The bot loads a plain-text FAQ, splits it into paragraphs, and embeds
//! each paragraph once at startup. For every question it finds the most
//! similar paragraph and runs an extractive QA model over it; when nothing
//! is similar enough it says so instead of guessing.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────────┐   ┌───────────┐   ┌──────────┐
//! │ faq.txt  │──▶│  Sections   │──▶│ Retriever │──▶│ QA model │──▶ answer
//! │          │   │ + embedding │   │ (cosine)  │   │ (span)   │
//! └──────────┘   └─────────────┘   └───────────┘   └──────────┘
//!                                                        │
//!                       ┌────────────────────────────────┤
//!                       ▼                                ▼
//!                  ┌──────────┐                     ┌──────────┐
//!                  │   chat   │                     │   HTTP   │
//!                  │  (tty)   │                     │  (JSON)  │
//!                  └──────────┘                     └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! support-bot sections                       # check how the FAQ splits
//! support-bot ask "How long for a refund?"   # one-shot answer
//! support-bot chat                           # interactive session
//! support-bot serve                          # HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`document`] | Document loading and section splitting |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`qa`] | Extractive QA provider abstraction |
//! | [`retriever`] | Section index and nearest-section lookup |
//! | [`agent`] | The bot: retrieval plus answering |
//! | [`feedback`] | Answer adjustment from feedback labels |
//! | [`chat`] | Terminal chat loop |
//! | [`server`] | HTTP JSON API |
//! | [`logging`] | Tracing subscriber setup |

pub mod agent;
pub mod chat;
pub mod config;
pub mod document;
pub mod embedding;
pub mod feedback;
pub mod logging;
#[cfg(any(feature = "local-embeddings-tract", feature = "local-qa"))]
pub mod model_cache;
pub mod models;
pub mod qa;
pub mod retriever;
pub mod server;
