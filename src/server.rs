//! HTTP JSON API for the support bot.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check with version and corpus status |
//! | `GET`  | `/sections` | The loaded sections |
//! | `POST` | `/ask` | Answer `{ "query": "..." }` |
//! | `POST` | `/feedback` | Adjust `{ "query", "answer", "feedback" }` |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `model_error` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so a browser chat page
//! can call the API directly.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::agent::SupportBot;
use crate::config::Config;
use crate::document::CorpusStatus;
use crate::feedback::Feedback;
use crate::models::{Retrieval, Section};

/// Starts the HTTP server.
///
/// Initializes the bot once, binds to `[server].bind`, and serves until the
/// process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bot = SupportBot::initialize(config).await?;
    serve(Arc::new(bot), &config.server.bind).await
}

/// Serve an already-initialized bot on `bind_addr`.
pub async fn serve(bot: Arc<SupportBot>, bind_addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "support bot listening");
    axum::serve(listener, router(bot)).await?;
    Ok(())
}

/// Build the route table around a shared bot.
pub fn router(bot: Arc<SupportBot>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/sections", get(handle_sections))
        .route("/ask", post(handle_ask))
        .route("/feedback", post(handle_feedback))
        .layer(cors)
        .with_state(bot)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

/// Embedding or QA delegate failure.
fn model_error(err: anyhow::Error) -> AppError {
    tracing::error!(error = %err, "request failed");
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "model_error",
        message: format!("{:#}", err),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    corpus: CorpusStatus,
    sections: usize,
}

async fn handle_health(State(bot): State<Arc<SupportBot>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        corpus: bot.corpus().status(),
        sections: bot.corpus().sections().len(),
    })
}

// ============ GET /sections ============

#[derive(Serialize)]
struct SectionsResponse {
    source: String,
    status: CorpusStatus,
    sections: Vec<Section>,
}

async fn handle_sections(State(bot): State<Arc<SupportBot>>) -> Json<SectionsResponse> {
    let corpus = bot.corpus();
    Json(SectionsResponse {
        source: corpus.source().display().to_string(),
        status: corpus.status(),
        sections: corpus.sections().to_vec(),
    })
}

// ============ POST /ask ============

#[derive(Deserialize)]
struct AskRequest {
    query: String,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
    retrieval: Option<Retrieval>,
}

async fn handle_ask(
    State(bot): State<Arc<SupportBot>>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    if req.query.trim().is_empty() {
        return Err(bad_request("query must not be empty"));
    }

    let reply = bot.respond(&req.query).await.map_err(model_error)?;
    Ok(Json(AskResponse {
        answer: reply.answer,
        retrieval: reply.retrieval,
    }))
}

// ============ POST /feedback ============

#[derive(Deserialize)]
struct FeedbackRequest {
    query: String,
    answer: String,
    feedback: String,
}

#[derive(Serialize)]
struct FeedbackResponse {
    answer: String,
}

async fn handle_feedback(
    State(bot): State<Arc<SupportBot>>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>, AppError> {
    if req.query.trim().is_empty() {
        return Err(bad_request("query must not be empty"));
    }

    let answer = bot
        .adjust(&req.query, &req.answer, &Feedback::parse(&req.feedback))
        .await
        .map_err(model_error)?;
    Ok(Json(FeedbackResponse { answer }))
}
