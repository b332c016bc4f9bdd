//! API handlers for the application parsing server
//!
//! Provides REST endpoints for:
//! - PDF parsing (raw request body)
//! - Text parsing
//! - Cohort ranking

use std::time::Duration;

use applicant_parser::{
    parse, parse_bytes, rank_against, ApplicationRecord, ParseOutcome, RankingInfo,
};
use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ServerError;
use crate::AppState;

/// File name reported when the client does not supply one
pub const DEFAULT_UPLOAD_NAME: &str = "upload.pdf";

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        message: "PDF parsing API is running",
        service: "applicant-api",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Query string for PDF uploads
#[derive(Deserialize, Default)]
pub struct ParsePdfQuery {
    /// Name to report in the `file` field
    pub file: Option<String>,
}

/// Handler: POST /api/parse-pdf
///
/// The request body is the PDF itself. Documents that cannot be read still
/// answer 200 with an `{error, file}` body.
pub async fn handle_parse_pdf(
    State(state): State<AppState>,
    Query(query): Query<ParsePdfQuery>,
    body: Bytes,
) -> Result<Json<ParseOutcome>, ServerError> {
    if body.is_empty() {
        return Err(ServerError::InvalidRequest("Request body is empty".into()));
    }

    let file_name = query
        .file
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_UPLOAD_NAME.to_string());

    info!("Parse request: file={}, bytes={}", file_name, body.len());

    let extractor = state.extractor.clone();
    let outcome = run_blocking(state.timeout_ms, move || {
        parse_bytes(&body, &file_name, extractor.as_ref())
    })
    .await?;

    Ok(Json(outcome))
}

/// Text parse request body
#[derive(Deserialize)]
pub struct ParseTextRequest {
    /// Document text as recovered from the PDF
    pub text: String,

    /// Optional source name echoed in the `file` field
    pub file: Option<String>,
}

/// Handler: POST /api/parse-text
pub async fn handle_parse_text(
    State(state): State<AppState>,
    Json(req): Json<ParseTextRequest>,
) -> Result<Json<ApplicationRecord>, ServerError> {
    debug!("Text parse request: {} chars", req.text.len());

    let record = run_blocking(state.timeout_ms, move || {
        let mut record = parse(&req.text);
        record.file = req.file;
        record
    })
    .await?;

    Ok(Json(record))
}

/// Ranking response
#[derive(Serialize)]
pub struct RankResponse {
    pub success: bool,
    pub ranking: RankingInfo,
}

/// Handler: POST /api/rank
pub async fn handle_rank(
    State(state): State<AppState>,
    Json(record): Json<ApplicationRecord>,
) -> Result<Json<RankResponse>, ServerError> {
    let cohort = state.cohort.as_ref().ok_or(ServerError::CohortUnavailable)?;
    let ranking = rank_against(cohort, &record);

    info!(
        "Ranked {} at {}/{}",
        record.file.as_deref().unwrap_or("applicant"),
        ranking.rank,
        ranking.total_candidates
    );

    Ok(Json(RankResponse {
        success: true,
        ranking,
    }))
}

/// Run a parse off the async workers, bounded by the configured timeout
async fn run_blocking<F, T>(timeout_ms: u64, job: F) -> Result<T, ServerError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::time::timeout(
        Duration::from_millis(timeout_ms),
        tokio::task::spawn_blocking(job),
    )
    .await;

    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(join_error)) => Err(ServerError::Internal(format!(
            "Parse task panicked: {}",
            join_error
        ))),
        Err(_timeout) => Err(ServerError::Timeout(timeout_ms)),
    }
}
