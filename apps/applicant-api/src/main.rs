//! Application Parsing Server
//!
//! Accepts residency application PDFs and answers with the structured
//! record extracted from them. Provides REST endpoints for:
//!
//! - PDF parsing from the raw request body
//! - Parsing text that was already extracted
//! - Ranking a parsed record against a cohort
//!
//! Each parse runs on the blocking pool under a timeout; parses share no
//! state, so concurrent requests never wait on each other.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use applicant_parser::{load_cohort, ApplicationRecord, PdfTextExtractor, TextExtractor};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;

use api::{handle_health, handle_parse_pdf, handle_parse_text, handle_rank};

/// Command-line arguments for the parsing server
#[derive(Parser, Debug)]
#[command(name = "applicant-api")]
#[command(about = "HTTP service for parsing residency application PDFs")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Parse timeout in milliseconds
    #[arg(long, default_value = "10000")]
    timeout_ms: u64,

    /// Rate limit: requests per second per IP
    #[arg(long, default_value = "10")]
    rate_limit: u32,

    /// Largest accepted upload, in megabytes
    #[arg(long, default_value = "20")]
    max_upload_mb: usize,

    /// JSON array of parsed applicants to rank against
    #[arg(long)]
    cohort: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Parse timeout in milliseconds
    pub timeout_ms: u64,
    /// Text recovery backend
    pub extractor: Arc<dyn TextExtractor>,
    /// Ranking cohort, when one was loaded
    pub cohort: Option<Arc<Vec<ApplicationRecord>>>,
}

/// Routes plus CORS, tracing and the upload size limit
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    // CORS preflight (OPTIONS) is answered by this layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handle_health))
        // API endpoints
        .route("/api/parse-pdf", post(handle_parse_pdf))
        .route("/api/parse-text", post(handle_parse_text))
        .route("/api/rank", post(handle_rank))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting applicant-api on {}:{}", args.host, args.port);

    let cohort = match &args.cohort {
        Some(path) => {
            let records = load_cohort(path)
                .with_context(|| format!("failed to load cohort from {}", path.display()))?;
            info!("Loaded ranking cohort of {} applicants", records.len());
            Some(Arc::new(records))
        }
        None => None,
    };

    // Create rate limiter configuration
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(args.rate_limit.into())
            .burst_size(args.rate_limit * 2)
            .finish()
            .context("invalid rate limit configuration")?,
    );

    let state = AppState {
        timeout_ms: args.timeout_ms,
        extractor: Arc::new(PdfTextExtractor::new()),
        cohort,
    };

    let app = router(state, args.max_upload_mb * 1024 * 1024).layer(GovernorLayer {
        config: governor_conf,
    });

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Rate limit: {} requests/second per IP", args.rate_limit);
    info!("Parse timeout: {}ms", args.timeout_ms);

    // The rate limiter keys on the peer address
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
