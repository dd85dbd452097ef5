//! REST API server for debrief.
//!
//! Two endpoints do the work: `/transcribe` (audio in, transcript out) and
//! `/process` (the full pipeline). Everything else is service info.

pub mod error;
pub mod routes;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::Config;
use crate::pipeline::PipelineOrchestrator;
use crate::speech::SpeechToText;

/// Shared handler state, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub speech: Arc<dyn SpeechToText>,
    pub orchestrator: Arc<PipelineOrchestrator>,
}

pub struct ApiServer {
    bind: String,
    cors_origin: String,
    max_upload_bytes: usize,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: &Config, state: AppState) -> Self {
        Self {
            bind: config.server.bind.clone(),
            cors_origin: config.server.cors_origin.clone(),
            max_upload_bytes: config.server.max_upload_mb * 1024 * 1024,
            state,
        }
    }

    pub async fn start(self) -> Result<()> {
        let cors = CorsLayer::new()
            .allow_origin(
                self.cors_origin
                    .parse::<HeaderValue>()
                    .context("Invalid CORS origin")?,
            )
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any);

        let app = Router::new()
            .route("/", get(status))
            .route("/version", get(version))
            .merge(routes::transcribe::router(self.state.clone()))
            .merge(routes::process::router(self.state))
            .layer(
                ServiceBuilder::new()
                    .layer(cors)
                    .layer(DefaultBodyLimit::max(self.max_upload_bytes)),
            );

        let listener = tokio::net::TcpListener::bind(&self.bind).await?;

        info!("API server listening on http://{}", self.bind);
        info!("Endpoints:");
        info!("  GET  /            - Service info");
        info!("  GET  /version     - Get version info");
        info!("  POST /transcribe  - Transcribe uploaded audio");
        info!("  POST /process     - Run the full meeting pipeline");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn status() -> Json<Value> {
    Json(json!({
        "service": "debrief",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn version() -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "name": "debrief"
    }))
}
