//! Service assembly: build every collaborator once, then serve.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::api::{ApiServer, AppState};
use crate::config::Config;
use crate::document::DocumentCompositor;
use crate::notify::SmtpNotifier;
use crate::pipeline::{PipelineOrchestrator, PipelineSettings};
use crate::speech::{HttpSpeechClient, SpeechToText};
use crate::storage::S3ObjectStore;
use crate::summarizer::{OllamaClient, SummarizationEngine};

pub async fn run_service(config_path: Option<&Path>) -> Result<()> {
    info!("Starting debrief service");

    let config = Config::load(config_path)?;

    let speech: Arc<dyn SpeechToText> = Arc::new(HttpSpeechClient::new(&config.speech)?);

    let ollama = if config.summarizer.enabled {
        Some(OllamaClient::new(&config.summarizer)?)
    } else {
        info!("Generative summarizer disabled, heuristic only");
        None
    };
    let summarizer = SummarizationEngine::new(ollama)?;

    let store = Arc::new(S3ObjectStore::new(&config.storage)?);
    let notifier = Arc::new(SmtpNotifier::new(&config.mail));

    let orchestrator = Arc::new(PipelineOrchestrator::new(
        speech.clone(),
        summarizer,
        DocumentCompositor::new(),
        store,
        notifier,
        PipelineSettings {
            audio_bucket: config.storage.audio_bucket.clone(),
            pdf_bucket: config.storage.pdf_bucket.clone(),
            presign_ttl_seconds: config.storage.presign_ttl_seconds,
        },
    ));

    let state = AppState {
        speech,
        orchestrator,
    };

    ApiServer::new(&config, state).start().await
}
