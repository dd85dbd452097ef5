//! Meeting processing pipeline.
//!
//! Sequences Transcribe → Summarize → Compose → Store → Presign → Notify,
//! one synchronous pass per request. Each stage has its own failure policy:
//! Transcribe, Compose, and Store abort the pipeline; Summarize never fails;
//! Presign and Notify degrade into fields of the result.
//!
//! All collaborators are injected via the constructor — no concrete types
//! hardcoded.

pub mod error;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::document::{ComposeRequest, DocumentCompositor};
use crate::language::Language;
use crate::notify::Notifier;
use crate::speech::SpeechToText;
use crate::storage::ObjectStore;
use crate::summarizer::SummarizationEngine;

pub use error::PipelineError;

/// One step of the pipeline, for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Transcribe,
    Summarize,
    Compose,
    Store,
    Presign,
    Notify,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transcribe => "transcribe",
            Self::Summarize => "summarize",
            Self::Compose => "compose",
            Self::Store => "store",
            Self::Presign => "presign",
            Self::Notify => "notify",
        }
    }
}

/// One meeting upload to process.
pub struct PipelineRequest {
    pub file_name: String,
    pub audio: Vec<u8>,
    /// Raw language tag from the caller; validated before any stage runs.
    pub language: String,
    pub send_email: bool,
    pub email_to: Option<String>,
}

/// The API-visible envelope. Built field by field as stages complete; no
/// field is ever retracted once set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub transcript: String,
    pub summary: String,
    pub tasks: String,
    pub pdf_url: Option<String>,
    pub email_sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_error: Option<String>,
}

/// Bucket names and presign lifetime, fixed at startup.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub audio_bucket: String,
    pub pdf_bucket: String,
    pub presign_ttl_seconds: u64,
}

pub struct PipelineOrchestrator {
    speech: Arc<dyn SpeechToText>,
    summarizer: SummarizationEngine,
    compositor: DocumentCompositor,
    store: Arc<dyn ObjectStore>,
    notifier: Arc<dyn Notifier>,
    settings: PipelineSettings,
}

impl PipelineOrchestrator {
    pub fn new(
        speech: Arc<dyn SpeechToText>,
        summarizer: SummarizationEngine,
        compositor: DocumentCompositor,
        store: Arc<dyn ObjectStore>,
        notifier: Arc<dyn Notifier>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            speech,
            summarizer,
            compositor,
            store,
            notifier,
            settings,
        }
    }

    /// Run the full pipeline for one request.
    pub async fn run(&self, request: PipelineRequest) -> Result<PipelineResult, PipelineError> {
        let run_id = short_run_id();
        info!("[{}] Pipeline started for {}", run_id, request.file_name);

        // Preconditions, before any work is committed.
        let language = Language::from_tag(request.language.trim())
            .ok_or_else(|| PipelineError::UnsupportedLanguage(request.language.clone()))?;

        let recipient = if request.send_email {
            match request.email_to.as_deref().map(str::trim) {
                Some(to) if !to.is_empty() => Some(to.to_string()),
                _ => return Err(PipelineError::MissingRecipient),
            }
        } else {
            None
        };

        // Transcribe: fatal on failure.
        let transcript = self
            .speech
            .transcribe(&request.audio, language)
            .await
            .map_err(|e| PipelineError::Transcription(format!("{e:#}")))?;
        info!("[{}] Stage {} done: {} chars", run_id, Stage::Transcribe.as_str(), transcript.len());

        // Summarize: cannot fail, only degrade.
        let summary = self.summarizer.summarize(&transcript, language).await;
        info!("[{}] Stage {} done", run_id, Stage::Summarize.as_str());

        // Compose: fatal on failure.
        let document = self
            .compositor
            .compose(&ComposeRequest {
                transcript: &transcript,
                summary: &summary.summary,
                tasks: &summary.tasks,
                original_file: &request.file_name,
                language,
                generated_at: Utc::now(),
            })
            .map_err(|e| PipelineError::Compose(format!("{e:#}")))?;
        info!(
            "[{}] Stage {} done: {} ({} pages)",
            run_id,
            Stage::Compose.as_str(),
            document.file_name,
            document.pages
        );

        // Store audio and PDF: fatal on failure.
        self.store
            .put(
                &self.settings.audio_bucket,
                &request.file_name,
                &request.audio,
                "application/octet-stream",
            )
            .await
            .map_err(|e| PipelineError::Store(format!("{e:#}")))?;
        self.store
            .put(
                &self.settings.pdf_bucket,
                &document.file_name,
                &document.bytes,
                "application/pdf",
            )
            .await
            .map_err(|e| PipelineError::Store(format!("{e:#}")))?;
        info!("[{}] Stage {} done", run_id, Stage::Store.as_str());

        // Presign: partial failure, result carries a null URL.
        let pdf_url = match self
            .store
            .presign(
                &self.settings.pdf_bucket,
                &document.file_name,
                self.settings.presign_ttl_seconds,
            )
            .await
        {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("[{}] Stage {} failed, continuing without URL: {:#}", run_id, Stage::Presign.as_str(), e);
                None
            }
        };

        // Notify: partial failure, reported inline.
        let mut email_sent = false;
        let mut email_error = None;
        if let Some(to) = recipient {
            let body = format!("Attached is the meeting summary for {}.", request.file_name);
            match self
                .notifier
                .send(&to, "Meeting Summary", &body, &document.bytes, &document.file_name)
                .await
            {
                Ok(()) => {
                    email_sent = true;
                    info!("[{}] Stage {} done: sent to {}", run_id, Stage::Notify.as_str(), to);
                }
                Err(e) => {
                    warn!("[{}] Stage {} failed: {:#}", run_id, Stage::Notify.as_str(), e);
                    email_error = Some(format!("{e:#}"));
                }
            }
        }

        info!("[{}] Pipeline done for {}", run_id, request.file_name);

        Ok(PipelineResult {
            transcript,
            summary: summary.summary,
            tasks: summary.tasks,
            pdf_url,
            email_sent,
            email_error,
        })
    }
}

fn short_run_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}
