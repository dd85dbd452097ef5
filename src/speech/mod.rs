//! Speech-to-text collaborator.
//!
//! The engine itself is external; this module is the wire adapter that posts
//! audio to it and pulls the transcript back out.

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::SpeechConfig;
use crate::language::Language;

/// Opaque transcription service: audio bytes in, transcript text out.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, audio: &[u8], language: Language) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct TranscriptionPayload {
    content: String, // base64 audio
    language: String,
    timestamps: bool,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    result: TranscriptionResult,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResult {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
    r#type: Option<String>,
    code: Option<String>,
}

pub struct HttpSpeechClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSpeechClient {
    pub fn new(config: &SpeechConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to build speech HTTP client")?;

        info!("Initialized speech client with endpoint: {}", config.endpoint);

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl SpeechToText for HttpSpeechClient {
    async fn transcribe(&self, audio: &[u8], language: Language) -> Result<String> {
        info!("Transcribing {} bytes of audio ({})", audio.len(), language.as_str());

        let body = TranscriptionPayload {
            content: BASE64.encode(audio),
            language: language.as_str().to_string(),
            timestamps: false,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .context("Failed to send request to speech service")?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            error!(
                "Speech service request failed with status {}: {}",
                status, response_text
            );

            if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&response_text) {
                return Err(anyhow::anyhow!(
                    "Speech service error: {} (type: {:?}, code: {:?})",
                    error_response.error.message,
                    error_response.error.r#type,
                    error_response.error.code
                ));
            }

            return Err(anyhow::anyhow!(
                "Speech service request failed with status {}: {}",
                status,
                response_text
            ));
        }

        let transcription: TranscriptionResponse = serde_json::from_str(&response_text)
            .context("Failed to parse transcription response")?;

        let text = transcription.result.text.trim().to_string();
        info!("Transcription complete: {} chars", text.len());
        debug!("Raw transcription: {}", text);

        Ok(text)
    }
}
