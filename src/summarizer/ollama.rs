//! Non-streaming client for a local Ollama server.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::SummarizerConfig;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

pub struct OllamaClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
}

impl OllamaClient {
    pub fn new(config: &SummarizerConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to build Ollama HTTP client")?;

        let endpoint = config.endpoint.trim().trim_end_matches('/').to_string();
        let model = config.model.trim().to_string();

        info!("Initialized Ollama client: {} (model {})", endpoint, model);

        Ok(Self {
            http,
            endpoint,
            model,
        })
    }

    /// Run one completion and return the model's raw response text.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .http
            .post(format!("{}/api/generate", self.endpoint))
            .json(&body)
            .send()
            .await
            .context("Failed to send request to Ollama")?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .context("Failed to read Ollama response body")?;

        if !status.is_success() {
            anyhow::bail!("Ollama request failed with status {}: {}", status, response_text);
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&response_text).context("Failed to parse Ollama response")?;

        debug!("Ollama returned {} chars", parsed.response.len());

        Ok(parsed.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trailing_slash_is_stripped() {
        let config = SummarizerConfig {
            enabled: true,
            endpoint: "http://localhost:11434/".to_string(),
            model: "llama3".to_string(),
            timeout_seconds: 5,
        };
        let client = OllamaClient::new(&config).unwrap();
        assert_eq!(client.endpoint, "http://localhost:11434");
    }

    #[test]
    fn test_request_body_is_non_streaming() {
        let body = GenerateRequest {
            model: "llama3",
            prompt: "hello",
            stream: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["model"], "llama3");
    }
}
