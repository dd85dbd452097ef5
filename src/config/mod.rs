//! Service configuration.
//!
//! Loaded once at startup from a TOML file (written out with defaults on
//! first run), then overridden from the environment. Read-only afterwards;
//! every collaborator gets its section by reference at construction time.

use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub speech: SpeechConfig,
    pub summarizer: SummarizerConfig,
    pub storage: StorageConfig,
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address for the HTTP API.
    pub bind: String,
    /// Origin allowed by the CORS layer (the dev frontend).
    pub cors_origin: String,
    /// Upper bound on uploaded audio, in megabytes.
    pub max_upload_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5000".to_string(),
            cors_origin: "http://localhost:3000".to_string(),
            max_upload_mb: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub endpoint: String,
    pub timeout_seconds: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3141/api/v1/transcriptions".to_string(),
            timeout_seconds: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// When false the generative strategy is skipped entirely.
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Host:port, or a full URL with scheme.
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    /// HTTPS to the storage endpoint.
    pub secure: bool,
    pub audio_bucket: String,
    pub pdf_bucket: String,
    pub presign_ttl_seconds: u64,
    pub timeout_seconds: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: "localhost:9000".to_string(),
            access_key: "minio".to_string(),
            secret_key: "minio123".to_string(),
            secure: false,
            audio_bucket: "meeting-audios".to_string(),
            pdf_bucket: "meeting-pdfs".to_string(),
            presign_ttl_seconds: 24 * 3600,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub use_tls: bool,
    pub sender_name: String,
    pub timeout_seconds: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            user: String::new(),
            password: String::new(),
            use_tls: true,
            sender_name: "AI Meeting Summarizer".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl Config {
    /// Load from `path` (or the platform config file), writing defaults on
    /// first run, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => global::config_file()?,
        };

        let mut config = if config_path.exists() {
            let content =
                std::fs::read_to_string(&config_path).context("Failed to read config file")?;
            let config: Self = toml::from_str(&content).context("Failed to parse config file")?;
            info!("Loaded config from {:?}", config_path);
            config
        } else {
            info!("Config file not found, creating default at {:?}", config_path);
            let config = Self::default();
            config.save(&config_path)?;
            config
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        global::config_file()
    }

    /// Environment wins over the config file, using the deployment's
    /// established variable names.
    fn apply_env_overrides(&mut self) {
        override_string(&mut self.server.bind, "DEBRIEF_BIND");
        override_string(&mut self.speech.endpoint, "DEBRIEF_SPEECH_ENDPOINT");

        override_string(&mut self.summarizer.endpoint, "OLLAMA_BASE_URL");
        override_string(&mut self.summarizer.model, "OLLAMA_MODEL");

        override_string(&mut self.storage.endpoint, "MINIO_ENDPOINT");
        override_string(&mut self.storage.access_key, "MINIO_ACCESS_KEY");
        override_string(&mut self.storage.secret_key, "MINIO_SECRET_KEY");
        override_bool(&mut self.storage.secure, "MINIO_SECURE");
        override_string(&mut self.storage.audio_bucket, "MINIO_AUDIO_BUCKET");
        override_string(&mut self.storage.pdf_bucket, "MINIO_PDF_BUCKET");

        override_string(&mut self.mail.host, "SMTP_HOST");
        override_u16(&mut self.mail.port, "SMTP_PORT");
        override_string(&mut self.mail.user, "SMTP_USER");
        override_string(&mut self.mail.password, "SMTP_PASSWORD");
        override_bool(&mut self.mail.use_tls, "SMTP_USE_TLS");
        override_string(&mut self.mail.sender_name, "SENDER_NAME");
    }
}

fn override_string(target: &mut String, var: &str) {
    if let Ok(value) = std::env::var(var) {
        if !value.trim().is_empty() {
            *target = value;
        }
    }
}

fn override_bool(target: &mut bool, var: &str) {
    if let Ok(value) = std::env::var(var) {
        if !value.trim().is_empty() {
            *target = truthy(&value);
        }
    }
}

fn override_u16(target: &mut u16, var: &str) {
    if let Ok(value) = std::env::var(var) {
        if let Ok(parsed) = value.trim().parse() {
            *target = parsed;
        }
    }
}

/// `1`, `true`, and `yes` (case-insensitive) are true; anything else false.
pub fn truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}
