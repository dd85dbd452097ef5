//! Pipeline error taxonomy.
//!
//! Only failures that abort the pipeline live here. Presign and Notify
//! failures are carried inside an otherwise-successful
//! [`PipelineResult`](super::PipelineResult) instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Rejected before any stage runs.
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Notification was requested without a recipient. Checked up front so a
    /// doomed request does not burn transcription or storage work.
    #[error("send_email is true but email_to was not provided")]
    MissingRecipient,

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("PDF generation failed: {0}")]
    Compose(String),

    #[error("Storage upload failed: {0}")]
    Store(String),
}

impl PipelineError {
    /// Caller-input failures, as opposed to stage failures.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedLanguage(_) | Self::MissingRecipient
        )
    }
}
