//! Lightweight transcription endpoint: audio in, transcript out. No
//! summarization, storage, or notification.

use axum::{
    extract::{Multipart, State},
    response::Json,
    routing::post,
    Router,
};
use serde_json::{json, Value};
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::language::Language;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/transcribe", post(transcribe))
        .with_state(state)
}

async fn transcribe(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<Value>> {
    let mut audio: Option<Vec<u8>> = None;
    let mut language = "en".to_string();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {e}")))?;
                audio = Some(bytes.to_vec());
            }
            "language" => {
                language = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read field: {e}")))?;
            }
            _ => {}
        }
    }

    let audio = audio.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;
    let language = Language::from_tag(language.trim())
        .ok_or_else(|| ApiError::bad_request(format!("Unsupported language: {language}")))?;

    info!("Transcribe request: {} bytes ({})", audio.len(), language.as_str());

    let transcript = state
        .speech
        .transcribe(&audio, language)
        .await
        .map_err(|e| ApiError::internal(format!("Transcription failed: {e:#}")))?;

    Ok(Json(json!({ "transcript": transcript })))
}
