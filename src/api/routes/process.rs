//! Full pipeline endpoint.
//!
//! Fatal stage failures become error responses; a notification failure comes
//! back inside a 200 with `email_sent: false` and the delivery error.

use axum::{
    extract::{Multipart, State},
    response::Json,
    routing::post,
    Router,
};
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::config::truthy;
use crate::pipeline::{PipelineRequest, PipelineResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/process", post(process))
        .with_state(state)
}

async fn process(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<PipelineResult>> {
    let mut audio: Option<Vec<u8>> = None;
    let mut file_name = "meeting_audio".to_string();
    let mut language = "en".to_string();
    let mut send_email = false;
    let mut email_to: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                if let Some(upload_name) = field.file_name() {
                    if !upload_name.trim().is_empty() {
                        file_name = upload_name.trim().to_string();
                    }
                }
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
            "send_email" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read field: {e}")))?;
                send_email = truthy(&raw);
            }
            "email_to" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read field: {e}")))?;
                if !raw.trim().is_empty() {
                    email_to = Some(raw.trim().to_string());
                }
            }
            _ => {}
        }
    }

    let audio = audio.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;

    info!(
        "Process request: {} ({} bytes, language {}, notify {})",
        file_name,
        audio.len(),
        language,
        send_email
    );

    let result = state
        .orchestrator
        .run(PipelineRequest {
            file_name,
            audio,
            language,
            send_email,
            email_to,
        })
        .await?;

    Ok(Json(result))
}
