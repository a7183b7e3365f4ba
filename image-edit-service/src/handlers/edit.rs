use crate::config::missing_api_key_message;
use crate::error::EditError;
use crate::models::edit::resolve_mime_type;
use crate::models::{EditRequest, EditResult};
use crate::services::providers::{EditedImages, ProviderError};
use crate::services::record_edit_outcome;
use crate::startup::AppState;
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};

/// `POST /api/edit`. Every outcome, including failures, is an HTTP 200 with
/// an [`EditResult`] body.
pub async fn edit_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Json<EditResult> {
    let result = match process_edit(&state, multipart).await {
        Ok(images) => EditResult::success(images.urls),
        Err(err) => {
            tracing::warn!(kind = err.kind().as_str(), error = %err, "Image edit failed");
            EditResult::from(err)
        }
    };

    record_edit_outcome(result.error_kind);
    Json(result)
}

async fn process_edit(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<EditedImages, EditError> {
    if !state.provider.is_configured() {
        return Err(ProviderError::NotConfigured(missing_api_key_message()).into());
    }

    let multipart = multipart.map_err(|e| EditError::InvalidRequest(e.body_text()))?;
    let request = read_edit_form(multipart, state.config.upload.max_bytes).await?;

    tracing::info!(
        prompt_len = request.prompt.len(),
        image_bytes = request.image.len(),
        mime_type = %request.mime_type,
        n = request.count,
        "Submitting image edit"
    );

    Ok(state.provider.edit(&request).await?)
}

/// Collects `prompt`, `file`, `n` and `negative_prompt` in any order.
async fn read_edit_form(
    mut multipart: Multipart,
    max_bytes: usize,
) -> Result<EditRequest, EditError> {
    let mut prompt: Option<String> = None;
    let mut upload: Option<(Vec<u8>, String)> = None;
    let mut count: u32 = 1;
    let mut negative_prompt: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| field_error(e, max_bytes))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("prompt") => {
                prompt = Some(field.text().await.map_err(|e| field_error(e, max_bytes))?);
            }
            Some("file") => {
                let mime_type = resolve_mime_type(field.content_type());
                let data = field.bytes().await.map_err(|e| field_error(e, max_bytes))?;
                if data.len() > max_bytes {
                    return Err(EditError::PayloadTooLarge { limit: max_bytes });
                }
                upload = Some((data.to_vec(), mime_type));
            }
            Some("n") => {
                let raw = field.text().await.map_err(|e| field_error(e, max_bytes))?;
                count = parse_count(&raw)?;
            }
            Some("negative_prompt") => {
                let value = field.text().await.map_err(|e| field_error(e, max_bytes))?;
                negative_prompt = Some(value).filter(|v| !v.trim().is_empty());
            }
            _ => {}
        }
    }

    let prompt = prompt
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| EditError::InvalidRequest("prompt is required".to_string()))?;
    let (image, mime_type) =
        upload.ok_or_else(|| EditError::InvalidRequest("file is required".to_string()))?;

    Ok(EditRequest {
        prompt,
        image,
        mime_type,
        count,
        negative_prompt,
    })
}

fn field_error(err: MultipartError, max_bytes: usize) -> EditError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        EditError::PayloadTooLarge { limit: max_bytes }
    } else {
        EditError::InvalidRequest(err.body_text())
    }
}

fn parse_count(raw: &str) -> Result<u32, EditError> {
    match raw.trim().parse::<u32>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(EditError::InvalidRequest(format!(
            "n must be a positive integer, got '{}'",
            raw
        ))),
    }
}
