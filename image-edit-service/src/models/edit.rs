//! Edit request and the uniform response envelope of `POST /api/edit`.

use serde::{Deserialize, Serialize};

/// MIME type used when the upload does not declare an image type.
pub const FALLBACK_MIME_TYPE: &str = "image/png";

/// One edit, scoped to a single HTTP call.
#[derive(Debug, Clone)]
pub struct EditRequest {
    pub prompt: String,
    pub image: Vec<u8>,
    pub mime_type: String,
    /// Number of variants to ask for, at least 1.
    pub count: u32,
    pub negative_prompt: Option<String>,
}

impl EditRequest {
    /// Returns the image as `data:<mime>;base64,<payload>`.
    pub fn data_url(&self) -> String {
        use base64::{engine::general_purpose::STANDARD, Engine as _};
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.image))
    }
}

/// Picks the upload's declared type when it is an image, `image/png` otherwise.
pub fn resolve_mime_type(content_type: Option<&str>) -> String {
    match content_type {
        Some(ct) if ct.starts_with("image/") => ct.to_string(),
        _ => FALLBACK_MIME_TYPE.to_string(),
    }
}

/// Failure category reported in `error_kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Provider,
    Schema,
    Transport,
    PayloadTooLarge,
    InvalidRequest,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Provider => "provider",
            ErrorKind::Schema => "schema",
            ErrorKind::Transport => "transport",
            ErrorKind::PayloadTooLarge => "payload_too_large",
            ErrorKind::InvalidRequest => "invalid_request",
        }
    }
}

/// Edit envelope. Always sent with HTTP 200; `success` tells the outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_image_urls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl EditResult {
    /// Success with the first URL as primary result. `urls` must be non-empty.
    pub fn success(urls: Vec<String>) -> Self {
        Self {
            success: true,
            image_url: urls.first().cloned(),
            all_image_urls: Some(urls),
            ..Default::default()
        }
    }

    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            error_kind: Some(kind),
            ..Default::default()
        }
    }

    /// Non-200 provider answer, forwarded field by field.
    pub fn provider_failure(
        status_code: u16,
        error_code: Option<String>,
        error_message: Option<String>,
    ) -> Self {
        Self {
            success: false,
            status_code: Some(status_code),
            error_code,
            error_message,
            error_kind: Some(ErrorKind::Provider),
            ..Default::default()
        }
    }
}
