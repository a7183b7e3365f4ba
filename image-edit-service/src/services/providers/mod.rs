//! Image edit provider abstraction.
//!
//! The edit handler only talks to [`ImageEditProvider`], so the DashScope
//! client can be swapped for a stub in tests.

pub mod dashscope;

use crate::models::EditRequest;
use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// No credential; raised before any network traffic.
    #[error("{0}")]
    NotConfigured(String),

    /// Non-200 answer, with the provider's own code and message.
    #[error("Provider returned HTTP {status_code}")]
    Api {
        status_code: u16,
        code: Option<String>,
        message: Option<String>,
    },

    #[error("call succeeded but no image returned")]
    NoImageReturned,

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Failed to call {provider}: {detail}")]
    Network {
        provider: &'static str,
        detail: String,
    },
}

/// Images produced by one successful edit call.
#[derive(Debug, Clone)]
pub struct EditedImages {
    /// Never empty.
    pub urls: Vec<String>,
    pub request_id: Option<String>,
}

/// Trait for image editing backends (e.g., DashScope qwen-image-edit).
#[async_trait]
pub trait ImageEditProvider: Send + Sync {
    /// Whether a credential is available. Callers check this before `edit`.
    fn is_configured(&self) -> bool;

    /// Submits one edit. A single attempt; no retries.
    async fn edit(&self, request: &EditRequest) -> Result<EditedImages, ProviderError>;
}
