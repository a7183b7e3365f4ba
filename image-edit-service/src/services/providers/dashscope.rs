//! DashScope provider implementation.
//!
//! Calls the multimodal-generation endpoint with model `qwen-image-edit`.
//! The image travels inline as a data URL next to the prompt text in a single
//! user message.

use super::{EditedImages, ImageEditProvider, ProviderError};
use crate::config::{missing_api_key_message, DashScopeConfig};
use crate::models::EditRequest;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const GENERATION_PATH: &str = "/services/aigc/multimodal-generation/generation";
const PROVIDER_NAME: &str = "DashScope";

/// DashScope image edit client.
#[derive(Clone)]
pub struct DashScopeClient {
    client: Client,
    config: DashScopeConfig,
}

impl DashScopeClient {
    pub fn new(config: DashScopeConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn generation_url(&self) -> String {
        format!("{}{}", self.config.base_url, GENERATION_PATH)
    }

    fn build_request<'a>(&'a self, request: &'a EditRequest) -> GenerationRequest<'a> {
        GenerationRequest {
            model: &self.config.model,
            input: GenerationInput {
                messages: vec![Message {
                    role: "user",
                    content: vec![
                        ContentPart::Image {
                            image: request.data_url(),
                        },
                        ContentPart::Text {
                            text: &request.prompt,
                        },
                    ],
                }],
            },
            parameters: GenerationParameters {
                n: request.count,
                watermark: false,
                prompt_extend: true,
                negative_prompt: request.negative_prompt.as_deref(),
            },
        }
    }
}

#[async_trait]
impl ImageEditProvider for DashScopeClient {
    fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    async fn edit(&self, request: &EditRequest) -> Result<EditedImages, ProviderError> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| ProviderError::NotConfigured(missing_api_key_message()))?;

        let body = self.build_request(request);

        tracing::debug!(
            model = %self.config.model,
            prompt_len = request.prompt.len(),
            image_bytes = request.image.len(),
            mime_type = %request.mime_type,
            n = request.count,
            "Sending image edit request to DashScope"
        );

        let response = self
            .client
            .post(self.generation_url())
            .bearer_auth(api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        let text = response.text().await.map_err(network_error)?;

        if status != StatusCode::OK {
            let error: ApiErrorBody = serde_json::from_str(&text).unwrap_or_default();
            tracing::warn!(
                status = %status,
                code = ?error.code,
                request_id = ?error.request_id,
                "DashScope rejected image edit"
            );

            let message = match error.message {
                Some(message) => Some(message),
                None if !text.trim().is_empty() => Some(text),
                None => None,
            };

            return Err(ProviderError::Api {
                status_code: status.as_u16(),
                code: error.code,
                message,
            });
        }

        let parsed: GenerationResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        let urls = parsed.image_urls();
        if urls.is_empty() {
            tracing::warn!(request_id = ?parsed.request_id, "DashScope returned no images");
            return Err(ProviderError::NoImageReturned);
        }

        tracing::info!(
            request_id = ?parsed.request_id,
            images = urls.len(),
            "DashScope image edit completed"
        );

        Ok(EditedImages {
            urls,
            request_id: parsed.request_id,
        })
    }
}

fn network_error(err: reqwest::Error) -> ProviderError {
    ProviderError::Network {
        provider: PROVIDER_NAME,
        detail: err.to_string(),
    }
}

// ============================================================================
// DashScope API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    input: GenerationInput<'a>,
    parameters: GenerationParameters<'a>,
}

#[derive(Debug, Serialize)]
struct GenerationInput<'a> {
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ContentPart<'a> {
    Image { image: String },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
struct GenerationParameters<'a> {
    n: u32,
    watermark: bool,
    prompt_extend: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    output: GenerationOutput,
    #[serde(default)]
    request_id: Option<String>,
}

impl GenerationResponse {
    /// Image URLs of the first choice, in order.
    fn image_urls(&self) -> Vec<String> {
        self.output
            .choices
            .first()
            .map(|choice| {
                choice
                    .message
                    .content
                    .iter()
                    .filter_map(|item| item.image.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct GenerationOutput {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Vec<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    image: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    request_id: Option<String>,
}
