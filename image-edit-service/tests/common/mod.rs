#![allow(dead_code)]

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use image_edit_service::config::{DashScopeConfig, EditConfig, UploadConfig, DEFAULT_MODEL};
use image_edit_service::services::providers::ImageEditProvider;
use image_edit_service::startup::Application;
use reqwest::multipart::{Form, Part};
use secrecy::Secret;
use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;
use std::sync::{Arc, Mutex};

pub const TEST_API_KEY: &str = "sk-test-key";
pub const GENERATION_PATH: &str = "/api/v1/services/aigc/multimodal-generation/generation";

/// One request received by the fake DashScope endpoint.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub authorization: Option<String>,
    pub body: Value,
}

struct MockState {
    status: StatusCode,
    body: Value,
    calls: Mutex<Vec<RecordedCall>>,
}

/// In-process stand-in for the DashScope API answering every generation
/// request with a fixed status and body.
pub struct MockDashScope {
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockDashScope {
    pub async fn start(status: StatusCode, body: Value) -> Self {
        let state = Arc::new(MockState {
            status,
            body,
            calls: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route(GENERATION_PATH, post(generate))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock provider");
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            base_url: format!("http://127.0.0.1:{}/api/v1", port),
            state,
        }
    }

    pub async fn returning_images(urls: &[&str]) -> Self {
        Self::start(StatusCode::OK, image_response(urls)).await
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.calls.lock().unwrap().clone()
    }
}

async fn generate(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.calls.lock().unwrap().push(RecordedCall {
        authorization: headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });

    (state.status, Json(state.body.clone()))
}

/// A DashScope 200 body whose first choice carries `urls` as image items.
pub fn image_response(urls: &[&str]) -> Value {
    let content: Vec<Value> = urls.iter().map(|url| json!({ "image": url })).collect();
    json!({
        "output": {
            "choices": [{
                "finish_reason": "stop",
                "message": { "role": "assistant", "content": content }
            }]
        },
        "usage": { "width": 1024, "height": 1024, "image_count": urls.len() },
        "request_id": "mock-request-id"
    })
}

pub fn test_config(
    api_key: Option<&str>,
    provider_base_url: &str,
    max_upload_bytes: usize,
) -> EditConfig {
    EditConfig {
        common: CoreConfig {
            port: 0, // Random port
            ..Default::default()
        },
        dashscope: DashScopeConfig {
            api_key: api_key.map(|k| Secret::new(k.to_string())),
            base_url: provider_base_url.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: 5,
        },
        upload: UploadConfig {
            max_bytes: max_upload_bytes,
        },
    }
}

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Spawns the service with the real DashScope client pointed at `provider_base_url`.
    pub async fn spawn(api_key: Option<&str>, provider_base_url: &str) -> Self {
        Self::spawn_with_limit(api_key, provider_base_url, 1024 * 1024).await
    }

    pub async fn spawn_with_limit(
        api_key: Option<&str>,
        provider_base_url: &str,
        max_upload_bytes: usize,
    ) -> Self {
        let config = test_config(api_key, provider_base_url, max_upload_bytes);
        let app = Application::build(config)
            .await
            .expect("Failed to build application");
        Self::run(app)
    }

    /// Spawns the service around an arbitrary provider implementation.
    pub async fn spawn_with_provider(provider: Arc<dyn ImageEditProvider>) -> Self {
        let config = test_config(None, "http://127.0.0.1:1", 1024 * 1024);
        let app = Application::build_with_provider(config, provider)
            .await
            .expect("Failed to build application");
        Self::run(app)
    }

    fn run(app: Application) -> Self {
        let port = app.port();

        tokio::spawn(async move {
            let _ = app.run_until_stopped().await;
        });

        Self {
            address: format!("http://127.0.0.1:{}", port),
            client: reqwest::Client::new(),
        }
    }

    pub async fn post_edit(&self, form: Form) -> Value {
        let response = self
            .client
            .post(format!("{}/api/edit", self.address))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), 200, "edit failures must not change the HTTP status");
        response.json().await.expect("Failed to parse JSON")
    }
}

/// A tiny but well-formed PNG header followed by filler bytes.
pub fn png_bytes() -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&[0u8; 56]);
    bytes
}

pub fn image_part(bytes: Vec<u8>, mime: &str) -> Part {
    Part::bytes(bytes)
        .file_name("input.png")
        .mime_str(mime)
        .unwrap()
}

pub fn edit_form(prompt: &str) -> Form {
    Form::new()
        .text("prompt", prompt.to_string())
        .part("file", image_part(png_bytes(), "image/png"))
}
