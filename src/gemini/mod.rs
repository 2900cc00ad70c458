//! Google Generative Language backend: Gemini for prompt improvement and
//! Imagen for image synthesis, both over plain REST.

pub mod image_client;
pub mod text_client;

use crate::{
    config::{GeminiConfig, ImageSize},
    error::{ImaginError, Result},
    policy::ImprovementPolicy,
};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

pub use image_client::GeminiImageClient;
pub use text_client::GeminiTextClient;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Shared HTTP plumbing for both Gemini clients.
#[derive(Clone)]
pub struct GeminiHttp {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiHttp {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ImaginError::ConfigError("Gemini API key is required".into()))?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client: Client::new(),
            api_key,
            base_url,
        })
    }

    pub fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.base_url, model, method)
    }

    fn request(&self, url: &str, payload: &Value) -> RequestBuilder {
        self.client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(payload)
    }

    pub async fn post_json(&self, url: &str, payload: &Value) -> Result<Value> {
        let response = self
            .request(url, payload)
            .send()
            .await
            .map_err(|e| ImaginError::RequestError(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ImaginError::ResponseError(e.to_string()))?;

        if !status.is_success() {
            return Err(error_from_body(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| ImaginError::ResponseError(e.to_string()))
    }
}

fn error_from_body(status: u16, body: &str) -> ImaginError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => {
            let code = envelope.error.code.unwrap_or(status);
            let label = envelope.error.status.unwrap_or_else(|| "ERROR".to_string());
            ImaginError::RequestError(format!(
                "Gemini {} ({}): {}",
                code, label, envelope.error.message
            ))
        }
        _ => ImaginError::RequestError(format!("Gemini returned HTTP {}: {}", status, body)),
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    text_client: GeminiTextClient,
    image_client: GeminiImageClient,
}

impl GeminiClient {
    pub fn new(
        config: &GeminiConfig,
        policy: Arc<ImprovementPolicy>,
        image_size: ImageSize,
    ) -> Result<Self> {
        let http = GeminiHttp::new(config)?;
        log::info!("Gemini client ready against {}", http.base_url);

        Ok(Self {
            text_client: GeminiTextClient::new(http.clone(), config, policy),
            image_client: GeminiImageClient::new(http, config, image_size),
        })
    }

    pub fn text(&self) -> &GeminiTextClient {
        &self.text_client
    }

    pub fn image(&self) -> &GeminiImageClient {
        &self.image_client
    }
}
