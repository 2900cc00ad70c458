use crate::{
    config::{GeminiConfig, ImageSize},
    error::{ImaginError, Result},
    gemini::GeminiHttp,
    logger::Timer,
    models::{
        data_uri, ImageGenerationRequest, ImageGenerationResult, ModelCategory, ModelInfo,
    },
    services::{ImageGenerator, ModelCatalog},
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

pub const DEFAULT_IMAGE_MODEL: &str = "imagen-3.0-generate-002";

const DEFAULT_MIME: &str = "image/png";

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    #[serde(default)]
    bytes_base64_encoded: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    rai_filtered_reason: Option<String>,
}

#[derive(Clone)]
pub struct GeminiImageClient {
    http: GeminiHttp,
    model: String,
    size: ImageSize,
}

impl GeminiImageClient {
    pub fn new(http: GeminiHttp, config: &GeminiConfig, size: ImageSize) -> Self {
        Self {
            http,
            model: config
                .image_model
                .clone()
                .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            size,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ImageGenerator for GeminiImageClient {
    async fn generate_image(
        &self,
        request: ImageGenerationRequest,
    ) -> Result<ImageGenerationResult> {
        let payload = build_request_payload(&request.prompt, self.size);
        let url = self.http.model_url(&self.model, "predict");

        log::info!("Generating image with model: {}", self.model);
        let _timer = Timer::new("gemini image generation");
        let body = self
            .http
            .post_json(&url, &payload)
            .await
            .map_err(|e| ImaginError::attempted(&request.prompt, e))?;

        parse_predictions(body).map_err(|e| ImaginError::attempted(&request.prompt, e))
    }
}

impl ModelCatalog for GeminiImageClient {
    fn supported_models() -> Vec<ModelInfo> {
        vec![
            ModelInfo::new(
                "imagen-3.0-generate-002",
                "Imagen 3",
                "Google",
                ModelCategory::Image,
            ),
            ModelInfo::new(
                "imagen-3.0-fast-generate-001",
                "Imagen 3 Fast",
                "Google",
                ModelCategory::Image,
            ),
        ]
    }
}

/// Imagen only takes an aspect ratio, so the configured size is mapped to
/// the closest one it accepts.
fn aspect_ratio(size: ImageSize) -> &'static str {
    const RATIOS: [(&str, f64); 5] = [
        ("1:1", 1.0),
        ("3:4", 0.75),
        ("4:3", 4.0 / 3.0),
        ("9:16", 9.0 / 16.0),
        ("16:9", 16.0 / 9.0),
    ];

    if size.width == 0 || size.height == 0 {
        return "1:1";
    }
    let wanted = size.width as f64 / size.height as f64;
    RATIOS
        .iter()
        .min_by(|a, b| {
            (a.1 - wanted)
                .abs()
                .partial_cmp(&(b.1 - wanted).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(ratio, _)| *ratio)
        .unwrap_or("1:1")
}

fn build_request_payload(prompt: &str, size: ImageSize) -> Value {
    json!({
        "instances": [{ "prompt": prompt }],
        "parameters": {
            "sampleCount": 1,
            "aspectRatio": aspect_ratio(size),
            "includeRaiReason": true
        }
    })
}

fn parse_predictions(body: Value) -> Result<ImageGenerationResult> {
    let response: PredictResponse =
        serde_json::from_value(body).map_err(|e| ImaginError::ResponseError(e.to_string()))?;

    let mut filtered_reason = None;
    for prediction in response.predictions {
        match prediction.bytes_base64_encoded.filter(|b| !b.is_empty()) {
            Some(bytes) => {
                let mime = prediction.mime_type.as_deref().unwrap_or(DEFAULT_MIME);
                return Ok(ImageGenerationResult::with_url(data_uri(mime, &bytes)));
            }
            None => {
                if prediction.rai_filtered_reason.is_some() {
                    filtered_reason = prediction.rai_filtered_reason;
                }
            }
        }
    }

    match filtered_reason {
        Some(reason) => Err(ImaginError::ContentBlocked(reason)),
        None => Ok(ImageGenerationResult::empty()),
    }
}
