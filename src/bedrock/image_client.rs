use crate::{
    bedrock::{map_invoke_error, parse_body},
    config::{BedrockConfig, ImageSize},
    error::{ImaginError, Result},
    logger::Timer,
    models::{
        data_uri, ImageGenerationRequest, ImageGenerationResult, ModelCategory, ModelInfo,
        StabilityImageResponse, TitanImageResponse,
    },
    services::{ImageGenerator, ModelCatalog},
};
use async_trait::async_trait;
use aws_sdk_bedrockruntime::{primitives::Blob, Client};
use serde_json::{json, Value};

pub const DEFAULT_IMAGE_MODEL: &str = "amazon.titan-image-generator-v1";

const PNG_MIME: &str = "image/png";

#[derive(Clone)]
pub struct ImageClient {
    client: Client,
    model_id: String,
    size: ImageSize,
}

impl ImageClient {
    pub fn new(client: Client, config: &BedrockConfig, size: ImageSize) -> Self {
        Self {
            client,
            model_id: config
                .image_model_id
                .clone()
                .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            size,
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn invoke(&self, payload: &Value) -> Result<Value> {
        let request_json = serde_json::to_string(payload)
            .map_err(|e| ImaginError::SerializationError(e.to_string()))?;

        log::info!("Generating image with model: {}", self.model_id);

        let response = self
            .client
            .invoke_model()
            .model_id(&self.model_id)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(request_json.into_bytes()))
            .send()
            .await
            .map_err(map_invoke_error)?;

        parse_body(response.body.into_inner())
    }
}

#[async_trait]
impl ImageGenerator for ImageClient {
    async fn generate_image(
        &self,
        request: ImageGenerationRequest,
    ) -> Result<ImageGenerationResult> {
        let payload = build_request_payload(&request.prompt, &self.model_id, self.size)
            .map_err(|e| ImaginError::attempted(&request.prompt, e))?;

        let _timer = Timer::new("bedrock image generation");
        let body = self
            .invoke(&payload)
            .await
            .map_err(|e| ImaginError::attempted(&request.prompt, e))?;

        parse_image_response(body, &self.model_id)
            .map_err(|e| ImaginError::attempted(&request.prompt, e))
    }
}

impl ModelCatalog for ImageClient {
    fn supported_models() -> Vec<ModelInfo> {
        vec![
            ModelInfo::new(
                "amazon.titan-image-generator-v1",
                "Titan Image Generator G1",
                "Amazon",
                ModelCategory::Image,
            ),
            ModelInfo::new(
                "amazon.titan-image-generator-v2:0",
                "Titan Image Generator G1 v2",
                "Amazon",
                ModelCategory::Image,
            ),
            ModelInfo::new(
                "stability.stable-diffusion-xl-v1",
                "SDXL 1.0",
                "Stability AI",
                ModelCategory::Image,
            ),
        ]
    }
}

fn build_request_payload(prompt: &str, model_id: &str, size: ImageSize) -> Result<Value> {
    let payload = match model_id {
        id if id.starts_with("amazon.titan-image-generator") => json!({
            "taskType": "TEXT_IMAGE",
            "textToImageParams": {
                "text": prompt
            },
            "imageGenerationConfig": {
                "numberOfImages": 1,
                "width": size.width,
                "height": size.height,
                "quality": "standard",
                "cfgScale": 8.0
            }
        }),
        id if id.starts_with("stability.stable-diffusion-xl") => json!({
            "text_prompts": [{ "text": prompt }],
            "width": size.width,
            "height": size.height,
            "samples": 1,
            "cfg_scale": 7,
            "steps": 30
        }),
        _ => {
            return Err(ImaginError::RequestError(format!(
                "Unsupported image model: {}",
                model_id
            )))
        }
    };

    Ok(payload)
}

fn parse_image_response(body: Value, model_id: &str) -> Result<ImageGenerationResult> {
    if model_id.starts_with("stability.") {
        let response: StabilityImageResponse = serde_json::from_value(body)
            .map_err(|e| ImaginError::ResponseError(e.to_string()))?;
        return match response.artifacts.into_iter().next() {
            Some(artifact) if artifact.finish_reason.as_deref() == Some("CONTENT_FILTERED") => Err(
                ImaginError::ContentBlocked("image was filtered by the model".into()),
            ),
            Some(artifact) => Ok(artifact
                .base64
                .filter(|b| !b.is_empty())
                .map(|b| ImageGenerationResult::with_url(data_uri(PNG_MIME, &b)))
                .unwrap_or_default()),
            None => Ok(ImageGenerationResult::empty()),
        };
    }

    let response: TitanImageResponse =
        serde_json::from_value(body).map_err(|e| ImaginError::ResponseError(e.to_string()))?;
    if let Some(error) = response.error.filter(|e| !e.is_empty()) {
        return Err(ImaginError::ResponseError(error));
    }

    Ok(response
        .images
        .into_iter()
        .find(|image| !image.is_empty())
        .map(|image| ImageGenerationResult::with_url(data_uri(PNG_MIME, &image)))
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titan_payload_carries_size() {
        let payload = build_request_payload(
            "a red barn",
            DEFAULT_IMAGE_MODEL,
            ImageSize {
                width: 512,
                height: 768,
            },
        )
        .unwrap();
        assert_eq!(payload["textToImageParams"]["text"], "a red barn");
        assert_eq!(payload["imageGenerationConfig"]["width"], 512);
        assert_eq!(payload["imageGenerationConfig"]["height"], 768);
    }

    #[test]
    fn unsupported_image_model() {
        assert!(build_request_payload("p", "acme.paint", ImageSize::default()).is_err());
    }

    #[test]
    fn titan_image_becomes_data_uri() {
        let result =
            parse_image_response(json!({ "images": ["iVBORw0K"] }), DEFAULT_IMAGE_MODEL).unwrap();
        assert_eq!(
            result.image_url.as_deref(),
            Some("data:image/png;base64,iVBORw0K")
        );
    }

    #[test]
    fn titan_without_images_is_empty() {
        let result = parse_image_response(json!({ "images": [] }), DEFAULT_IMAGE_MODEL).unwrap();
        assert_eq!(result, ImageGenerationResult::empty());
    }

    #[test]
    fn stability_filtered_is_blocked() {
        let body = json!({ "artifacts": [{ "base64": "", "finishReason": "CONTENT_FILTERED" }] });
        let err = parse_image_response(body, "stability.stable-diffusion-xl-v1").unwrap_err();
        assert!(err.is_content_blocked());
    }
}
