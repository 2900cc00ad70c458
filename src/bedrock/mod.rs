pub mod image_client;
pub mod text_client;

use crate::{
    config::{BedrockConfig, ImageSize},
    error::ImaginError,
    policy::ImprovementPolicy,
};
use aws_sdk_bedrockruntime::{
    config::{Credentials, Region},
    error::{ProvideErrorMetadata, SdkError},
    operation::invoke_model::InvokeModelError,
    Client,
};
use std::sync::Arc;

pub use image_client::ImageClient;
pub use text_client::TextClient;

pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Clone)]
pub struct BedrockClient {
    text_client: TextClient,
    image_client: ImageClient,
}

impl BedrockClient {
    pub async fn new(
        bedrock_config: BedrockConfig,
        policy: Arc<ImprovementPolicy>,
        image_size: ImageSize,
    ) -> Self {
        let region = bedrock_config
            .region
            .clone()
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.clone()));
        let aws_config = if let (Some(access_key), Some(secret_key)) =
            (&bedrock_config.access_key, &bedrock_config.secret_key)
        {
            loader
                .credentials_provider(Credentials::new(
                    access_key,
                    secret_key,
                    None,
                    None,
                    "imaginai",
                ))
                .load()
                .await
        } else {
            log::debug!("No static AWS credentials configured, using the default chain");
            loader.load().await
        };

        log::info!("Bedrock client ready in region {}", region);
        let client = Client::new(&aws_config);

        Self {
            text_client: TextClient::new(client.clone(), &bedrock_config, policy),
            image_client: ImageClient::new(client, &bedrock_config, image_size),
        }
    }

    pub fn text(&self) -> &TextClient {
        &self.text_client
    }

    pub fn image(&self) -> &ImageClient {
        &self.image_client
    }
}

pub(crate) fn map_invoke_error(e: SdkError<InvokeModelError>) -> ImaginError {
    log::error!("Bedrock invoke_model error details: {:?}", e);

    if let Some(service_error) = e.as_service_error() {
        ImaginError::AwsServiceError(format!(
            "{} - {}",
            service_error.code().unwrap_or("unknown"),
            service_error.message().unwrap_or("no message")
        ))
    } else {
        ImaginError::AwsError(e.to_string())
    }
}

pub(crate) fn parse_body(bytes: Vec<u8>) -> Result<serde_json::Value, ImaginError> {
    let body = String::from_utf8(bytes).map_err(|e| ImaginError::ResponseError(e.to_string()))?;
    serde_json::from_str(&body).map_err(|e| ImaginError::ResponseError(e.to_string()))
}
