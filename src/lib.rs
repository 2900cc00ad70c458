//! ImaginAI: rewrite a prompt so it stays clear of content filters, then turn
//! it into an image.
//!
//! ```no_run
//! use imaginai::{build_orchestrator, AppConfig, ImprovementPolicy};
//! use std::sync::Arc;
//!
//! # async fn run() -> imaginai::Result<()> {
//! let config = AppConfig::from_env()?;
//! let orchestrator = build_orchestrator(&config, Arc::new(ImprovementPolicy::default())).await?;
//! let outcome = orchestrator.handle_generate("a lighthouse in a storm").await;
//! println!("{:?}", outcome.image_url);
//! # Ok(())
//! # }
//! ```

pub mod bedrock;
pub mod config;
pub mod download;
pub mod error;
pub mod gemini;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod policy;
#[cfg(feature = "server")]
pub mod server;
pub mod services;
pub mod session;

pub use bedrock::BedrockClient;
pub use config::{AppConfig, Backend, BedrockConfig, GeminiConfig, ImageSize};
pub use error::{ImaginError, Result};
pub use gemini::GeminiClient;
pub use models::*;
pub use orchestrator::{classify_failure, Orchestrator};
pub use policy::{HarmCategory, HarmThreshold, ImprovementPolicy, SafetySetting};
pub use services::{ImageGenerator, ModelCatalog, PromptImprover};
pub use session::{GenerationSession, SessionState};

use std::sync::Arc;

/// Wires the configured backend's improver and generator into an orchestrator.
pub async fn build_orchestrator(
    config: &AppConfig,
    policy: Arc<ImprovementPolicy>,
) -> Result<Orchestrator> {
    match config.backend {
        Backend::Bedrock => {
            let client = BedrockClient::new(config.bedrock.clone(), policy, config.image_size).await;
            Ok(Orchestrator::new(
                Arc::new(client.text().clone()),
                Arc::new(client.image().clone()),
            ))
        }
        Backend::Gemini => {
            let client = GeminiClient::new(&config.gemini, policy, config.image_size)?;
            Ok(Orchestrator::new(
                Arc::new(client.text().clone()),
                Arc::new(client.image().clone()),
            ))
        }
    }
}

/// Models the given backend can drive, text models first.
pub fn supported_models(backend: Backend) -> Vec<ModelInfo> {
    match backend {
        Backend::Bedrock => {
            let mut models = bedrock::TextClient::supported_models();
            models.extend(bedrock::ImageClient::supported_models());
            models
        }
        Backend::Gemini => {
            let mut models = gemini::GeminiTextClient::supported_models();
            models.extend(gemini::GeminiImageClient::supported_models());
            models
        }
    }
}
