//! The two remote capabilities the orchestrator depends on.
//!
//! `Err` is reserved for transport or remote failures. A refusal that the
//! remote side reports as a normal response comes back as a value: an empty
//! improved prompt, or an image result without a URL.

use crate::{
    error::Result,
    models::{
        ImageGenerationRequest, ImageGenerationResult, ModelInfo, PromptImprovementRequest,
        PromptImprovementResult,
    },
};
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PromptImprover: Send + Sync {
    async fn improve_prompt(
        &self,
        request: PromptImprovementRequest,
    ) -> Result<PromptImprovementResult>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(&self, request: ImageGenerationRequest)
        -> Result<ImageGenerationResult>;
}

/// Models a backend knows how to drive, for listing in the CLI.
pub trait ModelCatalog {
    fn supported_models() -> Vec<ModelInfo>;
}
