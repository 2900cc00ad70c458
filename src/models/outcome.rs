use serde::Serialize;

pub const EMPTY_PROMPT_MESSAGE: &str = "Prompt cannot be empty.";
pub const IMPROVEMENT_BLOCKED_MESSAGE: &str =
    "Prompt was blocked or could not be improved. Please try a different prompt.";
pub const NO_IMAGE_MESSAGE: &str = "Failed to generate image. No image URL received.";
pub const CONTENT_FILTER_MESSAGE: &str =
    "Your prompt was blocked by the content filter. Please revise your prompt.";
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred during image generation.";

/// Which branch of the orchestration produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    EmptyPrompt,
    ImprovementBlocked,
    ImprovementTransportFailure,
    GenerationTransportFailure,
    GenerationEmptyResult,
    Success,
}

/// The record handed back to whoever asked for an image. Either `image_url`
/// or `error` is meaningful; the prompts ride along for display and audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub improved_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub kind: OutcomeKind,
}

impl GenerationOutcome {
    pub fn empty_prompt(original_prompt: impl Into<String>) -> Self {
        Self {
            image_url: None,
            improved_prompt: None,
            original_prompt: Some(original_prompt.into()),
            error: Some(EMPTY_PROMPT_MESSAGE.to_string()),
            kind: OutcomeKind::EmptyPrompt,
        }
    }

    /// The original prompt is echoed as `improved_prompt` so there is always
    /// something to show.
    pub fn improvement_blocked(audit_prompt: impl Into<String>, original_prompt: &str) -> Self {
        Self {
            image_url: None,
            improved_prompt: Some(original_prompt.to_string()),
            original_prompt: Some(audit_prompt.into()),
            error: Some(IMPROVEMENT_BLOCKED_MESSAGE.to_string()),
            kind: OutcomeKind::ImprovementBlocked,
        }
    }

    pub fn improvement_failed(error: impl Into<String>, original_prompt: impl Into<String>) -> Self {
        Self {
            image_url: None,
            improved_prompt: None,
            original_prompt: Some(original_prompt.into()),
            error: Some(error.into()),
            kind: OutcomeKind::ImprovementTransportFailure,
        }
    }

    pub fn generation_failed(
        error: impl Into<String>,
        improved_prompt: impl Into<String>,
        original_prompt: impl Into<String>,
    ) -> Self {
        Self {
            image_url: None,
            improved_prompt: Some(improved_prompt.into()),
            original_prompt: Some(original_prompt.into()),
            error: Some(error.into()),
            kind: OutcomeKind::GenerationTransportFailure,
        }
    }

    pub fn no_image(improved_prompt: impl Into<String>, audit_prompt: impl Into<String>) -> Self {
        Self {
            image_url: None,
            improved_prompt: Some(improved_prompt.into()),
            original_prompt: Some(audit_prompt.into()),
            error: Some(NO_IMAGE_MESSAGE.to_string()),
            kind: OutcomeKind::GenerationEmptyResult,
        }
    }

    pub fn success(
        image_url: impl Into<String>,
        improved_prompt: impl Into<String>,
        audit_prompt: impl Into<String>,
    ) -> Self {
        Self {
            image_url: Some(image_url.into()),
            improved_prompt: Some(improved_prompt.into()),
            original_prompt: Some(audit_prompt.into()),
            error: None,
            kind: OutcomeKind::Success,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.image_url.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_serializes_camel_case_without_error() {
        let outcome = GenerationOutcome::success("https://example.com/img.png", "improved", "orig");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["imageUrl"], "https://example.com/img.png");
        assert_eq!(json["improvedPrompt"], "improved");
        assert_eq!(json["originalPrompt"], "orig");
        assert!(json.get("error").is_none());
        assert!(json.get("kind").is_none());
        assert!(outcome.is_success());
    }

    #[test]
    fn empty_prompt_carries_only_error_and_original() {
        let json = serde_json::to_value(GenerationOutcome::empty_prompt("")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "originalPrompt": "", "error": EMPTY_PROMPT_MESSAGE })
        );
    }

    #[test]
    fn blocked_echoes_original_as_improved() {
        let outcome = GenerationOutcome::improvement_blocked("a forest", "a forest");
        assert_eq!(outcome.improved_prompt.as_deref(), Some("a forest"));
        assert_eq!(outcome.kind, OutcomeKind::ImprovementBlocked);
        assert!(!outcome.is_success());
    }
}
