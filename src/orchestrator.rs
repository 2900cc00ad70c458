//! Two-step generation: improve the prompt, then render it.
//!
//! Every failure is folded into a [`GenerationOutcome`]; nothing escapes as an
//! `Err`. Each call to [`Orchestrator::handle_generate`] is independent and
//! keeps no state between invocations.

use crate::{
    error::ImaginError,
    logger::Timer,
    models::{
        GenerationOutcome, ImageGenerationRequest, PromptImprovementRequest,
        CONTENT_FILTER_MESSAGE, UNEXPECTED_ERROR_MESSAGE,
    },
    services::{ImageGenerator, PromptImprover},
};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct Orchestrator {
    improver: Arc<dyn PromptImprover>,
    generator: Arc<dyn ImageGenerator>,
}

impl Orchestrator {
    pub fn new(improver: Arc<dyn PromptImprover>, generator: Arc<dyn ImageGenerator>) -> Self {
        Self {
            improver,
            generator,
        }
    }

    pub async fn handle_generate(&self, raw_prompt: &str) -> GenerationOutcome {
        let request_id = Uuid::new_v4();
        let original_prompt = raw_prompt.trim().to_string();

        if original_prompt.is_empty() {
            log::warn!("[req:{}] Rejected empty prompt", request_id);
            return GenerationOutcome::empty_prompt(original_prompt);
        }

        log::debug!("[req:{}] Improving prompt", request_id);
        let improvement = {
            let _timer = Timer::new("prompt improvement");
            self.improver
                .improve_prompt(PromptImprovementRequest::new(original_prompt.clone()))
                .await
        };

        let improvement = match improvement {
            Ok(result) => result,
            Err(e) => {
                log::error!("[req:{}] Prompt improvement failed: {}", request_id, e);
                return GenerationOutcome::improvement_failed(classify_failure(&e), original_prompt);
            }
        };

        let improved_prompt = improvement.improved_prompt;
        let audit_prompt = improvement.original_prompt;

        if improved_prompt.is_empty() {
            log::warn!(
                "[req:{}] Prompt was blocked or could not be improved",
                request_id
            );
            return GenerationOutcome::improvement_blocked(audit_prompt, &original_prompt);
        }

        log::debug!(
            "[req:{}] Improved prompt ready, generating image",
            request_id
        );
        let generation = {
            let _timer = Timer::new("image generation");
            self.generator
                .generate_image(ImageGenerationRequest::new(improved_prompt.clone()))
                .await
        };

        let generation = match generation {
            Ok(result) => result,
            Err(e) => {
                log::error!("[req:{}] Image generation failed: {}", request_id, e);
                let attempted = e.improved_prompt().unwrap_or(&original_prompt).to_string();
                return GenerationOutcome::generation_failed(
                    classify_failure(&e),
                    attempted,
                    original_prompt,
                );
            }
        };

        match generation.image_url {
            Some(image_url) if !image_url.is_empty() => {
                log::info!("[req:{}] Image generated", request_id);
                GenerationOutcome::success(image_url, improved_prompt, audit_prompt)
            }
            _ => {
                log::warn!("[req:{}] Image model returned no image", request_id);
                GenerationOutcome::no_image(improved_prompt, audit_prompt)
            }
        }
    }
}

/// Maps a remote failure to the message shown to the user.
///
/// A structured `ContentBlocked` wins. Otherwise the message text is sniffed
/// for "blocked" or "sensitive", which is the only signal some remote errors
/// carry. A remote error with a blank message gets the generic text.
pub fn classify_failure(error: &ImaginError) -> String {
    if error.is_content_blocked() {
        return CONTENT_FILTER_MESSAGE.to_string();
    }

    if error.message().trim().is_empty() {
        return UNEXPECTED_ERROR_MESSAGE.to_string();
    }

    let message = error.to_string();
    let lowered = message.to_lowercase();
    if lowered.contains("blocked") || lowered.contains("sensitive") {
        return CONTENT_FILTER_MESSAGE.to_string();
    }

    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ImageGenerationResult, OutcomeKind, PromptImprovementResult, IMPROVEMENT_BLOCKED_MESSAGE,
    };
    use crate::services::{MockImageGenerator, MockPromptImprover};

    fn orchestrator(improver: MockPromptImprover, generator: MockImageGenerator) -> Orchestrator {
        Orchestrator::new(Arc::new(improver), Arc::new(generator))
    }

    #[tokio::test]
    async fn blank_prompt_makes_no_remote_calls() {
        let mut improver = MockPromptImprover::new();
        improver.expect_improve_prompt().never();
        let mut generator = MockImageGenerator::new();
        generator.expect_generate_image().never();

        let outcome = orchestrator(improver, generator)
            .handle_generate(" \t\n ")
            .await;
        assert_eq!(outcome, GenerationOutcome::empty_prompt(""));
    }

    #[tokio::test]
    async fn improver_receives_trimmed_prompt() {
        let mut improver = MockPromptImprover::new();
        improver
            .expect_improve_prompt()
            .withf(|request| request.prompt == "a lighthouse")
            .times(1)
            .returning(|request| Ok(PromptImprovementResult::improved(&request, "a lighthouse, oil")));
        let mut generator = MockImageGenerator::new();
        generator
            .expect_generate_image()
            .withf(|request| request.prompt == "a lighthouse, oil")
            .times(1)
            .returning(|_| Ok(ImageGenerationResult::with_url("https://example.com/l.png")));

        let outcome = orchestrator(improver, generator)
            .handle_generate("  a lighthouse  ")
            .await;
        assert_eq!(outcome.kind, OutcomeKind::Success);
        assert_eq!(outcome.original_prompt.as_deref(), Some("a lighthouse"));
    }

    #[tokio::test]
    async fn blocked_improvement_skips_generation() {
        let mut improver = MockPromptImprover::new();
        improver
            .expect_improve_prompt()
            .times(1)
            .returning(|request| Ok(PromptImprovementResult::blocked(&request)));
        let mut generator = MockImageGenerator::new();
        generator.expect_generate_image().never();

        let outcome = orchestrator(improver, generator)
            .handle_generate("a peaceful forest")
            .await;
        assert_eq!(outcome.error.as_deref(), Some(IMPROVEMENT_BLOCKED_MESSAGE));
        assert_eq!(outcome.improved_prompt.as_deref(), Some("a peaceful forest"));
        assert_eq!(outcome.original_prompt.as_deref(), Some("a peaceful forest"));
    }

    #[tokio::test]
    async fn improvement_transport_failure_carries_only_original() {
        let mut improver = MockPromptImprover::new();
        improver
            .expect_improve_prompt()
            .returning(|_| Err(ImaginError::AwsError("connection reset".into())));
        let mut generator = MockImageGenerator::new();
        generator.expect_generate_image().never();

        let outcome = orchestrator(improver, generator)
            .handle_generate("a harbor")
            .await;
        assert_eq!(outcome.kind, OutcomeKind::ImprovementTransportFailure);
        assert_eq!(outcome.error.as_deref(), Some("AWS error: connection reset"));
        assert_eq!(outcome.improved_prompt, None);
        assert_eq!(outcome.original_prompt.as_deref(), Some("a harbor"));
    }

    #[tokio::test]
    async fn generation_failure_uses_prompt_attached_to_error() {
        let mut improver = MockPromptImprover::new();
        improver
            .expect_improve_prompt()
            .returning(|request| Ok(PromptImprovementResult::improved(&request, "a harbor at dusk")));
        let mut generator = MockImageGenerator::new();
        generator.expect_generate_image().returning(|request| {
            Err(ImaginError::attempted(
                request.prompt,
                ImaginError::ResponseError("quota exceeded".into()),
            ))
        });

        let outcome = orchestrator(improver, generator)
            .handle_generate("a harbor")
            .await;
        assert_eq!(outcome.kind, OutcomeKind::GenerationTransportFailure);
        assert_eq!(outcome.error.as_deref(), Some("Response error: quota exceeded"));
        assert_eq!(outcome.improved_prompt.as_deref(), Some("a harbor at dusk"));
        assert_eq!(outcome.original_prompt.as_deref(), Some("a harbor"));
    }

    #[tokio::test]
    async fn generation_failure_without_prompt_falls_back_to_original() {
        let mut improver = MockPromptImprover::new();
        improver
            .expect_improve_prompt()
            .returning(|request| Ok(PromptImprovementResult::improved(&request, "a harbor at dusk")));
        let mut generator = MockImageGenerator::new();
        generator
            .expect_generate_image()
            .returning(|_| Err(ImaginError::RequestError("timeout".into())));

        let outcome = orchestrator(improver, generator)
            .handle_generate("a harbor")
            .await;
        assert_eq!(outcome.improved_prompt.as_deref(), Some("a harbor"));
    }

    #[test]
    fn classify_structured_block() {
        let err = ImaginError::ContentBlocked("RAI".into());
        assert_eq!(classify_failure(&err), CONTENT_FILTER_MESSAGE);
    }

    #[test]
    fn classify_sniffs_message_case_insensitively() {
        let err = ImaginError::ResponseError("Sensitive content BLOCKED".into());
        assert_eq!(classify_failure(&err), CONTENT_FILTER_MESSAGE);
        let err = ImaginError::AwsServiceError("ValidationException - request was Blocked".into());
        assert_eq!(classify_failure(&err), CONTENT_FILTER_MESSAGE);
    }

    #[test]
    fn classify_passes_other_messages_through() {
        let err = ImaginError::RequestError("rate limited".into());
        assert_eq!(classify_failure(&err), "Request error: rate limited");
    }

    #[test]
    fn classify_blank_remote_message_falls_back() {
        for err in [
            ImaginError::RequestError(String::new()),
            ImaginError::ResponseError("  ".into()),
            ImaginError::AwsError(String::new()),
            ImaginError::attempted("a cat", ImaginError::AwsServiceError(String::new())),
        ] {
            assert_eq!(classify_failure(&err), UNEXPECTED_ERROR_MESSAGE);
        }
    }
}
