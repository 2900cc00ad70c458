//! Headless version of the single-page UI: one prompt box, a Generate
//! button, Regenerate and Download. The orchestrator outcome is the only
//! thing that moves the state forward.

use crate::{
    download,
    error::{ImaginError, Result},
    models::GenerationOutcome,
    orchestrator::Orchestrator,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Submitting,
    Success {
        image_url: String,
        improved_prompt: Option<String>,
    },
    Failed {
        error: String,
        improved_prompt: Option<String>,
    },
}

impl SessionState {
    pub fn is_busy(&self) -> bool {
        matches!(self, SessionState::Submitting)
    }

    pub fn improved_prompt(&self) -> Option<&str> {
        match self {
            SessionState::Success {
                improved_prompt, ..
            }
            | SessionState::Failed {
                improved_prompt, ..
            } => improved_prompt.as_deref(),
            _ => None,
        }
    }

    fn from_outcome(outcome: &GenerationOutcome) -> Self {
        let improved_prompt = outcome
            .improved_prompt
            .clone()
            .filter(|prompt| !prompt.is_empty());

        if let Some(error) = &outcome.error {
            return SessionState::Failed {
                error: error.clone(),
                improved_prompt,
            };
        }

        match &outcome.image_url {
            Some(image_url) => SessionState::Success {
                image_url: image_url.clone(),
                improved_prompt,
            },
            None => SessionState::Idle,
        }
    }
}

pub struct GenerationSession {
    orchestrator: Arc<Orchestrator>,
    state: SessionState,
    original_prompt: Option<String>,
}

impl GenerationSession {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            orchestrator,
            state: SessionState::Idle,
            original_prompt: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Prompt of the last submission, exactly as it was typed.
    pub fn original_prompt(&self) -> Option<&str> {
        self.original_prompt.as_deref()
    }

    pub async fn submit(&mut self, prompt: &str) -> Result<GenerationOutcome> {
        if prompt.trim().is_empty() {
            return Err(ImaginError::SessionError("Prompt cannot be empty.".into()));
        }
        self.ensure_idle()?;

        self.original_prompt = Some(prompt.to_string());
        self.run(prompt.to_string()).await
    }

    /// Starts a fresh generation from the last submitted prompt. The previous
    /// improved prompt is not reused.
    pub async fn regenerate(&mut self) -> Result<GenerationOutcome> {
        self.ensure_idle()?;
        let prompt = self
            .original_prompt
            .clone()
            .ok_or_else(|| ImaginError::SessionError("Nothing to regenerate yet".into()))?;

        log::info!("🔄 Regenerating from the original prompt");
        self.run(prompt).await
    }

    /// The improved prompt, when it actually differs from what was typed and
    /// the last run succeeded.
    pub fn prompt_enhancement(&self) -> Option<&str> {
        match (&self.state, self.original_prompt.as_deref()) {
            (
                SessionState::Success {
                    improved_prompt: Some(improved),
                    ..
                },
                Some(original),
            ) if improved != original => Some(improved.as_str()),
            _ => None,
        }
    }

    pub async fn download(&self, dir: &Path) -> Result<PathBuf> {
        let image_url = match &self.state {
            SessionState::Success { image_url, .. } => image_url,
            _ => {
                return Err(ImaginError::SessionError(
                    "No generated image to download".into(),
                ))
            }
        };
        let original_prompt = self
            .original_prompt
            .as_deref()
            .ok_or_else(|| ImaginError::SessionError("No prompt recorded".into()))?;

        download::save_image(image_url, original_prompt, dir).await
    }

    /// Clears a submission whose future was dropped before it finished.
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.state.is_busy() {
            return Err(ImaginError::SessionError(
                "A generation is already in progress".into(),
            ));
        }
        Ok(())
    }

    async fn run(&mut self, prompt: String) -> Result<GenerationOutcome> {
        self.state = SessionState::Submitting;
        let outcome = self.orchestrator.handle_generate(&prompt).await;
        self.state = SessionState::from_outcome(&outcome);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_outcome_maps_to_failed() {
        let outcome = GenerationOutcome::improvement_blocked("a storm", "a storm");
        let state = SessionState::from_outcome(&outcome);
        assert!(matches!(state, SessionState::Failed { .. }));
        assert_eq!(state.improved_prompt(), Some("a storm"));
    }

    #[test]
    fn image_outcome_maps_to_success() {
        let outcome = GenerationOutcome::success("data:image/png;base64,QQ==", "b", "a");
        assert_eq!(
            SessionState::from_outcome(&outcome),
            SessionState::Success {
                image_url: "data:image/png;base64,QQ==".into(),
                improved_prompt: Some("b".into()),
            }
        );
    }

    #[test]
    fn submitting_is_busy() {
        assert!(SessionState::Submitting.is_busy());
        assert!(!SessionState::Idle.is_busy());
    }
}
