use crate::{
    config::GeminiConfig,
    error::{ImaginError, Result},
    gemini::GeminiHttp,
    logger::Timer,
    models::{
        extract_improved_prompt, ModelCategory, ModelInfo, PromptImprovementRequest,
        PromptImprovementResult,
    },
    policy::ImprovementPolicy,
    services::{ModelCatalog, PromptImprover},
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Gemini prompt improver. The policy's safety thresholds are sent inline
/// with every request.
#[derive(Clone)]
pub struct GeminiTextClient {
    http: GeminiHttp,
    model: String,
    policy: Arc<ImprovementPolicy>,
}

impl GeminiTextClient {
    pub fn new(http: GeminiHttp, config: &GeminiConfig, policy: Arc<ImprovementPolicy>) -> Self {
        Self {
            http,
            model: config
                .text_model
                .clone()
                .unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
            policy,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl PromptImprover for GeminiTextClient {
    async fn improve_prompt(
        &self,
        request: PromptImprovementRequest,
    ) -> Result<PromptImprovementResult> {
        let payload = build_request_payload(&self.policy, &request.prompt)?;
        let url = self.http.model_url(&self.model, "generateContent");

        log::info!("Invoking text model: {}", self.model);
        let timer = Timer::new("gemini prompt improvement");
        let body = self.http.post_json(&url, &payload).await?;
        drop(timer);

        match parse_candidate_text(body)? {
            Some(text) => Ok(PromptImprovementResult::improved(
                &request,
                extract_improved_prompt(&text),
            )),
            None => {
                log::warn!("Gemini returned no usable candidate for the prompt");
                Ok(PromptImprovementResult::blocked(&request))
            }
        }
    }
}

impl ModelCatalog for GeminiTextClient {
    fn supported_models() -> Vec<ModelInfo> {
        vec![
            ModelInfo::new("gemini-2.0-flash", "Gemini 2.0 Flash", "Google", ModelCategory::Text),
            ModelInfo::new(
                "gemini-1.5-flash",
                "Gemini 1.5 Flash",
                "Google",
                ModelCategory::Text,
            ),
            ModelInfo::new("gemini-1.5-pro", "Gemini 1.5 Pro", "Google", ModelCategory::Text),
        ]
    }
}

fn build_request_payload(policy: &ImprovementPolicy, prompt: &str) -> Result<Value> {
    let safety_settings = serde_json::to_value(policy.safety_settings())
        .map_err(|e| ImaginError::SerializationError(e.to_string()))?;

    Ok(json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": policy.render(prompt) }]
        }],
        "safetySettings": safety_settings,
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "improvedPrompt": {
                        "type": "STRING",
                        "description": "The improved prompt, free of sensitive content."
                    },
                    "originalPrompt": {
                        "type": "STRING",
                        "description": "The original prompt for auditing purposes"
                    }
                },
                "required": ["improvedPrompt"]
            }
        }
    }))
}

/// `None` when the prompt or every candidate was blocked, or nothing came back.
fn parse_candidate_text(body: Value) -> Result<Option<String>> {
    let response: GenerateContentResponse =
        serde_json::from_value(body).map_err(|e| ImaginError::ResponseError(e.to_string()))?;

    if let Some(reason) = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        log::warn!("Gemini blocked the prompt: {}", reason);
        return Ok(None);
    }

    let candidate = match response.candidates.into_iter().next() {
        Some(candidate) => candidate,
        None => return Ok(None),
    };

    if candidate.finish_reason.as_deref() == Some("SAFETY") {
        return Ok(None);
    }

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    Ok(Some(text).filter(|t| !t.trim().is_empty()))
}
