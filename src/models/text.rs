use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptImprovementRequest {
    pub prompt: String,
}

impl PromptImprovementRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

/// `improved_prompt` is empty when the remote model refused or produced
/// nothing usable. `original_prompt` always echoes the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptImprovementResult {
    pub improved_prompt: String,
    pub original_prompt: String,
}

impl PromptImprovementResult {
    pub fn improved(request: &PromptImprovementRequest, improved_prompt: impl Into<String>) -> Self {
        Self {
            improved_prompt: improved_prompt.into(),
            original_prompt: request.prompt.clone(),
        }
    }

    pub fn blocked(request: &PromptImprovementRequest) -> Self {
        Self::improved(request, String::new())
    }

    pub fn is_blocked(&self) -> bool {
        self.improved_prompt.is_empty()
    }
}

/// Structured reply the improver asks the text model for.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovedPromptPayload {
    #[serde(default)]
    pub improved_prompt: Option<String>,
}

/// Pulls the improved prompt out of raw model text. Accepts either the JSON
/// payload above (optionally fenced in ```json) or plain text.
pub fn extract_improved_prompt(raw: &str) -> String {
    let trimmed = raw.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed);

    if unfenced.starts_with('{') {
        if let Ok(payload) = serde_json::from_str::<ImprovedPromptPayload>(unfenced) {
            return payload
                .improved_prompt
                .map(|p| p.trim().to_string())
                .unwrap_or_default();
        }
    }

    unfenced.trim_matches('"').trim().to_string()
}

#[derive(Serialize, Deserialize)]
pub struct TitanTextResult {
    #[serde(rename = "outputText")]
    pub output_text: String,
    #[serde(rename = "completionReason")]
    pub completion_reason: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct TitanTextResponse {
    pub results: Vec<TitanTextResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_from_json_payload() {
        let raw = r#"{"improvedPrompt": " a calm lake at dawn ", "originalPrompt": "lake"}"#;
        assert_eq!(extract_improved_prompt(raw), "a calm lake at dawn");
    }

    #[test]
    fn extracts_from_fenced_json() {
        let raw = "```json\n{\"improvedPrompt\": \"a lighthouse\"}\n```";
        assert_eq!(extract_improved_prompt(raw), "a lighthouse");
    }

    #[test]
    fn json_without_field_is_blocked() {
        assert_eq!(extract_improved_prompt(r#"{"originalPrompt": "x"}"#), "");
    }

    #[test]
    fn plain_text_is_trimmed() {
        assert_eq!(extract_improved_prompt("  \"a misty valley\"\n"), "a misty valley");
    }

    #[test]
    fn blocked_result_keeps_original() {
        let request = PromptImprovementRequest::new("a storm");
        let result = PromptImprovementResult::blocked(&request);
        assert!(result.is_blocked());
        assert_eq!(result.original_prompt, "a storm");
    }
}
