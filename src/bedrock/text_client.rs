use crate::{
    bedrock::{map_invoke_error, parse_body},
    config::BedrockConfig,
    error::{ImaginError, Result},
    logger::Timer,
    models::{
        extract_improved_prompt, ModelCategory, ModelInfo, PromptImprovementRequest,
        PromptImprovementResult, TitanTextResponse,
    },
    policy::ImprovementPolicy,
    services::{ModelCatalog, PromptImprover},
};
use async_trait::async_trait;
use aws_sdk_bedrockruntime::{primitives::Blob, Client};
use serde_json::{json, Value};
use std::sync::Arc;

pub const DEFAULT_TEXT_MODEL: &str = "anthropic.claude-3-haiku-20240307-v1:0";

const MAX_TOKENS: i32 = 512;
const TEMPERATURE: f32 = 0.7;
const GUARDRAIL_ACTION_KEY: &str = "amazon-bedrock-guardrailAction";

/// Rewrites prompts through a Bedrock text model. Safety thresholds cannot be
/// sent inline to Bedrock; when a guardrail is configured it is attached to
/// every call and an intervention yields an empty improved prompt.
#[derive(Clone)]
pub struct TextClient {
    client: Client,
    model_id: String,
    guardrail: Option<(String, String)>,
    policy: Arc<ImprovementPolicy>,
}

impl TextClient {
    pub fn new(client: Client, config: &BedrockConfig, policy: Arc<ImprovementPolicy>) -> Self {
        Self {
            client,
            model_id: config
                .text_model_id
                .clone()
                .unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
            guardrail: config
                .guardrail()
                .map(|(id, version)| (id.to_string(), version.to_string())),
            policy,
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn invoke(&self, payload: &Value) -> Result<Value> {
        let request_json = serde_json::to_string(payload)
            .map_err(|e| ImaginError::SerializationError(e.to_string()))?;

        log::info!("Invoking text model: {}", self.model_id);
        log::debug!("Prompt improvement payload: {}", request_json);

        let (guardrail_id, guardrail_version) = match &self.guardrail {
            Some((id, version)) => (Some(id.clone()), Some(version.clone())),
            None => (None, None),
        };

        let response = self
            .client
            .invoke_model()
            .model_id(&self.model_id)
            .content_type("application/json")
            .accept("application/json")
            .set_guardrail_identifier(guardrail_id)
            .set_guardrail_version(guardrail_version)
            .body(Blob::new(request_json.into_bytes()))
            .send()
            .await
            .map_err(map_invoke_error)?;

        parse_body(response.body.into_inner())
    }
}

#[async_trait]
impl PromptImprover for TextClient {
    async fn improve_prompt(
        &self,
        request: PromptImprovementRequest,
    ) -> Result<PromptImprovementResult> {
        let instruction = self.policy.render(&request.prompt);
        let payload = build_request_payload(&instruction, &self.model_id)?;

        let timer = Timer::new("bedrock prompt improvement");
        let body = self.invoke(&payload).await?;
        drop(timer);

        match parse_generated_text(&body, &self.model_id)? {
            Some(text) => {
                let improved = extract_improved_prompt(&text);
                if improved.is_empty() {
                    log::warn!("Model {} returned no usable prompt", self.model_id);
                }
                Ok(PromptImprovementResult::improved(&request, improved))
            }
            None => {
                log::warn!("Prompt improvement blocked by {}", self.model_id);
                Ok(PromptImprovementResult::blocked(&request))
            }
        }
    }
}

impl ModelCatalog for TextClient {
    fn supported_models() -> Vec<ModelInfo> {
        vec![
            ModelInfo::new(
                "anthropic.claude-3-haiku-20240307-v1:0",
                "Claude 3 Haiku",
                "Anthropic",
                ModelCategory::Text,
            ),
            ModelInfo::new(
                "anthropic.claude-3-5-sonnet-20240620-v1:0",
                "Claude 3.5 Sonnet",
                "Anthropic",
                ModelCategory::Text,
            ),
            ModelInfo::new(
                "amazon.titan-text-express-v1",
                "Titan Text Express",
                "Amazon",
                ModelCategory::Text,
            ),
            ModelInfo::new(
                "meta.llama3-8b-instruct-v1:0",
                "Llama 3 8B Instruct",
                "Meta",
                ModelCategory::Text,
            ),
            ModelInfo::new(
                "mistral.mistral-7b-instruct-v0:2",
                "Mistral 7B Instruct",
                "Mistral AI",
                ModelCategory::Text,
            ),
            ModelInfo::new(
                "cohere.command-text-v14",
                "Command",
                "Cohere",
                ModelCategory::Text,
            ),
            ModelInfo::new("ai21.j2-mid-v1", "Jurassic-2 Mid", "AI21 Labs", ModelCategory::Text),
        ]
    }
}

fn is_anthropic(model_id: &str) -> bool {
    model_id.starts_with("anthropic.claude") || model_id.starts_with("arn:aws:bedrock")
}

fn build_request_payload(prompt: &str, model_id: &str) -> Result<Value> {
    let payload = match model_id {
        id if id.starts_with("amazon.titan") => json!({
            "inputText": prompt,
            "textGenerationConfig": {
                "maxTokenCount": MAX_TOKENS,
                "temperature": TEMPERATURE,
                "topP": 0.9
            }
        }),
        id if is_anthropic(id) => json!({
            "messages": [
                {
                    "role": "user",
                    "content": prompt
                }
            ],
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
            "anthropic_version": "bedrock-2023-05-31"
        }),
        id if id.starts_with("meta.llama") => json!({
            "prompt": prompt,
            "max_gen_len": MAX_TOKENS,
            "temperature": TEMPERATURE,
            "top_p": 0.9
        }),
        id if id.starts_with("mistral.mistral") => json!({
            "prompt": prompt,
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
            "top_p": 0.9
        }),
        id if id.starts_with("cohere.command") => json!({
            "prompt": prompt,
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
            "p": 0.9
        }),
        id if id.starts_with("ai21.") => json!({
            "prompt": prompt,
            "maxTokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
            "topP": 0.9
        }),
        _ => {
            return Err(ImaginError::RequestError(format!(
                "Unsupported model ID: {}",
                model_id
            )))
        }
    };

    Ok(payload)
}

/// Returns `None` when the response represents a refusal: a guardrail
/// intervention, a Titan content filter, or no text at all.
fn parse_generated_text(body: &Value, model_id: &str) -> Result<Option<String>> {
    if body[GUARDRAIL_ACTION_KEY].as_str() == Some("INTERVENED") {
        return Ok(None);
    }

    let text = match model_id {
        id if id.starts_with("amazon.titan") => {
            let titan: TitanTextResponse = serde_json::from_value(body.clone())
                .map_err(|e| ImaginError::ResponseError(e.to_string()))?;
            match titan.results.into_iter().next() {
                Some(result) if result.completion_reason.as_deref() == Some("CONTENT_FILTERED") => {
                    None
                }
                Some(result) => Some(result.output_text),
                None => None,
            }
        }
        id if is_anthropic(id) => body["content"][0]["text"].as_str().map(String::from),
        id if id.starts_with("meta.llama") => body["generation"].as_str().map(String::from),
        id if id.starts_with("mistral.mistral") => {
            body["outputs"][0]["text"].as_str().map(String::from)
        }
        id if id.starts_with("cohere.command") => {
            body["generations"][0]["text"].as_str().map(String::from)
        }
        id if id.starts_with("ai21.") => body["completions"][0]["data"]["text"]
            .as_str()
            .map(String::from),
        _ => {
            return Err(ImaginError::ResponseError(format!(
                "Unexpected model type in response: {}",
                model_id
            )))
        }
    };

    Ok(text.filter(|t| !t.trim().is_empty()))
}
