//! Prompt improvement policy: the instruction sent to the text model and the
//! per-category safety thresholds that travel with it.
//!
//! The policy is a plain value. Build it once (usually `ImprovementPolicy::default()`),
//! wrap it in an `Arc` and hand it to whichever improver backend is in use.

use serde::{Deserialize, Serialize};

pub const DEFAULT_INSTRUCTION: &str = "You are an AI prompt improvement assistant. Your task is to rewrite user-provided prompts for image generation to avoid sensitive content and increase the likelihood of successful image creation.\n\nOriginal Prompt: {prompt}\n\nImproved Prompt:";

const PROMPT_PLACEHOLDER: &str = "{prompt}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HarmCategory {
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
    #[serde(rename = "HARM_CATEGORY_CIVIC_INTEGRITY")]
    CivicIntegrity,
}

impl HarmCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            HarmCategory::HateSpeech => "HARM_CATEGORY_HATE_SPEECH",
            HarmCategory::DangerousContent => "HARM_CATEGORY_DANGEROUS_CONTENT",
            HarmCategory::Harassment => "HARM_CATEGORY_HARASSMENT",
            HarmCategory::SexuallyExplicit => "HARM_CATEGORY_SEXUALLY_EXPLICIT",
            HarmCategory::CivicIntegrity => "HARM_CATEGORY_CIVIC_INTEGRITY",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmThreshold {
    BlockOnlyHigh,
    BlockNone,
    BlockMediumAndAbove,
    BlockLowAndAbove,
}

impl HarmThreshold {
    pub fn as_str(&self) -> &'static str {
        match self {
            HarmThreshold::BlockOnlyHigh => "BLOCK_ONLY_HIGH",
            HarmThreshold::BlockNone => "BLOCK_NONE",
            HarmThreshold::BlockMediumAndAbove => "BLOCK_MEDIUM_AND_ABOVE",
            HarmThreshold::BlockLowAndAbove => "BLOCK_LOW_AND_ABOVE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmThreshold,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImprovementPolicy {
    instruction: String,
    safety_settings: Vec<SafetySetting>,
}

impl Default for ImprovementPolicy {
    fn default() -> Self {
        Self {
            instruction: DEFAULT_INSTRUCTION.to_string(),
            safety_settings: vec![
                SafetySetting {
                    category: HarmCategory::HateSpeech,
                    threshold: HarmThreshold::BlockOnlyHigh,
                },
                SafetySetting {
                    category: HarmCategory::DangerousContent,
                    threshold: HarmThreshold::BlockNone,
                },
                SafetySetting {
                    category: HarmCategory::Harassment,
                    threshold: HarmThreshold::BlockMediumAndAbove,
                },
                SafetySetting {
                    category: HarmCategory::SexuallyExplicit,
                    threshold: HarmThreshold::BlockLowAndAbove,
                },
                SafetySetting {
                    category: HarmCategory::CivicIntegrity,
                    threshold: HarmThreshold::BlockOnlyHigh,
                },
            ],
        }
    }
}

impl ImprovementPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the instruction template. `{prompt}` marks where the user's
    /// prompt goes; without it the prompt is appended on its own line.
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    pub fn with_threshold(mut self, category: HarmCategory, threshold: HarmThreshold) -> Self {
        match self
            .safety_settings
            .iter_mut()
            .find(|setting| setting.category == category)
        {
            Some(setting) => setting.threshold = threshold,
            None => self.safety_settings.push(SafetySetting {
                category,
                threshold,
            }),
        }
        self
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn safety_settings(&self) -> &[SafetySetting] {
        &self.safety_settings
    }

    pub fn threshold_for(&self, category: HarmCategory) -> Option<HarmThreshold> {
        self.safety_settings
            .iter()
            .find(|setting| setting.category == category)
            .map(|setting| setting.threshold)
    }

    pub fn render(&self, prompt: &str) -> String {
        if self.instruction.contains(PROMPT_PLACEHOLDER) {
            self.instruction.replace(PROMPT_PLACEHOLDER, prompt)
        } else {
            format!("{}\n\n{}", self.instruction, prompt)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_thresholds() {
        let policy = ImprovementPolicy::default();
        assert_eq!(policy.safety_settings().len(), 5);
        assert_eq!(
            policy.threshold_for(HarmCategory::HateSpeech),
            Some(HarmThreshold::BlockOnlyHigh)
        );
        assert_eq!(
            policy.threshold_for(HarmCategory::DangerousContent),
            Some(HarmThreshold::BlockNone)
        );
        assert_eq!(
            policy.threshold_for(HarmCategory::Harassment),
            Some(HarmThreshold::BlockMediumAndAbove)
        );
        assert_eq!(
            policy.threshold_for(HarmCategory::SexuallyExplicit),
            Some(HarmThreshold::BlockLowAndAbove)
        );
        assert_eq!(
            policy.threshold_for(HarmCategory::CivicIntegrity),
            Some(HarmThreshold::BlockOnlyHigh)
        );
    }

    #[test]
    fn safety_settings_serialize_to_wire_names() {
        let setting = SafetySetting {
            category: HarmCategory::SexuallyExplicit,
            threshold: HarmThreshold::BlockLowAndAbove,
        };
        let json = serde_json::to_value(setting).unwrap();
        assert_eq!(json["category"], "HARM_CATEGORY_SEXUALLY_EXPLICIT");
        assert_eq!(json["threshold"], "BLOCK_LOW_AND_ABOVE");
        assert_eq!(
            HarmThreshold::BlockMediumAndAbove.as_str(),
            serde_json::to_value(HarmThreshold::BlockMediumAndAbove).unwrap()
        );
    }

    #[test]
    fn render_substitutes_prompt() {
        let rendered = ImprovementPolicy::default().render("a red fox");
        assert!(rendered.contains("Original Prompt: a red fox"));
        assert!(rendered.ends_with("Improved Prompt:"));
    }

    #[test]
    fn render_appends_without_placeholder() {
        let policy = ImprovementPolicy::new().with_instruction("Rewrite this safely.");
        assert_eq!(policy.render("a boat"), "Rewrite this safely.\n\na boat");
    }

    #[test]
    fn with_threshold_overrides_existing_category() {
        let policy =
            ImprovementPolicy::new().with_threshold(HarmCategory::HateSpeech, HarmThreshold::BlockNone);
        assert_eq!(policy.safety_settings().len(), 5);
        assert_eq!(
            policy.threshold_for(HarmCategory::HateSpeech),
            Some(HarmThreshold::BlockNone)
        );
    }
}
