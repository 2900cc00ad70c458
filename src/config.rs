use crate::error::{ImaginError, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_IMAGE_SIZE: u32 = 1024;
pub const DEFAULT_DOWNLOAD_DIR: &str = ".";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Bedrock,
    Gemini,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Bedrock => "bedrock",
            Backend::Gemini => "gemini",
        }
    }
}

impl FromStr for Backend {
    type Err = ImaginError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "bedrock" | "aws" => Ok(Backend::Bedrock),
            "gemini" | "google" => Ok(Backend::Gemini),
            other => Err(ImaginError::ConfigError(format!(
                "Unknown backend '{}', expected 'bedrock' or 'gemini'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BedrockConfig {
    pub region: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub text_model_id: Option<String>,
    pub image_model_id: Option<String>,
    pub guardrail_id: Option<String>,
    pub guardrail_version: Option<String>,
}

impl BedrockConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let region = env_var("AWS_REGION").or_else(|| env_var("AWS_DEFAULT_REGION"));
        let access_key = env_var("AWS_ACCESS_KEY_ID");
        let secret_key = env_var("AWS_SECRET_ACCESS_KEY");
        let text_model_id = env_var("BEDROCK_TEXT_MODEL_ID");
        let image_model_id = env_var("BEDROCK_IMAGE_MODEL_ID");
        let guardrail_id = env_var("BEDROCK_GUARDRAIL_ID");
        let guardrail_version = env_var("BEDROCK_GUARDRAIL_VERSION");

        BedrockConfig {
            region,
            access_key,
            secret_key,
            text_model_id,
            image_model_id,
            guardrail_id,
            guardrail_version,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self
    }

    pub fn with_text_model(mut self, model_id: impl Into<String>) -> Self {
        self.text_model_id = Some(model_id.into());
        self
    }

    pub fn with_image_model(mut self, model_id: impl Into<String>) -> Self {
        self.image_model_id = Some(model_id.into());
        self
    }

    pub fn with_guardrail(mut self, id: impl Into<String>, version: impl Into<String>) -> Self {
        self.guardrail_id = Some(id.into());
        self.guardrail_version = Some(version.into());
        self
    }

    /// Guardrail id and version, only when both are set.
    pub fn guardrail(&self) -> Option<(&str, &str)> {
        match (&self.guardrail_id, &self.guardrail_version) {
            (Some(id), Some(version)) => Some((id.as_str(), version.as_str())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub text_model: Option<String>,
    pub image_model: Option<String>,
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        GeminiConfig {
            api_key: env_var("GEMINI_API_KEY"),
            base_url: env_var("GEMINI_BASE_URL"),
            text_model: env_var("GEMINI_TEXT_MODEL"),
            image_model: env_var("GEMINI_IMAGE_MODEL"),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_models(
        mut self,
        text_model: impl Into<String>,
        image_model: impl Into<String>,
    ) -> Self {
        self.text_model = Some(text_model.into());
        self.image_model = Some(image_model.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ImageSize {
    fn default() -> Self {
        ImageSize {
            width: DEFAULT_IMAGE_SIZE,
            height: DEFAULT_IMAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: Backend,
    pub port: Option<u16>,
    pub download_dir: PathBuf,
    pub image_size: ImageSize,
    pub bedrock: BedrockConfig,
    pub gemini: GeminiConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            backend: Backend::Bedrock,
            port: None,
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            image_size: ImageSize::default(),
            bedrock: BedrockConfig::default(),
            gemini: GeminiConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every setting from the process environment. Unparseable numbers
    /// fall back to their defaults; an unknown backend name is an error.
    pub fn from_env() -> Result<Self> {
        let backend = match env_var("IMAGINAI_BACKEND") {
            Some(name) => name.parse()?,
            None => Backend::Bedrock,
        };
        let port = env_var("PORT").and_then(|port| port.parse().ok());
        let download_dir = env_var("IMAGINAI_DOWNLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_DIR));
        let image_size = ImageSize {
            width: parse_or(env_var("IMAGE_WIDTH"), DEFAULT_IMAGE_SIZE),
            height: parse_or(env_var("IMAGE_HEIGHT"), DEFAULT_IMAGE_SIZE),
        };

        Ok(AppConfig {
            backend,
            port,
            download_dir,
            image_size,
            bedrock: BedrockConfig::from_env(),
            gemini: GeminiConfig::from_env(),
        })
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    pub fn with_image_size(mut self, width: u32, height: u32) -> Self {
        self.image_size = ImageSize { width, height };
        self
    }

    pub fn with_bedrock(mut self, config: BedrockConfig) -> Self {
        self.bedrock = config;
        self.backend = Backend::Bedrock;
        self
    }

    pub fn with_gemini(mut self, config: GeminiConfig) -> Self {
        self.gemini = config;
        self.backend = Backend::Gemini;
        self
    }
}

/// Unset and blank variables both read as `None`.
fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}
