use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImaginError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Request error: {0}")]
    RequestError(String),
    #[error("Response error: {0}")]
    ResponseError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("AWS error: {0}")]
    AwsError(String),
    #[error("AWS service error: {0}")]
    AwsServiceError(String),
    #[error("Content blocked: {0}")]
    ContentBlocked(String),
    #[error("Download error: {0}")]
    DownloadError(String),
    #[error("Session error: {0}")]
    SessionError(String),
    /// A remote failure that happened while a specific prompt was in flight.
    #[error("{source}")]
    Attempted {
        improved_prompt: String,
        #[source]
        source: Box<ImaginError>,
    },
}

impl ImaginError {
    pub fn attempted(improved_prompt: impl Into<String>, source: ImaginError) -> Self {
        ImaginError::Attempted {
            improved_prompt: improved_prompt.into(),
            source: Box::new(source),
        }
    }

    /// Prompt recorded on the error, if a backend attached one.
    pub fn improved_prompt(&self) -> Option<&str> {
        match self {
            ImaginError::Attempted {
                improved_prompt, ..
            } if !improved_prompt.is_empty() => Some(improved_prompt),
            _ => None,
        }
    }

    /// The remote's own message, without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            ImaginError::ConfigError(m)
            | ImaginError::RequestError(m)
            | ImaginError::ResponseError(m)
            | ImaginError::SerializationError(m)
            | ImaginError::AwsError(m)
            | ImaginError::AwsServiceError(m)
            | ImaginError::ContentBlocked(m)
            | ImaginError::DownloadError(m)
            | ImaginError::SessionError(m) => m,
            ImaginError::Attempted { source, .. } => source.message(),
        }
    }

    pub fn is_content_blocked(&self) -> bool {
        match self {
            ImaginError::ContentBlocked(_) => true,
            ImaginError::Attempted { source, .. } => source.is_content_blocked(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ImaginError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempted_displays_inner_message() {
        let err = ImaginError::attempted("a cat", ImaginError::AwsError("timeout".into()));
        assert_eq!(err.to_string(), "AWS error: timeout");
        assert_eq!(err.improved_prompt(), Some("a cat"));
    }

    #[test]
    fn content_blocked_is_found_through_attempted() {
        let err = ImaginError::attempted("x", ImaginError::ContentBlocked("RAI".into()));
        assert!(err.is_content_blocked());
        assert!(!ImaginError::RequestError("nope".into()).is_content_blocked());
    }

    #[test]
    fn message_strips_prefix_and_attempted_wrapper() {
        assert_eq!(ImaginError::AwsError("timeout".into()).message(), "timeout");
        let err = ImaginError::attempted("a cat", ImaginError::RequestError(String::new()));
        assert_eq!(err.message(), "");
    }

    #[test]
    fn empty_attempted_prompt_is_not_reported() {
        let err = ImaginError::attempted("", ImaginError::ResponseError("bad".into()));
        assert_eq!(err.improved_prompt(), None);
    }
}
