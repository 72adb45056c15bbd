use thiserror::Error;

/// Failures talking to the hosted backend.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("http {status}: {message}")]
    Http { status: u16, message: String },
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("client setup failed: {0}")]
    Build(String),
}

impl BackendError {
    /// Text suitable for showing to a person, without the transport prefix.
    pub fn user_message(&self) -> String {
        match self {
            Self::Http { message, .. } => message.clone(),
            Self::Transport(message) => format!("network error: {message}"),
            other => other.to_string(),
        }
    }

    /// Failures a sign-in form should expect: rejected credentials, an
    /// unreachable service. A response we cannot decode is not one of them.
    pub fn is_expected_auth_failure(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Http { .. })
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if err.is_timeout() {
            Self::Transport("request timed out".to_string())
        } else if err.is_builder() {
            Self::Build(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_user_message_is_the_server_text() {
        let err = BackendError::Http {
            status: 400,
            message: "Invalid login credentials".to_string(),
        };
        assert_eq!(err.user_message(), "Invalid login credentials");
        assert_eq!(err.to_string(), "http 400: Invalid login credentials");
    }

    #[test]
    fn decode_errors_are_not_expected_auth_failures() {
        assert!(!BackendError::Decode("eof".into()).is_expected_auth_failure());
        assert!(BackendError::Transport("refused".into()).is_expected_auth_failure());
    }
}
