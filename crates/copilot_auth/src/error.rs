use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

/// Which network step of the device flow an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    DeviceCode,
    AccessToken,
    CopilotToken,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::DeviceCode => "Device code",
            Stage::AccessToken => "Access token",
            Stage::CopilotToken => "Copilot token",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{stage} request failed: HTTP {status} - {body}")]
    Http {
        stage: Stage,
        status: StatusCode,
        body: String,
    },

    /// The provider answered the poll with a terminal error code.
    #[error("Authorization failed: {body}")]
    Authorization { error: Option<String>, body: String },

    #[error("Authorization timed out after {attempts} attempts")]
    Timeout { attempts: u64 },

    #[error("Failed to parse {stage} response: {reason}")]
    Parse { stage: Stage, reason: String },

    #[error("Authorization cancelled")]
    Cancelled,

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest_middleware::Error),

    #[error("HTTP transport error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AuthError {
    pub(crate) fn parse(stage: Stage, reason: impl fmt::Display) -> Self {
        AuthError::Parse {
            stage,
            reason: reason.to_string(),
        }
    }

    /// A proxy between us and GitHub wants credentials (HTTP 407).
    pub fn is_proxy_auth_required(&self) -> bool {
        matches!(
            self,
            AuthError::Http { status, .. } if *status == StatusCode::PROXY_AUTHENTICATION_REQUIRED
        )
    }

    /// Provider error code carried by an [`AuthError::Authorization`], if any.
    pub fn provider_error(&self) -> Option<&str> {
        match self {
            AuthError::Authorization { error, .. } => error.as_deref(),
            _ => None,
        }
    }
}
