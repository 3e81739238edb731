use std::fmt;
use std::future::Future;
use std::sync::Arc;

use reqwest::Response;
use reqwest_middleware::ClientWithMiddleware;
use tokio_util::sync::CancellationToken;

use crate::clock::{Sleeper, TokioSleeper};
use crate::config::AuthConfig;
use crate::error::{AuthError, Stage};
use crate::utils::build_http_client;

/// Performs the three network steps of the GitHub device flow.
///
/// Cheap to clone; the HTTP client, config and clock are shared.
#[derive(Clone)]
pub struct CopilotAuthenticator {
    pub(super) client: Arc<ClientWithMiddleware>,
    pub(super) config: Arc<AuthConfig>,
    pub(super) sleeper: Arc<dyn Sleeper>,
    pub(super) cancel: CancellationToken,
}

impl fmt::Debug for CopilotAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CopilotAuthenticator")
            .field("config", &self.config)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl CopilotAuthenticator {
    pub fn new(config: AuthConfig) -> Result<Self, AuthError> {
        config.validate()?;
        let client = build_http_client(&config)?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: AuthConfig, client: ClientWithMiddleware) -> Self {
        Self {
            client: Arc::new(client),
            config: Arc::new(config),
            sleeper: Arc::new(TokioSleeper),
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the clock used between poll attempts.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that aborts polling when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Drive `step` unless the cancellation token fires first.
    pub(super) async fn until_cancelled<T, F>(&self, step: F) -> Result<T, AuthError>
    where
        F: Future<Output = Result<T, AuthError>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(AuthError::Cancelled),
            result = step => result,
        }
    }
}

/// Read the body of a response, turning a non-success status into [`AuthError::Http`].
pub(super) async fn success_body(response: Response, stage: Stage) -> Result<String, AuthError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::Http {
            stage,
            status,
            body,
        });
    }
    Ok(response.text().await?)
}
