use std::fmt;
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::authenticator::CopilotAuthenticator;
use super::device_code::DeviceCodeInfo;
use crate::error::{AuthError, Stage};
use crate::masking::mask_secret;

pub const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";
const AUTHORIZATION_PENDING: &str = "authorization_pending";

/// GitHub OAuth access token obtained from the device flow.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken")
            .field(&mask_secret(&self.0))
            .finish()
    }
}

/// Spacing and attempt budget for polling the access token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub interval: Duration,
    pub max_attempts: u64,
}

impl PollSchedule {
    /// `floor(expires_in / interval)` attempts, `interval` apart.
    pub fn new(interval_secs: u64, expires_in_secs: u64) -> Self {
        Self {
            interval: Duration::from_secs(interval_secs),
            max_attempts: expires_in_secs.checked_div(interval_secs).unwrap_or(0),
        }
    }

    pub fn for_device_code(device_code: &DeviceCodeInfo) -> Self {
        Self::new(device_code.interval, device_code.expires_in)
    }
}

/// Where the poll loop stands. Everything except `Polling` is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Polling,
    Authorized(AccessToken),
    Denied { error: Option<String>, body: String },
    TimedOut,
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollState::Polling)
    }

    /// Next state for a successful (2xx) poll response body.
    ///
    /// `slow_down` lands in `Denied` along with every other provider error.
    pub fn from_response_body(body: &str) -> Result<Self, AuthError> {
        let response: AccessTokenResponse =
            serde_json::from_str(body).map_err(|e| AuthError::parse(Stage::AccessToken, e))?;

        if let Some(token) = response.access_token.filter(|token| !token.is_empty()) {
            return Ok(PollState::Authorized(AccessToken(token)));
        }
        if response.error.as_deref() == Some(AUTHORIZATION_PENDING) {
            return Ok(PollState::Polling);
        }
        Ok(PollState::Denied {
            error: response.error,
            body: body.to_string(),
        })
    }
}

#[derive(Serialize)]
struct AccessTokenRequest<'a> {
    client_id: &'a str,
    device_code: &'a str,
    grant_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

impl CopilotAuthenticator {
    /// Poll until the user approves the device code, the provider refuses, or the
    /// attempt budget derived from the device code runs out.
    pub async fn poll_for_access_token(
        &self,
        device_code: &DeviceCodeInfo,
    ) -> Result<AccessToken, AuthError> {
        let schedule = PollSchedule::for_device_code(device_code);
        info!(
            "Polling for authorization every {}s, at most {} attempts",
            schedule.interval.as_secs(),
            schedule.max_attempts
        );

        let mut state = PollState::Polling;
        let mut attempts = 0;
        while !state.is_terminal() {
            if attempts == schedule.max_attempts {
                state = PollState::TimedOut;
                continue;
            }
            if attempts > 0 {
                self.wait(schedule.interval).await?;
            }
            attempts += 1;
            state = self
                .until_cancelled(self.poll_once(&device_code.device_code, attempts))
                .await?;
        }

        match state {
            PollState::Authorized(token) => {
                info!("Authorization granted after {attempts} attempts");
                Ok(token)
            }
            PollState::Denied { error, body } => Err(AuthError::Authorization { error, body }),
            PollState::Polling | PollState::TimedOut => Err(AuthError::Timeout { attempts }),
        }
    }

    async fn wait(&self, interval: Duration) -> Result<(), AuthError> {
        self.until_cancelled(async {
            self.sleeper.sleep(interval).await;
            Ok::<(), AuthError>(())
        })
        .await
    }

    /// One poll request. Transport failures and non-success statuses count as pending.
    async fn poll_once(&self, device_code: &str, attempt: u64) -> Result<PollState, AuthError> {
        let request = AccessTokenRequest {
            client_id: &self.config.client_id,
            device_code,
            grant_type: DEVICE_CODE_GRANT_TYPE,
        };
        let response = match self
            .client
            .post(self.config.access_token_url())
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Polling attempt {attempt} failed: {e}");
                return Ok(PollState::Polling);
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!("Polling attempt {attempt} returned HTTP {status}, continuing");
            return Ok(PollState::Polling);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Polling attempt {attempt} body unreadable: {e}");
                return Ok(PollState::Polling);
            }
        };

        let state = PollState::from_response_body(&body)?;
        debug!("Polling attempt {attempt}: {state:?}");
        Ok(state)
    }
}
