use std::fmt;

use log::{debug, info};
use serde::Deserialize;

use super::authenticator::{success_body, CopilotAuthenticator};
use super::poller::AccessToken;
use crate::error::{AuthError, Stage};
use crate::masking::mask_secret;

/// Short-lived Copilot API token.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct CopilotToken {
    pub token: String,
    /// Unix timestamp after which the token is rejected.
    pub expires_at: Option<u64>,
    /// Seconds until the API suggests fetching a new token.
    pub refresh_in: Option<u64>,
}

impl CopilotToken {
    pub fn as_str(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for CopilotToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CopilotToken")
            .field("token", &mask_secret(&self.token))
            .field("expires_at", &self.expires_at)
            .field("refresh_in", &self.refresh_in)
            .finish()
    }
}

pub(crate) fn parse_copilot_token(body: &str) -> Result<CopilotToken, AuthError> {
    let token: CopilotToken =
        serde_json::from_str(body).map_err(|e| AuthError::parse(Stage::CopilotToken, e))?;
    if token.token.is_empty() {
        return Err(AuthError::parse(Stage::CopilotToken, "empty `token` field"));
    }
    Ok(token)
}

impl CopilotAuthenticator {
    /// Trade a GitHub access token for a Copilot API token.
    pub async fn exchange_token(
        &self,
        access_token: &AccessToken,
    ) -> Result<CopilotToken, AuthError> {
        let url = self.config.copilot_token_url();
        info!("Retrieving Copilot API token from {url}");

        let body = self
            .until_cancelled(self.send_token_request(&url, access_token))
            .await?;
        let token = parse_copilot_token(&body)?;
        debug!("Received {token:?}");
        Ok(token)
    }

    async fn send_token_request(
        &self,
        url: &str,
        access_token: &AccessToken,
    ) -> Result<String, AuthError> {
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", access_token.secret()))
            .header("Editor-Version", self.config.editor_version.as_str())
            .header(
                "Editor-Plugin-Version",
                self.config.editor_plugin_version.as_str(),
            )
            .send()
            .await?;
        success_body(response, Stage::CopilotToken).await
    }
}
