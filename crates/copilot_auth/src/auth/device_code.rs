use std::fmt;
use std::time::Duration;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::authenticator::{success_body, CopilotAuthenticator};
use crate::error::{AuthError, Stage};
use crate::masking::mask_secret;

pub const DEFAULT_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 900;

/// Device code issued by GitHub for one authorization attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct DeviceCodeInfo {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    /// Seconds between poll attempts.
    pub interval: u64,
    /// Seconds the device code stays valid.
    pub expires_in: u64,
}

impl fmt::Debug for DeviceCodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceCodeInfo")
            .field("device_code", &mask_secret(&self.device_code))
            .field("user_code", &self.user_code)
            .field("verification_uri", &self.verification_uri)
            .field("interval", &self.interval)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

impl DeviceCodeInfo {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }
}

#[derive(Serialize)]
struct DeviceCodeRequest<'a> {
    client_id: &'a str,
    scope: &'a str,
}

#[derive(Deserialize)]
struct DeviceCodeResponse {
    device_code: String,
    user_code: String,
    verification_uri: String,
    interval: Option<u64>,
    expires_in: Option<u64>,
}

impl From<DeviceCodeResponse> for DeviceCodeInfo {
    fn from(response: DeviceCodeResponse) -> Self {
        // Zero counts as missing, same as an absent field.
        let or_default = |value: Option<u64>, default: u64| match value {
            Some(0) | None => default,
            Some(value) => value,
        };
        DeviceCodeInfo {
            device_code: response.device_code,
            user_code: response.user_code,
            verification_uri: response.verification_uri,
            interval: or_default(response.interval, DEFAULT_INTERVAL_SECS),
            expires_in: or_default(response.expires_in, DEFAULT_EXPIRES_IN_SECS),
        }
    }
}

pub(crate) fn parse_device_code(body: &str) -> Result<DeviceCodeInfo, AuthError> {
    serde_json::from_str::<DeviceCodeResponse>(body)
        .map(DeviceCodeInfo::from)
        .map_err(|e| AuthError::parse(Stage::DeviceCode, e))
}

impl CopilotAuthenticator {
    /// Ask GitHub for a device code and user code.
    pub async fn request_device_code(&self) -> Result<DeviceCodeInfo, AuthError> {
        let url = self.config.device_code_url();
        info!("Requesting device code from {url}");

        let body = self
            .until_cancelled(self.send_device_code_request(&url))
            .await?;
        let device_code = parse_device_code(&body)?;
        debug!("Received {device_code:?}");
        Ok(device_code)
    }

    async fn send_device_code_request(&self, url: &str) -> Result<String, AuthError> {
        let response = self
            .client
            .post(url)
            .json(&DeviceCodeRequest {
                client_id: &self.config.client_id,
                scope: &self.config.scope,
            })
            .send()
            .await?;
        success_body(response, Stage::DeviceCode).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_interval_and_expiry_use_defaults() {
        let info = parse_device_code(
            r#"{"device_code":"dc","user_code":"ABCD-1234","verification_uri":"https://github.com/login/device"}"#,
        )
        .expect("parse");

        assert_eq!(info.interval, DEFAULT_INTERVAL_SECS);
        assert_eq!(info.expires_in, DEFAULT_EXPIRES_IN_SECS);
        assert_eq!(info.poll_interval(), Duration::from_secs(5));
    }

    #[test]
    fn zero_interval_is_treated_as_missing() {
        let info = parse_device_code(
            r#"{"device_code":"dc","user_code":"U","verification_uri":"https://x","interval":0,"expires_in":60}"#,
        )
        .expect("parse");

        assert_eq!(info.interval, DEFAULT_INTERVAL_SECS);
        assert_eq!(info.expires_in, 60);
    }

    #[test]
    fn missing_user_code_is_a_parse_error() {
        let err = parse_device_code(r#"{"device_code":"dc","verification_uri":"https://x"}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::Parse {
                stage: Stage::DeviceCode,
                ..
            }
        ));
    }

    #[test]
    fn debug_masks_device_code() {
        let info = DeviceCodeInfo {
            device_code: "3584d83530557fdd1f46af8289938c8ef79f9dc5".to_string(),
            user_code: "WDJB-MJHT".to_string(),
            verification_uri: "https://github.com/login/device".to_string(),
            interval: 5,
            expires_in: 900,
        };
        let rendered = format!("{info:?}");
        assert!(!rendered.contains("3584d83530557fdd1f46af8289938c8ef79f9dc5"));
        assert!(rendered.contains("WDJB-MJHT"));
    }
}
