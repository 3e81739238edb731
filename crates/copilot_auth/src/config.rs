use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::AuthError;

pub const DEFAULT_CLIENT_ID: &str = "Iv1.b507a08c87ecfe98";
pub const DEFAULT_SCOPE: &str = "read:user";
pub const DEFAULT_USER_AGENT: &str = "GitHubCopilotChat/0.26.7";
pub const DEFAULT_EDITOR_VERSION: &str = "vscode/1.99.3";
pub const DEFAULT_EDITOR_PLUGIN_VERSION: &str = "copilot-chat/0.26.7";
pub const DEFAULT_LOGIN_BASE_URL: &str = "https://github.com";
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client identity and endpoints used for the device flow.
///
/// Resolved once at startup: compiled defaults, then an optional TOML file,
/// then environment variables. The CLI applies its flags on top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub client_id: String,
    pub scope: String,
    pub user_agent: String,
    pub editor_version: String,
    pub editor_plugin_version: String,
    pub login_base_url: String,
    pub api_base_url: String,
    pub http_proxy: String,
    pub https_proxy: String,
    pub request_timeout_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_id: DEFAULT_CLIENT_ID.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            editor_version: DEFAULT_EDITOR_VERSION.to_string(),
            editor_plugin_version: DEFAULT_EDITOR_PLUGIN_VERSION.to_string(),
            login_base_url: DEFAULT_LOGIN_BASE_URL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            http_proxy: String::new(),
            https_proxy: String::new(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl AuthConfig {
    /// Load from an optional config file and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, AuthError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, AuthError> {
        debug!("Reading config from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| {
            AuthError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, AuthError> {
        toml::from_str(content).map_err(|e| AuthError::Config(e.to_string()))
    }

    /// Override fields from environment-style lookups. Blank values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(client_id) = get("COPILOT_AUTH_CLIENT_ID") {
            self.client_id = client_id;
        }
        if let Some(scope) = get("COPILOT_AUTH_SCOPE") {
            self.scope = scope;
        }
        if let Some(user_agent) = get("COPILOT_AUTH_USER_AGENT") {
            self.user_agent = user_agent;
        }
        if let Some(http_proxy) = get("HTTP_PROXY") {
            self.http_proxy = http_proxy;
        }
        if let Some(https_proxy) = get("HTTPS_PROXY") {
            self.https_proxy = https_proxy;
        }
    }

    pub fn validate(&self) -> Result<(), AuthError> {
        for (name, value) in [
            ("client_id", &self.client_id),
            ("scope", &self.scope),
            ("user_agent", &self.user_agent),
        ] {
            if value.trim().is_empty() {
                return Err(AuthError::Config(format!("{name} must not be empty")));
            }
        }
        for (name, value) in [
            ("login_base_url", &self.login_base_url),
            ("api_base_url", &self.api_base_url),
        ] {
            Url::parse(value).map_err(|e| AuthError::Config(format!("{name} {value:?}: {e}")))?;
        }
        if self.request_timeout_secs == 0 {
            return Err(AuthError::Config(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn device_code_url(&self) -> String {
        format!("{}/login/device/code", self.login_base_url.trim_end_matches('/'))
    }

    pub fn access_token_url(&self) -> String {
        format!(
            "{}/login/oauth/access_token",
            self.login_base_url.trim_end_matches('/')
        )
    }

    pub fn copilot_token_url(&self) -> String {
        format!(
            "{}/copilot_internal/v2/token",
            self.api_base_url.trim_end_matches('/')
        )
    }
}
