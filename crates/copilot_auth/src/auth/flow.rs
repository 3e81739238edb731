use std::io::Write;

use log::warn;

use super::authenticator::CopilotAuthenticator;
use super::exchange::CopilotToken;
use crate::error::AuthError;

/// Runs device code -> poll -> exchange once, reporting progress to a writer.
#[derive(Debug, Clone)]
pub struct DeviceFlow {
    authenticator: CopilotAuthenticator,
    open_browser: bool,
    announce_token: bool,
}

impl DeviceFlow {
    pub fn new(authenticator: CopilotAuthenticator) -> Self {
        Self {
            authenticator,
            open_browser: false,
            announce_token: true,
        }
    }

    /// Open the verification page in the system browser once the code is known.
    pub fn open_browser(mut self, enabled: bool) -> Self {
        self.open_browser = enabled;
        self
    }

    /// Whether the progress writer also receives the final token. Off when the caller
    /// prints the token elsewhere.
    pub fn announce_token(mut self, enabled: bool) -> Self {
        self.announce_token = enabled;
        self
    }

    pub fn authenticator(&self) -> &CopilotAuthenticator {
        &self.authenticator
    }

    pub async fn run<W: Write>(&self, out: &mut W) -> Result<CopilotToken, AuthError> {
        writeln!(out, "Requesting device code from GitHub...")?;
        let device_code = self.authenticator.request_device_code().await?;

        writeln!(out)?;
        writeln!(
            out,
            "👉 Visit {} and enter code: {}",
            device_code.verification_uri, device_code.user_code
        )?;
        writeln!(out)?;
        if self.open_browser {
            if let Err(e) = webbrowser::open(&device_code.verification_uri) {
                warn!("Could not open browser: {e}");
            }
        }

        writeln!(out, "Waiting for user to authorize...")?;
        out.flush()?;
        let access_token = self
            .authenticator
            .poll_for_access_token(&device_code)
            .await?;

        writeln!(out, "Retrieving Copilot API token...")?;
        let copilot_token = self.authenticator.exchange_token(&access_token).await?;

        if self.announce_token {
            writeln!(out)?;
            writeln!(out, "✅ GitHub Copilot API Key:")?;
            writeln!(out, "{}", copilot_token.as_str())?;
        }
        out.flush()?;
        Ok(copilot_token)
    }
}
