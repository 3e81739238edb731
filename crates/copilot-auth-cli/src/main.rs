mod logging;

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use copilot_auth::{AuthConfig, CopilotAuthenticator, CopilotToken, DeviceFlow};

#[derive(Parser, Debug)]
#[command(name = "copilot-auth")]
#[command(about = "Sign in to GitHub with the device flow and print a Copilot API token")]
#[command(version)]
struct Cli {
    /// TOML file with client identity and endpoint overrides
    #[arg(long, env = "COPILOT_AUTH_CONFIG")]
    config: Option<PathBuf>,

    /// OAuth client id
    #[arg(long)]
    client_id: Option<String>,

    /// OAuth scope to request
    #[arg(long)]
    scope: Option<String>,

    /// User-Agent header sent with every request
    #[arg(long)]
    user_agent: Option<String>,

    /// Open the verification page in the default browser
    #[arg(long)]
    open: bool,

    /// Print only the Copilot token
    #[arg(long, short)]
    quiet: bool,

    /// Enable debug logging
    #[arg(long, short, default_value = "false")]
    debug: bool,

    /// Log level (overrides debug flag)
    #[arg(long, env = "RUST_LOG")]
    log_level: Option<String>,
}

impl Cli {
    fn apply_overrides(&self, config: &mut AuthConfig) {
        if let Some(client_id) = &self.client_id {
            config.client_id = client_id.clone();
        }
        if let Some(scope) = &self.scope {
            config.scope = scope.clone();
        }
        if let Some(user_agent) = &self.user_agent {
            config.user_agent = user_agent.clone();
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.debug, cli.log_level.as_deref());

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "❌ Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AuthConfig::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);

    log::debug!("Client id: {}", config.client_id);
    log::debug!("Scope: {}", config.scope);
    log::debug!("Login base URL: {}", config.login_base_url);
    log::debug!("API base URL: {}", config.api_base_url);

    let authenticator = CopilotAuthenticator::new(config)?;
    let cancel = authenticator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Interrupted, stopping authorization");
            cancel.cancel();
        }
    });

    let flow = DeviceFlow::new(authenticator).open_browser(cli.open);
    run_flow(flow, cli.quiet, &mut io::stderr(), &mut io::stdout()).await?;
    Ok(())
}

/// Run the flow, keeping stdout for the token alone when `quiet` is set.
///
/// The verification URL and user code always reach the user: on `out` normally,
/// on `progress` in quiet mode.
async fn run_flow<P: Write, O: Write>(
    flow: DeviceFlow,
    quiet: bool,
    progress: &mut P,
    out: &mut O,
) -> anyhow::Result<CopilotToken> {
    if quiet {
        let token = flow.announce_token(false).run(progress).await?;
        writeln!(out, "{}", token.as_str())?;
        return Ok(token);
    }

    let token = flow.run(out).await?;
    if let Some(expires_at) = token.expires_at.and_then(local_expiry) {
        writeln!(out, "{}", format!("(expires at {expires_at})").dimmed())?;
    }
    Ok(token)
}

/// Unix timestamp to local time; `None` when it does not fit a chrono timestamp.
fn local_expiry(ts: u64) -> Option<chrono::DateTime<chrono::Local>> {
    let secs = i64::try_from(ts).ok()?;
    chrono::DateTime::from_timestamp(secs, 0).map(|utc| utc.with_timezone(&chrono::Local))
}
