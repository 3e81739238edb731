use std::time::{Duration, Instant};

use http::Extensions;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Proxy, Request, Response};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, Middleware, Next};

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Logs method, path, status and latency of every outgoing request.
///
/// Query strings and bodies are never logged; they can carry device codes.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestLogger;

#[async_trait::async_trait]
impl Middleware for RequestLogger {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let method = req.method().clone();
        let target = format!(
            "{}{}",
            req.url().host_str().unwrap_or_default(),
            req.url().path()
        );
        let started = Instant::now();

        let result = next.run(req, extensions).await;
        match &result {
            Ok(response) => debug!(
                "{} {} -> {} ({}ms)",
                method,
                target,
                response.status(),
                started.elapsed().as_millis()
            ),
            Err(e) => debug!("{} {} failed: {}", method, target, e),
        }
        result
    }
}

fn default_headers(config: &AuthConfig) -> Result<HeaderMap, AuthError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    let user_agent = HeaderValue::from_str(&config.user_agent)
        .map_err(|e| AuthError::Config(format!("user_agent: {e}")))?;
    headers.insert(USER_AGENT, user_agent);
    Ok(headers)
}

/// Client builder with default headers, timeout and proxies applied.
///
/// Proxies set in the config replace reqwest's system proxy detection; with none
/// configured, `http_proxy`/`https_proxy`/`ALL_PROXY`/`NO_PROXY` apply as usual.
pub fn http_client_builder(config: &AuthConfig) -> Result<reqwest::ClientBuilder, AuthError> {
    let mut builder = Client::builder()
        .default_headers(default_headers(config)?)
        .timeout(Duration::from_secs(config.request_timeout_secs));

    if !config.http_proxy.is_empty() {
        let proxy = Proxy::http(&config.http_proxy)
            .map_err(|e| AuthError::Config(format!("http_proxy: {e}")))?;
        builder = builder.proxy(proxy);
    }
    if !config.https_proxy.is_empty() {
        let proxy = Proxy::https(&config.https_proxy)
            .map_err(|e| AuthError::Config(format!("https_proxy: {e}")))?;
        builder = builder.proxy(proxy);
    }
    Ok(builder)
}

/// Wrap a built client with the request logging middleware.
pub fn with_request_logging(client: Client) -> ClientWithMiddleware {
    ClientBuilder::new(client).with(RequestLogger).build()
}

/// Build the shared HTTP client: default headers, proxies, timeout and request logging.
pub fn build_http_client(config: &AuthConfig) -> Result<ClientWithMiddleware, AuthError> {
    let client = http_client_builder(config)?
        .build()
        .map_err(|e| AuthError::Config(format!("failed to build HTTP client: {e}")))?;
    Ok(with_request_logging(client))
}
