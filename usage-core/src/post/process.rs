//! Post handler for native processes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::PostHandler;
use crate::env::{platform_locale, Environment, OsFamily, SystemEnvironment};
use crate::error::{Error, Result};
use crate::payload::{post_encode, Payload};

/// Default request timeout for the reqwest transport
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Raw HTTP POST of an already encoded body
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, url: &str, body: String) -> Result<()>;

    fn close(&self) {}
}

/// [`Transport`] backed by a reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a client sending the given User-Agent
    pub fn new(user_agent: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post(&self, url: &str, body: String) -> Result<()> {
        let response = self
            .http_client
            .post(url)
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("HTTP request failed: {}", e)))?;

        // Status is irrelevant; drain so the connection can be reused
        response
            .bytes()
            .await
            .map_err(|e| Error::Transport(format!("failed to read response: {}", e)))?;
        Ok(())
    }
}

/// Sends hits from a native process
pub struct ProcessPostHandler {
    transport: Arc<dyn Transport>,
    user_agent: String,
}

impl ProcessPostHandler {
    /// Handler using reqwest and the real host environment
    pub fn new() -> Result<Self> {
        Self::with_env(&SystemEnvironment)
    }

    /// Handler using reqwest, with the User-Agent derived from `env`
    pub fn with_env(env: &dyn Environment) -> Result<Self> {
        let user_agent = user_agent(env);
        let transport = ReqwestTransport::new(&user_agent)?;
        Ok(Self {
            transport: Arc::new(transport),
            user_agent,
        })
    }

    /// Handler sending through a caller-supplied transport
    pub fn with_transport(transport: Arc<dyn Transport>, env: &dyn Environment) -> Self {
        Self {
            transport,
            user_agent: user_agent(env),
        }
    }

    /// User-Agent announced by the default transport
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

#[async_trait]
impl PostHandler for ProcessPostHandler {
    async fn send_post(&self, url: &str, parameters: Payload) {
        let body = post_encode(&parameters);
        if let Err(e) = self.transport.post(url, body).await {
            // Offline, DNS, refused: nothing useful to do about it
            tracing::debug!(url = %url, error = %e, "Dropping analytics hit");
        }
    }

    fn close(&self) {
        self.transport.close();
    }
}

/// Describe the host platform as a browser-style User-Agent
///
/// A missing locale leaves an empty segment rather than omitting it.
pub fn user_agent(env: &dyn Environment) -> String {
    let locale = platform_locale(env).unwrap_or_default();
    match env.os() {
        OsFamily::Android => format!("Mozilla/5.0 (Android; Mobile; {})", locale),
        OsFamily::Ios => format!(
            "Mozilla/5.0 (iPhone; U; CPU iPhone OS like Mac OS X; {})",
            locale
        ),
        OsFamily::MacOs => format!(
            "Mozilla/5.0 (Macintosh; Intel Mac OS X; Macintosh; {})",
            locale
        ),
        OsFamily::Windows => format!("Mozilla/5.0 (Windows; Windows; Windows; {})", locale),
        OsFamily::Linux => format!("Mozilla/5.0 (Linux; Linux; Linux; {})", locale),
        OsFamily::Other(os) => format!(
            "{runtime}/{version} ({os}; {os}; {os}; {locale})",
            runtime = env!("CARGO_PKG_NAME"),
            version = env!("CARGO_PKG_VERSION"),
            os = os,
            locale = locale,
        ),
    }
}
