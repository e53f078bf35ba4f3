//! Post handler for browser pages.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::PostHandler;
use crate::error::{Error, Result};
use crate::payload::{post_encode, Payload};

/// Screen geometry reported by the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenInfo {
    pub width: u32,
    pub height: u32,
    pub pixel_depth: u32,
}

/// What the analytics client needs from a browser page
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait BrowserHost: Send + Sync {
    /// Visible document size as (width, height)
    fn viewport(&self) -> (u32, u32);

    fn screen(&self) -> ScreenInfo;

    /// Browser UI language, e.g. `en-US`
    fn language(&self) -> Option<String>;

    /// POST an encoded form body with the page's native request facility
    async fn request(&self, url: &str, body: String) -> Result<()>;
}

/// Sends hits from a browser page
///
/// Every hit carries the current viewport as `vp`.
pub struct BrowserPostHandler<H: BrowserHost> {
    host: Arc<H>,
}

impl<H: BrowserHost> BrowserPostHandler<H> {
    pub fn new(host: Arc<H>) -> Self {
        Self { host }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl<H: BrowserHost + 'static> PostHandler for BrowserPostHandler<H> {
    async fn send_post(&self, url: &str, mut parameters: Payload) {
        let (width, height) = self.host.viewport();
        parameters.set("vp", format!("{}x{}", width, height));

        let body = post_encode(&parameters);
        if let Err(e) = self.host.request(url, body).await {
            tracing::debug!(url = %url, error = %e, "Dropping analytics hit");
        }
    }
}

/// Browser host with fixed geometry that records request bodies
///
/// Stands in for a page in tests and headless embedding.
#[derive(Debug, Clone)]
pub struct StaticBrowserHost {
    pub viewport: (u32, u32),
    pub screen: ScreenInfo,
    pub language: Option<String>,
    fail_requests: bool,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl StaticBrowserHost {
    pub fn new(viewport: (u32, u32), screen: ScreenInfo, language: Option<&str>) -> Self {
        Self {
            viewport,
            screen,
            language: language.map(str::to_string),
            fail_requests: false,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make every request fail, as if the page were offline
    pub fn failing(mut self) -> Self {
        self.fail_requests = true;
        self
    }

    /// (url, body) of every request, oldest first
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl BrowserHost for StaticBrowserHost {
    fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    fn screen(&self) -> ScreenInfo {
        self.screen
    }

    fn language(&self) -> Option<String> {
        self.language.clone()
    }

    async fn request(&self, url: &str, body: String) -> Result<()> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((url.to_string(), body));
        if self.fail_requests {
            return Err(Error::Transport("network unavailable".to_string()));
        }
        Ok(())
    }
}

/// The current browser window
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowHost;

#[cfg(target_arch = "wasm32")]
#[async_trait(?Send)]
impl BrowserHost for WindowHost {
    fn viewport(&self) -> (u32, u32) {
        web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.document_element())
            .map(|e| (e.client_width().max(0) as u32, e.client_height().max(0) as u32))
            .unwrap_or((0, 0))
    }

    fn screen(&self) -> ScreenInfo {
        let screen = web_sys::window().and_then(|w| w.screen().ok());
        let read = |f: fn(&web_sys::Screen) -> std::result::Result<i32, wasm_bindgen::JsValue>| {
            screen
                .as_ref()
                .and_then(|s| f(s).ok())
                .map(|v| v.max(0) as u32)
                .unwrap_or(0)
        };
        ScreenInfo {
            width: read(web_sys::Screen::width),
            height: read(web_sys::Screen::height),
            pixel_depth: read(web_sys::Screen::pixel_depth),
        }
    }

    fn language(&self) -> Option<String> {
        web_sys::window()?.navigator().language()
    }

    async fn request(&self, url: &str, body: String) -> Result<()> {
        gloo_net::http::Request::post(url)
            .body(body)
            .map_err(|e| Error::Transport(format!("failed to build request: {}", e)))?
            .send()
            .await
            .map_err(|e| Error::Transport(format!("HTTP request failed: {}", e)))?;
        Ok(())
    }
}
