//! Best-effort delivery of hits to the collection endpoint
//!
//! A [`PostHandler`] form-encodes a [`Payload`] and POSTs it. Delivery is
//! fire-and-forget: transport failures are logged at debug level and the
//! send still completes normally. Response status codes are not inspected.
//!
//! ## Handlers
//!
//! - [`ProcessPostHandler`]: native processes, HTTP via a [`Transport`]
//!   (reqwest by default) with a platform-derived User-Agent
//! - [`BrowserPostHandler`]: browser pages, adds the `vp` viewport field and
//!   sends through the page's [`BrowserHost`]
//! - [`RecordingPostHandler`]: keeps every hit in memory

mod browser;
#[cfg(not(target_arch = "wasm32"))]
mod process;

pub use browser::{BrowserHost, BrowserPostHandler, ScreenInfo, StaticBrowserHost};
#[cfg(target_arch = "wasm32")]
pub use browser::WindowHost;
#[cfg(not(target_arch = "wasm32"))]
pub use process::{user_agent, ProcessPostHandler, ReqwestTransport, Transport};

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::payload::Payload;

/// Sends one encoded hit to a URL
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait PostHandler: Send + Sync {
    /// POST `parameters` to `url`. Never fails from the caller's view.
    async fn send_post(&self, url: &str, parameters: Payload);

    /// Release transport resources
    fn close(&self) {}
}

/// A hit captured by [`RecordingPostHandler`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPost {
    pub url: String,
    pub parameters: Payload,
}

/// Post handler that stores hits instead of sending them
///
/// Clones share the same record, so a test can keep one clone and hand the
/// other to an [`crate::Analytics`] session.
#[derive(Debug, Clone, Default)]
pub struct RecordingPostHandler {
    posts: Arc<Mutex<Vec<RecordedPost>>>,
    closed: Arc<Mutex<bool>>,
}

impl RecordingPostHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every hit received so far, oldest first
    pub fn posts(&self) -> Vec<RecordedPost> {
        self.posts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// The most recent hit
    pub fn last(&self) -> Option<RecordedPost> {
        self.posts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl PostHandler for RecordingPostHandler {
    async fn send_post(&self, url: &str, parameters: Payload) {
        self.posts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedPost {
                url: url.to_string(),
                parameters,
            });
    }

    fn close(&self) {
        *self.closed.lock().unwrap_or_else(|e| e.into_inner()) = true;
    }
}
