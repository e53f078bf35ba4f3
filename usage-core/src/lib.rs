//! # usage-core
//!
//! Client library for application usage analytics.
//!
//! This library provides:
//! - Hit payloads (events, screen views, timings, exceptions) and their
//!   form encoding
//! - Persistent properties: a small per-application JSON store for the
//!   client id, the enabled flag and similar settings
//! - Best-effort delivery to a collection endpoint
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! Two capabilities are composed by an [`Analytics`] session:
//! - **[`PersistentProperties`]:** durable key-value settings (dotfile in
//!   the home directory, or browser web storage)
//! - **[`PostHandler`]:** fire-and-forget POST of encoded hits (reqwest in
//!   native processes, the page's request facility in browsers)
//!
//! Analytics never interrupts the host application. A corrupt store loads
//! as empty, failed writes and failed sends are logged and dropped.
//!
//! ## Example
//!
//! ```rust,no_run
//! use usage_core::{Analytics, AnalyticsOptions, Config, Event, ProcessOptions};
//!
//! # async fn run() -> usage_core::Result<()> {
//! let config = Config::load()?;
//! let analytics = Analytics::for_process(config.analytics.to_options()?, ProcessOptions::default())?;
//!
//! if analytics.first_run() {
//!     // ask the user about analytics
//! }
//! analytics.send_event(Event::new("startup", "launch")).await;
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use payload::{post_encode, Payload};
pub use post::PostHandler;
pub use properties::PersistentProperties;
#[cfg(not(target_arch = "wasm32"))]
pub use session::ProcessOptions;
pub use session::{
    Analytics, AnalyticsOpt, AnalyticsOptions, AnalyticsTimer, Event, Timing,
    DEFAULT_COLLECTION_URL,
};

// Public modules
pub mod config;
pub mod env;
pub mod error;
#[cfg(not(target_arch = "wasm32"))]
pub mod logging;
pub mod payload;
pub mod post;
pub mod properties;
pub mod session;
