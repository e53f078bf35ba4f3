//! Analytics sessions
//!
//! [`Analytics`] turns semantic calls (events, screen views, timings,
//! exceptions) into hit payloads and hands them to a [`PostHandler`]. Durable
//! settings (client id, enabled flag, first-run marker) live in a
//! [`PersistentProperties`] store. The two are injected at construction;
//! [`Analytics::for_process`] and [`Analytics::for_browser`] pair the
//! standard implementations for each host.
//!
//! ## Payload layout
//!
//! Each hit is assembled as: hit-specific fields, then session values, then
//! `v=1`, `tid`, `cid` and `t` (hit type).
//!
//! ## Example
//!
//! ```rust,no_run
//! use usage_core::{Analytics, AnalyticsOptions, Event, ProcessOptions};
//!
//! # async fn run() -> usage_core::Result<()> {
//! let options = AnalyticsOptions::new("UA-0000000-1", "my tool").with_version("1.2.0");
//! let analytics = Analytics::for_process(options, ProcessOptions::default())?;
//!
//! analytics.send_screen_view("main").await;
//! analytics.send_event(Event::new("files", "open").label("csv")).await;
//! # Ok(())
//! # }
//! ```

mod browser;
mod hits;
#[cfg(not(target_arch = "wasm32"))]
mod process;
mod throttle;

pub use hits::{sanitize_exception, AnalyticsTimer, Event, Timing};
#[cfg(not(target_arch = "wasm32"))]
pub use process::ProcessOptions;
pub use throttle::ThrottlingBucket;

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Deserialize;
use serde_json::Value;

use crate::payload::Payload;
use crate::post::PostHandler;
use crate::properties::PersistentProperties;

/// Default collection endpoint
pub const DEFAULT_COLLECTION_URL: &str = "https://www.google-analytics.com/collect";

/// Hits allowed in a burst before throttling kicks in
const THROTTLE_CAPACITY: u32 = 20;

/// Persisted anonymous client id
pub const CLIENT_ID_KEY: &str = "clientId";
/// Persisted flag consulted by [`AnalyticsOpt::is_enabled`]
pub const ENABLED_KEY: &str = "enabled";
const FIRST_RUN_KEY: &str = "firstRun";

/// How the persisted `enabled` flag is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsOpt {
    /// Enabled unless the user turned it off
    #[default]
    OptOut,
    /// Disabled unless the user turned it on
    OptIn,
}

impl AnalyticsOpt {
    /// Whether hits are sent given the persisted `enabled` property
    pub fn is_enabled(self, flag: Option<&Value>) -> bool {
        match self {
            AnalyticsOpt::OptIn => flag == Some(&Value::Bool(true)),
            AnalyticsOpt::OptOut => flag != Some(&Value::Bool(false)),
        }
    }
}

/// Construction-time settings shared by every host
#[derive(Debug, Clone)]
pub struct AnalyticsOptions {
    pub tracking_id: String,
    pub application_name: String,
    pub application_version: Option<String>,
    pub collection_url: String,
    pub opt: AnalyticsOpt,
}

impl AnalyticsOptions {
    pub fn new(tracking_id: impl Into<String>, application_name: impl Into<String>) -> Self {
        Self {
            tracking_id: tracking_id.into(),
            application_name: application_name.into(),
            application_version: None,
            collection_url: DEFAULT_COLLECTION_URL.to_string(),
            opt: AnalyticsOpt::default(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.application_version = Some(version.into());
        self
    }

    pub fn with_collection_url(mut self, url: impl Into<String>) -> Self {
        self.collection_url = url.into();
        self
    }

    pub fn with_opt(mut self, opt: AnalyticsOpt) -> Self {
        self.opt = opt;
        self
    }
}

struct SessionState {
    values: Payload,
    bucket: ThrottlingBucket,
    first_run: Option<bool>,
}

/// One analytics session for an application
///
/// Methods take `&self`; wrap in an `Arc` to share between tasks. Sends are
/// independent futures with no ordering between them.
pub struct Analytics {
    options: AnalyticsOptions,
    properties: Mutex<Box<dyn PersistentProperties>>,
    post_handler: Arc<dyn PostHandler>,
    state: Mutex<SessionState>,
}

impl Analytics {
    /// Compose a session from explicit capabilities
    pub fn new(
        options: AnalyticsOptions,
        properties: Box<dyn PersistentProperties>,
        post_handler: Arc<dyn PostHandler>,
    ) -> Self {
        let mut values = Payload::new();
        values.set("an", options.application_name.as_str());
        if let Some(version) = &options.application_version {
            values.set("av", version.as_str());
        }

        Self {
            options,
            properties: Mutex::new(properties),
            post_handler,
            state: Mutex::new(SessionState {
                values,
                bucket: ThrottlingBucket::new(THROTTLE_CAPACITY),
                first_run: None,
            }),
        }
    }

    pub fn tracking_id(&self) -> &str {
        &self.options.tracking_id
    }

    pub fn application_name(&self) -> &str {
        &self.options.application_name
    }

    pub fn application_version(&self) -> Option<&str> {
        self.options.application_version.as_deref()
    }

    pub fn collection_url(&self) -> &str {
        &self.options.collection_url
    }

    /// True the first time this is asked for a fresh property store
    ///
    /// The answer is fixed for the lifetime of the session.
    pub fn first_run(&self) -> bool {
        let mut state = self.lock_state();
        if let Some(first_run) = state.first_run {
            return first_run;
        }

        let mut properties = self.lock_properties();
        let stored = properties.get(FIRST_RUN_KEY);
        let first_run = stored.is_none();
        if stored != Some(Value::Bool(false)) {
            properties.set(FIRST_RUN_KEY, Some(Value::Bool(false)));
        }
        state.first_run = Some(first_run);
        first_run
    }

    /// Whether hits are sent, per the persisted flag and opt mode
    pub fn enabled(&self) -> bool {
        let flag = self.lock_properties().get(ENABLED_KEY);
        self.options.opt.is_enabled(flag.as_ref())
    }

    /// Persist the user's choice
    pub fn set_enabled(&self, enabled: bool) {
        self.lock_properties()
            .set(ENABLED_KEY, Some(Value::Bool(enabled)));
    }

    /// Stable anonymous client id, generated and stored on first use
    pub fn client_id(&self) -> String {
        let mut properties = self.lock_properties();
        if let Some(Value::String(id)) = properties.get(CLIENT_ID_KEY) {
            return id;
        }

        let id = uuid::Uuid::new_v4().to_string();
        properties.set(CLIENT_ID_KEY, Some(Value::String(id.clone())));
        id
    }

    /// Read a raw persisted property
    pub fn property(&self, key: &str) -> Option<Value> {
        self.lock_properties().get(key)
    }

    /// Write or clear a raw persisted property
    pub fn set_property(&self, key: &str, value: Option<Value>) {
        self.lock_properties().set(key, value);
    }

    /// Value attached to every hit under `param`
    pub fn session_value(&self, param: &str) -> Option<String> {
        self.lock_state().values.get(param).map(str::to_string)
    }

    /// Attach (or with `None`, detach) a value to every later hit
    pub fn set_session_value(&self, param: &str, value: Option<&str>) {
        let mut state = self.lock_state();
        match value {
            Some(value) => state.values.set(param, value),
            None => {
                state.values.remove(param);
            }
        }
    }

    pub async fn send_screen_view(&self, view_name: &str) {
        let args = Payload::new().with("cd", view_name);
        self.send_payload("screenview", args).await;
    }

    pub async fn send_event(&self, event: Event) {
        self.send_payload("event", event.into_payload()).await;
    }

    pub async fn send_social(&self, network: &str, action: &str, target: &str) {
        let args = Payload::new()
            .with("sn", network)
            .with("sa", action)
            .with("st", target);
        self.send_payload("social", args).await;
    }

    pub async fn send_timing(&self, timing: Timing) {
        self.send_payload("timing", timing.into_payload()).await;
    }

    /// Start measuring a duration; see [`AnalyticsTimer::finish`]
    pub fn start_timer(
        &self,
        variable_name: &str,
        category: Option<&str>,
        label: Option<&str>,
    ) -> AnalyticsTimer {
        AnalyticsTimer::start(variable_name, category, label)
    }

    /// Report an exception; the description is scrubbed of local paths
    pub async fn send_exception(&self, description: &str, fatal: bool) {
        let mut args = Payload::new().with("exd", sanitize_exception(description));
        if fatal {
            args.set("exf", "1");
        }
        self.send_payload("exception", args).await;
    }

    /// Release the post handler's resources
    pub fn close(&self) {
        self.post_handler.close();
    }

    async fn send_payload(&self, hit_type: &str, mut args: Payload) {
        if !self.enabled() {
            return;
        }

        {
            let mut state = self.lock_state();
            if !state.bucket.try_take() {
                tracing::debug!(hit_type = %hit_type, "Throttled analytics hit");
                return;
            }
            args.extend(state.values.iter());
        }

        args.set("v", "1");
        args.set("tid", self.options.tracking_id.as_str());
        args.set("cid", self.client_id());
        args.set("t", hit_type);

        self.post_handler
            .send_post(&self.options.collection_url, args)
            .await;
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_properties(&self) -> MutexGuard<'_, Box<dyn PersistentProperties>> {
        self.properties.lock().unwrap_or_else(|e| e.into_inner())
    }
}
