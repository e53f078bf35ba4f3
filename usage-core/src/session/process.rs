//! Session wiring for native processes.

use std::path::PathBuf;
use std::sync::Arc;

use super::{Analytics, AnalyticsOptions};
use crate::env::{platform_locale, Environment, SystemEnvironment};
use crate::error::Result;
use crate::post::{ProcessPostHandler, Transport};
use crate::properties::FileProperties;

/// Host-specific overrides for [`Analytics::for_process`]
#[derive(Default)]
pub struct ProcessOptions {
    /// Directory for the properties dotfile (default: home directory)
    pub properties_dir: Option<PathBuf>,
    /// Replace the HTTP transport, e.g. with a test double
    pub transport: Option<Arc<dyn Transport>>,
    /// Replace the host environment probe
    pub env: Option<Arc<dyn Environment>>,
}

impl Analytics {
    /// Session backed by a properties dotfile and HTTP delivery
    ///
    /// Seeds `ul` with the platform locale when `LANG` is set.
    pub fn for_process(options: AnalyticsOptions, process: ProcessOptions) -> Result<Self> {
        let env: Arc<dyn Environment> = process
            .env
            .unwrap_or_else(|| Arc::new(SystemEnvironment) as Arc<dyn Environment>);

        let properties = match &process.properties_dir {
            Some(dir) => FileProperties::in_dir(&options.application_name, dir),
            None => FileProperties::with_env(&options.application_name, env.as_ref()),
        };

        let post_handler = match process.transport {
            Some(transport) => ProcessPostHandler::with_transport(transport, env.as_ref()),
            None => ProcessPostHandler::with_env(env.as_ref())?,
        };

        tracing::debug!(
            app = %options.application_name,
            properties = %properties.path().display(),
            user_agent = %post_handler.user_agent(),
            "Starting analytics session"
        );

        let analytics = Analytics::new(options, Box::new(properties), Arc::new(post_handler));
        if let Some(locale) = platform_locale(env.as_ref()) {
            analytics.set_session_value("ul", Some(&locale));
        }
        Ok(analytics)
    }
}
