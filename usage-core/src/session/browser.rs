//! Session wiring for browser pages.

use std::sync::Arc;

use super::{Analytics, AnalyticsOptions};
use crate::post::{BrowserHost, BrowserPostHandler};
use crate::properties::{BrowserProperties, WebStorage};

impl Analytics {
    /// Session backed by web storage and the page's request facility
    ///
    /// Seeds `sr` (screen size), `sd` (color depth) and `ul` (browser
    /// language) from the host.
    pub fn for_browser<S, H>(options: AnalyticsOptions, storage: S, host: Arc<H>) -> Self
    where
        S: WebStorage + 'static,
        H: BrowserHost + 'static,
    {
        let properties = BrowserProperties::new(&options.application_name, storage);
        let screen = host.screen();
        let language = host.language();

        let analytics = Analytics::new(
            options,
            Box::new(properties),
            Arc::new(BrowserPostHandler::new(host)),
        );
        analytics.set_session_value("sr", Some(&format!("{}x{}", screen.width, screen.height)));
        analytics.set_session_value("sd", Some(&format!("{}-bits", screen.pixel_depth)));
        if let Some(language) = language {
            analytics.set_session_value("ul", Some(&language));
        }
        analytics
    }
}
