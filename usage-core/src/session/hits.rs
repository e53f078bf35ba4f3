//! Hit builders.

use web_time::Instant;

use super::Analytics;
use crate::payload::Payload;

/// Exception descriptions are cut to this many characters
const MAX_EXCEPTION_LENGTH: usize = 1000;

/// A user interaction, sent with [`Analytics::send_event`]
///
/// Extra parameters (custom dimensions such as `cd1`) are passed through
/// unvalidated.
#[derive(Debug, Clone)]
pub struct Event {
    category: String,
    action: String,
    label: Option<String>,
    value: Option<i64>,
    parameters: Payload,
}

impl Event {
    pub fn new(category: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            action: action.into(),
            label: None,
            value: None,
            parameters: Payload::new(),
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn value(mut self, value: i64) -> Self {
        self.value = Some(value);
        self
    }

    /// Add an extra hit parameter
    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.set(key, value);
        self
    }

    pub(crate) fn into_payload(self) -> Payload {
        let mut args = Payload::new()
            .with("ec", self.category)
            .with("ea", self.action);
        if let Some(label) = self.label {
            args.set("el", label);
        }
        if let Some(value) = self.value {
            args.set("ev", value.to_string());
        }
        args.extend(self.parameters.iter());
        args
    }
}

/// A measured duration, sent with [`Analytics::send_timing`]
#[derive(Debug, Clone)]
pub struct Timing {
    variable_name: String,
    millis: u64,
    category: Option<String>,
    label: Option<String>,
}

impl Timing {
    pub fn new(variable_name: impl Into<String>, millis: u64) -> Self {
        Self {
            variable_name: variable_name.into(),
            millis,
            category: None,
            label: None,
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub(crate) fn into_payload(self) -> Payload {
        let mut args = Payload::new()
            .with("utv", self.variable_name)
            .with("utt", self.millis.to_string());
        if let Some(category) = self.category {
            args.set("utc", category);
        }
        if let Some(label) = self.label {
            args.set("utl", label);
        }
        args
    }
}

/// Running timer from [`Analytics::start_timer`]
#[derive(Debug)]
pub struct AnalyticsTimer {
    variable_name: String,
    category: Option<String>,
    label: Option<String>,
    started: Instant,
}

impl AnalyticsTimer {
    pub(crate) fn start(variable_name: &str, category: Option<&str>, label: Option<&str>) -> Self {
        Self {
            variable_name: variable_name.to_string(),
            category: category.map(str::to_string),
            label: label.map(str::to_string),
            started: Instant::now(),
        }
    }

    /// Milliseconds since the timer started
    pub fn elapsed_millis(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Stop the timer and send the elapsed time as a timing hit
    pub async fn finish(self, analytics: &Analytics) {
        let millis = self.elapsed_millis();
        let timing = Timing {
            variable_name: self.variable_name,
            millis,
            category: self.category,
            label: self.label,
        };
        analytics.send_timing(timing).await;
    }
}

/// Make an exception description safe to send
///
/// Drops everything from the first `file:/` (local paths in stack traces),
/// flattens newlines to `; `, then cuts the result to 1000 characters.
pub fn sanitize_exception(description: &str) -> String {
    let description = match description.find("file:/") {
        Some(idx) => &description[..idx],
        None => description,
    };
    description
        .replace('\n', "; ")
        .chars()
        .take(MAX_EXCEPTION_LENGTH)
        .collect()
}
