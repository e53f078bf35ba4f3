//! Host environment probing
//!
//! Every read of ambient host state (environment variables, OS identity)
//! goes through [`Environment`], so adapters can be pointed at a
//! [`StaticEnvironment`] instead of the real process.

use std::collections::HashMap;
use std::path::PathBuf;

/// Operating system families recognized when building a user agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OsFamily {
    Android,
    Ios,
    MacOs,
    Windows,
    Linux,
    /// Anything else, carrying the raw OS name (e.g. "freebsd")
    Other(String),
}

impl OsFamily {
    /// Map a `std::env::consts::OS` style name to a family
    pub fn from_os_name(name: &str) -> Self {
        match name {
            "android" => OsFamily::Android,
            "ios" => OsFamily::Ios,
            "macos" => OsFamily::MacOs,
            "windows" => OsFamily::Windows,
            "linux" => OsFamily::Linux,
            other => OsFamily::Other(other.to_string()),
        }
    }

    /// The raw OS name this family was detected from
    pub fn name(&self) -> &str {
        match self {
            OsFamily::Android => "android",
            OsFamily::Ios => "ios",
            OsFamily::MacOs => "macos",
            OsFamily::Windows => "windows",
            OsFamily::Linux => "linux",
            OsFamily::Other(name) => name,
        }
    }
}

/// Read-only view of the host environment
pub trait Environment: Send + Sync {
    /// Value of an environment variable, if set and valid unicode
    fn var(&self, key: &str) -> Option<String>;

    /// Operating system the process runs on
    fn os(&self) -> OsFamily;
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn os(&self) -> OsFamily {
        OsFamily::from_os_name(std::env::consts::OS)
    }
}

/// Fixed environment for tests and embedding
#[derive(Debug, Clone)]
pub struct StaticEnvironment {
    vars: HashMap<String, String>,
    os: OsFamily,
}

impl StaticEnvironment {
    /// Empty environment reporting the given OS
    pub fn new(os: OsFamily) -> Self {
        Self {
            vars: HashMap::new(),
            os,
        }
    }

    /// Add a variable
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl Environment for StaticEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn os(&self) -> OsFamily {
        self.os.clone()
    }
}

/// Derive the user's locale from `LANG`
///
/// `en_US.UTF-8` becomes `en-us`. Returns `None` when `LANG` is unset.
pub fn platform_locale(env: &dyn Environment) -> Option<String> {
    let lang = env.var("LANG")?;
    let base = lang.split('.').next().unwrap_or_default();
    Some(base.replace('_', "-").to_lowercase())
}

/// Directory holding per-application property files
///
/// `APPDATA` on Windows, `HOME` elsewhere, `.` when neither is set.
pub fn user_home_dir(env: &dyn Environment) -> PathBuf {
    let key = match env.os() {
        OsFamily::Windows => "APPDATA",
        _ => "HOME",
    };
    env.var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_locale_strips_encoding() {
        let env = StaticEnvironment::new(OsFamily::Linux).with_var("LANG", "en_US.UTF-8");
        assert_eq!(platform_locale(&env).as_deref(), Some("en-us"));
    }

    #[test]
    fn test_platform_locale_without_encoding() {
        let env = StaticEnvironment::new(OsFamily::Linux).with_var("LANG", "pt_BR");
        assert_eq!(platform_locale(&env).as_deref(), Some("pt-br"));
    }

    #[test]
    fn test_platform_locale_unset() {
        let env = StaticEnvironment::new(OsFamily::Linux);
        assert_eq!(platform_locale(&env), None);
    }

    #[test]
    fn test_user_home_dir_by_os() {
        let env = StaticEnvironment::new(OsFamily::Windows)
            .with_var("APPDATA", "C:\\Users\\me\\AppData")
            .with_var("HOME", "/home/me");
        assert_eq!(user_home_dir(&env), PathBuf::from("C:\\Users\\me\\AppData"));

        let env = StaticEnvironment::new(OsFamily::MacOs)
            .with_var("APPDATA", "C:\\Users\\me\\AppData")
            .with_var("HOME", "/Users/me");
        assert_eq!(user_home_dir(&env), PathBuf::from("/Users/me"));
    }

    #[test]
    fn test_user_home_dir_fallback() {
        let env = StaticEnvironment::new(OsFamily::Linux);
        assert_eq!(user_home_dir(&env), PathBuf::from("."));
    }

    #[test]
    fn test_os_family_round_trip_names() {
        assert_eq!(OsFamily::from_os_name("macos"), OsFamily::MacOs);
        assert_eq!(
            OsFamily::from_os_name("freebsd"),
            OsFamily::Other("freebsd".to_string())
        );
        assert_eq!(OsFamily::Other("haiku".to_string()).name(), "haiku");
    }
}
