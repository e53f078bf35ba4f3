//! Filesystem-backed properties.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::{PersistentProperties, PropertyMap};
use crate::env::{user_home_dir, Environment, SystemEnvironment};
use crate::error::{Error, Result};

/// Properties stored as JSON in `<dir>/.<app_name>`
///
/// Spaces in the application name become underscores in the file name.
/// The file is created empty if it does not exist yet.
///
/// # Example
/// ```rust,no_run
/// use serde_json::json;
/// use usage_core::properties::{FileProperties, PersistentProperties};
///
/// let mut props = FileProperties::in_dir("my app", "/tmp");
/// props.set("clientId", Some(json!("abc-123")));
/// // persisted to /tmp/.my_app
/// ```
#[derive(Debug)]
pub struct FileProperties {
    name: String,
    path: PathBuf,
    map: PropertyMap,
}

impl FileProperties {
    /// Store in the user's home directory (`APPDATA` on Windows)
    pub fn new(name: &str) -> Self {
        Self::with_env(name, &SystemEnvironment)
    }

    /// Store in the home directory reported by `env`
    pub fn with_env(name: &str, env: &dyn Environment) -> Self {
        Self::in_dir(name, user_home_dir(env))
    }

    /// Store in an explicit directory
    pub fn in_dir(name: &str, dir: impl AsRef<Path>) -> Self {
        let path = dir.as_ref().join(Self::file_name(name));
        Self::from_file(name, path)
    }

    /// Store at an explicit file path
    pub fn from_file(name: &str, path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        if let Err(e) = ensure_file(&path) {
            tracing::debug!(path = %path.display(), error = %e, "Could not create properties file");
        }

        Self::load(name, path)
    }

    /// Read the store at `path` without creating the file
    ///
    /// A missing file loads as empty; the first mutation creates it.
    pub fn load(name: &str, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => Some(raw),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Could not read properties file");
                None
            }
        };

        Self {
            name: name.to_string(),
            map: PropertyMap::parse(raw.as_deref()),
            path,
        }
    }

    /// File name used for an application: `.` + name with spaces as `_`
    pub fn file_name(name: &str) -> String {
        format!(".{}", name.replace(' ', "_"))
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        let mut contents = self.map.to_json()?;
        contents.push('\n');
        fs::write(&self.path, contents).map_err(|e| {
            Error::Storage(format!("failed to write {}: {}", self.path.display(), e))
        })
    }
}

fn ensure_file(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
    }
    Ok(())
}

impl PersistentProperties for FileProperties {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.map.get(key)
    }

    fn set(&mut self, key: &str, value: Option<Value>) {
        if !self.map.apply(key, value) {
            return;
        }
        if let Err(e) = self.persist() {
            tracing::debug!(name = %self.name, error = %e, "Dropping properties write");
        }
    }
}
