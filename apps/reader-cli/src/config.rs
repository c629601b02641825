//! TOML configuration for the reader CLI
//!
//! ```toml
//! [api]
//! base_url = "https://library.example.edu/api"
//! timeout_secs = 20
//!
//! [session]
//! file = "/home/me/.config/elibrary/elibrary-auth-v2.json"
//! ```
//!
//! Command-line flags and their environment variables win over the file.

use anyhow::Context;
use elibrary_client::{ClientConfig, SessionFile, DEFAULT_BASE_URL};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "reader.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// Where the signed-in session is kept
    pub file: Option<PathBuf>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }

    /// `<config dir>/elibrary/reader.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("elibrary").join(CONFIG_FILE_NAME))
    }

    /// Load an explicit file, else the default file when it exists, else
    /// built-in defaults
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(path),
            _ => Ok(Self::default()),
        }
    }

    /// Overlay command-line values
    pub fn with_overrides(mut self, base_url: Option<String>, session_file: Option<PathBuf>) -> Self {
        if let Some(url) = base_url {
            self.api.base_url = url;
        }
        if session_file.is_some() {
            self.session.file = session_file;
        }
        self
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.api.base_url.clone())
            .with_timeout(Duration::from_secs(self.api.timeout_secs))
    }

    pub fn session_file(&self) -> anyhow::Result<SessionFile> {
        match &self.session.file {
            Some(path) => Ok(SessionFile::new(path)),
            None => SessionFile::default_location().context("Cannot locate the session file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.api.base_url, "http://localhost:8000/api");
        assert_eq!(config.client_config().timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_partial_config() {
        let config = Config::from_str(
            r#"
            [api]
            base_url = "https://library.example.edu/api"
        "#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://library.example.edu/api");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.session.file, None);
    }

    #[test]
    fn test_overrides_win() {
        let config = Config::from_str(
            r#"
            [api]
            base_url = "https://a.example/api"
            timeout_secs = 5

            [session]
            file = "/tmp/a.json"
        "#,
        )
        .unwrap()
        .with_overrides(Some("https://b.example/api".to_string()), None);

        assert_eq!(config.api.base_url, "https://b.example/api");
        assert_eq!(config.session.file, Some(PathBuf::from("/tmp/a.json")));
        assert_eq!(
            config.session_file().unwrap().path(),
            Path::new("/tmp/a.json")
        );
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        assert!(Config::from_str("[api\nbase_url = 1").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[api]\ntimeout_secs = 3\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.api.timeout_secs, 3);

        let missing = dir.path().join("nope.toml");
        assert!(Config::load(Some(&missing)).is_err());
    }
}
