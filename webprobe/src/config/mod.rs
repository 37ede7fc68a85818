//! Test client configuration
//!
//! Settings are layered with clear precedence:
//!
//! 1. Environment variables (highest priority, `WEBPROBE_` prefix, `__` for nesting)
//! 2. `./webprobe.toml`
//! 3. Hardcoded defaults (fallback)
//!
//! # Example Configuration
//!
//! ```toml
//! # webprobe.toml
//! scheme = "https"
//! host = "example.test:8443"
//! relative_to = "tests/fixtures"
//!
//! [extra_headers]
//! x-test-run = "nightly"
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use webprobe::config::TestAppConfig;
//!
//! # fn example() -> webprobe::error::Result<()> {
//! let config = TestAppConfig::load()?;
//! assert!(config.base_url()?.as_str().ends_with('/'));
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Result;

/// Local configuration file name
pub const CONFIG_FILE: &str = "webprobe.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "WEBPROBE_";

/// How requests are addressed and decorated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestAppConfig {
    /// URL scheme of request URLs
    pub scheme: String,

    /// Host (and optional port) of request URLs and the `Host` header
    pub host: String,

    /// Directory that filename-only uploads are read from
    pub relative_to: Option<PathBuf>,

    /// Headers added to every request
    pub extra_headers: BTreeMap<String, String>,
}

impl Default for TestAppConfig {
    fn default() -> Self {
        Self {
            scheme: "http".to_string(),
            host: "localhost".to_string(),
            relative_to: None,
            extra_headers: BTreeMap::new(),
        }
    }
}

impl TestAppConfig {
    /// Load from defaults, `./webprobe.toml` and `WEBPROBE_*` variables
    ///
    /// # Errors
    ///
    /// Returns an error if the file is not valid TOML or a value has the
    /// wrong type.
    pub fn load() -> Result<Self> {
        Self::load_from(CONFIG_FILE)
    }

    /// Load from defaults, the given file (if it exists) and `WEBPROBE_*`
    /// variables
    ///
    /// # Errors
    ///
    /// Returns an error if the file is not valid TOML or a value has the
    /// wrong type.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let config = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__").lowercase(true))
            .extract()?;
        Ok(config)
    }

    /// Set the host
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the upload directory
    #[must_use]
    pub fn relative_to(mut self, dir: impl Into<PathBuf>) -> Self {
        self.relative_to = Some(dir.into());
        self
    }

    /// Add a header sent with every request
    #[must_use]
    pub fn extra_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(name.into(), value.into());
        self
    }

    /// Root URL that request paths are resolved against
    ///
    /// # Errors
    ///
    /// Returns an error if scheme and host do not form a valid URL.
    pub fn base_url(&self) -> Result<Url> {
        Ok(Url::parse(&format!("{}://{}/", self.scheme, self.host))?)
    }

    /// Where a filename-only upload is read from
    #[must_use]
    pub fn upload_path(&self, filename: &str) -> PathBuf {
        self.relative_to
            .as_ref()
            .map_or_else(|| PathBuf::from(filename), |dir| dir.join(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = TestAppConfig::default();
        assert_eq!(config.scheme, "http");
        assert_eq!(config.host, "localhost");
        assert!(config.relative_to.is_none());
        assert_eq!(config.base_url().unwrap().as_str(), "http://localhost/");
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = TestAppConfig::load_from(path).unwrap();
        assert_eq!(config.host, TestAppConfig::default().host);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
host = "example.test:8080"
relative_to = "/srv/uploads"

[extra_headers]
x-run = "ci"
"#
        )
        .unwrap();

        let config = TestAppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.host, "example.test:8080");
        assert_eq!(config.scheme, "http");
        assert_eq!(config.extra_headers["x-run"], "ci");
        assert_eq!(
            config.upload_path("a.txt"),
            PathBuf::from("/srv/uploads/a.txt")
        );
        assert_eq!(
            config.base_url().unwrap().as_str(),
            "http://example.test:8080/"
        );
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "host = [").unwrap();
        assert!(TestAppConfig::load_from(file.path()).is_err());
    }

    #[test]
    fn test_builder() {
        let config = TestAppConfig::default()
            .host("app.test")
            .relative_to("fixtures")
            .extra_header("x-a", "1");
        assert_eq!(config.host, "app.test");
        assert_eq!(
            config.upload_path("f.txt"),
            PathBuf::from("fixtures/f.txt")
        );
        assert_eq!(config.extra_headers.len(), 1);
    }
}
