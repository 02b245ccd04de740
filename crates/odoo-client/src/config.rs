//! Connection configuration
//!
//! Resolved from code, the environment (`ODOO_*` variables) or a JSON file
//! under `~/.odoo-client/`.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{OdooError, OdooResult};

pub const ENV_URL: &str = "ODOO_URL";
pub const ENV_DB: &str = "ODOO_DB";
pub const ENV_USERNAME: &str = "ODOO_USERNAME";
pub const ENV_PASSWORD: &str = "ODOO_PASSWORD";
pub const ENV_TIMEOUT: &str = "ODOO_TIMEOUT_SECS";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Zero would make every request time out immediately.
pub fn validate_timeout(timeout_secs: u64) -> OdooResult<u64> {
    if timeout_secs == 0 {
        return Err(OdooError::Config("timeout must be at least 1 second".to_string()));
    }
    Ok(timeout_secs)
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server base URL, e.g. `https://erp.example.com`
    pub url: String,
    pub database: String,
    pub username: String,
    /// Password or API key
    pub password: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl ClientConfig {
    pub fn new(
        url: impl Into<String>,
        database: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            database: database.into(),
            username: username.into(),
            password: password.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Read `ODOO_URL`, `ODOO_DB`, `ODOO_USERNAME`, `ODOO_PASSWORD` and the
    /// optional `ODOO_TIMEOUT_SECS`.
    pub fn from_env() -> OdooResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> OdooResult<Self> {
        let required = |key: &str| {
            lookup(key).filter(|v| !v.is_empty()).ok_or_else(|| {
                OdooError::Config(format!("environment variable {} is not set", key))
            })
        };

        let timeout_secs = match lookup(ENV_TIMEOUT) {
            Some(raw) => raw.trim().parse().map_err(|_| {
                OdooError::Config(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    ENV_TIMEOUT, raw
                ))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        let timeout_secs = validate_timeout(timeout_secs)?;

        Ok(Self {
            url: required(ENV_URL)?,
            database: required(ENV_DB)?,
            username: required(ENV_USERNAME)?,
            password: required(ENV_PASSWORD)?,
            timeout_secs,
        })
    }

    /// Load a config from a JSON file
    pub fn load(path: &Path) -> OdooResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            OdooError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: Self = serde_json::from_str(&content).map_err(|e| {
            OdooError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        validate_timeout(config.timeout_secs)?;
        Ok(config)
    }

    /// `~/.odoo-client/config.json`
    pub fn default_path() -> OdooResult<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| OdooError::Config("home directory unavailable".to_string()))?;
        Ok(home.join(".odoo-client").join("config.json"))
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_complete() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_URL, "https://erp.example.com"),
            (ENV_DB, "prod"),
            (ENV_USERNAME, "admin"),
            (ENV_PASSWORD, "secret"),
            (ENV_TIMEOUT, "5"),
        ]))
        .unwrap();

        assert_eq!(
            config,
            ClientConfig::new("https://erp.example.com", "prod", "admin", "secret").with_timeout(5)
        );
    }

    #[test]
    fn test_from_lookup_missing_variable() {
        let err = ClientConfig::from_lookup(lookup(&[
            (ENV_URL, "https://erp.example.com"),
            (ENV_USERNAME, "admin"),
            (ENV_PASSWORD, "secret"),
        ]))
        .unwrap_err();

        assert!(err.to_string().contains(ENV_DB));
    }

    #[test]
    fn test_from_lookup_bad_timeout() {
        let err = ClientConfig::from_lookup(lookup(&[
            (ENV_URL, "http://localhost:8069"),
            (ENV_DB, "prod"),
            (ENV_USERNAME, "admin"),
            (ENV_PASSWORD, "secret"),
            (ENV_TIMEOUT, "soon"),
        ]))
        .unwrap_err();

        assert!(matches!(err, OdooError::Config(_)));
    }

    #[test]
    fn test_from_lookup_zero_timeout() {
        let err = ClientConfig::from_lookup(lookup(&[
            (ENV_URL, "http://localhost:8069"),
            (ENV_DB, "prod"),
            (ENV_USERNAME, "admin"),
            (ENV_PASSWORD, "secret"),
            (ENV_TIMEOUT, "0"),
        ]))
        .unwrap_err();

        assert!(matches!(err, OdooError::Config(_)));
        assert!(err.to_string().contains("at least 1 second"));
    }

    fn temp_config(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir()
            .join(format!("odoo-client-{}-{}.json", name, std::process::id()));
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_load_rejects_zero_timeout() {
        let path = temp_config(
            "zero-timeout",
            r#"{"url":"http://localhost:8069","database":"dev","username":"admin",
                "password":"admin","timeout_secs":0}"#,
        );

        let result = ClientConfig::load(&path);
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(OdooError::Config(_))));
    }

    #[test]
    fn test_load_json_file_with_default_timeout() {
        let path = temp_config(
            "default-timeout",
            r#"{"url":"http://localhost:8069","database":"dev","username":"admin",
                "password":"admin"}"#,
        );

        let config = ClientConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.database, "dev");
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_load_missing_file() {
        let err = ClientConfig::load(Path::new("/nonexistent/odoo-client.json")).unwrap_err();
        assert!(matches!(err, OdooError::Config(_)));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = ClientConfig::new("http://localhost:8069", "dev", "admin", "hunter2");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
