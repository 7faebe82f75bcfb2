use crate::asset_host::DEFAULT_UPLOAD_URL;
use clap::ArgMatches;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_API_KEY: &str = "ASSET_HOST_API_KEY";
pub const ENV_UPLOAD_URL: &str = "ASSET_UPLOAD_URL";
pub const ENV_DB_URL: &str = "CATALOG_DB_URL";
pub const ENV_BUILD_HOOK_URL: &str = "BUILD_HOOK_URL";
pub const ENV_EVENT_LOG: &str = "CATALOGPOST_EVENT_LOG";
pub const ENV_DOTENV_FILE: &str = "CATALOGPOST_ENV_FILE";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing configuration: set {0} or pass the matching flag")]
    Missing(&'static str),
    #[error("Cannot open event log {0}: {1}")]
    EventLog(String, std::io::Error),
}

/// Load a `.env` file into the process environment. Variables that are
/// already set keep their value. `file` picks an explicit path, otherwise
/// `.env` is searched from the working directory upwards. A missing file is
/// not an error.
pub fn load_dotenv(file: Option<&Path>) -> Result<Option<PathBuf>, dotenvy::Error> {
    let loaded = match file {
        Some(path) => dotenvy::from_path(path).map(|_| path.to_path_buf()),
        None => dotenvy::dotenv(),
    };
    match loaded {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Runtime configuration, taken from the environment with flag overrides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_key: Option<String>,
    pub upload_url: String,
    pub db_url: Option<String>,
    pub build_hook_url: Option<String>,
    pub event_log: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_key: None,
            upload_url: DEFAULT_UPLOAD_URL.to_string(),
            db_url: None,
            build_hook_url: None,
            event_log: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Config::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Config {
            api_key: get(ENV_API_KEY),
            upload_url: get(ENV_UPLOAD_URL).unwrap_or_else(|| DEFAULT_UPLOAD_URL.to_string()),
            db_url: get(ENV_DB_URL),
            build_hook_url: get(ENV_BUILD_HOOK_URL),
            event_log: get(ENV_EVENT_LOG),
        }
    }

    /// Values from the global flags; clap already falls back to the environment
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let get = |id: &str| {
            matches
                .get_one::<String>(id)
                .filter(|v| !v.trim().is_empty())
                .cloned()
        };
        Config {
            api_key: get("api-key"),
            upload_url: get("upload-url").unwrap_or_else(|| DEFAULT_UPLOAD_URL.to_string()),
            db_url: get("db-url"),
            build_hook_url: get("build-hook-url"),
            event_log: get("event-log"),
        }
    }

    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or(ConfigError::Missing(ENV_API_KEY))
    }

    pub fn require_db_url(&self) -> Result<&str, ConfigError> {
        self.db_url.as_deref().ok_or(ConfigError::Missing(ENV_DB_URL))
    }

    pub fn require_build_hook_url(&self) -> Result<&str, ConfigError> {
        self.build_hook_url
            .as_deref()
            .ok_or(ConfigError::Missing(ENV_BUILD_HOOK_URL))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn reads_all_variables() {
        let config = Config::from_lookup(lookup(&[
            (ENV_API_KEY, "k"),
            (ENV_UPLOAD_URL, "http://127.0.0.1:9000/upload"),
            (ENV_DB_URL, "http://127.0.0.1:9001/items"),
            (ENV_BUILD_HOOK_URL, "http://127.0.0.1:9002/hook"),
        ]));
        assert_eq!(config.require_api_key().unwrap(), "k");
        assert_eq!(config.upload_url, "http://127.0.0.1:9000/upload");
        assert_eq!(config.require_db_url().unwrap(), "http://127.0.0.1:9001/items");
        assert_eq!(config.require_build_hook_url().unwrap(), "http://127.0.0.1:9002/hook");
        assert_eq!(config.event_log, None);
    }

    #[test]
    fn upload_url_defaults() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config.upload_url, DEFAULT_UPLOAD_URL);
    }

    #[test]
    fn dotenv_file_values_are_loaded() {
        let var = format!("CATALOGPOST_TEST_{}", uuid::Uuid::new_v4().simple()).to_uppercase();
        let path = std::env::temp_dir().join(format!("catalogpost-{}.env", uuid::Uuid::new_v4()));
        std::fs::write(&path, format!("{}=from-dotenv\n", var)).unwrap();

        assert_eq!(load_dotenv(Some(&path)).unwrap(), Some(path.clone()));
        assert_eq!(std::env::var(&var).unwrap(), "from-dotenv");

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_dotenv_file_is_tolerated() {
        let path = std::env::temp_dir().join(format!("catalogpost-{}.env", uuid::Uuid::new_v4()));
        assert_eq!(load_dotenv(Some(&path)).unwrap(), None);
    }

    #[test]
    fn blank_values_count_as_missing() {
        let config = Config::from_lookup(lookup(&[(ENV_API_KEY, "  "), (ENV_DB_URL, "")]));
        assert!(matches!(config.require_api_key(), Err(ConfigError::Missing(ENV_API_KEY))));
        assert!(matches!(config.require_db_url(), Err(ConfigError::Missing(ENV_DB_URL))));
        assert!(matches!(
            config.require_build_hook_url(),
            Err(ConfigError::Missing(ENV_BUILD_HOOK_URL))
        ));
    }
}
