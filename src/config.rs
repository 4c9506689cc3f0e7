use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const API_URL_ENV_VAR: &str = "RECIPE_CHAT_API_URL";
pub const CACHE_DIR_ENV_VAR: &str = "RECIPE_CHAT_CACHE_DIR";
pub const TIMEOUT_ENV_VAR: &str = "RECIPE_CHAT_TIMEOUT_SECS";

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_CACHE_DIR: &str = ".recipe_chat";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub cache_dir: PathBuf,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Reads the environment (after `.env`), keeping defaults for anything unset.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup(API_URL_ENV_VAR).filter(|v| !v.trim().is_empty()) {
            config.api_url = url;
        }
        if let Some(dir) = lookup(CACHE_DIR_ENV_VAR).filter(|v| !v.trim().is_empty()) {
            config.cache_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup(TIMEOUT_ENV_VAR) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => warn!(
                    "Ignoring {}='{}', using {}s",
                    TIMEOUT_ENV_VAR, raw, DEFAULT_TIMEOUT_SECS
                ),
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(Config::from_lookup(lookup_from(&[])), Config::default());
    }

    #[test]
    fn test_overrides_from_environment() {
        let config = Config::from_lookup(lookup_from(&[
            (API_URL_ENV_VAR, "http://recipes.local:9000"),
            (CACHE_DIR_ENV_VAR, "/tmp/recipes"),
            (TIMEOUT_ENV_VAR, "15"),
        ]));
        assert_eq!(config.api_url, "http://recipes.local:9000");
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/recipes"));
        assert_eq!(config.request_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_bad_timeout_keeps_default() {
        let config = Config::from_lookup(lookup_from(&[(TIMEOUT_ENV_VAR, "soon")]));
        assert_eq!(config.request_timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }
}
