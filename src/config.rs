//! Runtime configuration: positional data directory + `ATHENAEUM_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::application::catalog::GUTENDEX_BASE_URL;

pub const ENV_DATA_DIR: &str = "ATHENAEUM_DATA_DIR";
pub const ENV_API_URL: &str = "ATHENAEUM_API_URL";
pub const ENV_HTTP_TIMEOUT: &str = "ATHENAEUM_HTTP_TIMEOUT_SECS";

pub const DEFAULT_DATA_DIR: &str = "athenaeum-data";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("ATHENAEUM_HTTP_TIMEOUT_SECS must be a positive number of seconds, got {0:?}")]
    InvalidTimeout(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// ブックマークのスロットファイルを置くディレクトリ
    pub data_dir: PathBuf,
    pub api_url: String,
    pub http_timeout: Duration,
}

impl Config {
    /// プロセスの引数と環境変数から解決する。
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(std::env::args().nth(1), |key| std::env::var(key).ok())
    }

    /// 優先順位: 位置引数 > 環境変数 > 既定値
    pub fn resolve(
        arg: Option<String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let data_dir = arg
            .or_else(|| env(ENV_DATA_DIR))
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let api_url = env(ENV_API_URL)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| GUTENDEX_BASE_URL.to_string());

        let http_timeout = match env(ENV_HTTP_TIMEOUT) {
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidTimeout(raw)),
            },
        };

        Ok(Self {
            data_dir,
            api_url,
            http_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::resolve(None, env_of(&[])).unwrap();
        assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(config.api_url, GUTENDEX_BASE_URL);
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn arg_wins_over_env() {
        let env = env_of(&[(ENV_DATA_DIR, "/from/env")]);
        let config = Config::resolve(Some("/from/arg".into()), env).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/from/arg"));

        let env = env_of(&[(ENV_DATA_DIR, "/from/env")]);
        let config = Config::resolve(None, env).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/from/env"));
    }

    #[test]
    fn env_overrides() {
        let env = env_of(&[
            (ENV_API_URL, "http://localhost:8000"),
            (ENV_HTTP_TIMEOUT, "5"),
        ]);
        let config = Config::resolve(None, env).unwrap();
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.http_timeout, Duration::from_secs(5));
    }

    #[test]
    fn invalid_timeout() {
        for bad in ["0", "abc", "-3"] {
            let env = env_of(&[(ENV_HTTP_TIMEOUT, bad)]);
            assert!(Config::resolve(None, env).is_err(), "{bad} should be rejected");
        }
    }
}
