//! Centralized configuration management for cvm-fii

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Base directory used when neither `CVM_FII_BASE_DIR` nor `--base-dir` is set
pub const DEFAULT_BASE_DIR: &str = "dados_cvm_fii";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory where archives are cached, extracted and consolidated
    pub base_dir: PathBuf,
    /// Directory for the log file
    pub log_dir: PathBuf,
    /// HTTP client configuration
    pub http: HttpConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
    /// Attempts per archive download (at least one)
    pub download_retries: u32,
    /// Delay between download attempts (milliseconds)
    pub retry_delay_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 60,
            user_agent: default_user_agent(),
            download_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(DEFAULT_BASE_DIR),
            log_dir: PathBuf::from("."),
            http: HttpConfig::default(),
        }
    }
}

fn default_user_agent() -> String {
    format!("cvm-fii/{}", env!("CARGO_PKG_VERSION"))
}

impl Config {
    /// Load configuration from environment variables and defaults
    pub fn from_env() -> Result<Self> {
        let defaults = HttpConfig::default();

        let base_dir = std::env::var("CVM_FII_BASE_DIR")
            .unwrap_or_else(|_| DEFAULT_BASE_DIR.to_string())
            .into();

        let log_dir = std::env::var("CVM_FII_LOG_DIR")
            .unwrap_or_else(|_| ".".to_string())
            .into();

        let http = HttpConfig {
            timeout_seconds: parse_env_var("CVM_FII_HTTP_TIMEOUT_SECONDS")?
                .unwrap_or(defaults.timeout_seconds),
            user_agent: std::env::var("CVM_FII_USER_AGENT").unwrap_or(defaults.user_agent),
            download_retries: parse_env_var("CVM_FII_DOWNLOAD_RETRIES")?
                .unwrap_or(defaults.download_retries),
            retry_delay_ms: parse_env_var("CVM_FII_RETRY_DELAY_MS")?
                .unwrap_or(defaults.retry_delay_ms),
        };

        Ok(Config {
            base_dir,
            log_dir,
            http,
        })
    }

    /// Replace the base directory, e.g. from a command line flag
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Get HTTP timeout as Duration
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }

    /// Get delay between download attempts as Duration
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.http.retry_delay_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.http.download_retries == 0 {
            return Err(anyhow::anyhow!(
                "CVM_FII_DOWNLOAD_RETRIES must be at least 1"
            ));
        }

        std::fs::create_dir_all(&self.base_dir).with_context(|| {
            format!("Cannot create base directory: {}", self.base_dir.display())
        })?;

        Ok(())
    }
}

/// Helper function to parse environment variable as a specific type
fn parse_env_var<T>(var_name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display + Send + Sync + std::error::Error + 'static,
{
    match std::env::var(var_name) {
        Ok(val) => val.parse().map(Some).with_context(|| {
            format!("Failed to parse environment variable {} = '{}'", var_name, val)
        }),
        Err(_) => Ok(None),
    }
}
