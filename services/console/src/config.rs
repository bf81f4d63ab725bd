//! services/console/src/config.rs
//!
//! Defines the console's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The
//! `.env` file is used for local development.

use std::path::PathBuf;
use std::time::Duration;

use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_url: String,
    pub openai_api_key: Option<String>,
    pub quiz_model: String,
    pub log_level: Level,
    pub session_file: PathBuf,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for
    /// development, but this is skipped in test environments to ensure tests
    /// are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let server_url = std::env::var("SERVER_URL")
            .map_err(|_| ConfigError::MissingVar("SERVER_URL".to_string()))?
            .trim_end_matches('/')
            .to_string();

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let session_file = std::env::var("SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./.quizr-session.json"));

        // --- Load API Key (as optional; required only for generation) ---
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();

        // --- Load Adapter-specific Settings ---
        let quiz_model =
            std::env::var("QUIZ_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string());

        let poll_interval = Duration::from_secs(parse_secs("POLL_INTERVAL_SECS", 3)?);
        let request_timeout = Duration::from_secs(parse_secs("REQUEST_TIMEOUT_SECS", 15)?);

        Ok(Self {
            server_url,
            openai_api_key,
            quiz_model,
            log_level,
            session_file,
            poll_interval,
            request_timeout,
        })
    }
}

fn parse_secs(var: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(var) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidValue(var.to_string(), raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test covering the whole surface: the variables are process-wide,
    // so the cases run sequentially in a single function.
    #[test]
    fn from_env_defaults_and_required_vars() {
        std::env::remove_var("SERVER_URL");
        std::env::remove_var("RUST_LOG");
        std::env::remove_var("SESSION_FILE");
        std::env::remove_var("QUIZ_MODEL");
        std::env::remove_var("POLL_INTERVAL_SECS");
        std::env::remove_var("REQUEST_TIMEOUT_SECS");

        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::MissingVar(var)) if var == "SERVER_URL"
        ));

        std::env::set_var("SERVER_URL", "http://backend.example/");
        let config = Config::from_env().expect("config");
        assert_eq!(config.server_url, "http://backend.example");
        assert_eq!(config.quiz_model, "gpt-3.5-turbo");
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.log_level, Level::INFO);

        std::env::set_var("POLL_INTERVAL_SECS", "ten");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::InvalidValue(var, _)) if var == "POLL_INTERVAL_SECS"
        ));
        std::env::set_var("POLL_INTERVAL_SECS", "10");
        let config = Config::from_env().expect("config");
        assert_eq!(config.poll_interval, Duration::from_secs(10));

        std::env::remove_var("SERVER_URL");
        std::env::remove_var("POLL_INTERVAL_SECS");
    }
}
