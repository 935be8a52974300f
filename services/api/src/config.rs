use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// What `/chat` does when a request carries no `x-session-id` header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionIdFallback {
    /// All such requests share the session named `"default"`.
    Shared,
    /// Each such request gets a fresh id, echoed back in the response header.
    Generate,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub google_api_key: String,
    pub chat_model: String,
    pub api_base: String,
    pub upstream_timeout: Duration,
    /// `0` replays the full history.
    pub history_window: usize,
    pub session_id_fallback: SessionIdFallback,
    pub log_level: Level,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("google_api_key", &"<redacted>")
            .field("chat_model", &self.chat_model)
            .field("api_base", &self.api_base)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("history_window", &self.history_window)
            .field("session_id_fallback", &self.session_id_fallback)
            .field("log_level", &self.log_level)
            .finish()
    }
}

fn parse_var<T: std::str::FromStr>(var: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(var.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let google_api_key = std::env::var("GOOGLE_API_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                ConfigError::MissingVar("GOOGLE_API_KEY (or GEMINI_API_KEY)".to_string())
            })?;

        let chat_model =
            std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string());
        let api_base = std::env::var("GEMINI_API_BASE").unwrap_or_else(|_| {
            "https://generativelanguage.googleapis.com/v1beta".to_string()
        });

        let timeout_secs: u64 = parse_var("UPSTREAM_TIMEOUT_SECS", 30)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "UPSTREAM_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let history_window: usize = parse_var("HISTORY_WINDOW", 0)?;

        let fallback_str =
            std::env::var("SESSION_ID_FALLBACK").unwrap_or_else(|_| "shared".to_string());
        let session_id_fallback = match fallback_str.trim().to_lowercase().as_str() {
            "shared" => SessionIdFallback::Shared,
            "generate" => SessionIdFallback::Generate,
            other => {
                return Err(ConfigError::InvalidValue(
                    "SESSION_ID_FALLBACK".to_string(),
                    format!("'{}' is not one of 'shared' or 'generate'", other),
                ));
            }
        };

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address,
            google_api_key,
            chat_model,
            api_base,
            upstream_timeout: Duration::from_secs(timeout_secs),
            history_window,
            session_id_fallback,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tracing::Level;

    fn clear_env_vars() {
        unsafe {
            env::remove_var("BIND_ADDRESS");
            env::remove_var("GOOGLE_API_KEY");
            env::remove_var("GEMINI_API_KEY");
            env::remove_var("CHAT_MODEL");
            env::remove_var("GEMINI_API_BASE");
            env::remove_var("UPSTREAM_TIMEOUT_SECS");
            env::remove_var("HISTORY_WINDOW");
            env::remove_var("SESSION_ID_FALLBACK");
            env::remove_var("RUST_LOG");
        }
    }

    fn set_minimal_env() {
        unsafe {
            env::set_var("GOOGLE_API_KEY", "test-google-key");
        }
    }

    #[test]
    fn test_config_error_display() {
        let missing_var = ConfigError::MissingVar("TEST_VAR".to_string());
        assert_eq!(
            format!("{}", missing_var),
            "Missing environment variable: TEST_VAR"
        );

        let invalid_value =
            ConfigError::InvalidValue("TEST_VAR".to_string(), "bad_value".to_string());
        assert_eq!(
            format!("{}", invalid_value),
            "Invalid value for environment variable TEST_VAR: bad_value"
        );
    }

    #[test]
    #[serial]
    fn test_config_from_env_minimal() {
        clear_env_vars();
        set_minimal_env();

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "0.0.0.0:3000");
        assert_eq!(config.google_api_key, "test-google-key");
        assert_eq!(config.chat_model, "gemini-1.5-flash");
        assert_eq!(
            config.api_base,
            "https://generativelanguage.googleapis.com/v1beta"
        );
        assert_eq!(config.upstream_timeout, Duration::from_secs(30));
        assert_eq!(config.history_window, 0);
        assert_eq!(config.session_id_fallback, SessionIdFallback::Shared);
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    #[serial]
    fn test_config_accepts_gemini_key_alias() {
        clear_env_vars();
        unsafe {
            env::set_var("GEMINI_API_KEY", "alias-key");
        }

        let config = Config::from_env().expect("Config should load successfully");
        assert_eq!(config.google_api_key, "alias-key");
    }

    #[test]
    #[serial]
    fn test_config_from_env_custom_values() {
        clear_env_vars();
        unsafe {
            env::set_var("BIND_ADDRESS", "127.0.0.1:8080");
            env::set_var("GOOGLE_API_KEY", "custom-key");
            env::set_var("GEMINI_API_KEY", "ignored-key");
            env::set_var("CHAT_MODEL", "gemini-2.0-flash");
            env::set_var("GEMINI_API_BASE", "http://localhost:9000/v1beta");
            env::set_var("UPSTREAM_TIMEOUT_SECS", "5");
            env::set_var("HISTORY_WINDOW", "12");
            env::set_var("SESSION_ID_FALLBACK", "generate");
            env::set_var("RUST_LOG", "debug");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "127.0.0.1:8080");
        assert_eq!(config.google_api_key, "custom-key");
        assert_eq!(config.chat_model, "gemini-2.0-flash");
        assert_eq!(config.api_base, "http://localhost:9000/v1beta");
        assert_eq!(config.upstream_timeout, Duration::from_secs(5));
        assert_eq!(config.history_window, 12);
        assert_eq!(config.session_id_fallback, SessionIdFallback::Generate);
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    #[serial]
    fn test_config_missing_api_key() {
        clear_env_vars();

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(msg) => assert!(msg.contains("GOOGLE_API_KEY")),
            _ => panic!("Expected MissingVar for GOOGLE_API_KEY"),
        }
    }

    #[test]
    #[serial]
    fn test_config_blank_api_key_is_missing() {
        clear_env_vars();
        unsafe {
            env::set_var("GOOGLE_API_KEY", "   ");
        }

        assert!(matches!(
            Config::from_env().unwrap_err(),
            ConfigError::MissingVar(_)
        ));
    }

    #[test]
    #[serial]
    fn test_config_invalid_bind_address() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("BIND_ADDRESS", "not-a-valid-address");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "BIND_ADDRESS"),
            _ => panic!("Expected InvalidValue for BIND_ADDRESS"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("RUST_LOG", "not-a-level");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RUST_LOG"),
            _ => panic!("Expected InvalidValue for RUST_LOG"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_numeric_values() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("HISTORY_WINDOW", "lots");
        }
        match Config::from_env().unwrap_err() {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "HISTORY_WINDOW"),
            _ => panic!("Expected InvalidValue for HISTORY_WINDOW"),
        }

        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("UPSTREAM_TIMEOUT_SECS", "0");
        }
        match Config::from_env().unwrap_err() {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "UPSTREAM_TIMEOUT_SECS"),
            _ => panic!("Expected InvalidValue for UPSTREAM_TIMEOUT_SECS"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_session_id_fallback() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("SESSION_ID_FALLBACK", "random");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, reason) => {
                assert_eq!(var, "SESSION_ID_FALLBACK");
                assert!(reason.contains("random"));
            }
            _ => panic!("Expected InvalidValue for SESSION_ID_FALLBACK"),
        }
    }

    #[test]
    #[serial]
    fn test_config_debug_redacts_key() {
        clear_env_vars();
        set_minimal_env();

        let config = Config::from_env().expect("Config should load successfully");
        let debug = format!("{:?}", config);
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("test-google-key"));
    }
}
