//! Configuration module for the coffee shift backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_DB_PATH: &str = "./data/coffee.sqlite";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_GENERATOR_TIMEOUT_SECS: u64 = 30;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication (required in production)
    pub api_psk: Option<String>,
    /// Key granting the Admin actor via `x-admin-key`
    pub admin_key: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Remote schedule generator endpoint; the built-in greedy generator is used when unset
    pub generator_url: Option<String>,
    pub generator_token: Option<String>,
    /// Upper bound on a single generation call
    pub generator_timeout: Duration,
    /// Insert the demo roster into an empty database
    pub seed_demo: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let db_path = env::var("COFFEE_DB_PATH")
            .unwrap_or_else(|_| DEFAULT_DB_PATH.to_string())
            .into();

        let bind_addr = env::var("COFFEE_BIND_ADDR")
            .ok()
            .and_then(|raw| match raw.parse() {
                Ok(addr) => Some(addr),
                Err(_) => {
                    tracing::warn!("Invalid COFFEE_BIND_ADDR '{}', using {}", raw, DEFAULT_BIND_ADDR);
                    None
                }
            })
            .unwrap_or_else(default_bind_addr);

        let log_level = env::var("COFFEE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let generator_timeout = env::var("COFFEE_GENERATOR_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Some(secs),
                _ => {
                    tracing::warn!(
                        "Invalid COFFEE_GENERATOR_TIMEOUT_SECS '{}', using {}",
                        raw,
                        DEFAULT_GENERATOR_TIMEOUT_SECS
                    );
                    None
                }
            })
            .unwrap_or(DEFAULT_GENERATOR_TIMEOUT_SECS);

        let seed_demo = env::var("COFFEE_SEED_DEMO")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            api_psk: non_empty_var("COFFEE_API_PSK"),
            admin_key: non_empty_var("COFFEE_ADMIN_KEY"),
            db_path,
            bind_addr,
            log_level,
            generator_url: non_empty_var("COFFEE_GENERATOR_URL"),
            generator_token: non_empty_var("COFFEE_GENERATOR_TOKEN"),
            generator_timeout: Duration::from_secs(generator_timeout),
            seed_demo,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        for key in [
            "COFFEE_API_PSK",
            "COFFEE_ADMIN_KEY",
            "COFFEE_DB_PATH",
            "COFFEE_BIND_ADDR",
            "COFFEE_LOG_LEVEL",
            "COFFEE_GENERATOR_URL",
            "COFFEE_GENERATOR_TOKEN",
            "COFFEE_GENERATOR_TIMEOUT_SECS",
            "COFFEE_SEED_DEMO",
        ] {
            env::remove_var(key);
        }

        let config = Config::from_env();

        assert!(config.api_psk.is_none());
        assert!(config.admin_key.is_none());
        assert_eq!(config.db_path, PathBuf::from("./data/coffee.sqlite"));
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.log_level, "info");
        assert!(config.generator_url.is_none());
        assert_eq!(config.generator_timeout, Duration::from_secs(30));
        assert!(!config.seed_demo);
    }
}
