//! Server configuration read from environment variables.
//!
//! - `TACTIVO_DB_PATH`: SQLite database file path (default: "tactivo.db")
//! - `TACTIVO_PORT`: Server listen port (default: 3000)
//! - `TACTIVO_FRAME_MS`: Drag frame pump interval in milliseconds (default: 16)
//! - `TACTIVO_TOAST_MS`: Notification lifetime in milliseconds (default: 2600)

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_DB_PATH: &str = "tactivo.db";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_FRAME_MS: u64 = 16;
pub const DEFAULT_TOAST_MS: u64 = 2600;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{var} must be a number, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} must be greater than zero")]
    Zero { var: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub db_path: String,
    pub port: u16,
    pub frame_interval: Duration,
    pub toast_ttl: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            db_path: DEFAULT_DB_PATH.to_string(),
            port: DEFAULT_PORT,
            frame_interval: Duration::from_millis(DEFAULT_FRAME_MS),
            toast_ttl: Duration::from_millis(DEFAULT_TOAST_MS),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ServerConfig::default();
        let frame_ms = parse_number(&lookup, "TACTIVO_FRAME_MS", DEFAULT_FRAME_MS)?;
        let toast_ms = parse_number(&lookup, "TACTIVO_TOAST_MS", DEFAULT_TOAST_MS)?;
        // tokio::time::interval panics on a zero period.
        if frame_ms == 0 {
            return Err(ConfigError::Zero {
                var: "TACTIVO_FRAME_MS",
            });
        }
        Ok(ServerConfig {
            db_path: lookup("TACTIVO_DB_PATH").unwrap_or(defaults.db_path),
            port: parse_number(&lookup, "TACTIVO_PORT", DEFAULT_PORT)?,
            frame_interval: Duration::from_millis(frame_ms),
            toast_ttl: Duration::from_millis(toast_ms),
        })
    }
}

fn parse_number<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
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
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.toast_ttl, Duration::from_millis(2600));
    }

    #[test]
    fn reads_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("TACTIVO_DB_PATH", "/tmp/t.db"),
            ("TACTIVO_PORT", "8080"),
            ("TACTIVO_FRAME_MS", "33"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, "/tmp/t.db");
        assert_eq!(config.port, 8080);
        assert_eq!(config.frame_interval, Duration::from_millis(33));
    }

    #[test]
    fn rejects_bad_numbers() {
        assert_eq!(
            ServerConfig::from_lookup(lookup(&[("TACTIVO_PORT", "http")])),
            Err(ConfigError::InvalidNumber {
                var: "TACTIVO_PORT",
                value: "http".into()
            })
        );
        assert!(ServerConfig::from_lookup(lookup(&[("TACTIVO_FRAME_MS", "0")])).is_err());
    }
}
