//! Service configuration read from the environment.

use std::{env, str::FromStr};

use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "postgres://docker:pg@0.0.0.0";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_PUSH_CHANNEL_CAPACITY: usize = 64;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a number, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("PUSH_CHANNEL_CAPACITY must be greater than zero")]
    ZeroCapacity,

    #[error("unknown STORE_BACKEND {0:?}, expected \"postgres\" or \"memory\"")]
    UnknownBackend(String),
}

/// Where documents are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreBackend {
    #[default]
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(ConfigError::UnknownBackend(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub store_backend: StoreBackend,
    pub port: u16,
    pub push_channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            store_backend: StoreBackend::default(),
            port: DEFAULT_PORT,
            push_channel_capacity: DEFAULT_PUSH_CHANNEL_CAPACITY,
        }
    }
}

impl Config {
    /// Read `DATABASE_URL`, `STORE_BACKEND`, `PORT`, and `PUSH_CHANNEL_CAPACITY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            store_backend: match lookup("STORE_BACKEND") {
                Some(raw) => raw.parse()?,
                None => defaults.store_backend,
            },
            port: parse_number(&lookup, "PORT")?.unwrap_or(defaults.port),
            push_channel_capacity: parse_number(&lookup, "PUSH_CHANNEL_CAPACITY")?
                .unwrap_or(defaults.push_channel_capacity),
        };

        if config.push_channel_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(config)
    }
}

fn parse_number<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    lookup(name)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber { name, value })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.port, 3001);
        assert_eq!(config.store_backend, StoreBackend::Postgres);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/jobs"),
            ("STORE_BACKEND", "Memory"),
            ("PORT", "8080"),
            ("PUSH_CHANNEL_CAPACITY", "8"),
        ]))
        .unwrap();

        assert_eq!(config.database_url, "postgres://db/jobs");
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.port, 8080);
        assert_eq!(config.push_channel_capacity, 8);
    }

    #[test]
    fn test_invalid_port() {
        let err = Config::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidNumber {
                name: "PORT",
                value: "eighty".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_backend() {
        let err = Config::from_lookup(lookup(&[("STORE_BACKEND", "mongo")])).unwrap_err();
        assert_eq!(err, ConfigError::UnknownBackend("mongo".to_string()));
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let err = Config::from_lookup(lookup(&[("PUSH_CHANNEL_CAPACITY", "0")])).unwrap_err();
        assert_eq!(err, ConfigError::ZeroCapacity);
    }
}
