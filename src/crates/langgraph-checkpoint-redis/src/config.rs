//! Connection settings for the Redis savers
//!
//! [`RedisConfig`] carries host, port, logical database index, optional credentials and the
//! pool size. It deserializes with serde (so it can sit inside a YAML or TOML application
//! config) and can be read from the environment:
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `REDIS_HOST` | `host` | `127.0.0.1` |
//! | `REDIS_PORT` | `port` | `6379` |
//! | `REDIS_DB` | `db` | `0` |
//! | `REDIS_USERNAME` | `username` | unset |
//! | `REDIS_PASSWORD` | `password` | unset |
//! | `REDIS_POOL_SIZE` | `pool_size` | `8` |

use langgraph_checkpoint::{CheckpointError, Result};
use redis::{ConnectionInfo, IntoConnectionInfo};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 6379;
pub const DEFAULT_POOL_SIZE: u32 = 8;

/// Redis connection and pool settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    /// Logical database index
    pub db: i64,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// Maximum pooled connections
    pub pool_size: u32,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            db: 0,
            username: None,
            password: None,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl RedisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: String) -> Self {
        self.host = host;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_db(mut self, db: i64) -> Self {
        self.db = db;
        self
    }

    pub fn with_credentials(mut self, username: Option<String>, password: String) -> Self {
        self.username = username;
        self.password = Some(password);
        self
    }

    pub fn with_pool_size(mut self, pool_size: u32) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Read settings from `REDIS_*` environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("REDIS_HOST") {
            config.host = host;
        }
        if let Some(port) = parse_var(&lookup, "REDIS_PORT")? {
            config.port = port;
        }
        if let Some(db) = parse_var(&lookup, "REDIS_DB")? {
            config.db = db;
        }
        if let Some(pool_size) = parse_var(&lookup, "REDIS_POOL_SIZE")? {
            config.pool_size = pool_size;
        }
        config.username = lookup("REDIS_USERNAME");
        config.password = lookup("REDIS_PASSWORD");

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that cannot describe a usable connection
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(CheckpointError::Configuration(
                "redis host must not be empty".to_string(),
            ));
        }
        if self.port == 0 {
            return Err(CheckpointError::Configuration(
                "redis port must be non-zero".to_string(),
            ));
        }
        if self.db < 0 {
            return Err(CheckpointError::Configuration(format!(
                "redis db index must be non-negative, got {}",
                self.db
            )));
        }
        if self.pool_size == 0 {
            return Err(CheckpointError::Configuration(
                "pool_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Client connection parameters
    pub fn to_connection_info(&self) -> Result<ConnectionInfo> {
        self.validate()?;

        let mut info = (self.host.clone(), self.port)
            .into_connection_info()
            .map_err(|err| CheckpointError::Configuration(err.to_string()))?;
        info.redis.db = self.db;
        info.redis.username = self.username.clone();
        info.redis.password = self.password.clone();
        Ok(info)
    }

    /// `redis://host:port/db`, without credentials, for log output
    pub fn display_url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map(Some).map_err(|err: T::Err| {
            CheckpointError::Configuration(format!("invalid {name} value {raw:?}: {err}"))
        }),
        None => Ok(None),
    }
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
        let config = RedisConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, RedisConfig::default());
        assert_eq!(config.display_url(), "redis://127.0.0.1:6379/0");
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = RedisConfig::from_lookup(lookup(&[
            ("REDIS_HOST", "cache.internal"),
            ("REDIS_PORT", "6380"),
            ("REDIS_DB", "3"),
            ("REDIS_PASSWORD", "s3cret"),
            ("REDIS_POOL_SIZE", "2"),
        ]))
        .unwrap();

        assert_eq!(config.host, "cache.internal");
        assert_eq!(config.port, 6380);
        assert_eq!(config.db, 3);
        assert_eq!(config.password.as_deref(), Some("s3cret"));
        assert_eq!(config.pool_size, 2);
    }

    #[test]
    fn test_invalid_port_is_configuration_error() {
        let err = RedisConfig::from_lookup(lookup(&[("REDIS_PORT", "not-a-port")])).unwrap_err();
        assert!(matches!(err, CheckpointError::Configuration(_)));

        let err = RedisConfig::new().with_port(0).validate().unwrap_err();
        assert!(matches!(err, CheckpointError::Configuration(_)));
    }

    #[test]
    fn test_connection_info_carries_db_and_credentials() {
        let info = RedisConfig::new()
            .with_db(5)
            .with_credentials(Some("app".to_string()), "pw".to_string())
            .to_connection_info()
            .unwrap();

        assert_eq!(info.redis.db, 5);
        assert_eq!(info.redis.username.as_deref(), Some("app"));
        assert_eq!(info.redis.password.as_deref(), Some("pw"));
    }

    #[test]
    fn test_deserialize_from_yaml_with_defaults() {
        let config: RedisConfig = serde_yaml::from_str("host: redis\ndb: 2\n").unwrap();
        assert_eq!(config.host, "redis");
        assert_eq!(config.db, 2);
        assert_eq!(config.port, DEFAULT_PORT);
    }
}
