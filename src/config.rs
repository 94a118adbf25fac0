//! Configuration Module
//!
//! Construction-time cache parameters, loadable from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Cache configuration parameters.
///
/// The zero value of every field is a valid, permissive default: no
/// expiry, no capacity bound, no pre-sizing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Time-to-live measured from each entry's most recent write.
    /// Zero disables expiry entirely.
    pub ttl: Duration,
    /// Hard bound on resident entries. Inserting past it evicts the
    /// least recently used entry. Zero means unbounded.
    pub capacity: usize,
    /// Pre-sizing hint for the entry store. Does not bound the cache.
    pub initial_capacity: usize,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// Malformed or negative inputs are rejected with a [`ConfigError`]
    /// rather than silently replaced by defaults.
    ///
    /// # Environment Variables
    /// - `CACHE_TTL_SECS` - entry TTL in seconds (default: 0, no expiry)
    /// - `CACHE_CAPACITY` - maximum entries (default: 0, unbounded)
    /// - `CACHE_INITIAL_CAPACITY` - entry store pre-sizing hint (default: 0)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(secs) = parse_env::<u64>("CACHE_TTL_SECS")? {
            config.ttl = Duration::from_secs(secs);
        }
        if let Some(capacity) = parse_env::<usize>("CACHE_CAPACITY")? {
            config.capacity = capacity;
        }
        if let Some(hint) = parse_env::<usize>("CACHE_INITIAL_CAPACITY")? {
            config.initial_capacity = hint;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration for contradictory settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity > 0 && self.initial_capacity > self.capacity {
            return Err(ConfigError::InitialCapacityExceedsBound {
                initial_capacity: self.initial_capacity,
                capacity: self.capacity,
            });
        }
        Ok(())
    }
}

/// Reads and parses one environment variable, distinguishing "not set"
/// from "set to garbage".
fn parse_env<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(raw)) => Err(ConfigError::InvalidValue {
            name,
            value: raw.to_string_lossy().into_owned(),
        }),
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::{Mutex, MutexGuard};

    // Tests mutate shared process environment; serialize them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clean_env() -> MutexGuard<'static, ()> {
        let guard = ENV_LOCK.lock();
        env::remove_var("CACHE_TTL_SECS");
        env::remove_var("CACHE_CAPACITY");
        env::remove_var("CACHE_INITIAL_CAPACITY");
        guard
    }

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::ZERO);
        assert_eq!(config.capacity, 0);
        assert_eq!(config.initial_capacity, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_env_defaults() {
        let _guard = clean_env();

        let config = CacheConfig::from_env().unwrap();
        assert_eq!(config, CacheConfig::default());
    }

    #[test]
    fn test_config_from_env_reads_values() {
        let _guard = clean_env();
        env::set_var("CACHE_TTL_SECS", "120");
        env::set_var("CACHE_CAPACITY", "500");

        let config = CacheConfig::from_env().unwrap();
        assert_eq!(config.ttl, Duration::from_secs(120));
        assert_eq!(config.capacity, 500);

        env::remove_var("CACHE_TTL_SECS");
        env::remove_var("CACHE_CAPACITY");
    }

    #[test]
    fn test_config_rejects_negative_capacity() {
        let _guard = clean_env();
        env::set_var("CACHE_CAPACITY", "-10");

        let err = CacheConfig::from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                name: "CACHE_CAPACITY",
                ..
            }
        ));

        env::remove_var("CACHE_CAPACITY");
    }

    #[test]
    fn test_config_rejects_garbage_ttl() {
        let _guard = clean_env();
        env::set_var("CACHE_TTL_SECS", "soon");

        let err = CacheConfig::from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                name: "CACHE_TTL_SECS",
                ..
            }
        ));

        env::remove_var("CACHE_TTL_SECS");
    }

    #[test]
    fn test_validate_rejects_oversized_hint() {
        let config = CacheConfig {
            capacity: 8,
            initial_capacity: 32,
            ..CacheConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InitialCapacityExceedsBound { .. })
        ));
    }

    #[test]
    fn test_validate_allows_hint_without_bound() {
        let config = CacheConfig {
            capacity: 0,
            initial_capacity: 1024,
            ..CacheConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
