//! Blacklist configuration.

use crate::blacklist::error::{BlacklistError, BlacklistResult};
use std::time::Duration;

/// Default sweep interval (15 seconds).
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_millis(15_000);

/// Environment variable overriding the sweep interval, in milliseconds.
pub const SWEEP_INTERVAL_ENV: &str = "BLACKLIST_SWEEP_INTERVAL_MS";

/// Configuration for an [`ExpiringSet`](super::ExpiringSet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlacklistConfig {
    /// Time between sweeps of the expiry heap (default: 15s)
    pub sweep_interval: Duration,
}

impl Default for BlacklistConfig {
    fn default() -> Self {
        Self {
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl BlacklistConfig {
    /// Creates a configuration with the given sweep interval.
    pub fn with_interval(sweep_interval: Duration) -> BlacklistResult<Self> {
        let config = Self { sweep_interval };
        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration is usable.
    pub fn validate(&self) -> BlacklistResult<()> {
        if self.sweep_interval.is_zero() {
            return Err(BlacklistError::InvalidInterval);
        }
        Ok(())
    }

    /// Loads the configuration from the process environment.
    ///
    /// Unset variables fall back to their defaults.
    pub fn from_env() -> BlacklistResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> BlacklistResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(SWEEP_INTERVAL_ENV) {
            let ms: u64 = raw.trim().parse().map_err(|_| BlacklistError::InvalidConfig {
                name: SWEEP_INTERVAL_ENV,
                value: raw.clone(),
            })?;
            config.sweep_interval = Duration::from_millis(ms);
        }

        config.validate()?;
        Ok(config)
    }
}
