#![forbid(unsafe_code)]

//! Session configuration.
//!
//! The host may supply a JSON object; every field is optional, so `{}` yields
//! [`SessionConfig::default`].

use serde::{Deserialize, Serialize};

use crate::error::{KeyscopeError, Result};

/// Default number of rows kept in the event log.
pub const DEFAULT_LOG_CAPACITY: usize = 300;
/// Default number of labels kept in the repeat pattern ring.
pub const DEFAULT_PATTERN_CAPACITY: usize = 80;

/// Capacities for the bounded stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub log_capacity: usize,
    pub pattern_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            log_capacity: DEFAULT_LOG_CAPACITY,
            pattern_capacity: DEFAULT_PATTERN_CAPACITY,
        }
    }
}

impl SessionConfig {
    /// Parse and validate a JSON config object.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject zero capacities.
    pub fn validate(&self) -> Result<()> {
        if self.log_capacity == 0 {
            return Err(KeyscopeError::InvalidConfig(
                "log_capacity must be at least 1".to_string(),
            ));
        }
        if self.pattern_capacity == 0 {
            return Err(KeyscopeError::InvalidConfig(
                "pattern_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
