//! Runtime settings read from the environment.
//!
//! Unset variables keep their defaults; anything set must parse.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gemledger_core::DomainError;
use gemledger_lots::DISCREPANCY_EPSILON;
use gemledger_stones::MatchingCriteria;

pub const ENV_DISCREPANCY_EPSILON: &str = "GEMLEDGER_DISCREPANCY_EPSILON";
pub const ENV_CARAT_TOLERANCE: &str = "GEMLEDGER_CARAT_TOLERANCE";
pub const ENV_MIN_SET_SIZE: &str = "GEMLEDGER_MIN_SET_SIZE";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: String, value: String },

    #[error(transparent)]
    Criteria(#[from] DomainError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Carat tolerance before a lot balance counts as a discrepancy.
    pub discrepancy_epsilon: f64,
    pub default_criteria: MatchingCriteria,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            discrepancy_epsilon: DISCREPANCY_EPSILON,
            default_criteria: MatchingCriteria::default(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(epsilon) = parse_var(&lookup, ENV_DISCREPANCY_EPSILON)? {
            settings.discrepancy_epsilon = epsilon;
        }
        if let Some(tolerance) = parse_var(&lookup, ENV_CARAT_TOLERANCE)? {
            settings.default_criteria.carat_tolerance = tolerance;
        }
        if let Some(min_set_size) = parse_var(&lookup, ENV_MIN_SET_SIZE)? {
            settings.default_criteria.min_set_size = min_set_size;
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.discrepancy_epsilon.is_finite() && self.discrepancy_epsilon >= 0.0) {
            return Err(ConfigError::Invalid {
                key: ENV_DISCREPANCY_EPSILON.to_string(),
                value: self.discrepancy_epsilon.to_string(),
            });
        }
        self.default_criteria.validate()?;
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<T>()
        .map(Some)
        .map_err(|_| ConfigError::Invalid {
            key: key.to_string(),
            value: raw.clone(),
        })
}
