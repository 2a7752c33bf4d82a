//! Configuration settings management.
//!
//! Type-safe access to the small closed set of global settings backing
//! `config get`/`config set`/`config list`.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A valid configuration setting key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    /// Default per-request timeout in milliseconds (`default_timeout_ms`).
    DefaultTimeoutMs,
    /// Reject unrecognized `x-cli-*` extensions instead of warning (`strict_mode`).
    StrictMode,
}

impl SettingKey {
    pub const ALL: &'static [Self] = &[Self::DefaultTimeoutMs, Self::StrictMode];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DefaultTimeoutMs => "default_timeout_ms",
            Self::StrictMode => "strict_mode",
        }
    }

    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::DefaultTimeoutMs => "integer",
            Self::StrictMode => "boolean",
        }
    }

    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::DefaultTimeoutMs => "Default per-request timeout, in milliseconds",
            Self::StrictMode => "Treat unrecognized x-cli-* extensions as hard errors",
        }
    }

    #[must_use]
    pub const fn default_value_str(&self) -> &'static str {
        match self {
            Self::DefaultTimeoutMs => "30000",
            Self::StrictMode => "false",
        }
    }

    #[must_use]
    pub const fn value_from_config(&self, config: &super::models::GlobalConfig) -> SettingValue {
        match self {
            Self::DefaultTimeoutMs => SettingValue::U64(config.default_timeout_ms),
            Self::StrictMode => SettingValue::Bool(config.strict_mode),
        }
    }

    pub fn apply(&self, config: &mut super::models::GlobalConfig, value: &SettingValue) {
        match (self, value) {
            (Self::DefaultTimeoutMs, SettingValue::U64(v)) => config.default_timeout_ms = *v,
            (Self::StrictMode, SettingValue::Bool(v)) => config.strict_mode = *v,
            _ => {}
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default_timeout_ms" => Ok(Self::DefaultTimeoutMs),
            "strict_mode" => Ok(Self::StrictMode),
            _ => Err(Error::unknown_setting_key(s)),
        }
    }
}

/// Type-safe representation of a configuration setting value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    U64(u64),
    Bool(bool),
}

/// Maximum allowed timeout, in milliseconds (1 hour). Prevents nonsensical
/// per-request timeouts from silently hanging every invocation.
const MAX_TIMEOUT_MS: u64 = 60 * 60 * 1000;

impl SettingValue {
    /// Parses a string value into the type expected by the given key.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be parsed as the expected type,
    /// or is outside the allowed range for the setting.
    pub fn parse_for_key(key: SettingKey, value: &str) -> Result<Self, Error> {
        match key {
            SettingKey::DefaultTimeoutMs => {
                let parsed = value
                    .parse::<u64>()
                    .map_err(|_| Error::invalid_setting_value(key, value))?;
                if parsed == 0 {
                    return Err(Error::setting_value_out_of_range(
                        key,
                        value,
                        "timeout must be greater than 0",
                    ));
                }
                if parsed > MAX_TIMEOUT_MS {
                    return Err(Error::setting_value_out_of_range(
                        key,
                        value,
                        &format!("timeout cannot exceed {MAX_TIMEOUT_MS}ms (1 hour)"),
                    ));
                }
                Ok(Self::U64(parsed))
            }
            SettingKey::StrictMode => {
                let parsed = match value.to_lowercase().as_str() {
                    "true" | "1" | "yes" | "on" => true,
                    "false" | "0" | "no" | "off" => false,
                    _ => return Err(Error::invalid_setting_value(key, value)),
                };
                Ok(Self::Bool(parsed))
            }
        }
    }

    #[must_use]
    pub const fn as_u64(&self) -> Option<u64> {
        match self {
            Self::U64(v) => Some(*v),
            Self::Bool(_) => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            Self::U64(_) => None,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U64(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// Display-oriented view of a setting, used by `config list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingInfo {
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub description: String,
    pub default: String,
}

impl SettingInfo {
    #[must_use]
    pub fn new(key: SettingKey, current_value: &SettingValue) -> Self {
        Self {
            key: key.as_str().to_string(),
            value: current_value.to_string(),
            type_name: key.type_name().to_string(),
            description: key.description().to_string(),
            default: key.default_value_str().to_string(),
        }
    }
}
