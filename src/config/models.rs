use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Persisted configuration for the active spec, read from
/// `${XDG_CONFIG_HOME}/<cliName>/config.toml`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Overrides the spec's own server default regardless of environment.
    pub base_url_override: Option<String>,
    /// Per-environment URL overrides, keyed by an arbitrary environment name
    /// (e.g. "staging", "prod") selected via `CLIFORGE_ENV`.
    pub environment_urls: HashMap<String, String>,
    /// When true, an unrecognized `x-cli-*` key is a hard parse error instead
    /// of a warning.
    pub strict_mode: bool,
    /// Default per-request timeout, in milliseconds.
    pub default_timeout_ms: u64,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            base_url_override: None,
            environment_urls: HashMap::new(),
            strict_mode: false,
            default_timeout_ms: 30_000,
        }
    }
}
