use crate::config::models::GlobalConfig;

/// Resolves the base URL for the active spec based on a priority hierarchy.
pub struct BaseUrlResolver<'a> {
    /// Base URL declared by the spec's own `servers` block, if any.
    spec_default: Option<&'a str>,
    global_config: Option<&'a GlobalConfig>,
    /// Current environment, from `CLIFORGE_ENV`.
    environment: Option<String>,
}

const FALLBACK_BASE_URL: &str = "https://api.example.com";

impl<'a> BaseUrlResolver<'a> {
    #[must_use]
    pub fn new(spec_default: Option<&'a str>) -> Self {
        Self {
            spec_default,
            global_config: None,
            environment: std::env::var("CLIFORGE_ENV").ok(),
        }
    }

    #[must_use]
    pub fn with_global_config(mut self, config: &'a GlobalConfig) -> Self {
        self.global_config = Some(config);
        self
    }

    #[must_use]
    pub fn with_environment(mut self, env: Option<String>) -> Self {
        self.environment = env;
        self
    }

    /// Resolves the base URL according to the priority hierarchy:
    /// 1. Environment variable `ROSA_API_URL`
    /// 2. Config file: per-environment override for the active environment
    /// 3. Config file: general override
    /// 4. The spec's own server default
    /// 5. Fallback: <https://api.example.com>
    #[must_use]
    pub fn resolve(&self) -> String {
        if let Ok(url) = std::env::var("ROSA_API_URL") {
            return url;
        }

        if let Some(config) = self.global_config {
            if let Some(env) = &self.environment {
                if let Some(env_url) = config.environment_urls.get(env) {
                    return env_url.clone();
                }
            }
            if let Some(override_url) = &config.base_url_override {
                return override_url.clone();
            }
        }

        if let Some(base_url) = self.spec_default {
            return base_url.to_string();
        }

        FALLBACK_BASE_URL.to_string()
    }
}
