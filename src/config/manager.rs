//! Global configuration storage: `${XDG_CONFIG_HOME}/<cliName>/config.toml`.

use crate::config::models::GlobalConfig;
use crate::config::settings::{SettingInfo, SettingKey, SettingValue};
use crate::constants;
use crate::error::Error;
use crate::fs::{FileSystem, OsFileSystem};
use std::path::{Path, PathBuf};

pub struct ConfigManager<F: FileSystem> {
    fs: F,
    config_dir: PathBuf,
}

impl ConfigManager<OsFileSystem> {
    /// Creates a new `ConfigManager` rooted at the default OS config directory.
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, Error> {
        let config_dir = get_config_dir()?;
        Ok(Self {
            fs: OsFileSystem,
            config_dir,
        })
    }
}

impl<F: FileSystem> ConfigManager<F> {
    pub const fn with_fs(fs: F, config_dir: PathBuf) -> Self {
        Self { fs, config_dir }
    }

    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Loads the global configuration from `config.toml`, or the defaults if
    /// the file does not exist yet.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_global_config(&self) -> Result<GlobalConfig, Error> {
        let config_path = self.config_dir.join(constants::CONFIG_FILENAME);
        if self.fs.exists(&config_path) {
            let content = self.fs.read_to_string(&config_path)?;
            toml::from_str(&content).map_err(Error::from)
        } else {
            Ok(GlobalConfig::default())
        }
    }

    /// Saves the global configuration to `config.toml`, creating the config
    /// directory if needed.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save_global_config(&self, config: &GlobalConfig) -> Result<(), Error> {
        let config_path = self.config_dir.join(constants::CONFIG_FILENAME);
        self.fs.create_dir_all(&self.config_dir)?;

        let content = toml::to_string_pretty(config)
            .map_err(|e| Error::internal(format!("failed to serialize config: {e}")))?;

        self.fs.write_all(&config_path, content.as_bytes())?;
        Ok(())
    }

    /// Gets a single setting's current value.
    ///
    /// # Errors
    /// Returns an error if the config file cannot be read or parsed.
    pub fn get_setting(&self, key: SettingKey) -> Result<SettingValue, Error> {
        let config = self.load_global_config()?;
        Ok(key.value_from_config(&config))
    }

    /// Sets a single setting's value and persists the result.
    ///
    /// # Errors
    /// Returns an error if the config file cannot be read, parsed, or written.
    pub fn set_setting(&self, key: SettingKey, value: &SettingValue) -> Result<(), Error> {
        let mut config = self.load_global_config()?;
        key.apply(&mut config, value);
        self.save_global_config(&config)
    }

    /// Lists every known setting alongside its current value.
    ///
    /// # Errors
    /// Returns an error if the config file cannot be read or parsed.
    pub fn list_settings(&self) -> Result<Vec<SettingInfo>, Error> {
        let config = self.load_global_config()?;
        Ok(SettingKey::ALL
            .iter()
            .map(|key| SettingInfo::new(*key, &key.value_from_config(&config)))
            .collect())
    }

    /// Sets the base URL override, optionally scoped to an environment name.
    ///
    /// # Errors
    /// Returns an error if the config cannot be saved.
    pub fn set_url(&self, url: &str, environment: Option<&str>) -> Result<(), Error> {
        let mut config = self.load_global_config()?;
        if let Some(env) = environment {
            config.environment_urls.insert(env.to_string(), url.to_string());
        } else {
            config.base_url_override = Some(url.to_string());
        }
        self.save_global_config(&config)
    }
}

/// Gets the default configuration directory path (`~/.config/cliforge`).
///
/// # Errors
/// Returns an error if the home directory cannot be determined.
pub fn get_config_dir() -> Result<PathBuf, Error> {
    let home_dir = dirs::home_dir().ok_or_else(|| Error::internal("could not determine home directory"))?;
    Ok(home_dir.join(".config").join("cliforge"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;

    fn manager() -> ConfigManager<MemoryFileSystem> {
        ConfigManager::with_fs(MemoryFileSystem::new(), PathBuf::from("/config"))
    }

    #[test]
    fn load_defaults_when_missing() {
        let mgr = manager();
        let config = mgr.load_global_config().unwrap();
        assert_eq!(config.default_timeout_ms, 30_000);
        assert!(!config.strict_mode);
    }

    #[test]
    fn save_then_load_round_trips() {
        let mgr = manager();
        let mut config = GlobalConfig::default();
        config.strict_mode = true;
        config.base_url_override = Some("https://example.com".to_string());
        mgr.save_global_config(&config).unwrap();

        let loaded = mgr.load_global_config().unwrap();
        assert!(loaded.strict_mode);
        assert_eq!(loaded.base_url_override.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn set_and_get_setting_round_trips() {
        let mgr = manager();
        mgr.set_setting(SettingKey::DefaultTimeoutMs, &SettingValue::U64(5_000))
            .unwrap();
        assert_eq!(
            mgr.get_setting(SettingKey::DefaultTimeoutMs).unwrap(),
            SettingValue::U64(5_000)
        );
    }

    #[test]
    fn list_settings_includes_all_keys() {
        let mgr = manager();
        let settings = mgr.list_settings().unwrap();
        assert_eq!(settings.len(), SettingKey::ALL.len());
    }

    #[test]
    fn set_url_with_environment_scopes_override() {
        let mgr = manager();
        mgr.set_url("https://staging.example.com", Some("staging")).unwrap();
        let config = mgr.load_global_config().unwrap();
        assert_eq!(
            config.environment_urls.get("staging").map(String::as_str),
            Some("https://staging.example.com")
        );
        assert!(config.base_url_override.is_none());
    }
}
