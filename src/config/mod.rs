//! Global configuration storage and resolution.
//!
//! `manager` persists [`models::GlobalConfig`] to `config.toml`; `url_resolver`
//! and `server_variable_resolver` apply it (plus environment variables and the
//! spec's own defaults) when building the base URL for a request.

pub mod manager;
pub mod models;
pub mod server_variable_resolver;
pub mod settings;
pub mod url_resolver;

pub use manager::ConfigManager;
pub use models::GlobalConfig;
pub use server_variable_resolver::ServerVariableResolver;
pub use settings::{SettingInfo, SettingKey, SettingValue};
pub use url_resolver::BaseUrlResolver;
