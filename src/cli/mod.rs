//! Static CLI scaffolding shared across every generated command tree: output
//! formatting, error rendering, and tracing setup. The dynamic operation
//! tree itself is built by [`crate::engine::generator`], not here — this
//! runtime has no fixed subcommand enum, since the available commands are a
//! function of whatever spec is loaded at invocation time.

pub mod errors;
pub mod tracing_init;

use clap::ValueEnum;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Table,
}

impl OutputFormat {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Table => "table",
        }
    }
}

/// Global flags resolved from `ArgMatches` once, before dispatch. Kept as a
/// plain struct (rather than a `clap::Parser` derive) because it is merged
/// onto a dynamically built [`clap::Command`] tree alongside the operation
/// tree — see [`crate::engine::generator::build_cli`].
#[derive(Debug, Clone)]
pub struct GlobalFlags {
    pub output: OutputFormat,
    pub no_color: bool,
    pub no_deprecation_warnings: bool,
    pub force: bool,
    pub quiet: bool,
    pub debug: bool,
    pub json_errors: bool,
    pub token: Option<String>,
    pub timeout: Option<std::time::Duration>,
    pub server_var: Vec<String>,
}

impl Default for GlobalFlags {
    fn default() -> Self {
        Self {
            output: OutputFormat::default(),
            no_color: false,
            no_deprecation_warnings: false,
            force: false,
            quiet: false,
            debug: false,
            json_errors: false,
            token: None,
            timeout: None,
            server_var: Vec::new(),
        }
    }
}

impl GlobalFlags {
    /// # Errors
    /// Returns an error if `--timeout` was supplied but is not a valid duration.
    pub fn from_matches(matches: &clap::ArgMatches) -> Result<Self, crate::error::Error> {
        let timeout = matches
            .get_one::<String>("timeout")
            .map(|s| crate::duration::parse_duration(s))
            .transpose()?;

        Ok(Self {
            output: matches.get_one::<OutputFormat>("output").copied().unwrap_or_default(),
            no_color: matches.get_flag("no-color"),
            no_deprecation_warnings: matches.get_flag("no-deprecation-warnings"),
            force: matches.get_flag("force"),
            quiet: matches.get_flag("quiet"),
            debug: matches.get_flag("debug"),
            json_errors: matches.get_flag("json-errors"),
            token: matches.get_one::<String>("token").cloned(),
            timeout,
            server_var: matches
                .get_many::<String>("server-var")
                .map(|v| v.cloned().collect())
                .unwrap_or_default(),
        })
    }
}
