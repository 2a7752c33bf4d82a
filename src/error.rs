//! Error handling for the CliForge runtime.
//!
//! All internal errors are mapped onto the nine kinds of `ErrorKind`, each
//! with a stable exit code and a structured JSON rendering for `--json-errors`
//! mode. Components return typed errors; only the Executor and the top-level
//! command dispatcher decide how an error is surfaced.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::borrow::Cow;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{kind}: {message}")]
    Internal {
        kind: ErrorKind,
        message: Cow<'static, str>,
        context: Option<ErrorContext>,
    },

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// The closed taxonomy of error kinds. Each maps to a fixed process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing required flag, unknown command, invalid flag value.
    Usage,
    /// No token resolvable through the resolution chain.
    Auth,
    /// Token rejected with 401 and refresh-and-retry also failed.
    AuthExpired,
    /// Interactive validation failure, confirmation declined, required preflight failure.
    Validation,
    /// Upstream returned >= 400 other than a 401 handled by the retry path.
    Api,
    /// Transport failure: DNS, refused connection, TLS.
    Network,
    /// Per-request or async-poll total timeout elapsed.
    Timeout,
    /// Operation blocked by deprecation policy (critical without --force, or removed).
    DeprecationBlocked,
    /// Invariant violation internal to the runtime.
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Usage => "UsageError",
            Self::Auth => "AuthError",
            Self::AuthExpired => "AuthExpired",
            Self::Validation => "ValidationError",
            Self::Api => "APIError",
            Self::Network => "NetworkError",
            Self::Timeout => "TimeoutError",
            Self::DeprecationBlocked => "DeprecationBlocked",
            Self::Internal => "InternalError",
        }
    }

    /// The process exit code mandated for this kind.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Usage => 2,
            Self::Timeout => 124,
            _ => 1,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Additional context attached to an `Error::Internal`.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    pub details: Option<serde_json::Value>,
    pub suggestion: Option<Cow<'static, str>>,
}

impl ErrorContext {
    #[must_use]
    pub const fn with_suggestion(suggestion: Cow<'static, str>) -> Self {
        Self {
            details: None,
            suggestion: Some(suggestion),
        }
    }

    #[must_use]
    pub fn with_detail(key: &str, value: impl serde::Serialize) -> Self {
        Self {
            details: Some(json!({ key: value })),
            suggestion: None,
        }
    }
}

/// Structured rendering of an error for `--json-errors` mode. The shape is
/// identical across every `ErrorKind` so scripts have one envelope to parse.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonError {
    pub kind: &'static str,
    pub message: String,
    pub exit_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<Cow<'static, str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl Error {
    const fn new_internal(kind: ErrorKind, message: Cow<'static, str>) -> Self {
        Self::Internal {
            kind,
            message,
            context: None,
        }
    }

    fn internal_owned(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::new_internal(kind, Cow::Owned(message.into()))
    }

    #[must_use]
    pub fn usage(message: impl Into<String>) -> Self {
        Self::internal_owned(ErrorKind::Usage, message)
    }

    #[must_use]
    pub fn auth(message: impl Into<String>) -> Self {
        Self::internal_owned(ErrorKind::Auth, message)
    }

    #[must_use]
    pub fn auth_expired(message: impl Into<String>) -> Self {
        Self::internal_owned(ErrorKind::AuthExpired, message)
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::internal_owned(ErrorKind::Validation, message)
    }

    #[must_use]
    pub fn api(status: u16, message: impl std::fmt::Display) -> Self {
        Self::internal_owned(ErrorKind::Api, format!("HTTP {status}: {message}"))
    }

    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::internal_owned(ErrorKind::Network, message)
    }

    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::internal_owned(ErrorKind::Timeout, message)
    }

    #[must_use]
    pub fn deprecation_blocked(message: impl Into<String>) -> Self {
        Self::internal_owned(ErrorKind::DeprecationBlocked, message)
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::internal_owned(ErrorKind::Internal, message)
    }

    /// The error kind, for components that need to branch on it (the
    /// Executor's 401-retry decision, the top-level exit-code mapper).
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Internal { kind, .. } => *kind,
            Self::Io(_) | Self::Yaml(_) | Self::Json(_) | Self::Toml(_) => ErrorKind::Usage,
            Self::Network(_) => ErrorKind::Network,
            Self::Anyhow(_) => ErrorKind::Internal,
        }
    }

    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }

    #[must_use]
    pub fn with_suggestion(self, suggestion: impl Into<String>) -> Self {
        match self {
            Self::Internal {
                kind,
                message,
                context,
            } => Self::Internal {
                kind,
                message,
                context: Some(match context {
                    Some(mut ctx) => {
                        ctx.suggestion = Some(Cow::Owned(suggestion.into()));
                        ctx
                    }
                    None => ErrorContext::with_suggestion(Cow::Owned(suggestion.into())),
                }),
            },
            other => other,
        }
    }

    /// Renders this error as the structured JSON envelope used by `--json-errors`.
    #[must_use]
    pub fn to_json(&self) -> JsonError {
        let (kind, suggestion, details) = match self {
            Self::Internal { kind, context, .. } => (
                *kind,
                context.as_ref().and_then(|c| c.suggestion.clone()),
                context.as_ref().and_then(|c| c.details.clone()),
            ),
            _ => (self.kind(), None, None),
        };
        JsonError {
            kind: kind.as_str(),
            message: self.to_string(),
            exit_code: kind.exit_code(),
            suggestion,
            details,
        }
    }

    // Small construction helpers used by config/settings.rs and the server
    // variable resolver; kept separate from the generic `validation`/`usage`
    // constructors because callers want a consistent message shape.
    #[must_use]
    pub fn unknown_setting_key(key: &str) -> Self {
        Self::usage(format!("Unknown configuration key: '{key}'"))
    }

    #[must_use]
    pub fn invalid_setting_value(key: impl std::fmt::Display, value: &str) -> Self {
        Self::usage(format!("Invalid value '{value}' for setting '{key}'"))
    }

    #[must_use]
    pub fn setting_value_out_of_range(key: impl std::fmt::Display, value: &str, reason: &str) -> Self {
        Self::usage(format!("Value '{value}' for setting '{key}' is out of range: {reason}"))
    }

    #[must_use]
    pub fn missing_server_variable(name: &str) -> Self {
        Self::usage(format!("Missing required server variable '{name}' (no default in spec)"))
    }

    #[must_use]
    pub fn unknown_server_variable(name: &str, known: &[String]) -> Self {
        Self::usage(format!(
            "Unknown server variable '{name}'; known variables: {}",
            known.join(", ")
        ))
    }

    #[must_use]
    pub fn invalid_server_var_format(arg: impl std::fmt::Display, reason: &str) -> Self {
        Self::usage(format!("Invalid --server-var '{arg}': {reason}"))
    }

    #[must_use]
    pub fn invalid_server_var_value(name: &str, value: &str, allowed: &[String]) -> Self {
        Self::usage(format!(
            "Invalid value '{value}' for server variable '{name}'; allowed: {}",
            allowed.join(", ")
        ))
    }

    #[must_use]
    pub fn unresolved_template_variable(name: &str, template: &str) -> Self {
        Self::internal(format!("Unresolved template variable '{{{name}}}' in '{template}'"))
    }
}
