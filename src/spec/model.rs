//! Runtime value types produced by [`crate::spec::parser`] from a raw
//! `OpenAPI` document: the `Operation` model (including indexed `x-cli-*`
//! extensions) that the command builder, executor, and every `x-cli-*`
//! subsystem consume instead of touching `openapiv3` types directly.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An `OpenAPI` server variable declaration (`servers[].variables.<name>`).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ServerVariable {
    pub default: Option<String>,
    #[serde(default)]
    pub enum_values: Vec<String>,
    pub description: Option<String>,
}

/// Where a parameter is carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParamLocation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
        }
    }
}

/// A flattened JSON-Schema-ish description of a parameter or request body
/// field, carrying just enough to derive a `clap` flag type and validate a
/// raw string argument.
#[derive(Debug, Clone, Default)]
pub struct ParamSchema {
    /// `"string"`, `"integer"`, `"number"`, `"boolean"`, `"array"`, `"object"`.
    pub type_name: String,
    pub format: Option<String>,
    pub enum_values: Vec<String>,
    pub default: Option<String>,
    pub items: Option<Box<ParamSchema>>,
}

/// A single operation parameter (path, query, header, or cookie).
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub location: ParamLocation,
    pub required: bool,
    pub description: Option<String>,
    pub schema: ParamSchema,
}

/// The (JSON) request body accepted by an operation.
#[derive(Debug, Clone)]
pub struct RequestBodyInfo {
    pub content_type: String,
    pub required: bool,
    pub schema: ParamSchema,
}

/// One `x-cli-preflight` check: a validation HTTP call run before the main
/// request, e.g. verifying credentials against a lightweight endpoint.
#[derive(Debug, Clone)]
pub struct PreflightCheck {
    pub name: String,
    pub description: Option<String>,
    /// Absolute URL or base-relative path.
    pub endpoint: String,
    /// HTTP method; defaults to `GET` when unspecified.
    pub method: String,
    /// A failing required check halts execution; a failing optional check
    /// warns and the sequence continues.
    pub required: bool,
}

/// `x-cli-confirmation`: an interactive yes/no gate with a templated prompt.
#[derive(Debug, Clone)]
pub struct ConfirmationSpec {
    pub message_template: String,
    /// Name of the CLI flag that bypasses the prompt (e.g. `force`).
    pub bypass_flag: Option<String>,
}

/// Where the choices for an `x-cli-interactive` select prompt come from.
#[derive(Debug, Clone)]
pub struct InteractiveSource {
    pub operation_id: String,
    pub value_field: String,
    pub label_field: Option<String>,
}

/// `x-cli-interactive`: a single field that should be interactively prompted
/// for when missing from the invocation.
#[derive(Debug, Clone)]
pub struct InteractiveFieldSpec {
    pub param: String,
    pub prompt: String,
    pub source: Option<InteractiveSource>,
}

/// `x-cli-async`: the operation returns an async job; poll another operation
/// until a terminal status is observed.
#[derive(Debug, Clone)]
pub struct AsyncSpec {
    pub poll_operation_id: String,
    pub status_field: String,
    pub success_values: Vec<String>,
    pub failure_values: Vec<String>,
    pub interval_ms: u64,
    pub timeout_ms: u64,
}

/// `x-cli-output`: rendering hints for the executor's default formatter.
#[derive(Debug, Clone, Default)]
pub struct OutputSpec {
    pub default_format: Option<String>,
    pub table_columns: Option<Vec<String>>,
}

/// `x-cli-deprecation`: sunset metadata independent of the HTTP
/// `Sunset`/`Deprecation` response headers (which are read per-response).
#[derive(Debug, Clone)]
pub struct DeprecationInfo {
    pub removal_date: Option<chrono::NaiveDate>,
    pub message: Option<String>,
    pub migration: Option<String>,
}

/// `x-cli-command`: an explicit override of the generated command path,
/// taking precedence over tag-derived grouping.
#[derive(Debug, Clone, Default)]
pub struct CommandOverride {
    pub path: Vec<String>,
}

/// A single `OpenAPI` operation, fully resolved into the runtime's own
/// vocabulary. This is what [`crate::engine::generator`] walks to build the
/// `clap` command tree and what [`crate::engine::executor`] dispatches.
#[derive(Debug, Clone)]
pub struct Operation {
    pub operation_id: String,
    pub method: String,
    pub path: String,
    /// Command path segments, e.g. `["clusters", "create"]`.
    pub command_path: Vec<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub parameters: Vec<Parameter>,
    pub request_body: Option<RequestBodyInfo>,
    pub security_requirements: Vec<String>,
    pub preflight: Vec<PreflightCheck>,
    pub confirmation: Option<ConfirmationSpec>,
    pub interactive: Vec<InteractiveFieldSpec>,
    pub async_spec: Option<AsyncSpec>,
    pub output: OutputSpec,
    pub deprecation: Option<DeprecationInfo>,
    pub deprecated: bool,
}

/// The parsed runtime representation of an entire spec document.
#[derive(Debug, Clone, Default)]
pub struct RuntimeSpec {
    pub title: String,
    pub version: String,
    pub base_url: Option<String>,
    pub server_variables: HashMap<String, ServerVariable>,
    pub operations: Vec<Operation>,
    pub security_schemes: HashMap<String, SecuritySchemeInfo>,
}

/// A security scheme declared in `components.securitySchemes`, enriched with
/// `x-auth-config` if present.
#[derive(Debug, Clone)]
pub struct SecuritySchemeInfo {
    pub scheme_type: String,
    pub http_scheme: Option<String>,
    pub location: Option<String>,
    pub parameter_name: Option<String>,
}
