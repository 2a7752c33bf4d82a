//! Turns raw `OpenAPI` 3.0/3.1 document text into a [`RuntimeSpec`]: parsing
//! the document with `openapiv3` (falling back to `oas3` for 3.1), then
//! walking every path/operation to build the runtime's `Operation` model and
//! index every `x-cli-*` / `x-auth-config` vendor extension it carries.

use crate::error::Error;
use crate::spec::model::{
    AsyncSpec, CommandOverride, ConfirmationSpec, DeprecationInfo, InteractiveFieldSpec,
    InteractiveSource, Operation, ParamLocation, ParamSchema, PreflightCheck, Parameter,
    RequestBodyInfo, RuntimeSpec, SecuritySchemeInfo, ServerVariable,
};
use openapiv3::{OpenAPI, ReferenceOr, Schema, SchemaKind, Type as SchemaType};
use regex::Regex;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Properties that should be boolean in `OpenAPI` 3.0 but sometimes round-trip
/// as 0/1 from tooling that generates specs from another schema system.
const BOOLEAN_PROPERTIES: &[&str] = &[
    "deprecated",
    "required",
    "readOnly",
    "writeOnly",
    "nullable",
    "uniqueItems",
    "allowEmptyValue",
    "explode",
    "allowReserved",
    "exclusiveMinimum",
    "exclusiveMaximum",
];

fn preprocess_for_compatibility(content: &str) -> String {
    let is_json = content.trim_start().starts_with('{');
    if is_json {
        return fix_json_boolean_values(content.to_string());
    }
    let mut result = fix_yaml_boolean_values(content.to_string());
    if result.contains('"') {
        result = fix_json_boolean_values(result);
    }
    result
}

fn fix_yaml_boolean_values(mut content: String) -> String {
    for property in BOOLEAN_PROPERTIES {
        let pattern_0 =
            Regex::new(&format!(r"\b{property}: 0\b")).expect("hardcoded pattern is valid");
        let pattern_1 =
            Regex::new(&format!(r"\b{property}: 1\b")).expect("hardcoded pattern is valid");
        content = pattern_0
            .replace_all(&content, format!("{property}: false"))
            .to_string();
        content = pattern_1
            .replace_all(&content, format!("{property}: true"))
            .to_string();
    }
    content
}

fn fix_json_boolean_values(mut content: String) -> String {
    for property in BOOLEAN_PROPERTIES {
        let pattern_0 = Regex::new(&format!(r#""{property}"\s*:\s*0\b"#)).unwrap();
        let pattern_1 = Regex::new(&format!(r#""{property}"\s*:\s*1\b"#)).unwrap();
        content = pattern_0
            .replace_all(&content, format!(r#""{property}":false"#))
            .to_string();
        content = pattern_1
            .replace_all(&content, format!(r#""{property}":true"#))
            .to_string();
    }
    content
}

/// Parses raw `OpenAPI` document text (YAML or JSON, 3.0.x or 3.1.x) into an
/// `openapiv3::OpenAPI` value.
///
/// # Errors
/// Returns an error if the content is neither valid YAML nor valid JSON, or
/// does not describe a supported `OpenAPI` document.
pub fn parse_openapi(content: &str) -> Result<OpenAPI, Error> {
    let preprocessed = preprocess_for_compatibility(content);

    let looks_like_31 = content.contains("openapi: 3.1")
        || content.contains("openapi: \"3.1")
        || content.contains("openapi: '3.1")
        || content.contains(r#""openapi":"3.1"#)
        || content.contains(r#""openapi": "3.1"#);

    if looks_like_31 {
        match parse_with_oas3(&preprocessed) {
            Ok(spec) => return Ok(spec),
            #[cfg(not(feature = "openapi31"))]
            Err(e) => return Err(e),
            #[cfg(feature = "openapi31")]
            Err(_) => {}
        }
    }

    let trimmed = content.trim();
    if trimmed.starts_with('{') {
        parse_json_with_fallback(&preprocessed)
    } else {
        parse_yaml_with_fallback(&preprocessed)
    }
}

fn parse_json_with_fallback(content: &str) -> Result<OpenAPI, Error> {
    match serde_json::from_str::<OpenAPI>(content) {
        Ok(spec) => Ok(spec),
        Err(json_err) => {
            if let Ok(spec) = serde_yaml::from_str::<OpenAPI>(content) {
                return Ok(spec);
            }
            Err(Error::validation(format!(
                "failed to parse OpenAPI document as JSON: {json_err}"
            )))
        }
    }
}

fn parse_yaml_with_fallback(content: &str) -> Result<OpenAPI, Error> {
    match serde_yaml::from_str::<OpenAPI>(content) {
        Ok(spec) => Ok(spec),
        Err(yaml_err) => {
            if let Ok(spec) = serde_json::from_str::<OpenAPI>(content) {
                return Ok(spec);
            }
            Err(Error::Yaml(yaml_err))
        }
    }
}

#[cfg(feature = "openapi31")]
fn parse_with_oas3(content: &str) -> Result<OpenAPI, Error> {
    let oas3_spec = match oas3::from_yaml(content) {
        Ok(spec) => spec,
        Err(_) => oas3::from_json(content).map_err(|e| {
            Error::validation(format!(
                "failed to parse OpenAPI 3.1 document as YAML or JSON: {e}"
            ))
        })?,
    };

    eprintln!(
        "{} OpenAPI 3.1 document detected; using 3.0 compatibility mode. Some 3.1-only features may not be available.",
        crate::constants::MSG_WARNING_PREFIX
    );

    let json = oas3::to_json(&oas3_spec)
        .map_err(|e| Error::validation(format!("failed to re-serialize OpenAPI 3.1 document: {e}")))?;

    serde_json::from_str::<OpenAPI>(&json).map_err(|e| {
        Error::validation(format!(
            "OpenAPI 3.1 document uses features incompatible with 3.0: {e}"
        ))
    })
}

#[cfg(not(feature = "openapi31"))]
fn parse_with_oas3(_content: &str) -> Result<OpenAPI, Error> {
    Err(Error::validation(
        "OpenAPI 3.1 support is not enabled; rebuild with --features openapi31",
    ))
}

/// Parses raw document text and builds the runtime's `Operation` model,
/// indexing every `x-cli-*` / `x-auth-config` extension along the way.
pub struct SpecParser;

impl SpecParser {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// # Errors
    /// Returns an error if `content` cannot be parsed as an `OpenAPI` document.
    pub fn parse(&self, content: &str) -> Result<RuntimeSpec, Error> {
        let spec = parse_openapi(content)?;
        Ok(Self::build_runtime_spec(&spec))
    }

    fn build_runtime_spec(spec: &OpenAPI) -> RuntimeSpec {
        let base_url = spec.servers.first().map(|s| s.url.clone());
        let server_variables = spec
            .servers
            .first()
            .map(|s| {
                s.variables
                    .iter()
                    .map(|(name, var)| {
                        (
                            name.clone(),
                            ServerVariable {
                                default: Some(var.default.clone()),
                                enum_values: var.enum_values.clone(),
                                description: var.description.clone(),
                            },
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();

        let global_security: Vec<String> = spec
            .security
            .iter()
            .flat_map(|reqs| reqs.iter().flat_map(|r| r.keys().cloned()))
            .collect();

        let mut operations = Vec::new();
        for (path, path_item) in spec.paths.iter() {
            let ReferenceOr::Item(item) = path_item else {
                continue;
            };
            let methods: [(&str, &Option<openapiv3::Operation>); 7] = [
                ("GET", &item.get),
                ("POST", &item.post),
                ("PUT", &item.put),
                ("DELETE", &item.delete),
                ("PATCH", &item.patch),
                ("HEAD", &item.head),
                ("OPTIONS", &item.options),
            ];
            for (method, op) in methods {
                if let Some(operation) = op {
                    operations.push(Self::build_operation(method, path, operation, &global_security));
                }
            }
        }

        let security_schemes = spec
            .components
            .as_ref()
            .map(|c| {
                c.security_schemes
                    .iter()
                    .filter_map(|(name, scheme_ref)| {
                        let ReferenceOr::Item(scheme) = scheme_ref else {
                            return None;
                        };
                        Self::build_security_scheme(scheme).map(|info| (name.clone(), info))
                    })
                    .collect()
            })
            .unwrap_or_default();

        RuntimeSpec {
            title: spec.info.title.clone(),
            version: spec.info.version.clone(),
            base_url,
            server_variables,
            operations,
            security_schemes,
        }
    }

    fn build_security_scheme(scheme: &openapiv3::SecurityScheme) -> Option<SecuritySchemeInfo> {
        match scheme {
            openapiv3::SecurityScheme::APIKey { location, name, .. } => {
                let location_str = match location {
                    openapiv3::APIKeyLocation::Query => "query",
                    openapiv3::APIKeyLocation::Header => "header",
                    openapiv3::APIKeyLocation::Cookie => "cookie",
                };
                Some(SecuritySchemeInfo {
                    scheme_type: "apiKey".to_string(),
                    http_scheme: None,
                    location: Some(location_str.to_string()),
                    parameter_name: Some(name.clone()),
                })
            }
            openapiv3::SecurityScheme::HTTP { scheme, .. } => Some(SecuritySchemeInfo {
                scheme_type: "http".to_string(),
                http_scheme: Some(scheme.clone()),
                location: Some("header".to_string()),
                parameter_name: Some("Authorization".to_string()),
            }),
            openapiv3::SecurityScheme::OAuth2 { .. } => Some(SecuritySchemeInfo {
                scheme_type: "oauth2".to_string(),
                http_scheme: None,
                location: Some("header".to_string()),
                parameter_name: Some("Authorization".to_string()),
            }),
            openapiv3::SecurityScheme::OpenIDConnect { .. } => None,
        }
    }

    fn build_operation(
        method: &str,
        path: &str,
        operation: &openapiv3::Operation,
        global_security: &[String],
    ) -> Operation {
        let operation_id = operation
            .operation_id
            .clone()
            .unwrap_or_else(|| format!("{}_{}", method.to_lowercase(), path.replace(['/', '{', '}'], "_")));

        let command_override = extract_command_override(&operation.extensions);
        let command_path = command_override.map(|o| o.path).unwrap_or_else(|| {
            let tag = operation.tags.first().cloned().unwrap_or_else(|| "default".to_string());
            vec![crate::utils::to_kebab_case(&tag), crate::utils::to_kebab_case(&operation_id)]
        });

        let mut parameters: Vec<Parameter> = operation
            .parameters
            .iter()
            .filter_map(|p| match p {
                ReferenceOr::Item(param) => Some(build_parameter(param)),
                ReferenceOr::Reference { .. } => None,
            })
            .collect();

        apply_flag_overrides(&operation.extensions, &mut parameters);

        let request_body = operation
            .request_body
            .as_ref()
            .and_then(|b| match b {
                ReferenceOr::Item(body) => build_request_body(body),
                ReferenceOr::Reference { .. } => None,
            });

        let security_requirements = operation.security.as_ref().map_or_else(
            || global_security.to_vec(),
            |reqs| reqs.iter().flat_map(|r| r.keys().cloned()).collect(),
        );

        let preflight = extract_preflight(&operation.extensions);
        let confirmation = extract_confirmation(&operation.extensions);
        let interactive = extract_interactive(&operation.extensions);
        let async_spec = extract_async(&operation.extensions);
        let output = extract_output(&operation.extensions);
        let deprecation = extract_deprecation(&operation.extensions);

        Operation {
            operation_id,
            method: method.to_string(),
            path: path.to_string(),
            command_path,
            summary: operation.summary.clone(),
            description: operation.description.clone(),
            parameters,
            request_body,
            security_requirements,
            preflight,
            confirmation,
            interactive,
            async_spec,
            output,
            deprecation,
            deprecated: operation.deprecated,
        }
    }
}

impl Default for SpecParser {
    fn default() -> Self {
        Self::new()
    }
}

fn build_parameter(param: &openapiv3::Parameter) -> Parameter {
    let (data, location) = match param {
        openapiv3::Parameter::Query { parameter_data, .. } => (parameter_data, ParamLocation::Query),
        openapiv3::Parameter::Header { parameter_data, .. } => (parameter_data, ParamLocation::Header),
        openapiv3::Parameter::Path { parameter_data, .. } => (parameter_data, ParamLocation::Path),
        openapiv3::Parameter::Cookie { parameter_data, .. } => (parameter_data, ParamLocation::Cookie),
    };

    let schema = data
        .format
        .clone()
        .schema()
        .and_then(|s| match s {
            ReferenceOr::Item(schema) => Some(build_schema(schema)),
            ReferenceOr::Reference { .. } => None,
        })
        .unwrap_or_default();

    Parameter {
        name: data.name.clone(),
        location,
        required: data.required,
        description: data.description.clone(),
        schema,
    }
}

fn build_schema(schema: &Schema) -> ParamSchema {
    let enum_values = match &schema.schema_kind {
        SchemaKind::Type(SchemaType::String(s)) => {
            s.enumeration.iter().filter_map(|v| v.clone()).collect()
        }
        _ => Vec::new(),
    };

    let type_name = match &schema.schema_kind {
        SchemaKind::Type(SchemaType::String(_)) => "string",
        SchemaKind::Type(SchemaType::Integer(_)) => "integer",
        SchemaKind::Type(SchemaType::Number(_)) => "number",
        SchemaKind::Type(SchemaType::Boolean(_)) => "boolean",
        SchemaKind::Type(SchemaType::Array(_)) => "array",
        SchemaKind::Type(SchemaType::Object(_)) => "object",
        _ => "string",
    }
    .to_string();

    let items = if let SchemaKind::Type(SchemaType::Array(arr)) = &schema.schema_kind {
        arr.items.as_ref().and_then(|i| match i.clone().unbox() {
            ReferenceOr::Item(inner) => Some(Box::new(build_schema(&inner))),
            ReferenceOr::Reference { .. } => None,
        })
    } else {
        None
    };

    ParamSchema {
        type_name,
        format: None,
        enum_values,
        default: None,
        items,
    }
}

fn build_request_body(body: &openapiv3::RequestBody) -> Option<RequestBodyInfo> {
    let (content_type, media_type) = body
        .content
        .get("application/json")
        .map(|m| ("application/json".to_string(), m))
        .or_else(|| body.content.iter().next().map(|(k, v)| (k.clone(), v)))?;

    let schema = media_type
        .schema
        .as_ref()
        .and_then(|s| match s {
            ReferenceOr::Item(schema) => Some(build_schema(schema)),
            ReferenceOr::Reference { .. } => None,
        })
        .unwrap_or_default();

    Some(RequestBodyInfo {
        content_type,
        required: body.required,
        schema,
    })
}

fn extract_command_override(
    extensions: &indexmap::IndexMap<String, JsonValue>,
) -> Option<CommandOverride> {
    let value = extensions.get(crate::constants::EXT_CLI_COMMAND)?;
    let path = match value {
        JsonValue::String(s) => s.split_whitespace().map(str::to_string).collect(),
        JsonValue::Array(arr) => arr
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => return None,
    };
    Some(CommandOverride { path })
}

fn apply_flag_overrides(extensions: &indexmap::IndexMap<String, JsonValue>, parameters: &mut [Parameter]) {
    let Some(JsonValue::Object(flags)) = extensions.get(crate::constants::EXT_CLI_FLAGS) else {
        return;
    };
    for param in parameters.iter_mut() {
        if let Some(JsonValue::String(alias)) = flags.get(&param.name) {
            param.name = alias.clone();
        }
    }
}

fn extract_preflight(extensions: &indexmap::IndexMap<String, JsonValue>) -> Vec<PreflightCheck> {
    let Some(JsonValue::Array(checks)) = extensions.get(crate::constants::EXT_CLI_PREFLIGHT) else {
        return Vec::new();
    };
    checks
        .iter()
        .filter_map(|c| {
            let obj = c.as_object()?;
            let endpoint = obj.get("endpoint")?.as_str()?.to_string();
            let name = obj
                .get("name")
                .and_then(|v| v.as_str())
                .map_or_else(|| endpoint.clone(), str::to_string);
            let description = obj.get("description").and_then(|v| v.as_str()).map(str::to_string);
            let method = obj
                .get("method")
                .and_then(|v| v.as_str())
                .map_or_else(|| "GET".to_string(), str::to_uppercase);
            let required = obj.get("required").and_then(JsonValue::as_bool).unwrap_or(true);
            Some(PreflightCheck {
                name,
                description,
                endpoint,
                method,
                required,
            })
        })
        .collect()
}

fn extract_confirmation(extensions: &indexmap::IndexMap<String, JsonValue>) -> Option<ConfirmationSpec> {
    let obj = extensions.get(crate::constants::EXT_CLI_CONFIRMATION)?.as_object()?;
    let message_template = obj.get("message")?.as_str()?.to_string();
    let bypass_flag = obj.get("bypassFlag").and_then(|v| v.as_str()).map(str::to_string);
    Some(ConfirmationSpec {
        message_template,
        bypass_flag,
    })
}

fn extract_interactive(extensions: &indexmap::IndexMap<String, JsonValue>) -> Vec<InteractiveFieldSpec> {
    let Some(JsonValue::Array(fields)) = extensions.get(crate::constants::EXT_CLI_INTERACTIVE) else {
        return Vec::new();
    };
    fields
        .iter()
        .filter_map(|f| {
            let obj = f.as_object()?;
            let param = obj.get("param")?.as_str()?.to_string();
            let prompt = obj
                .get("prompt")
                .and_then(|v| v.as_str())
                .unwrap_or(&param)
                .to_string();
            let source = obj.get("source").and_then(|v| v.as_object()).and_then(|s| {
                Some(InteractiveSource {
                    operation_id: s.get("operationId")?.as_str()?.to_string(),
                    value_field: s.get("valueField")?.as_str()?.to_string(),
                    label_field: s.get("labelField").and_then(|v| v.as_str()).map(str::to_string),
                })
            });
            Some(InteractiveFieldSpec { param, prompt, source })
        })
        .collect()
}

fn extract_async(extensions: &indexmap::IndexMap<String, JsonValue>) -> Option<AsyncSpec> {
    let obj = extensions.get(crate::constants::EXT_CLI_ASYNC)?.as_object()?;
    Some(AsyncSpec {
        poll_operation_id: obj.get("pollOperationId")?.as_str()?.to_string(),
        status_field: obj
            .get("statusField")
            .and_then(|v| v.as_str())
            .unwrap_or("status")
            .to_string(),
        success_values: obj
            .get("successValues")
            .and_then(|v| v.as_array())
            .map(|a| a.iter().filter_map(|x| x.as_str().map(str::to_string)).collect())
            .unwrap_or_else(|| vec!["succeeded".to_string(), "completed".to_string()]),
        failure_values: obj
            .get("failureValues")
            .and_then(|v| v.as_array())
            .map(|a| a.iter().filter_map(|x| x.as_str().map(str::to_string)).collect())
            .unwrap_or_else(|| vec!["failed".to_string(), "error".to_string()]),
        interval_ms: obj.get("intervalMs").and_then(JsonValue::as_u64).unwrap_or(2_000),
        timeout_ms: obj.get("timeoutMs").and_then(JsonValue::as_u64).unwrap_or(300_000),
    })
}

fn extract_output(extensions: &indexmap::IndexMap<String, JsonValue>) -> crate::spec::model::OutputSpec {
    let Some(obj) = extensions.get(crate::constants::EXT_CLI_OUTPUT).and_then(|v| v.as_object()) else {
        return crate::spec::model::OutputSpec::default();
    };
    crate::spec::model::OutputSpec {
        default_format: obj.get("defaultFormat").and_then(|v| v.as_str()).map(str::to_string),
        table_columns: obj.get("tableColumns").and_then(|v| v.as_array()).map(|a| {
            a.iter().filter_map(|x| x.as_str().map(str::to_string)).collect()
        }),
    }
}

fn extract_deprecation(extensions: &indexmap::IndexMap<String, JsonValue>) -> Option<DeprecationInfo> {
    let obj = extensions.get(crate::constants::EXT_CLI_DEPRECATION)?.as_object()?;
    let removal_date = obj
        .get("removalDate")
        .and_then(|v| v.as_str())
        .and_then(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
    Some(DeprecationInfo {
        removal_date,
        message: obj.get("message").and_then(|v| v.as_str()).map(str::to_string),
        migration: obj.get("migration").and_then(|v| v.as_str()).map(str::to_string),
    })
}

trait ParameterDataExt {
    fn schema(self) -> Option<ReferenceOr<Schema>>;
}

impl ParameterDataExt for openapiv3::ParameterSchemaOrContent {
    fn schema(self) -> Option<ReferenceOr<Schema>> {
        match self {
            Self::Schema(s) => Some(s),
            Self::Content(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_SPEC: &str = r#"
openapi: 3.0.0
info:
  title: Widgets API
  version: 1.0.0
servers:
  - url: https://api.example.com
paths:
  /widgets/{id}:
    get:
      operationId: getWidget
      tags: [widgets]
      parameters:
        - name: id
          in: path
          required: true
          schema:
            type: string
      responses:
        "200":
          description: ok
    delete:
      operationId: deleteWidget
      tags: [widgets]
      x-cli-confirmation:
        message: "Delete widget {id}?"
        bypassFlag: force
      parameters:
        - name: id
          in: path
          required: true
          schema:
            type: string
      responses:
        "204":
          description: ok
"#;

    #[test]
    fn parses_operations_and_extensions() {
        let parser = SpecParser::new();
        let runtime = parser.parse(SAMPLE_SPEC).unwrap();
        assert_eq!(runtime.operations.len(), 2);
        assert_eq!(runtime.base_url.as_deref(), Some("https://api.example.com"));

        let delete_op = runtime
            .operations
            .iter()
            .find(|o| o.operation_id == "deleteWidget")
            .unwrap();
        let confirmation = delete_op.confirmation.as_ref().unwrap();
        assert_eq!(confirmation.message_template, "Delete widget {id}?");
        assert_eq!(confirmation.bypass_flag.as_deref(), Some("force"));
    }

    #[test]
    fn preprocess_fixes_numeric_booleans() {
        let input = "deprecated: 0\nrequired: 1\n";
        let result = preprocess_for_compatibility(input);
        assert!(result.contains("deprecated: false"));
        assert!(result.contains("required: true"));
    }

    #[test]
    fn preprocess_preserves_multi_digit_numbers() {
        let input = "minimum: 10\nmaximum: 100\n";
        let result = preprocess_for_compatibility(input);
        assert!(result.contains("minimum: 10"));
        assert!(result.contains("maximum: 100"));
    }

    #[test]
    fn invalid_document_is_rejected() {
        let result = parse_openapi("not: valid: yaml: at: all:");
        assert!(result.is_err());
    }
}
