//! Strict-mode validation of `x-cli-*`/`x-auth-config` extension usage.
//!
//! Parsing (see [`crate::spec::parser`]) never fails on an unrecognized
//! extension key — it simply ignores what it doesn't understand. This
//! module is the second pass that decides whether that's acceptable: under
//! strict mode (see [`crate::config::GlobalConfig::strict_mode`]) an
//! unrecognized `x-cli-*`/`x-auth-config` key is a hard error; otherwise
//! it's collected as a warning for the caller to display.

use crate::constants;
use crate::error::Error;
use openapiv3::{OpenAPI, ReferenceOr, SecurityScheme};

/// One unrecognized extension key found somewhere in the document.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// Where the extension was found, e.g. `"operation listClusters"` or `"security scheme bearerAuth"`.
    pub location: String,
    pub key: String,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unrecognized extension '{}' on {}", self.key, self.location)
    }
}

/// Outcome of a validation pass: under non-strict mode `errors` is always
/// empty and every problem lands in `warnings`.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub warnings: Vec<ValidationWarning>,
    pub errors: Vec<Error>,
}

impl ValidationResult {
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// # Errors
    /// Returns the first validation error, if any.
    pub fn into_result(self) -> Result<(), Error> {
        self.errors.into_iter().next().map_or(Ok(()), Err)
    }
}

pub struct SpecValidator;

impl SpecValidator {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Walks the document looking for `x-cli-*`/`x-auth-config` keys not in
    /// [`constants::KNOWN_CLI_EXTENSIONS`]. Under `strict`, every finding
    /// becomes an error; otherwise findings are collected as warnings only.
    #[must_use]
    pub fn validate_with_mode(&self, spec: &OpenAPI, strict: bool) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::check_extensions(&spec.extensions, "document root", &mut result, strict);

        if let Some(components) = &spec.components {
            for (name, scheme_ref) in &components.security_schemes {
                if let ReferenceOr::Item(scheme) = scheme_ref {
                    Self::validate_security_scheme(name, scheme, &mut result, strict);
                }
            }
        }

        for (path, path_item_ref) in spec.paths.iter() {
            let ReferenceOr::Item(path_item) = path_item_ref else {
                continue;
            };
            Self::check_extensions(
                &path_item.extensions,
                &format!("path '{path}'"),
                &mut result,
                strict,
            );

            let methods: [(&str, &Option<openapiv3::Operation>); 7] = [
                ("GET", &path_item.get),
                ("POST", &path_item.post),
                ("PUT", &path_item.put),
                ("DELETE", &path_item.delete),
                ("PATCH", &path_item.patch),
                ("HEAD", &path_item.head),
                ("OPTIONS", &path_item.options),
            ];
            for (method, op) in methods {
                if let Some(operation) = op {
                    Self::validate_operation(method, path, operation, &mut result, strict);
                }
            }
        }

        result
    }

    fn validate_operation(
        method: &str,
        path: &str,
        operation: &openapiv3::Operation,
        result: &mut ValidationResult,
        strict: bool,
    ) {
        let label = operation
            .operation_id
            .clone()
            .unwrap_or_else(|| format!("{method} {path}"));
        Self::check_extensions(&operation.extensions, &format!("operation '{label}'"), result, strict);

        for param_ref in &operation.parameters {
            let ReferenceOr::Item(param) = param_ref else {
                continue;
            };
            let data = match param {
                openapiv3::Parameter::Query { parameter_data, .. }
                | openapiv3::Parameter::Header { parameter_data, .. }
                | openapiv3::Parameter::Path { parameter_data, .. }
                | openapiv3::Parameter::Cookie { parameter_data, .. } => parameter_data,
            };
            Self::check_extensions(
                &data.extensions,
                &format!("parameter '{}' on operation '{label}'", data.name),
                result,
                strict,
            );
        }
    }

    fn validate_security_scheme(
        name: &str,
        scheme: &SecurityScheme,
        result: &mut ValidationResult,
        strict: bool,
    ) {
        if matches!(scheme, SecurityScheme::OpenIDConnect { .. }) {
            let error = Error::validation(format!(
                "security scheme '{name}' uses OpenID Connect, which is not supported"
            ));
            if strict {
                result.errors.push(error);
            } else {
                result.warnings.push(ValidationWarning {
                    location: format!("security scheme '{name}'"),
                    key: "openIdConnect".to_string(),
                });
            }
        }

        let extensions = match scheme {
            SecurityScheme::APIKey { extensions, .. }
            | SecurityScheme::HTTP { extensions, .. }
            | SecurityScheme::OAuth2 { extensions, .. }
            | SecurityScheme::OpenIDConnect { extensions, .. } => extensions,
        };
        Self::check_extensions(
            extensions,
            &format!("security scheme '{name}'"),
            result,
            strict,
        );
    }

    fn check_extensions(
        extensions: &indexmap::IndexMap<String, serde_json::Value>,
        location: &str,
        result: &mut ValidationResult,
        strict: bool,
    ) {
        for key in extensions.keys() {
            let recognized = constants::KNOWN_CLI_EXTENSIONS.contains(&key.as_str());
            let is_cli_namespace = key.starts_with("x-cli-") || key == constants::EXT_AUTH_CONFIG;
            if is_cli_namespace && !recognized {
                if strict {
                    result.errors.push(Error::validation(format!(
                        "unrecognized extension '{key}' on {location}"
                    )));
                } else {
                    result.warnings.push(ValidationWarning {
                        location: location.to_string(),
                        key: key.clone(),
                    });
                }
            }
        }
    }
}
