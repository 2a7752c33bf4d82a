//! Translates a resolved [`crate::invocation::OperationCall`] against an
//! [`Operation`] into an actual HTTP request: path interpolation, query
//! params, header params, and a merged JSON body.

use crate::constants;
use crate::error::Error;
use crate::invocation::OperationCall;
use crate::spec::model::{Operation, ParamLocation};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};
use std::str::FromStr;

/// A fully assembled request, ready to hand to [`crate::resilience`].
pub struct BuiltRequest {
    pub method: reqwest::Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

/// Builds a request from `operation` and `call` against `base_url`.
///
/// # Errors
/// Returns `Error::usage` if a required path parameter is missing, or
/// `Error::internal` if a header value isn't valid ASCII.
pub fn build_request(base_url: &str, operation: &Operation, call: &OperationCall) -> Result<BuiltRequest, Error> {
    let url = build_url(base_url, operation, call)?;
    let method = reqwest::Method::from_str(&operation.method.to_uppercase())
        .map_err(|_| Error::internal(format!("unsupported HTTP method '{}'", operation.method)))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        HeaderValue::from_static(constants::CONTENT_TYPE_JSON),
    );

    for parameter in operation.parameters.iter().filter(|p| p.location == ParamLocation::Header) {
        if let Some(value) = call.header_params.get(&parameter.name) {
            insert_header(&mut headers, &parameter.name, value)?;
        }
    }
    for raw in &call.custom_headers {
        if let Some((name, value)) = raw.split_once(':') {
            insert_header(&mut headers, name.trim(), value.trim())?;
        }
    }

    let body = build_body(operation, call)?;
    if body.is_some() {
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static(constants::CONTENT_TYPE_JSON),
        );
    }

    Ok(BuiltRequest { method, url, headers, body })
}

fn build_url(base_url: &str, operation: &Operation, call: &OperationCall) -> Result<String, Error> {
    let mut path = operation.path.clone();
    for parameter in operation.parameters.iter().filter(|p| p.location == ParamLocation::Path) {
        let placeholder = format!("{{{}}}", parameter.name);
        if !path.contains(&placeholder) {
            continue;
        }
        let value = call
            .path_params
            .get(&parameter.name)
            .ok_or_else(|| Error::usage(format!("missing required path parameter '{}'", parameter.name)))?;
        path = path.replace(&placeholder, &urlencoding::encode(value));
    }

    let mut url = format!("{}{}", base_url.trim_end_matches('/'), path);

    let query_params: Vec<(&str, &str)> = operation
        .parameters
        .iter()
        .filter(|p| p.location == ParamLocation::Query)
        .filter_map(|p| call.query_params.get(&p.name).map(|v| (p.name.as_str(), v.as_str())))
        .collect();

    if !query_params.is_empty() {
        let query = query_params
            .iter()
            .map(|(name, value)| format!("{}={}", urlencoding::encode(name), urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        url.push('?');
        url.push_str(&query);
    }

    Ok(url)
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), Error> {
    let header_name =
        HeaderName::from_str(name).map_err(|e| Error::internal(format!("invalid header name '{name}': {e}")))?;
    let header_value =
        HeaderValue::from_str(value).map_err(|e| Error::internal(format!("invalid header value for '{name}': {e}")))?;
    headers.insert(header_name, header_value);
    Ok(())
}

fn build_body(operation: &Operation, call: &OperationCall) -> Result<Option<Value>, Error> {
    let Some(request_body) = &operation.request_body else {
        return Ok(None);
    };

    match &call.body {
        Some(raw) => {
            let parsed: Value = serde_json::from_str(raw)?;
            Ok(Some(parsed))
        }
        None if request_body.required => Err(Error::usage("request body is required for this operation")),
        None => Ok(None),
    }
}

/// Merges a set of flag-derived body fields into a single JSON object,
/// used when an operation's body is assembled from individual `--field`
/// flags rather than a raw `--body` blob.
#[must_use]
pub fn merge_body_fields(fields: Vec<(String, Value)>) -> Value {
    let mut map = Map::new();
    for (key, value) in fields {
        map.insert(key, value);
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::model::{ParamSchema, RequestBodyInfo};
    use std::collections::HashMap;

    fn operation() -> Operation {
        Operation {
            operation_id: "getCluster".to_string(),
            method: "get".to_string(),
            path: "/clusters/{id}".to_string(),
            command_path: vec!["clusters".to_string(), "get".to_string()],
            summary: None,
            description: None,
            parameters: vec![
                crate::spec::model::Parameter {
                    name: "id".to_string(),
                    location: ParamLocation::Path,
                    required: true,
                    description: None,
                    schema: ParamSchema::default(),
                },
                crate::spec::model::Parameter {
                    name: "verbose".to_string(),
                    location: ParamLocation::Query,
                    required: false,
                    description: None,
                    schema: ParamSchema::default(),
                },
            ],
            request_body: None,
            security_requirements: vec![],
            preflight: vec![],
            confirmation: None,
            interactive: vec![],
            async_spec: None,
            output: Default::default(),
            deprecation: None,
            deprecated: false,
        }
    }

    #[test]
    fn path_param_is_interpolated() {
        let op = operation();
        let mut call = OperationCall::default();
        call.path_params.insert("id".to_string(), "abc 123".to_string());
        let built = build_request("https://api.example.com", &op, &call).unwrap();
        assert_eq!(built.url, "https://api.example.com/clusters/abc%20123");
    }

    #[test]
    fn missing_required_path_param_errors() {
        let op = operation();
        let call = OperationCall::default();
        let result = build_request("https://api.example.com", &op, &call);
        assert!(result.is_err());
    }

    #[test]
    fn query_param_is_appended() {
        let op = operation();
        let mut call = OperationCall::default();
        call.path_params.insert("id".to_string(), "1".to_string());
        call.query_params.insert("verbose".to_string(), "true".to_string());
        let built = build_request("https://api.example.com", &op, &call).unwrap();
        assert_eq!(built.url, "https://api.example.com/clusters/1?verbose=true");
    }

    #[test]
    fn required_body_missing_errors() {
        let mut op = operation();
        op.request_body = Some(RequestBodyInfo {
            content_type: constants::CONTENT_TYPE_JSON.to_string(),
            required: true,
            schema: ParamSchema::default(),
        });
        let mut call = OperationCall::default();
        call.path_params.insert("id".to_string(), "1".to_string());
        let result = build_request("https://api.example.com", &op, &call);
        assert!(result.is_err());
    }

    #[test]
    fn provided_body_is_parsed_as_json() {
        let mut op = operation();
        op.request_body = Some(RequestBodyInfo {
            content_type: constants::CONTENT_TYPE_JSON.to_string(),
            required: true,
            schema: ParamSchema::default(),
        });
        let mut call = OperationCall::default();
        call.path_params.insert("id".to_string(), "1".to_string());
        call.body = Some(r#"{"name":"prod"}"#.to_string());
        let built = build_request("https://api.example.com", &op, &call).unwrap();
        assert_eq!(built.body, Some(serde_json::json!({"name": "prod"})));
        assert_eq!(
            built.headers.get(reqwest::header::CONTENT_TYPE).unwrap(),
            constants::CONTENT_TYPE_JSON
        );
    }

    #[test]
    fn custom_header_is_attached() {
        let op = operation();
        let mut call = OperationCall::default();
        call.path_params.insert("id".to_string(), "1".to_string());
        call.custom_headers.push("X-Request-Id: abc".to_string());
        let built = build_request("https://api.example.com", &op, &call).unwrap();
        assert_eq!(
            built.headers.get("X-Request-Id").unwrap(),
            "abc"
        );
    }

    #[test]
    fn merge_body_fields_builds_object() {
        let merged = merge_body_fields(vec![
            ("name".to_string(), Value::String("prod".to_string())),
            ("size".to_string(), Value::from(3)),
        ]);
        assert_eq!(merged, serde_json::json!({"name": "prod", "size": 3}));
    }
}
