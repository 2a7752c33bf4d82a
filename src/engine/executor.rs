//! The per-invocation pipeline: resolve the operation, run its gates
//! (deprecation, confirmation, preflight, interactive fill-in), build and
//! dispatch the request, then render or poll the result.

use crate::auth;
use crate::auth::storage::AuthStorage;
use crate::cli::{GlobalFlags, OutputFormat};
use crate::confirmation;
use crate::deprecation::{self, DeprecationTracker, Severity};
use crate::error::Error;
use crate::fs::OsFileSystem;
use crate::interactive::mock::RealInputOutput;
use crate::invocation::{ExecutionContext, ExecutionResult, OperationCall};
use crate::preflight;
use crate::request_builder::{self, BuiltRequest};
use crate::resilience::{self, RetryConfig};
use crate::secret::SecretDetector;
use crate::spec::model::{InteractiveSource, Operation, OutputSpec, RuntimeSpec};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tabled::builder::Builder as TableBuilder;
use tabled::settings::Style as TableStyle;

/// Everything the executor needs that isn't already captured in
/// [`OperationCall`]/[`ExecutionContext`]: the resolved base URL, the active
/// auth storage backend, global flags, and the shared HTTP client.
pub struct ExecutorDeps<'a> {
    pub client: &'a reqwest::Client,
    pub base_url: &'a str,
    pub storage: &'a dyn AuthStorage,
    pub flags: &'a GlobalFlags,
    pub secrets: &'a SecretDetector,
    pub token_url: Option<&'a str>,
    pub oauth_client_id: Option<&'a str>,
    /// Where `Info`-severity deprecation notices record when they were last
    /// shown, so a cooldown can suppress repeats. `None` disables tracking
    /// (every `Info` notice is shown every time).
    pub deprecation_tracking_path: Option<&'a Path>,
}

/// Runs the full pipeline for `operation` against `call`/`context`.
///
/// # Errors
/// Returns the first error encountered at any gate: deprecation block,
/// declined/non-interactive confirmation treated as validation failure by
/// the caller, required preflight failure, request build failure, auth
/// failure, or upstream API/network/timeout error.
pub async fn execute(
    spec: &RuntimeSpec,
    operation: &Operation,
    mut call: OperationCall,
    context: &ExecutionContext,
    deps: &ExecutorDeps<'_>,
) -> Result<ExecutionResult, Error> {
    let mut deferred_notice = check_deprecation(operation, context.force, deps)?;

    if let Some(spec_notice) = &operation.deprecation {
        if deferred_notice.is_none() {
            deferred_notice = spec_notice.message.clone();
        }
    }

    if let Some(confirmation_spec) = &operation.confirmation {
        let bypass = context.force;
        let params = string_params(&call);
        let io = RealInputOutput;
        let proceeded = confirmation::confirm_with_io(confirmation_spec, &params, bypass, !context.dry_run, &io)?;
        if !proceeded {
            return Err(Error::validation("operation cancelled: confirmation declined"));
        }
    }

    if !operation.preflight.is_empty() {
        let token = auth::resolve_token(context.token_override.as_deref(), deps.storage, false).ok();
        preflight::run_preflight_checks(
            deps.client,
            deps.base_url,
            &operation.preflight,
            token.as_ref().map(|t| t.token.as_str()),
        )
        .await?;
    }

    fill_interactive_fields(spec, operation, &mut call, deps).await?;

    if context.dry_run {
        let built = request_builder::build_request(deps.base_url, operation, &call)?;
        return Ok(ExecutionResult::DryRun {
            request_info: serde_json::json!({
                "method": built.method.as_str(),
                "url": built.url,
                "body": built.body,
            }),
        });
    }

    let mut access_token = resolve_access_token(context, deps).await?;

    let retry_config = context.retry_config.clone().unwrap_or_default();

    let response = dispatch(operation, &call, deps, &access_token, &retry_config).await;

    let response = match response {
        Err(e) if e.kind() == crate::error::ErrorKind::AuthExpired => {
            access_token = refresh_token(deps).await?;
            dispatch(operation, &call, deps, &access_token, &retry_config).await?
        }
        other => other?,
    };

    if let Some(sunset_notice) = read_deprecation_headers(&response) {
        deferred_notice = Some(sunset_notice);
    }

    let result = if let Some(async_spec) = &operation.async_spec {
        let status_operation = spec.operations.iter().find(|op| op.operation_id == async_spec.poll_operation_id);
        let status_url = status_operation.map_or_else(|| deps.base_url.to_string(), |op| format!("{}{}", deps.base_url, op.path));
        let initial: Value = serde_json::from_str(&response.body).unwrap_or(Value::Null);
        let outcome = crate::async_poll::poll_until_terminal(deps.client, &status_url, async_spec, Some(&initial)).await?;
        match outcome {
            crate::async_poll::PollOutcome::Succeeded(body) => ExecutionResult::Success {
                body: body.to_string(),
                status: response.status,
                headers: response.headers,
            },
            crate::async_poll::PollOutcome::Failed(body) => {
                if let Some(notice) = deferred_notice.take() {
                    if !deps.flags.no_deprecation_warnings {
                        eprintln!("{}", deps.secrets.mask_text(&notice));
                    }
                }
                return Err(Error::api(response.status, extract_api_error_message(&body.to_string())));
            }
        }
    } else {
        ExecutionResult::Success {
            body: response.body,
            status: response.status,
            headers: response.headers,
        }
    };

    if let Some(notice) = deferred_notice {
        if !deps.flags.no_deprecation_warnings {
            eprintln!("{}", deps.secrets.mask_text(&notice));
        }
    }

    Ok(result)
}

/// Checks both deprecation sources §4.12 names: the standard OpenAPI
/// `deprecated: true` boolean and the richer `x-cli-deprecation` extension.
/// The extension, when present, takes precedence (it carries a removal date
/// and can block/require-force); the bare boolean alone only ever produces
/// a cooldown-tracked informational notice.
fn check_deprecation(operation: &Operation, force: bool, deps: &ExecutorDeps<'_>) -> Result<Option<String>, Error> {
    if let Some(info) = &operation.deprecation {
        let notice = deprecation::enforce(&operation.operation_id, info, force)?;
        let is_info_severity = info.removal_date.map_or(true, |date| {
            Severity::from_days_remaining(deprecation::days_remaining(date)) == Severity::Info
        });
        return Ok(notice.filter(|_| !is_info_severity || show_info_notice(&operation.operation_id, deps)));
    }

    if operation.deprecated {
        let notice = format!("'{}' is deprecated", operation.operation_id);
        return Ok(show_info_notice(&operation.operation_id, deps).then_some(notice));
    }

    Ok(None)
}

/// Consults the cooldown tracker for an `Info`-severity notice. Returns
/// `true` (always show) when no tracking path is configured.
fn show_info_notice(operation_id: &str, deps: &ExecutorDeps<'_>) -> bool {
    let Some(path) = deps.deprecation_tracking_path else {
        return true;
    };
    let tracker = DeprecationTracker::new(OsFileSystem, path.to_path_buf());
    tracker.should_show_info_notice(operation_id).unwrap_or(true)
}

fn string_params(call: &OperationCall) -> HashMap<String, String> {
    let mut params = HashMap::new();
    params.extend(call.path_params.clone());
    params.extend(call.query_params.clone());
    params
}

async fn fill_interactive_fields(
    spec: &RuntimeSpec,
    operation: &Operation,
    call: &mut OperationCall,
    deps: &ExecutorDeps<'_>,
) -> Result<(), Error> {
    for field in &operation.interactive {
        let already_set = call.path_params.contains_key(&field.param) || call.query_params.contains_key(&field.param);
        if already_set {
            continue;
        }

        let value = if let Some(source) = &field.source {
            let options = fetch_dynamic_options(spec, source, deps).await?;
            crate::interactive::select_from_options(&field.prompt, &options)?
        } else {
            crate::interactive::prompt_for_input(&field.prompt)?
        };

        call.query_params.insert(field.param.clone(), value);
    }
    Ok(())
}

async fn fetch_dynamic_options(
    spec: &RuntimeSpec,
    source: &InteractiveSource,
    deps: &ExecutorDeps<'_>,
) -> Result<Vec<(String, String)>, Error> {
    let Some(source_operation) = spec.operations.iter().find(|op| op.operation_id == source.operation_id) else {
        return Ok(Vec::new());
    };
    let url = format!("{}{}", deps.base_url, source_operation.path);
    let response = deps.client.get(&url).send().await?;
    let body: Value = response.json().await?;
    Ok(extract_options(&body, source))
}

fn extract_options(body: &Value, source: &InteractiveSource) -> Vec<(String, String)> {
    let array = body
        .as_array()
        .cloned()
        .or_else(|| {
            crate::constants::RESPONSE_WRAPPER_KEYS
                .iter()
                .find_map(|key| body.get(key).and_then(Value::as_array).cloned())
        })
        .unwrap_or_default();

    array
        .into_iter()
        .filter_map(|item| match &item {
            Value::String(s) => Some((s.clone(), s.clone())),
            Value::Object(_) => {
                let value = item.get(&source.value_field)?.as_str()?.to_string();
                let label = source
                    .label_field
                    .as_ref()
                    .and_then(|field| item.get(field))
                    .and_then(Value::as_str)
                    .unwrap_or(&value)
                    .to_string();
                Some((value, label))
            }
            _ => None,
        })
        .collect()
}

async fn resolve_access_token(context: &ExecutionContext, deps: &ExecutorDeps<'_>) -> Result<String, Error> {
    let interactive = !context.dry_run;
    let resolved = auth::resolve_token(context.token_override.as_deref(), deps.storage, interactive)?;
    if let (Some(token_url), Some(client_id)) = (deps.token_url, deps.oauth_client_id) {
        if resolved.source == auth::TokenSource::Storage {
            return auth::refresh_if_needed(deps.client, token_url, client_id, deps.storage).await;
        }
    }
    Ok(resolved.token)
}

async fn refresh_token(deps: &ExecutorDeps<'_>) -> Result<String, Error> {
    match (deps.token_url, deps.oauth_client_id) {
        (Some(token_url), Some(client_id)) => {
            auth::refresh_if_needed(deps.client, token_url, client_id, deps.storage).await
        }
        _ => Err(Error::auth_expired("token rejected and no refresh endpoint is configured")),
    }
}

struct RawResponse {
    status: u16,
    body: String,
    headers: HashMap<String, String>,
}

async fn dispatch(
    operation: &Operation,
    call: &OperationCall,
    deps: &ExecutorDeps<'_>,
    access_token: &str,
    retry_config: &RetryConfig,
) -> Result<RawResponse, Error> {
    let built = request_builder::build_request(deps.base_url, operation, call)?;

    let response = resilience::execute_with_retry(retry_config, &operation.operation_id, || {
        send_once(deps.client, &built, access_token)
    })
    .await?;

    let status = response.status();
    let mut headers = HashMap::new();
    for (name, value) in response.headers() {
        if let Ok(v) = value.to_str() {
            headers.insert(name.as_str().to_string(), v.to_string());
        }
    }
    let body = response.text().await.unwrap_or_default();

    if status.as_u16() == 401 {
        return Err(Error::auth_expired("access token rejected with 401"));
    }
    if status.as_u16() >= 400 {
        return Err(Error::api(status.as_u16(), extract_api_error_message(&body)));
    }

    Ok(RawResponse {
        status: status.as_u16(),
        body,
        headers,
    })
}

async fn send_once(client: &reqwest::Client, built: &BuiltRequest, access_token: &str) -> Result<reqwest::Response, reqwest::Error> {
    let mut request = client.request(built.method.clone(), &built.url).headers(built.headers.clone());
    request = request.bearer_auth(access_token);
    if let Some(body) = &built.body {
        request = request.json(body);
    }
    request.send().await
}

fn extract_api_error_message(body: &str) -> String {
    let Ok(parsed) = serde_json::from_str::<Value>(body) else {
        return crate::utils::truncate_at_char_boundary(body, 200);
    };
    for key in ["message", "error", "detail"] {
        if let Some(text) = parsed.get(key).and_then(Value::as_str) {
            return text.to_string();
        }
    }
    crate::utils::truncate_at_char_boundary(body, 200)
}

fn read_deprecation_headers(response: &RawResponse) -> Option<String> {
    let sunset = response.headers.get(crate::constants::HEADER_SUNSET);
    let deprecation = response.headers.get(crate::constants::HEADER_DEPRECATION);
    match (sunset, deprecation) {
        (Some(sunset), _) => Some(format!("This operation is scheduled for removal on {sunset}.")),
        (None, Some(_)) => Some("This operation is marked deprecated by the server.".to_string()),
        (None, None) => None,
    }
}

/// Renders a successful result to stdout per the requested output format.
///
/// # Errors
/// Returns an error if the body can't be parsed as JSON for YAML/table
/// rendering (raw JSON passthrough never fails).
pub fn render(result: &ExecutionResult, format: OutputFormat, secrets: &SecretDetector) -> Result<(), Error> {
    match result {
        ExecutionResult::Empty => Ok(()),
        ExecutionResult::DryRun { request_info } => {
            let mut masked = request_info.clone();
            secrets.mask_json_fields(&mut masked);
            let rendered = serde_json::to_string_pretty(&masked)?;
            println!("{}", secrets.mask_text(&rendered));
            Ok(())
        }
        ExecutionResult::Success { body, .. } => render_body(body, format, secrets, None),
    }
}

/// Renders a successful result, honoring an operation's own
/// `x-cli-output` hints (default format, table column order) when one
/// applies.
///
/// # Errors
/// Same conditions as [`render`].
pub fn render_with_output_spec(
    result: &ExecutionResult,
    format: OutputFormat,
    secrets: &SecretDetector,
    output_spec: &OutputSpec,
) -> Result<(), Error> {
    match result {
        ExecutionResult::Success { body, .. } => render_body(body, format, secrets, Some(output_spec)),
        _ => render(result, format, secrets),
    }
}

fn render_body(body: &str, format: OutputFormat, secrets: &SecretDetector, output_spec: Option<&OutputSpec>) -> Result<(), Error> {
    if body.trim().is_empty() {
        return Ok(());
    }
    match format {
        OutputFormat::Json => {
            let mut value: Value = serde_json::from_str(body)?;
            secrets.mask_json_fields(&mut value);
            let pretty = serde_json::to_string_pretty(&value)?;
            println!("{}", secrets.mask_text(&pretty));
        }
        OutputFormat::Yaml => {
            let mut value: Value = serde_json::from_str(body)?;
            secrets.mask_json_fields(&mut value);
            let yaml = serde_yaml::to_string(&value)?;
            println!("{}", secrets.mask_text(&yaml));
        }
        OutputFormat::Table => {
            let mut value: Value = serde_json::from_str(body)?;
            secrets.mask_json_fields(&mut value);
            let columns = output_spec.and_then(|spec| spec.table_columns.clone());
            let rendered = render_table(&value, columns.as_deref());
            println!("{}", secrets.mask_text(&rendered));
        }
    }
    Ok(())
}

/// Flattens `value` into rows for tabular display. A bare object becomes a
/// single row; an array of objects becomes one row per element. `columns`
/// restricts and orders which fields are shown, falling back to the keys of
/// the first row.
fn render_table(value: &Value, columns: Option<&[String]>) -> String {
    let rows: Vec<&serde_json::Map<String, Value>> = match value {
        Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
        Value::Object(map) => vec![map],
        _ => return value.to_string(),
    };
    if rows.is_empty() {
        return String::new();
    }

    let header: Vec<String> = columns.map_or_else(|| rows[0].keys().cloned().collect(), <[String]>::to_vec);

    let mut builder = TableBuilder::default();
    builder.push_record(header.iter().cloned());
    for row in &rows {
        builder.push_record(header.iter().map(|col| {
            row.get(col).map_or_else(String::new, |v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
        }));
    }

    builder.build().with(TableStyle::rounded()).to_string()
}
