//! Preflight check execution: a sequence of lightweight requests run against
//! a live, authenticated client before the real operation fires.

use crate::error::Error;
use crate::spec::model::PreflightCheck;
use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use serde_json::Value;
use std::str::FromStr;

/// Outcome of a single check, surfaced to the caller for logging/warnings.
#[derive(Debug, Clone)]
pub struct PreflightOutcome {
    pub name: String,
    pub passed: bool,
    pub status: Option<u16>,
    pub message: Option<String>,
}

/// Runs `checks` in order. A required check that fails halts immediately and
/// returns an error; all subsequent checks (including optional ones) are
/// skipped. An optional check that fails is recorded in the returned
/// outcomes but does not stop the sequence.
///
/// Auth headers are attached only when the check's endpoint is base-relative
/// or its absolute host matches `base_url`'s host; cross-host absolute
/// endpoints are called without credentials.
///
/// # Errors
/// Returns `Error::validation` on the first required-check failure.
pub async fn run_preflight_checks(
    client: &reqwest::Client,
    base_url: &str,
    checks: &[PreflightCheck],
    token: Option<&str>,
) -> Result<Vec<PreflightOutcome>, Error> {
    let mut outcomes = Vec::with_capacity(checks.len());
    let base_host = reqwest::Url::parse(base_url).ok().and_then(|u| u.host_str().map(str::to_string));

    for check in checks {
        let outcome = run_single_check(client, base_url, check, token, base_host.as_deref()).await?;
        let failed = !outcome.passed;
        outcomes.push(outcome);

        if failed && checks[outcomes.len() - 1].required {
            let message = outcomes
                .last()
                .and_then(|o| o.message.clone())
                .unwrap_or_else(|| format!("preflight check '{}' failed", check.name));
            return Err(Error::validation(message));
        }
    }
    Ok(outcomes)
}

async fn run_single_check(
    client: &reqwest::Client,
    base_url: &str,
    check: &PreflightCheck,
    token: Option<&str>,
    base_host: Option<&str>,
) -> Result<PreflightOutcome, Error> {
    let url = build_check_url(base_url, &check.endpoint);
    let method = Method::from_str(&check.method).unwrap_or(Method::GET);
    let send_body = matches!(method, Method::POST | Method::PUT | Method::PATCH);

    let mut request = client.request(method, &url);
    if send_body {
        request = request.json(&serde_json::json!({}));
    }

    if let (Some(token), true) = (token, host_matches(&url, base_host)) {
        request = request.header(AUTHORIZATION, format!("Bearer {token}"));
    }

    let response = request.send().await;
    match response {
        Ok(resp) => {
            let status = resp.status();
            let passed = status.is_success();
            let body = resp.text().await.unwrap_or_default();
            Ok(PreflightOutcome {
                name: check.name.clone(),
                passed,
                status: Some(status.as_u16()),
                message: (!passed).then(|| extract_check_error(&body, status.as_u16())),
            })
        }
        Err(e) => Ok(PreflightOutcome {
            name: check.name.clone(),
            passed: false,
            status: None,
            message: Some(format!("{} failed: {e}", check.name)),
        }),
    }
}

/// Joins a base-relative `endpoint` onto `base_url`; leaves an absolute
/// endpoint untouched.
fn build_check_url(base_url: &str, endpoint: &str) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("{}/{}", base_url.trim_end_matches('/'), endpoint.trim_start_matches('/'))
    }
}

/// Extracts a human-readable error from a failed check's response body:
/// JSON `message`, then `error`, then `detail`, then the raw body truncated
/// to 200 bytes, then the bare status.
fn extract_check_error(body: &str, status: u16) -> String {
    if let Ok(parsed) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error", "detail"] {
            if let Some(text) = parsed.get(key).and_then(Value::as_str) {
                return text.to_string();
            }
        }
    }
    if !body.trim().is_empty() {
        return crate::utils::truncate_at_char_boundary(body, 200);
    }
    format!("HTTP {status}")
}

fn host_matches(url: &str, base_host: Option<&str>) -> bool {
    match (reqwest::Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string)), base_host) {
        (Some(check_host), Some(base_host)) => check_host == base_host,
        _ => false,
    }
}
