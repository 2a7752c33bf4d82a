//! `x-cli-async` poller: after an operation kicks off a background job, poll
//! a status field until a terminal value is observed or the timeout elapses.

use crate::error::Error;
use crate::spec::model::AsyncSpec;
use serde_json::Value;
use std::io::Write;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Outcome of a completed poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Succeeded(Value),
    Failed(Value),
}

/// Polls `status_url` (already fully resolved, e.g. with the job id
/// substituted in) at `spec.interval_ms` until `spec.status_field` reaches a
/// value in `success_values` or `failure_values`, printing a single-line
/// progress indicator between polls.
///
/// # Errors
/// Returns `Error::timeout` if `spec.timeout_ms` elapses first, or propagates
/// request/parse failures from an individual poll.
pub async fn poll_until_terminal(
    client: &reqwest::Client,
    status_url: &str,
    spec: &AsyncSpec,
    initial_body: Option<&Value>,
) -> Result<PollOutcome, Error> {
    if let Some(body) = initial_body {
        if let Some(outcome) = terminal_outcome(body, spec) {
            return Ok(outcome);
        }
    }

    let deadline = Instant::now() + Duration::from_millis(spec.timeout_ms);
    let interval = Duration::from_millis(spec.interval_ms.max(1));
    let mut tick: u64 = 0;

    loop {
        if Instant::now() >= deadline {
            eprintln!();
            return Err(Error::timeout(format!(
                "timed out after {}ms waiting for job to reach a terminal state",
                spec.timeout_ms
            )));
        }
        sleep(interval).await;
        tick += 1;
        print_progress(tick);

        let response = client.get(status_url).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            eprintln!();
            return Err(Error::api(status, body));
        }
        let body: Value = response.json().await?;
        if let Some(outcome) = terminal_outcome(&body, spec) {
            eprintln!();
            return Ok(outcome);
        }
    }
}

fn terminal_outcome(body: &Value, spec: &AsyncSpec) -> Option<PollOutcome> {
    let status = body.get(&spec.status_field)?.as_str()?;
    if spec.success_values.iter().any(|v| v == status) {
        return Some(PollOutcome::Succeeded(body.clone()));
    }
    if spec.failure_values.iter().any(|v| v == status) {
        return Some(PollOutcome::Failed(body.clone()));
    }
    None
}

fn print_progress(tick: u64) {
    let dots = ".".repeat((tick % 4) as usize + 1);
    eprint!("\rWaiting for job to complete{dots}    ");
    let _ = std::io::stderr().flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn spec() -> AsyncSpec {
        AsyncSpec {
            poll_operation_id: "getJobStatus".to_string(),
            status_field: "status".to_string(),
            success_values: vec!["completed".to_string()],
            failure_values: vec!["failed".to_string()],
            interval_ms: 5,
            timeout_ms: 2000,
        }
    }

    #[test]
    fn initial_body_already_terminal_short_circuits() {
        let body = json!({"status": "completed"});
        assert_eq!(terminal_outcome(&body, &spec()), Some(PollOutcome::Succeeded(body.clone())));
    }

    #[test]
    fn non_terminal_status_returns_none() {
        let body = json!({"status": "pending"});
        assert_eq!(terminal_outcome(&body, &spec()), None);
    }

    #[test]
    fn failure_value_maps_to_failed_outcome() {
        let body = json!({"status": "failed"});
        assert_eq!(terminal_outcome(&body, &spec()), Some(PollOutcome::Failed(body.clone())));
    }

    #[tokio::test]
    async fn poll_until_terminal_resolves_when_server_reports_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "completed"})))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let result = poll_until_terminal(&client, &server.uri(), &spec(), None).await.unwrap();
        assert_eq!(result, PollOutcome::Succeeded(json!({"status": "completed"})));
    }

    #[tokio::test]
    async fn poll_until_terminal_times_out_when_never_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "pending"})))
            .mount(&server)
            .await;

        let mut short_spec = spec();
        short_spec.timeout_ms = 20;
        short_spec.interval_ms = 5;

        let client = reqwest::Client::new();
        let result = poll_until_terminal(&client, &server.uri(), &short_spec, None).await;
        assert!(matches!(result, Err(e) if e.kind() == crate::error::ErrorKind::Timeout));
    }
}
