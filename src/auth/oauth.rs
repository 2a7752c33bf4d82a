//! Browser-based PKCE login and device-code login.
//!
//! Both flows end by handing a freshly issued access/refresh token pair back
//! to the caller; neither one touches [`crate::auth::storage`] directly —
//! that's the caller's job (see [`crate::auth::login_with_browser`] and
//! [`crate::auth::login_with_device_code`]).

use crate::error::Error;
use base64::Engine;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::{sleep, Instant};

/// Default loopback port for the PKCE redirect listener. Configurable since
/// some environments reserve it.
pub const DEFAULT_REDIRECT_PORT: u16 = 9998;

const BROWSER_FLOW_TIMEOUT: Duration = Duration::from_secs(5 * 60);

pub struct PkceChallenge {
    pub verifier: String,
    pub challenge: String,
}

/// Generates a fresh S256 PKCE verifier/challenge pair.
#[must_use]
pub fn generate_pkce() -> PkceChallenge {
    let verifier_bytes: Vec<u8> = (0..32).map(|_| fastrand::u8(..)).collect();
    let verifier = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(verifier_bytes);
    let digest = Sha256::digest(verifier.as_bytes());
    let challenge = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest);
    PkceChallenge { verifier, challenge }
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// Runs a full browser PKCE login: opens `authorize_url` (expected to already
/// carry `response_type=code`, `code_challenge`, `code_challenge_method=S256`,
/// and a `redirect_uri` pointing at `127.0.0.1:<port>`), waits for the
/// loopback callback, then exchanges the authorization code for tokens.
///
/// # Errors
/// Returns an error if the browser can't be opened, the callback doesn't
/// arrive within the timeout, or the token exchange fails.
pub async fn run_browser_login(
    client: &reqwest::Client,
    authorize_url: &str,
    token_url: &str,
    client_id: &str,
    redirect_uri: &str,
    pkce: &PkceChallenge,
    port: u16,
) -> Result<TokenResponse, Error> {
    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .map_err(|e| Error::internal(format!("failed to bind loopback listener on port {port}: {e}")))?;

    webbrowser::open(authorize_url)
        .map_err(|e| Error::internal(format!("failed to open browser: {e}")))?;

    let code = tokio::time::timeout(BROWSER_FLOW_TIMEOUT, accept_authorization_code(&listener))
        .await
        .map_err(|_| Error::timeout("timed out waiting for browser login callback"))??;

    exchange_authorization_code(client, token_url, client_id, redirect_uri, &pkce.verifier, &code).await
}

async fn accept_authorization_code(listener: &TcpListener) -> Result<String, Error> {
    loop {
        let (mut stream, _) = listener
            .accept()
            .await
            .map_err(|e| Error::internal(format!("loopback listener accept failed: {e}")))?;

        let mut buf = [0u8; 4096];
        let n = stream
            .read(&mut buf)
            .await
            .map_err(|e| Error::internal(format!("failed to read callback request: {e}")))?;
        let request = String::from_utf8_lossy(&buf[..n]);

        let response_body = "Login complete. You may close this tab and return to the terminal.";
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{response_body}",
            response_body.len()
        );
        let _ = stream.write_all(response.as_bytes()).await;

        if let Some(code) = extract_query_param(&request, "code") {
            return Ok(code);
        }
        // Not a callback carrying a code (e.g. a favicon request) — keep waiting.
    }
}

fn extract_query_param(http_request: &str, name: &str) -> Option<String> {
    let request_line = http_request.lines().next()?;
    let path = request_line.split_whitespace().nth(1)?;
    let (_, query) = path.split_once('?')?;
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name).then(|| urlencoding::decode(value).ok().map(|v| v.into_owned()))?
    })
}

async fn exchange_authorization_code(
    client: &reqwest::Client,
    token_url: &str,
    client_id: &str,
    redirect_uri: &str,
    code_verifier: &str,
    code: &str,
) -> Result<TokenResponse, Error> {
    let response = client
        .post(token_url)
        .form(&[
            ("grant_type", "authorization_code"),
            ("client_id", client_id),
            ("redirect_uri", redirect_uri),
            ("code", code),
            ("code_verifier", code_verifier),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::api(status, body));
    }

    response.json().await.map_err(Error::from)
}

#[derive(Debug, Deserialize)]
struct DeviceCodeResponse {
    device_code: String,
    user_code: String,
    verification_uri: String,
    #[serde(default = "default_device_poll_interval")]
    interval: u64,
    expires_in: u64,
}

const fn default_device_poll_interval() -> u64 {
    5
}

/// Starts a device-code login: requests a device code, prints the
/// verification URL and user code, then polls the token endpoint at the
/// server-indicated interval until the user completes the flow or it
/// expires.
///
/// # Errors
/// Returns an error if the device-code request fails, the flow expires
/// before authorization completes, or the final token exchange fails.
pub async fn run_device_code_login(
    client: &reqwest::Client,
    device_authorization_url: &str,
    token_url: &str,
    client_id: &str,
) -> Result<TokenResponse, Error> {
    let device_response: DeviceCodeResponse = client
        .post(device_authorization_url)
        .form(&[("client_id", client_id)])
        .send()
        .await?
        .json()
        .await?;

    println!(
        "To continue, open {} and enter code: {}",
        device_response.verification_uri, device_response.user_code
    );

    let deadline = Instant::now() + Duration::from_secs(device_response.expires_in);
    let poll_interval = Duration::from_secs(device_response.interval.max(1));

    loop {
        if Instant::now() >= deadline {
            return Err(Error::timeout("device code login expired before authorization completed"));
        }
        sleep(poll_interval).await;

        let response = client
            .post(token_url)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:device_code"),
                ("device_code", &device_response.device_code),
                ("client_id", client_id),
            ])
            .send()
            .await?;

        if response.status().is_success() {
            return response.json().await.map_err(Error::from);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        if body.contains("authorization_pending") || body.contains("slow_down") {
            continue;
        }
        return Err(Error::api(status, body));
    }
}
