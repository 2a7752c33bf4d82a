//! Authentication: token resolution, header attachment, and refresh.
//!
//! The resolution chain is strict and ordered — see [`resolve_token`]. Token
//! storage is behind the [`storage::AuthStorage`] trait so tests can swap in
//! [`storage::MemoryAuthStorage`] without touching a real keyring or file.

pub mod jwt;
pub mod oauth;
pub mod storage;

use crate::error::Error;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use storage::{AuthStorage, StoredAuth};

/// Where a resolved token ultimately came from. Surfaced by `auth status`
/// and useful in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Flag,
    RosaTokenEnv,
    OcmTokenEnv,
    Storage,
    Interactive,
}

#[derive(Debug, Clone)]
pub struct ResolvedToken {
    pub token: String,
    pub source: TokenSource,
}

/// Resolves the active access token via the fixed 5-step chain: an explicit
/// `--token` flag, then `ROSA_TOKEN`, then `OCM_TOKEN` (compat), then the
/// active storage backend, then an interactive prompt. The last step is
/// unavailable when `interactive` is false.
///
/// # Errors
/// Returns `Error::auth` if no step yields a token.
pub fn resolve_token(
    flag_token: Option<&str>,
    storage: &dyn AuthStorage,
    interactive: bool,
) -> Result<ResolvedToken, Error> {
    if let Some(token) = flag_token {
        return Ok(ResolvedToken {
            token: token.to_string(),
            source: TokenSource::Flag,
        });
    }
    if let Ok(token) = std::env::var(crate::constants::ENV_ROSA_TOKEN) {
        if !token.is_empty() {
            return Ok(ResolvedToken {
                token,
                source: TokenSource::RosaTokenEnv,
            });
        }
    }
    if let Ok(token) = std::env::var(crate::constants::ENV_OCM_TOKEN) {
        if !token.is_empty() {
            return Ok(ResolvedToken {
                token,
                source: TokenSource::OcmTokenEnv,
            });
        }
    }
    if let Some(stored) = storage.load()? {
        if let Some(token) = stored.access_token {
            return Ok(ResolvedToken {
                token,
                source: TokenSource::Storage,
            });
        }
    }
    if interactive {
        let token = crate::interactive::prompt_for_input("API token")?;
        if !token.trim().is_empty() {
            return Ok(ResolvedToken {
                token,
                source: TokenSource::Interactive,
            });
        }
    }
    Err(Error::auth(
        "No API token found. Run `auth login`, set ROSA_TOKEN, or pass --token.",
    ))
}

/// Sets the `Authorization: Bearer <token>` header on `headers`.
///
/// # Errors
/// Returns `Error::internal` if `token` contains characters invalid in an
/// HTTP header value.
pub fn apply_auth_headers(headers: &mut HeaderMap, token: &str) -> Result<(), Error> {
    let value = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| Error::internal(format!("token is not a valid header value: {e}")))?;
    headers.insert(AUTHORIZATION, value);
    Ok(())
}

/// Skew window before expiry within which a token is treated as "about to
/// expire" and proactively refreshed.
const REFRESH_SKEW_SECONDS: i64 = 30;

/// Refreshes the stored access token if it's within [`REFRESH_SKEW_SECONDS`]
/// of expiry (or already expired), replacing only the access token slot and
/// leaving the refresh token untouched.
///
/// Returns the (possibly unchanged) access token to use for this call.
///
/// # Errors
/// Returns an error if refresh is needed but no refresh token is stored, or
/// if the refresh request itself fails.
pub async fn refresh_if_needed(
    client: &reqwest::Client,
    token_url: &str,
    client_id: &str,
    storage: &dyn AuthStorage,
) -> Result<String, Error> {
    let stored = storage
        .load()?
        .ok_or_else(|| Error::auth("no stored credentials to refresh"))?;
    let access_token = stored
        .access_token
        .clone()
        .ok_or_else(|| Error::auth("no access token stored"))?;

    let needs_refresh = match jwt::expires_at(&access_token) {
        Some(exp) => exp - Utc::now().timestamp() <= REFRESH_SKEW_SECONDS,
        None => false,
    };
    if !needs_refresh {
        return Ok(access_token);
    }

    let refresh_token = stored
        .refresh_token
        .clone()
        .ok_or_else(|| Error::auth_expired("access token expired and no refresh token is stored"))?;

    let response = client
        .post(token_url)
        .form(&[
            ("grant_type", "refresh_token"),
            ("client_id", client_id),
            ("refresh_token", refresh_token.as_str()),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::auth_expired(format!(
            "token refresh failed (HTTP {status}): {body}"
        )));
    }

    let refreshed: oauth::TokenResponse = response.json().await?;
    storage.save(&StoredAuth {
        access_token: Some(refreshed.access_token.clone()),
        refresh_token: Some(refresh_token),
        username: stored.username,
    })?;
    Ok(refreshed.access_token)
}

/// Stores the outcome of a successful login, deriving the username from the
/// access token's claims when present.
///
/// # Errors
/// Returns an error if the storage backend can't be written to.
pub fn persist_login(storage: &dyn AuthStorage, tokens: &oauth::TokenResponse) -> Result<(), Error> {
    let username = jwt::decode_claims(&tokens.access_token).and_then(|c| jwt::extract_username(&c));
    storage.save(&StoredAuth {
        access_token: Some(tokens.access_token.clone()),
        refresh_token: tokens.refresh_token.clone(),
        username,
    })
}

/// Status summary for `auth status`.
#[derive(Debug, Clone)]
pub struct AuthStatus {
    pub logged_in: bool,
    pub username: Option<String>,
    pub expires_at: Option<i64>,
}

/// Reads the stored auth state without touching the resolution chain — used
/// by `auth status`, which should never fall through to an interactive
/// prompt or env vars.
///
/// # Errors
/// Returns an error if the storage backend exists but cannot be read.
pub fn status(storage: &dyn AuthStorage) -> Result<AuthStatus, Error> {
    match storage.load()? {
        Some(stored) if !stored.is_empty() => {
            let expires_at = stored.access_token.as_deref().and_then(jwt::expires_at);
            Ok(AuthStatus {
                logged_in: true,
                username: stored.username,
                expires_at,
            })
        }
        _ => Ok(AuthStatus {
            logged_in: false,
            username: None,
            expires_at: None,
        }),
    }
}

/// Clears stored credentials. Used by `auth logout`.
///
/// # Errors
/// Returns an error if the storage backend cannot be cleared.
pub fn logout(storage: &dyn AuthStorage) -> Result<(), Error> {
    storage.clear()
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::MemoryAuthStorage;

    #[test]
    fn flag_token_wins_over_everything() {
        std::env::set_var(crate::constants::ENV_ROSA_TOKEN, "from-env");
        let storage = MemoryAuthStorage::new();
        let resolved = resolve_token(Some("from-flag"), &storage, false).unwrap();
        assert_eq!(resolved.token, "from-flag");
        assert_eq!(resolved.source, TokenSource::Flag);
        std::env::remove_var(crate::constants::ENV_ROSA_TOKEN);
    }

    #[test]
    fn rosa_token_env_wins_over_ocm_token_env() {
        std::env::set_var(crate::constants::ENV_ROSA_TOKEN, "rosa-value");
        std::env::set_var(crate::constants::ENV_OCM_TOKEN, "ocm-value");
        let storage = MemoryAuthStorage::new();
        let resolved = resolve_token(None, &storage, false).unwrap();
        assert_eq!(resolved.token, "rosa-value");
        assert_eq!(resolved.source, TokenSource::RosaTokenEnv);
        std::env::remove_var(crate::constants::ENV_ROSA_TOKEN);
        std::env::remove_var(crate::constants::ENV_OCM_TOKEN);
    }

    #[test]
    fn falls_back_to_storage_when_no_flag_or_env() {
        let storage = MemoryAuthStorage::new();
        storage
            .save(&StoredAuth {
                access_token: Some("stored-token".to_string()),
                refresh_token: None,
                username: None,
            })
            .unwrap();
        let resolved = resolve_token(None, &storage, false).unwrap();
        assert_eq!(resolved.token, "stored-token");
        assert_eq!(resolved.source, TokenSource::Storage);
    }

    #[test]
    fn errors_when_nothing_resolves_and_not_interactive() {
        let storage = MemoryAuthStorage::new();
        let result = resolve_token(None, &storage, false);
        assert!(result.is_err());
    }

    #[test]
    fn apply_auth_headers_sets_bearer_scheme() {
        let mut headers = HeaderMap::new();
        apply_auth_headers(&mut headers, "abc123").unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc123");
    }

    #[test]
    fn status_reports_logged_out_when_storage_empty() {
        let storage = MemoryAuthStorage::new();
        let status = status(&storage).unwrap();
        assert!(!status.logged_in);
    }

    #[test]
    fn status_reports_logged_in_with_username() {
        let storage = MemoryAuthStorage::new();
        storage
            .save(&StoredAuth {
                access_token: Some("t".to_string()),
                refresh_token: None,
                username: Some("alice".to_string()),
            })
            .unwrap();
        let status = status(&storage).unwrap();
        assert!(status.logged_in);
        assert_eq!(status.username, Some("alice".to_string()));
    }

    #[test]
    fn logout_clears_storage() {
        let storage = MemoryAuthStorage::new();
        storage
            .save(&StoredAuth {
                access_token: Some("t".to_string()),
                refresh_token: None,
                username: None,
            })
            .unwrap();
        logout(&storage).unwrap();
        assert!(storage.load().unwrap().is_none());
    }
}
