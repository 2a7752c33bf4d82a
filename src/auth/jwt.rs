//! Lightweight JWT/JWE introspection — no signature verification, since the
//! runtime never needs to trust the token itself, only classify which
//! storage slot it belongs in and pull a display name out of it.

use base64::Engine;
use serde_json::Value;

/// Which storage slot a bearer string belongs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
    /// A 5-segment JWE, or anything else that doesn't parse as a 3-segment
    /// JWS. Always routed to the refresh slot, never attached as a bearer
    /// token.
    Unknown,
}

/// Classifies a raw token string by counting dot-separated segments and, for
/// a 3-segment JWS, reading its `typ` claim.
#[must_use]
pub fn classify(token: &str) -> TokenKind {
    match token.matches('.').count() {
        2 => classify_jws(token),
        4 => TokenKind::Unknown,
        _ => TokenKind::Unknown,
    }
}

fn classify_jws(token: &str) -> TokenKind {
    let Some(claims) = decode_claims(token) else {
        return TokenKind::Unknown;
    };
    match claims.get("typ").and_then(Value::as_str) {
        Some("Refresh") => TokenKind::Refresh,
        Some("Offline") => TokenKind::Refresh,
        _ => TokenKind::Access,
    }
}

/// Decodes the middle (payload) segment of a 3-segment JWS into its claims.
/// Returns `None` for anything that isn't a well-formed 3-segment JWS —
/// callers should treat that as "can't tell, be conservative".
#[must_use]
pub fn decode_claims(token: &str) -> Option<Value> {
    let mut segments = token.split('.');
    let _header = segments.next()?;
    let payload = segments.next()?;
    if segments.next().is_none() {
        return None;
    }
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Extracts a display username from decoded claims: `preferred_username`
/// first, then `username`.
#[must_use]
pub fn extract_username(claims: &Value) -> Option<String> {
    claims
        .get("preferred_username")
        .and_then(Value::as_str)
        .or_else(|| claims.get("username").and_then(Value::as_str))
        .map(str::to_string)
}

/// The `exp` claim, in seconds since the epoch, if present and well-formed.
#[must_use]
pub fn expires_at(token: &str) -> Option<i64> {
    decode_claims(token)?.get("exp")?.as_i64()
}
