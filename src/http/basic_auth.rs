//! Requester attribution from HTTP Basic-Auth credentials.

use axum::http::{header, HeaderMap};
use base64::prelude::*;

/// Username from an `Authorization: Basic ...` header.
///
/// Only the identity is extracted; the password is never checked or kept.
/// Returns `None` for other schemes, malformed credentials and empty names.
pub fn basic_auth_user(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, credentials) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = BASE64_STANDARD.decode(credentials.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, _password) = decoded.split_once(':')?;

    if user.is_empty() {
        None
    } else {
        Some(user.to_string())
    }
}
