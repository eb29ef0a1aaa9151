//! Session id transport
//!
//! Callers identify their session with the `s3b_session` cookie or the
//! `x-session-id` header; the header wins when both are present.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, header, request::Parts},
};
use sb_core::SessionId;

pub const COOKIE_NAME: &str = "s3b_session";
pub const HEADER_NAME: &str = "x-session-id";

/// The session id sent with a request, if any
#[derive(Debug, Clone, Default)]
pub struct CallerSession(pub Option<SessionId>);

impl CallerSession {
    pub fn id(&self) -> Option<&SessionId> {
        self.0.as_ref()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CallerSession {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_id_from_headers(&parts.headers)))
    }
}

/// Extract a well-formed session id from headers or cookies
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<SessionId> {
    if let Some(id) = headers
        .get(HEADER_NAME)
        .and_then(|v| v.to_str().ok())
        .and_then(SessionId::parse)
    {
        return Some(id);
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .and_then(|(_, value)| SessionId::parse(value))
}

/// `Set-Cookie` value binding the caller to `id`
pub fn session_cookie(id: &SessionId) -> HeaderValue {
    // uuid text is always a valid header value
    HeaderValue::from_str(&format!(
        "{COOKIE_NAME}={id}; Path=/; HttpOnly; SameSite=Lax"
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("s3b_session=; Path=/"))
}

/// `Set-Cookie` value removing the session cookie
pub fn expired_cookie() -> HeaderValue {
    HeaderValue::from_static("s3b_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
