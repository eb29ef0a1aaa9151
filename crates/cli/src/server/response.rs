//! Response shapes and error translation
//!
//! Store faults never reach the caller verbatim: they are logged here and
//! replaced by their [`ErrorToken`].

use axum::{
    Json,
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use sb_core::{Error, ErrorToken, SessionId};
use serde::Serialize;
use serde_json::json;

use super::session_id::{HEADER_NAME, session_cookie};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    Ok,
    Error,
}

/// `{status, message}` body used by the session endpoints
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status: Status,
    pub message: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(message: T) -> Self {
        Self {
            status: Status::Ok,
            message,
        }
    }
}

impl Envelope<[ErrorToken; 1]> {
    pub fn error(token: ErrorToken) -> Self {
        Self {
            status: Status::Error,
            message: [token],
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Bind the response to `id` through both the cookie and the header
pub fn with_session(mut response: Response, id: &SessionId) -> Response {
    let headers = response.headers_mut();
    headers.insert(header::SET_COOKIE, session_cookie(id));
    if let Ok(value) = HeaderValue::from_str(id.as_str()) {
        headers.insert(HeaderName::from_static(HEADER_NAME), value);
    }
    response
}

/// Add the permissive CORS headers to every response
pub async fn cors_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static(HEADER_NAME),
    );
    response
}

/// A failed request, tagged with the body shape its endpoint answers with
#[derive(Debug)]
pub enum ApiError {
    /// `GET /`: 404 with an empty string
    Snapshot(Error),
    /// 200 `{status:"Error", message:[Token]}`
    Envelope(Error),
    /// 200 `{status:"Error", message:null}`
    NullEnvelope(Error),
    /// 404 `{size:0}`
    Size(Error),
    /// 404 `"Error"`
    Objects(Error),
}

impl ApiError {
    fn error(&self) -> &Error {
        match self {
            Self::Snapshot(e)
            | Self::Envelope(e)
            | Self::NullEnvelope(e)
            | Self::Size(e)
            | Self::Objects(e) => e,
        }
    }
}

fn log_failure(error: &Error) {
    let token = error.token();
    match error {
        Error::NoSession | Error::NoBucketSelected => {
            tracing::debug!(%token, "Request rejected: {error}");
        }
        Error::Auth(_) | Error::Bucket(_) | Error::NotFound(_) => {
            tracing::warn!(%token, "Request failed: {error}");
        }
        _ => tracing::error!(%token, "Request failed: {error}"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = self.error();
        log_failure(error);

        match &self {
            Self::Snapshot(_) => (StatusCode::NOT_FOUND, Json("")).into_response(),
            Self::Envelope(e) => Envelope::error(e.token()).into_response(),
            Self::NullEnvelope(_) => Envelope {
                status: Status::Error,
                message: (),
            }
            .into_response(),
            Self::Size(_) => (StatusCode::NOT_FOUND, Json(json!({ "size": 0 }))).into_response(),
            Self::Objects(_) => (StatusCode::NOT_FOUND, Json("Error")).into_response(),
        }
    }
}
