//! Request handlers
//!
//! Each handler resolves the caller's session, runs one session operation
//! and answers with the body shape its endpoint promises. Failures go
//! through [`ApiError`] so only error tokens reach the caller.

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use sb_core::{Connection, Error, ResolvedSession};
use serde::Deserialize;
use serde_json::json;

use super::AppState;
use super::response::{ApiError, Envelope, with_session};
use super::session_id::{CallerSession, expired_cookie};

#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    pub endpoint: String,
    pub key: String,
    pub secret: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectBucketRequest {
    pub bucket: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct BucketsQuery {
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct PrefixQuery {
    pub prefix: Option<String>,
}

/// Attach the session binding when the session was opened for this request
fn finish(resolved: &ResolvedSession, body: impl IntoResponse) -> Response {
    let response = body.into_response();
    if resolved.created {
        with_session(response, &resolved.id)
    } else {
        response
    }
}

fn rejected(reason: impl std::fmt::Display) -> Error {
    Error::Unknown(format!("Malformed request: {reason}"))
}

/// `GET /` - session state without credentials
pub async fn home(
    State(state): State<AppState>,
    caller: CallerSession,
) -> Result<Response, ApiError> {
    let resolved = state
        .sessions
        .resolve(caller.id())
        .await
        .map_err(ApiError::Snapshot)?;

    let snapshot = resolved.session.lock().await.snapshot();
    Ok(finish(&resolved, Json(snapshot)))
}

/// `POST /` - test credentials and open a session
pub async fn connect(
    State(state): State<AppState>,
    caller: CallerSession,
    body: Result<Json<ConnectRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::Envelope(rejected(e.body_text())))?;
    let connection = Connection::new(request.endpoint, request.key, request.secret)
        .map_err(ApiError::Envelope)?;

    let (id, buckets) = state
        .sessions
        .open(caller.0, connection)
        .await
        .map_err(ApiError::Envelope)?;

    Ok(with_session(Envelope::ok(buckets).into_response(), &id))
}

/// `DELETE /` - drop the caller's session
pub async fn clear(
    State(state): State<AppState>,
    caller: CallerSession,
) -> Result<Response, ApiError> {
    let id = caller.id().ok_or(ApiError::Envelope(Error::NoSession))?;
    if !state.sessions.clear(id).await {
        return Err(ApiError::Envelope(Error::NoSession));
    }

    let mut response = Envelope::ok("Session cleared.").into_response();
    response
        .headers_mut()
        .insert(header::SET_COOKIE, expired_cookie());
    Ok(response)
}

/// `GET /buckets` - cached bucket list, refetched with `?refresh=true`
pub async fn buckets(
    State(state): State<AppState>,
    caller: CallerSession,
    query: Result<Query<BucketsQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::NullEnvelope(rejected(e.body_text())))?;
    let resolved = state
        .sessions
        .resolve(caller.id())
        .await
        .map_err(ApiError::NullEnvelope)?;

    let buckets = {
        let mut session = resolved.session.lock().await;
        if query.refresh {
            session.refresh_buckets().await
        } else {
            session.get_buckets().await
        }
    }
    .map_err(ApiError::NullEnvelope)?;

    Ok(finish(&resolved, Envelope::ok(buckets)))
}

/// `POST /bucket` - select the bucket to browse
pub async fn select_bucket(
    State(state): State<AppState>,
    caller: CallerSession,
    body: Result<Json<SelectBucketRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::Envelope(rejected(e.body_text())))?;
    let resolved = state
        .sessions
        .resolve(caller.id())
        .await
        .map_err(ApiError::Envelope)?;

    resolved
        .session
        .lock()
        .await
        .select_bucket(request.bucket.as_str());

    Ok(finish(&resolved, Envelope::ok(request.bucket)))
}

/// `GET /size` - total size under `?prefix=` in the selected bucket
pub async fn size(
    State(state): State<AppState>,
    caller: CallerSession,
    query: Result<Query<PrefixQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::Size(rejected(e.body_text())))?;
    let resolved = state
        .sessions
        .resolve(caller.id())
        .await
        .map_err(ApiError::Size)?;

    let prefix = query.prefix.unwrap_or_default();
    let size = resolved
        .session
        .lock()
        .await
        .get_size(&prefix)
        .await
        .map_err(ApiError::Size)?;

    Ok(finish(&resolved, Json(json!({ "size": size }))))
}

/// `GET /objects` - one folder level under `?prefix=` in the selected bucket
pub async fn objects(
    State(state): State<AppState>,
    caller: CallerSession,
    query: Result<Query<PrefixQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::Objects(rejected(e.body_text())))?;
    let resolved = state
        .sessions
        .resolve(caller.id())
        .await
        .map_err(ApiError::Objects)?;

    let prefix = query.prefix.unwrap_or_default();
    let objects = resolved
        .session
        .lock()
        .await
        .get_objects(&prefix)
        .await
        .map_err(ApiError::Objects)?;

    Ok(finish(&resolved, Json(objects)))
}

/// `GET /healthz`
pub async fn healthz() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// `OPTIONS` on any route
pub async fn preflight() -> impl IntoResponse {
    Envelope::ok("Preflight request accepted.")
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "The requested page does not exist.")
}
