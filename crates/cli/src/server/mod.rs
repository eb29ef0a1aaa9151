//! HTTP surface of the browser.
//!
//! ## Routes
//! - `OPTIONS` on every route - CORS preflight
//! - `GET    /`        - current session state (no credentials)
//! - `POST   /`        - test credentials and open a session
//! - `DELETE /`        - drop the caller's session
//! - `GET    /buckets` - bucket list (cached per session, `?refresh=true` refetches)
//! - `POST   /bucket`  - select the bucket to browse
//! - `GET    /size`    - total size under `?prefix=`
//! - `GET    /objects` - one folder level under `?prefix=`
//! - `GET    /healthz` - liveness

use std::io::ErrorKind;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use sb_core::{ServerSettings, SessionStore};
use tokio::net::TcpListener;

pub mod handlers;
pub mod response;
pub mod session_id;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(sessions: SessionStore) -> Self {
        Self {
            sessions: Arc::new(sessions),
        }
    }
}

/// Build the router with CORS headers applied to every response
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/",
            get(handlers::home)
                .post(handlers::connect)
                .delete(handlers::clear)
                .options(handlers::preflight),
        )
        .route(
            "/buckets",
            get(handlers::buckets).options(handlers::preflight),
        )
        .route(
            "/bucket",
            post(handlers::select_bucket).options(handlers::preflight),
        )
        .route("/size", get(handlers::size).options(handlers::preflight))
        .route(
            "/objects",
            get(handlers::objects).options(handlers::preflight),
        )
        .route("/healthz", get(handlers::healthz))
        .fallback(handlers::not_found)
        .layer(middleware::map_response(response::cors_headers))
        .with_state(state)
}

/// Bind and serve until Ctrl+C
pub async fn serve(settings: &ServerSettings, state: AppState) -> Result<()> {
    let addr = settings.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(settings.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", settings.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}
