//! Axum-based HTTP status surface
//!
//! Read-only: serves the latest [`ControllerSnapshot`] published by the
//! controller. The server never touches the controller itself.

use crate::controller::ControllerSnapshot;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub snapshot_rx: watch::Receiver<Arc<ControllerSnapshot>>,
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.snapshot_rx.borrow().clone();
    Json(snapshot.as_ref().clone())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/status", get(status))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// HTTP server bound to a controller's snapshot channel
pub struct WebServer {
    state: AppState,
}

impl WebServer {
    pub fn new(snapshot_rx: watch::Receiver<Arc<ControllerSnapshot>>) -> Self {
        Self {
            state: AppState { snapshot_rx },
        }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Bind and serve until the listener fails
    pub async fn start(self, host: &str, port: u16) -> anyhow::Result<()> {
        let router = self.router();
        let logger = crate::logging::get_logger("web");
        logger.info(&format!(
            "Starting web server; requested host={}, port={}",
            host, port
        ));

        let addr = match host.parse::<IpAddr>() {
            Ok(ip) => SocketAddr::new(ip, port),
            Err(_) => {
                logger.warn(&format!("Invalid host '{}'; falling back to 127.0.0.1", host));
                ([127, 0, 0, 1], port).into()
            }
        };

        let listener = tokio::net::TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        logger.info(&format!(
            "Web server listening at http://{}:{} (API /api)",
            local_addr.ip(),
            local_addr.port()
        ));

        axum::serve(listener, router).await?;
        Ok(())
    }
}
