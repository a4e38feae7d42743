//! HTTP front end for the dashboard.

mod handlers;
mod routes;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::queries::ZoneBounds;
use crate::responses::ResponseLog;
use crate::services::dataset::DatasetService;
use crate::session::SessionStore;

pub use handlers::SESSION_COOKIE;
pub use routes::create_router;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub datasets: Arc<DatasetService>,
    pub sessions: Arc<SessionStore>,
    pub responses: Arc<ResponseLog>,
    pub zone: ZoneBounds,
}

impl AppState {
    pub fn new(datasets: DatasetService, responses: ResponseLog, zone: ZoneBounds) -> Self {
        Self {
            datasets: Arc::new(datasets),
            sessions: Arc::new(SessionStore::new()),
            responses: Arc::new(responses),
            zone,
        }
    }
}

/// Binds `address` and serves the dashboard until the process is stopped.
pub async fn serve(address: &str, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!(address = %listener.local_addr()?, "Dashboard listening");

    axum::serve(listener, create_router(state))
        .await
        .context("server stopped unexpectedly")
}
