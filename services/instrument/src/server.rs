//! HTTP server
//!
//! Exposes `GET /health` and `POST /run` over axum.

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::runner::CommandRunner;
use crate::types::{Config, InstrumentError};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<CommandRunner>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            runner: Arc::new(CommandRunner::new(config)),
        }
    }
}

/// Create the router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/run", post(handlers::run_command))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured address and serve until SIGINT/SIGTERM
pub async fn serve(config: Config) -> Result<(), InstrumentError> {
    let addr = config.server.bind;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| InstrumentError::Bind { addr, source })?;

    tracing::info!("Starting instrument server on http://{}", addr);

    serve_with_listener(listener, config, service_common::shutdown_signal()).await
}

/// Serve on an already-bound listener until `shutdown` resolves
pub async fn serve_with_listener<F>(
    listener: TcpListener,
    config: Config,
    shutdown: F,
) -> Result<(), InstrumentError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = AppState::new(&config);

    if !state.runner.data_dir().is_dir() {
        tracing::warn!(
            "Data directory {} does not exist, every run will fail to spawn",
            state.runner.data_dir().display()
        );
    }
    tracing::info!(
        "Commands run via {} in {}",
        state.runner.shell(),
        state.runner.data_dir().display()
    );

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
