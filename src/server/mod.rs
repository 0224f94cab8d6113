//! HTTP server for the task API.
//!
//! This module provides the axum router, the state shared by handlers, and
//! the listener lifecycle.

pub mod accounts;
pub mod extract;
pub mod tasks;

use anyhow::{Context, bail};
use axum::{
    Json, Router,
    response::IntoResponse,
    routing::{get, patch, post},
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::auth::TokenIssuer;
use crate::config::{AuthConfig, AuthMode};
use crate::db::Database;

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Database>,
    tokens: Arc<TokenIssuer>,
    auth: Arc<AuthConfig>,
}

impl AppState {
    pub fn new(db: Arc<Database>, auth: AuthConfig) -> Self {
        let tokens = TokenIssuer::new(&auth.jwt_secret, auth.token_ttl_seconds);
        Self {
            db,
            tokens: Arc::new(tokens),
            auth: Arc::new(auth),
        }
    }

    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }
}

/// Health check response.
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the router. Account routes exist only in token mode.
pub fn build_router(state: AppState) -> Router {
    // The browser client is served from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/health", get(health))
        .route("/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/tasks/{id}",
            patch(tasks::update_task).delete(tasks::delete_task),
        );

    if state.auth().mode == AuthMode::Token {
        router = router
            .route("/register", post(accounts::register))
            .route("/login", post(accounts::login));
    }

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Handle for a running server.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<std::io::Result<()>>,
}

/// Flatten the server task's outcome into one error.
fn task_result(result: Result<std::io::Result<()>, JoinError>) -> anyhow::Result<()> {
    result
        .context("server task panicked or was cancelled")?
        .context("server stopped with an error")
}

impl ServerHandle {
    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections and wait for in-flight requests to finish.
    pub async fn shutdown(mut self) -> anyhow::Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        task_result(self.task.await)
    }

    /// Serve until `signal` resolves, then shut down gracefully.
    ///
    /// Returns an error if the server stops by itself, even cleanly.
    pub async fn run_until<F>(mut self, signal: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        let finished = tokio::select! {
            _ = signal => None,
            result = &mut self.task => Some(result),
        };

        match finished {
            None => {
                info!("Shutdown signal received");
                self.shutdown().await
            }
            Some(result) => {
                task_result(result)?;
                bail!("server stopped unexpectedly")
            }
        }
    }
}

/// Bind `bind_addr` and serve in a background task.
pub async fn start_server(state: AppState, bind_addr: &str) -> anyhow::Result<ServerHandle> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    let addr = listener.local_addr()?;

    info!("Task store listening on http://{}", addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("Task store shutting down");
            })
            .await;
        if let Err(e) = &result {
            error!("Server error: {}", e);
        }
        result
    });

    Ok(ServerHandle {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}
