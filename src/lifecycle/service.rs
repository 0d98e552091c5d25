use std::sync::Arc;

use axum::Router;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::session::{SessionContext, SessionSettings};
use crate::web::{build_router, AppState};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("could not bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// The running order form service.
///
/// `OrderService` is responsible for:
/// - **Wiring**: building the session context from configuration
/// - **Serving**: running the HTTP server until Ctrl-C
/// - **Shutdown**: dropping the session, which closes the store connection
///
/// The store connection is established lazily on the first page load (or
/// by [`OrderService::warm_up`]); a failure is shown on the page rather than
/// stopping the service.
pub struct OrderService {
    bind: String,
    state: Arc<AppState>,
}

impl OrderService {
    pub fn new(config: &AppConfig) -> Result<Self, ServiceError> {
        let settings = SessionSettings::from(config);
        let session = SessionContext::new(config.store.clone(), settings);
        let state = Arc::new(AppState::new(session, config.server.title.clone())?);
        Ok(Self {
            bind: config.server.bind.clone(),
            state,
        })
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Runs one page-load pass so connection problems show up in the log at startup.
    pub async fn warm_up(&self) {
        let view = self.state.session.lock().await.refresh().await;
        if view.connected {
            info!(ingredients = view.ingredients.len(), "Store ready");
        } else {
            for feedback in &view.feedback {
                warn!(message = feedback.message(), "Store not ready");
            }
        }
    }

    /// Serves until Ctrl-C, then shuts down gracefully.
    pub async fn run(self) -> Result<(), ServiceError> {
        let listener = tokio::net::TcpListener::bind(&self.bind)
            .await
            .map_err(|source| ServiceError::Bind {
                addr: self.bind.clone(),
                source,
            })?;
        info!(addr = %self.bind, "Serving order form");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(ServiceError::Serve)?;

        self.shutdown();
        Ok(())
    }

    /// Drops the session; the store actor exits once its last client is gone.
    pub fn shutdown(self) {
        info!("Shutting down...");
        drop(self.state);
        info!("Shutdown complete.");
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
