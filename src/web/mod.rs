//! Presentation Layer: the order form served over HTTP.
//!
//! | Route          | Action                                               |
//! |----------------|------------------------------------------------------|
//! | `GET /`        | Page-load pass, renders the form                     |
//! | `POST /orders` | Submit pass, re-renders the form with the outcome    |
//! | `GET /health`  | JSON snapshot of connection state (never connects)   |

pub mod form;
pub mod handlers;
pub mod render;

pub use form::OrderForm;
pub use render::PageRenderer;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::sync::Mutex;

use crate::session::SessionContext;

/// Shared state behind every handler.
///
/// The session sits behind one async mutex, so each request runs its whole
/// pass before the next one starts.
pub struct AppState {
    pub session: Mutex<SessionContext>,
    pub renderer: PageRenderer,
    pub title: String,
}

impl AppState {
    pub fn new(session: SessionContext, title: impl Into<String>) -> Result<Self, tera::Error> {
        Ok(Self {
            session: Mutex::new(session),
            renderer: PageRenderer::new()?,
            title: title.into(),
        })
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/orders", post(handlers::submit_order))
        .route("/health", get(handlers::health))
        .with_state(state)
}
