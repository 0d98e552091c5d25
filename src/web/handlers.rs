use std::sync::Arc;

use axum::extract::{RawForm, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use serde::Serialize;
use tracing::{debug, error, instrument};

use super::{AppState, OrderForm};
use crate::session::PageView;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub connected: bool,
    pub ingredients: usize,
}

#[instrument(skip(state))]
pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    let view = state.session.lock().await.refresh().await;
    render(&state, &view)
}

#[instrument(skip(state, body))]
pub async fn submit_order(State(state): State<Arc<AppState>>, RawForm(body): RawForm) -> Response {
    let form = OrderForm::parse(&body);
    debug!(?form, "Order form received");
    let view = state
        .session
        .lock()
        .await
        .submit(form.name_on_order, form.ingredients)
        .await;
    render(&state, &view)
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    let session = state.session.lock().await;
    Json(HealthReport {
        connected: session.is_connected(),
        ingredients: session.cached_ingredients(),
    })
}

fn render(state: &AppState, view: &PageView) -> Response {
    match state.renderer.render(&state.title, view) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = %e, "Page render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "could not render page").into_response()
        }
    }
}
