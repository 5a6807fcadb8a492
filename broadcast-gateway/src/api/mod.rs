//! HTTP API.

pub mod broadcast;
pub mod health;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Build the API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(broadcast::router())
        .merge(health::router())
}
