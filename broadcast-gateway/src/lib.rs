//! Mesh Broadcast Gateway - HTTP facade over a Meshtastic radio.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod radio;
pub mod state;
pub mod test_util;

pub use crate::config::Config;
pub use error::{Error, Result};
pub use radio::{MeshRadio, RadioError, RadioLink, SerialRadio};
pub use state::AppState;

use std::sync::Arc;

use axum::{middleware, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the full application router.
pub fn app(state: Arc<AppState>) -> Router {
    api::router()
        .layer(middleware::from_fn(logging::request_logger))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
