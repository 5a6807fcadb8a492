//! Broadcast endpoint.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use mesh_common::{BroadcastRequest, BroadcastResponse};

use crate::error::{Error, Result};
use crate::logging::truncate_for_log;
use crate::state::AppState;

/// Build the broadcast router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/broadcast", post(broadcast))
}

/// POST /broadcast - send one text message over the mesh.
///
/// A body that is not a valid `BroadcastRequest` is rejected with 422 before
/// the radio is consulted.
async fn broadcast(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<BroadcastRequest>, JsonRejection>,
) -> Result<Json<BroadcastResponse>> {
    let Json(request) = payload?;
    let radio = state.radio.radio().ok_or(Error::DeviceUnavailable)?;

    if request.is_blank() {
        return Err(Error::InvalidRequest("Message cannot be empty".to_string()));
    }

    let destination = request.resolved_destination().to_string();
    tracing::info!(
        "Broadcasting message: {} to destination: {}",
        truncate_for_log(&request.message, 80),
        destination
    );

    if let Err(e) = radio.send_text(&request.message, &destination).await {
        tracing::error!("Error broadcasting message: {}", e);
        return Err(e.into());
    }

    Ok(Json(BroadcastResponse::success(request.message, destination)))
}
