use crate::api::snapshot::build_update;
use crate::core::error::MonitoringError;
use crate::core::state::AppState;
use crate::models::admin::ApiKeyQuery;
use crate::utils::auth::verify_api_key;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::warn;

/// GET /sync?api_key=<key>
///
/// The pull side of backend synchronization: the full peer/torrent/user
/// snapshot as JSON, for a backend that prefers polling over receiving the
/// periodic push.
pub async fn sync_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ApiKeyQuery>,
) -> Result<Response, MonitoringError> {
    if !verify_api_key(&params.api_key, &state.config.sync.api_key) {
        warn!("Unauthorized sync access attempt");
        return Err(MonitoringError::InvalidApiKey);
    }

    let snapshot = build_update(&state);

    Ok((StatusCode::OK, Json(snapshot)).into_response())
}
