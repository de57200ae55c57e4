// HTTP routes configuration

use crate::core::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Public endpoints
        .route("/announce", get(crate::handlers::announce::announce_handler))
        .route("/health", get(crate::handlers::health::health_handler))
        // Monitoring endpoints (require API key)
        .route("/metrics", get(crate::handlers::metrics::metrics_handler))
        .route("/sync", get(crate::handlers::sync::sync_handler))
        // Admin endpoints (require API key)
        .route("/reload", post(crate::handlers::admin::reload_handler))
        .route("/settings/update", get(crate::handlers::admin::settings_update_handler))
        .route("/torrent/add", get(crate::handlers::admin::torrent_add_handler))
        .route("/torrent/remove", get(crate::handlers::admin::torrent_remove_handler))
        .route("/user/add", get(crate::handlers::admin::user_add_handler))
        .route("/user/remove", get(crate::handlers::admin::user_remove_handler))
        .route("/credential/add", get(crate::handlers::admin::credential_add_handler))
        .route("/credential/revoke", get(crate::handlers::admin::credential_revoke_handler))
        .route("/client/ban", get(crate::handlers::admin::client_ban_handler))
        .route("/client/unban", get(crate::handlers::admin::client_unban_handler))
        .route("/client/list", get(crate::handlers::admin::client_list_handler))
        .route("/incidents", get(crate::handlers::admin::incidents_handler))
        // 404 fallback for all unmatched routes
        .fallback(crate::handlers::fallback::fallback_handler)
        .with_state(state)
}
