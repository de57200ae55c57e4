use crate::core::state::AppState;
use crate::tracker::announce::AnnounceContext;
use crate::utils::time::current_timestamp;
use axum::{
    extract::{ConnectInfo, RawQuery, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::instrument;

/// GET /announce
///
/// Thin HTTP glue: the pipeline in `tracker::announce` does the work and
/// always hands back a complete bencoded body. Per tracker convention the
/// status is 200 even for failures; the body carries the verdict.
#[instrument(skip_all, fields(remote = %addr))]
pub async fn announce_handler(
    State(state): State<Arc<AppState>>,
    RawQuery(raw_query): RawQuery,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Response {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("Unknown");

    let body = AnnounceContext::new(&state, user_agent, addr.ip(), current_timestamp())
        .execute(raw_query.as_deref())
        .await;

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain")],
        body,
    )
        .into_response()
}
