use axum::{
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};

/// 404 fallback for unmatched routes.
///
/// Browsers get a short HTML page; everything else gets a plain 404.
pub async fn fallback_handler(headers: HeaderMap) -> Response {
    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let is_browser = ["Mozilla", "Chrome", "Safari", "Firefox", "Edge"]
        .iter()
        .any(|marker| user_agent.contains(marker));

    if is_browser {
        return (
            StatusCode::NOT_FOUND,
            Html("Nothing to see here. The announce URL belongs in a torrent client."),
        )
            .into_response();
    }

    (StatusCode::NOT_FOUND, "Not found").into_response()
}
