use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// GET /
/// The upload form. Posts to /api/v1/introductions and plays the result inline.
pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}
