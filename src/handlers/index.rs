use crate::views;
use axum::response::Html;

/// GET / - upload form
pub async fn index() -> Html<String> {
    Html(views::upload_form())
}
