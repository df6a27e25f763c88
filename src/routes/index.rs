use crate::{page::Page, server::SharedState};
use axum::{extract::State, response::Html};

pub async fn index(State(state): State<SharedState>) -> Html<String> {
    state.metrics.record_request("/");
    Html(Page::default().render())
}
