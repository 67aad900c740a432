use axum::{Router, routing::get};

use crate::incoming::http_axum::{
    handlers::{health::health_check, images::serve_image},
    router_ext::RouterExt,
};
use crate::shared::app_state::AppState;

pub fn build_application_router() -> Router<AppState> {
    Router::new()
        .route("/images/{image_id}", get(serve_image))
        .route("/health", get(health_check))
        .with_request_id()
}
