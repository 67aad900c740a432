use std::time::Instant;

use axum::body::HttpBody;
use axum::http::{HeaderValue, header};
use axum::{extract::Request, middleware::Next, response::Response};
use tracing::{debug, warn};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Propagates or assigns `X-Request-Id` and logs the delivered format and
/// size of every `/images/` response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), ToString::to_string);
    let header_value = HeaderValue::from_str(&request_id).ok();

    if let Some(value) = &header_value {
        request.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
    }

    let image_path = request
        .uri()
        .path()
        .starts_with("/images/")
        .then(|| request.uri().to_string());
    let started = Instant::now();

    let mut response = next.run(request).await;

    if let Some(value) = header_value {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    if let Some(uri) = image_path {
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("-");
        let bytes = response.body().size_hint().exact();

        if status.is_server_error() {
            warn!(%request_id, %status, %uri, elapsed_ms, "Image request failed");
        } else {
            debug!(
                %request_id,
                %status,
                %uri,
                content_type,
                bytes,
                elapsed_ms,
                "Image request completed"
            );
        }
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use axum::{Router, middleware, routing::get};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/images/{id}", get(|| async { "pixels" }))
            .layer(middleware::from_fn(request_id_middleware))
    }

    #[tokio::test]
    async fn echoes_incoming_request_id() {
        let response = app()
            .oneshot(
                HttpRequest::get("/images/page-1?format=webp")
                    .header(REQUEST_ID_HEADER, "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get(REQUEST_ID_HEADER).unwrap(),
            "abc-123"
        );
    }

    #[tokio::test]
    async fn assigns_request_id_when_missing() {
        let response = app()
            .oneshot(
                HttpRequest::get("/images/page-1")
                    .header(REQUEST_ID_HEADER, "")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let id = response.headers().get(REQUEST_ID_HEADER).unwrap();
        assert!(Uuid::parse_str(id.to_str().unwrap()).is_ok());
    }
}
