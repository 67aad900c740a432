use axum::{
    http::{
        HeaderMap, HeaderValue,
        header::{CACHE_CONTROL, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use serde::Serialize;

use domain::image::EncodedImage;

#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    #[must_use]
    pub fn success_with_data(data: Option<T>) -> Self {
        Self {
            ok: true,
            error: None,
            data,
        }
    }
}

/// Encoded rendition with its MIME type and cache policy.
pub struct ImageResponse {
    pub image: EncodedImage,
    pub cache_control: String,
}

impl IntoResponse for ImageResponse {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static(self.image.format.mime_type()),
        );

        if let Ok(cache_header) = HeaderValue::from_str(&self.cache_control) {
            headers.insert(CACHE_CONTROL, cache_header);
        }

        (headers, self.image.bytes).into_response()
    }
}
