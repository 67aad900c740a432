use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};

use domain::image::{ImageFormat, ImageId};
use domain::image_url::ImageUrlKey;
use toon_application::error::AppError;
use toon_application::ports::incoming::delivery::ImageDeliveryUseCase;

use crate::incoming::http_axum::{
    dto::{requests::ImageQuery, responses::ImageResponse},
    error_mapper::HttpError,
};
use crate::shared::app_state::AppState;

pub async fn serve_image(
    Path(image_id): Path<String>,
    Query(query): Query<ImageQuery>,
    State(state): State<AppState>,
) -> Result<Response, HttpError> {
    let key = image_key(image_id, &query, state.config.images.default_format)?;

    let delivery_uc: &dyn ImageDeliveryUseCase = &*state.image_delivery_service;
    let image = delivery_uc.render(&key).await.map_err(HttpError)?;

    Ok(ImageResponse {
        image,
        cache_control: state.config.images.http_cache_control.clone(),
    }
    .into_response())
}

fn image_key(
    image_id: String,
    query: &ImageQuery,
    default_format: ImageFormat,
) -> Result<ImageUrlKey, HttpError> {
    let image_id = ImageId::new(image_id).map_err(|e| HttpError(AppError::Domain(e)))?;

    let format = match query.format.as_deref() {
        Some(raw) => raw
            .parse::<ImageFormat>()
            .map_err(|e| HttpError(AppError::Domain(e)))?,
        None => default_format,
    };

    Ok(ImageUrlKey::new(image_id)
        .with_format(format)
        .with_size(query.width, query.height))
}
