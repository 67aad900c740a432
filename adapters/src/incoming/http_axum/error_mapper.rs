use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{debug, error};

use toon_application::conversion::error::ConversionError;
use toon_application::error::AppError;

pub struct HttpError(pub AppError);

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        match app_error {
            AppError::Domain(_)
            | AppError::ValidationError { .. }
            | AppError::NotFound { .. }
            | AppError::Conversion(ConversionError::Codec { .. }) => {
                debug!("Client error response generated: {}", app_error);
            }
            _ => {
                error!("Server error response generated: {}", app_error);
            }
        }

        let (status_code, message) = match app_error {
            AppError::Domain(_) => (StatusCode::BAD_REQUEST, app_error.to_string()),

            AppError::ValidationError { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, app_error.to_string())
            }

            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message.clone()),

            AppError::Conversion(ConversionError::Codec { message }) => {
                (StatusCode::UNPROCESSABLE_ENTITY, message.clone())
            }

            AppError::Conversion(ConversionError::Transport { .. }) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Image worker unavailable".to_string(),
            ),

            AppError::Conversion(ConversionError::Lifecycle { .. }) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Image worker failed".to_string(),
            ),

            AppError::ConfigError { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error".to_string(),
            ),

            AppError::FetchError { .. } => {
                (StatusCode::BAD_GATEWAY, "Upstream fetch failed".to_string())
            }

            AppError::IoError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let error_response = json!({
            "ok": false,
            "error": message,
            "status": status_code.as_u16()
        });

        (status_code, Json(error_response)).into_response()
    }
}

impl From<AppError> for HttpError {
    fn from(app_error: AppError) -> Self {
        HttpError(app_error)
    }
}
