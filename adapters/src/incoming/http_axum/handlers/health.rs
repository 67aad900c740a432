use axum::{Json, extract::State};

use toon_application::ports::incoming::conversion::ConversionStatsQueryUseCase;

use crate::incoming::http_axum::dto::responses::ApiResponse;
use crate::shared::app_state::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<serde_json::Value>> {
    let stats_uc: &dyn ConversionStatsQueryUseCase = &*state.conversion_stats_service;
    let conversions = stats_uc.stats();

    Json(ApiResponse::success_with_data(Some(serde_json::json!({
        "conversions": conversions,
        "config": {
            "isolation": state.config.workers.isolation,
            "default_format": state.config.images.default_format,
            "conversion_timeout_ms": state.config.workers.conversion_timeout_ms
        }
    }))))
}
