use std::sync::Arc;

use toon_application::infrastructure_config::Config;
use toon_application::ports::incoming::{
    conversion::ConversionStatsQueryUseCase, delivery::ImageDeliveryUseCase,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub image_delivery_service: Arc<dyn ImageDeliveryUseCase + Send + Sync>,
    pub conversion_stats_service: Arc<dyn ConversionStatsQueryUseCase + Send + Sync>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        image_delivery_service: Arc<dyn ImageDeliveryUseCase + Send + Sync>,
        conversion_stats_service: Arc<dyn ConversionStatsQueryUseCase + Send + Sync>,
    ) -> Self {
        Self {
            config,
            image_delivery_service,
            conversion_stats_service,
        }
    }
}
