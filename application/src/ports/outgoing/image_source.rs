use std::sync::Arc;

use crate::error::AppResult;
use domain::image::ImageId;

#[async_trait::async_trait]
pub trait ImageSourcePort: Send + Sync {
    async fn load(&self, image_id: &ImageId) -> AppResult<Option<Vec<u8>>>;
}

pub type DynImageSourcePort = Arc<dyn ImageSourcePort>;
