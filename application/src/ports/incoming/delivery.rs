use crate::error::AppResult;
use domain::image::EncodedImage;
use domain::image_url::ImageUrlKey;

#[async_trait::async_trait]
pub trait ImageDeliveryUseCase: Send + Sync {
    async fn render(&self, key: &ImageUrlKey) -> AppResult<EncodedImage>;
}
