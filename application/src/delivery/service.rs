use tracing::{debug, instrument};

use domain::conversion::ConversionRequest;
use domain::image::EncodedImage;
use domain::image_url::ImageUrlKey;

use crate::{
    conversion::service::{expect_encoded, expect_pixels},
    error::{AppError, AppResult},
    ports::{
        incoming::{conversion::DynConvertImageUseCase, delivery::ImageDeliveryUseCase},
        outgoing::image_source::DynImageSourcePort,
    },
};

/// Serves `/images/{id}` renditions: source bytes are decoded and re-encoded
/// to the requested format and size, each step on its own worker unit.
pub struct ImageDeliveryService {
    source: DynImageSourcePort,
    converter: DynConvertImageUseCase,
}

impl ImageDeliveryService {
    #[must_use]
    pub fn new(source: DynImageSourcePort, converter: DynConvertImageUseCase) -> Self {
        Self { source, converter }
    }

    #[instrument(skip(self, key), fields(key = %key))]
    pub async fn render(&self, key: &ImageUrlKey) -> AppResult<EncodedImage> {
        let options = key.encode_options();
        options.validate()?;

        let source = self
            .source
            .load(&key.image_id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                message: format!("Image '{}' not found", key.image_id),
            })?;

        let decoded = self
            .converter
            .convert(ConversionRequest::decode(source))
            .await?;
        let pixels = expect_pixels(decoded)?;
        debug!("Source is {}x{}", pixels.width(), pixels.height());

        let encoded = self
            .converter
            .convert(ConversionRequest::encode(pixels, options)?)
            .await?;
        let image = expect_encoded(encoded)?;
        debug!("Rendered {} bytes", image.bytes.len());

        Ok(image)
    }
}

#[async_trait::async_trait]
impl ImageDeliveryUseCase for ImageDeliveryService {
    async fn render(&self, key: &ImageUrlKey) -> AppResult<EncodedImage> {
        self.render(key).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::conversion::error::ConversionError;
    use crate::conversion::worker::{execute_task, tests::StubCodec};
    use crate::ports::incoming::conversion::ConvertImageUseCase;
    use crate::ports::outgoing::image_source::ImageSourcePort;
    use domain::conversion::{ConversionOutput, WorkerMessage};
    use domain::image::{ImageFormat, ImageId};
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MemorySource(HashMap<String, Vec<u8>>);

    #[async_trait::async_trait]
    impl ImageSourcePort for MemorySource {
        async fn load(&self, image_id: &ImageId) -> AppResult<Option<Vec<u8>>> {
            Ok(self.0.get(image_id.as_str()).cloned())
        }
    }

    /// Runs the stub codec inline instead of on a worker.
    #[derive(Default)]
    struct InlineConverter {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ConvertImageUseCase for InlineConverter {
        async fn convert(
            &self,
            request: ConversionRequest,
        ) -> Result<ConversionOutput, ConversionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match execute_task(&StubCodec, request) {
                WorkerMessage::Success(output) => Ok(output),
                WorkerMessage::Failure { message } => Err(ConversionError::Codec { message }),
            }
        }
    }

    fn service() -> (ImageDeliveryService, Arc<InlineConverter>) {
        let source = MemorySource(HashMap::from([
            ("page-1".to_string(), vec![8, 4, 200]),
            ("broken".to_string(), vec![1]),
        ]));
        let converter = Arc::new(InlineConverter::default());
        let service = ImageDeliveryService::new(
            Arc::new(source),
            Arc::clone(&converter) as DynConvertImageUseCase,
        );
        (service, converter)
    }

    fn key(id: &str) -> ImageUrlKey {
        ImageUrlKey::new(ImageId::new(id).unwrap())
    }

    #[tokio::test]
    async fn renders_source_in_requested_format() {
        let (service, converter) = service();

        let image = service
            .render(&key("page-1").with_format(ImageFormat::Webp))
            .await
            .unwrap();

        assert_eq!(image.format, ImageFormat::Webp);
        assert_eq!(image.bytes.len(), 8 * 4 * 4);
        assert_eq!(converter.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn missing_source_is_not_found() {
        let (service, converter) = service();

        let result = service.render(&key("absent")).await;

        assert!(matches!(result, Err(AppError::NotFound { .. })));
        assert_eq!(converter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn codec_failure_surfaces_as_conversion_error() {
        let (service, _) = service();

        match service.render(&key("broken")).await {
            Err(AppError::Conversion(ConversionError::Codec { message })) => {
                assert_eq!(message, "unsupported image format");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn zero_dimension_is_rejected_before_loading() {
        let (service, converter) = service();

        let result = service
            .render(&key("page-1").with_size(Some(0), None))
            .await;

        assert!(matches!(result, Err(AppError::Domain(_))));
        assert_eq!(converter.calls.load(Ordering::SeqCst), 0);
    }
}
