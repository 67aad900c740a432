use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

use domain::conversion::{ConversionOutput, ConversionRequest, WorkerExit};
use toon_application::conversion::error::ConversionError;
use toon_application::ports::incoming::conversion::{
    ConvertImageUseCase, DynConvertImageUseCase,
};

/// Bounds a conversion by wall-clock time. On expiry the worker is abandoned,
/// not killed, and the caller gets a lifecycle error.
pub struct TokioConversionTimeoutAdapter {
    inner: DynConvertImageUseCase,
    duration: Duration,
}

impl TokioConversionTimeoutAdapter {
    pub fn new(inner: DynConvertImageUseCase, duration: Duration) -> Self {
        Self { inner, duration }
    }
}

#[async_trait::async_trait]
impl ConvertImageUseCase for TokioConversionTimeoutAdapter {
    async fn convert(
        &self,
        request: ConversionRequest,
    ) -> Result<ConversionOutput, ConversionError> {
        let operation = request.operation();

        if let Ok(result) = timeout(self.duration, self.inner.convert(request)).await {
            result
        } else {
            let millis = self.duration.as_millis();
            warn!("{} conversion timed out after {} ms", operation, millis);
            Err(ConversionError::lifecycle(
                WorkerExit::with_code(None).with_detail(format!("timed out after {millis} ms")),
            ))
        }
    }
}
