use std::sync::Arc;

use crate::conversion::{error::ConversionError, stats::ConversionStatsSnapshot};
use domain::conversion::{ConversionOutput, ConversionRequest};

#[async_trait::async_trait]
pub trait ConvertImageUseCase: Send + Sync {
    async fn convert(&self, request: ConversionRequest)
    -> Result<ConversionOutput, ConversionError>;
}

pub type DynConvertImageUseCase = Arc<dyn ConvertImageUseCase>;

pub trait ConversionStatsQueryUseCase: Send + Sync {
    fn stats(&self) -> ConversionStatsSnapshot;
}
