use std::fmt;
use std::sync::Arc;

use domain::conversion::EncodeOptions;
use domain::image::{EncodedImage, ImageFormat, PixelBuffer};

/// Formats the codec reads back. AVIF is encode-only and JPEG XL is neither.
pub const DECODABLE_FORMATS: [ImageFormat; 3] =
    [ImageFormat::Webp, ImageFormat::Png, ImageFormat::Jpg];

/// A codec failure for a specific input; the message is shown to callers as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecError {
    pub message: String,
}

impl CodecError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

pub trait ImageCodecPort: Send + Sync {
    fn decode(&self, encoded: &[u8]) -> Result<PixelBuffer, CodecError>;
    fn encode(
        &self,
        pixels: &PixelBuffer,
        options: EncodeOptions,
    ) -> Result<EncodedImage, CodecError>;
}

pub type DynImageCodecPort = Arc<dyn ImageCodecPort>;
