use serde::{Deserialize, Serialize};
use std::fmt;

use crate::conversion::EncodeOptions;
use crate::image::{ImageFormat, ImageId};

/// Everything that determines an image resource URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageUrlKey {
    pub image_id: ImageId,
    #[serde(default)]
    pub format: ImageFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl ImageUrlKey {
    #[must_use]
    pub fn new(image_id: ImageId) -> Self {
        Self {
            image_id,
            format: ImageFormat::default(),
            width: None,
            height: None,
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_size(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    #[must_use]
    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions::new(self.format).with_size(self.width, self.height)
    }
}

impl fmt::Display for ImageUrlKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.image_id, self.format)?;
        if let Some(width) = self.width {
            write!(f, " w={width}")?;
        }
        if let Some(height) = self.height {
            write!(f, " h={height}")?;
        }
        Ok(())
    }
}
