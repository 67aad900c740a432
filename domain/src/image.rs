use serde::{Deserialize, Deserializer, Serialize, de};
use std::{fmt, str::FromStr};

use crate::error::{DomainError, DomainResult};

pub const BYTES_PER_PIXEL: usize = 4;

/// Output formats addressable through the image URL contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Avif,
    Webp,
    Png,
    Jpg,
    Jxl,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 5] = [
        ImageFormat::Avif,
        ImageFormat::Webp,
        ImageFormat::Png,
        ImageFormat::Jpg,
        ImageFormat::Jxl,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ImageFormat::Avif => "avif",
            ImageFormat::Webp => "webp",
            ImageFormat::Png => "png",
            ImageFormat::Jpg => "jpg",
            ImageFormat::Jxl => "jxl",
        }
    }

    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Avif => "image/avif",
            ImageFormat::Webp => "image/webp",
            ImageFormat::Png => "image/png",
            ImageFormat::Jpg => "image/jpeg",
            ImageFormat::Jxl => "image/jxl",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageFormat {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "avif" => Ok(ImageFormat::Avif),
            "webp" => Ok(ImageFormat::Webp),
            "png" => Ok(ImageFormat::Png),
            "jpg" | "jpeg" => Ok(ImageFormat::Jpg),
            "jxl" => Ok(ImageFormat::Jxl),
            other => Err(DomainError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Identifier of a stored page image. Always usable as a single URL path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageId(String);

impl ImageId {
    pub const MAX_LEN: usize = 128;

    pub fn new(value: impl Into<String>) -> DomainResult<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(DomainError::InvalidImageId(
                "Image id cannot be empty".to_string(),
            ));
        }
        if value.len() > Self::MAX_LEN {
            return Err(DomainError::InvalidImageId(format!(
                "Image id exceeds {} bytes",
                Self::MAX_LEN
            )));
        }
        if value == "." || value == ".." || value.contains(['/', '\\', '\0']) {
            return Err(DomainError::InvalidImageId(format!(
                "Image id '{value}' contains path characters"
            )));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ImageId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ImageId> for String {
    fn from(value: ImageId) -> Self {
        value.0
    }
}

/// Decoded RGBA8 pixels, row-major.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> DomainResult<Self> {
        if width == 0 || height == 0 {
            return Err(DomainError::InvalidDimensions(format!(
                "{width}x{height} has a zero side"
            )));
        }

        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(BYTES_PER_PIXEL))
            .ok_or_else(|| {
                DomainError::InvalidDimensions(format!("{width}x{height} overflows"))
            })?;

        if data.len() != expected {
            return Err(DomainError::InvalidPixelBuffer(format!(
                "Expected {expected} bytes for {width}x{height} RGBA, got {}",
                data.len()
            )));
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> DomainResult<Self> {
        let pixels = (width as usize).saturating_mul(height as usize);
        Self::new(width, height, rgba.repeat(pixels))
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        self.data
            .get(offset..offset + BYTES_PER_PIXEL)
            .and_then(|slice| slice.try_into().ok())
    }
}

/// Deserialized buffers go through the same length checks as `PixelBuffer::new`.
impl<'de> Deserialize<'de> for PixelBuffer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(rename = "PixelBuffer")]
        struct Fields {
            width: u32,
            height: u32,
            data: Vec<u8>,
        }

        let fields = Fields::deserialize(deserializer)?;
        Self::new(fields.width, fields.height, fields.data).map_err(de::Error::custom)
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedImage")
            .field("format", &self.format)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}
