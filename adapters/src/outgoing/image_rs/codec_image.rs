use domain::conversion::EncodeOptions;
use domain::image::{EncodedImage, ImageFormat, PixelBuffer};
use image::codecs::{
    avif::AvifEncoder, jpeg::JpegEncoder, png::PngEncoder, webp::WebPEncoder,
};
use image::imageops::{self, FilterType};
use image::{
    DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat as SourceFormat, ImageReader,
    Limits, RgbaImage,
};
use std::io::Cursor;
use toon_application::conversion::worker::EMPTY_INPUT_MESSAGE;
use toon_application::ports::outgoing::image_codec::{CodecError, ImageCodecPort};
use tracing::{debug, instrument, trace};

#[derive(Debug, Copy, Clone)]
pub struct ImageCodecConfig {
    pub max_dimension: u32,
    pub quality: u8,
    pub avif_speed: u8,
}

impl Default for ImageCodecConfig {
    fn default() -> Self {
        Self {
            max_dimension: 8192,
            quality: 80,
            avif_speed: 6,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageCodecAdapter {
    config: ImageCodecConfig,
}

impl ImageCodecAdapter {
    pub fn new(config: ImageCodecConfig) -> Self {
        Self { config }
    }

    #[instrument(skip(self, encoded), fields(len = encoded.len()))]
    fn decode_impl(&self, encoded: &[u8]) -> Result<PixelBuffer, CodecError> {
        if encoded.is_empty() {
            return Err(CodecError::new(EMPTY_INPUT_MESSAGE));
        }

        let mut reader = ImageReader::new(Cursor::new(encoded))
            .with_guessed_format()
            .map_err(|e| CodecError::new(format!("Failed to read image header: {}", e)))?;

        let Some(source_format) = reader.format() else {
            return Err(CodecError::new("Unrecognized image format"));
        };
        trace!("Detected source format {:?}", source_format);

        if source_format == SourceFormat::Avif {
            return Err(CodecError::new("AVIF decoding is not supported"));
        }

        let mut limits = Limits::default();
        limits.max_image_width = Some(self.config.max_dimension);
        limits.max_image_height = Some(self.config.max_dimension);
        reader.limits(limits);

        let img = reader.decode().map_err(|e| {
            CodecError::new(format!("Failed to decode {:?}: {}", source_format, e))
        })?;

        let rgba_img = img.into_rgba8();
        let (width, height) = rgba_img.dimensions();

        let pixels = PixelBuffer::new(width, height, rgba_img.into_raw())
            .map_err(|e| CodecError::new(e.to_string()))?;

        debug!(
            "Decoded {:?}: {} bytes -> {}x{}",
            source_format,
            encoded.len(),
            width,
            height
        );
        Ok(pixels)
    }

    #[instrument(skip(self, pixels), fields(format = %options.format))]
    fn encode_impl(
        &self,
        pixels: &PixelBuffer,
        options: EncodeOptions,
    ) -> Result<EncodedImage, CodecError> {
        let (width, height) = options.target_dimensions(pixels.dimensions());
        self.check_dimensions(width, height)?;

        let source = RgbaImage::from_raw(
            pixels.width(),
            pixels.height(),
            pixels.as_bytes().to_vec(),
        )
        .ok_or_else(|| CodecError::new("Failed to create image buffer from RGBA data"))?;

        let frame = if (width, height) == pixels.dimensions() {
            source
        } else {
            trace!(
                "Resizing {}x{} -> {}x{}",
                pixels.width(),
                pixels.height(),
                width,
                height
            );
            imageops::resize(&source, width, height, FilterType::Lanczos3)
        };

        let mut bytes = Vec::new();
        let written = match options.format {
            ImageFormat::Avif => AvifEncoder::new_with_speed_quality(
                &mut bytes,
                self.config.avif_speed,
                self.config.quality,
            )
            .write_image(frame.as_raw(), width, height, ExtendedColorType::Rgba8),
            ImageFormat::Webp => WebPEncoder::new_lossless(&mut bytes).write_image(
                frame.as_raw(),
                width,
                height,
                ExtendedColorType::Rgba8,
            ),
            ImageFormat::Png => PngEncoder::new(&mut bytes).write_image(
                frame.as_raw(),
                width,
                height,
                ExtendedColorType::Rgba8,
            ),
            ImageFormat::Jpg => {
                let rgb = DynamicImage::ImageRgba8(frame).into_rgb8();
                JpegEncoder::new_with_quality(&mut bytes, self.config.quality).write_image(
                    rgb.as_raw(),
                    width,
                    height,
                    ExtendedColorType::Rgb8,
                )
            }
            ImageFormat::Jxl => {
                return Err(CodecError::new("JPEG XL encoding is not supported"));
            }
        };

        written.map_err(|e| {
            CodecError::new(format!("Failed to encode {}: {}", options.format, e))
        })?;

        if bytes.is_empty() {
            return Err(CodecError::new(format!(
                "{} encoding produced empty output",
                options.format
            )));
        }

        debug!("Encoded {}: {} bytes", options.format, bytes.len());

        Ok(EncodedImage {
            format: options.format,
            bytes,
        })
    }

    fn check_dimensions(&self, width: u32, height: u32) -> Result<(), CodecError> {
        let max = self.config.max_dimension;
        if width > max || height > max {
            return Err(CodecError::new(format!(
                "Requested size {}x{} exceeds the {}px limit",
                width, height, max
            )));
        }
        Ok(())
    }
}

impl ImageCodecPort for ImageCodecAdapter {
    fn decode(&self, encoded: &[u8]) -> Result<PixelBuffer, CodecError> {
        self.decode_impl(encoded)
    }

    fn encode(
        &self,
        pixels: &PixelBuffer,
        options: EncodeOptions,
    ) -> Result<EncodedImage, CodecError> {
        self.encode_impl(pixels, options)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use toon_application::ports::outgoing::image_codec::DECODABLE_FORMATS;

    fn codec() -> ImageCodecAdapter {
        ImageCodecAdapter::new(ImageCodecConfig::default())
    }

    fn gradient(width: u32, height: u32) -> PixelBuffer {
        let mut data = Vec::new();
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[(x * 16) as u8, (y * 16) as u8, 128, 255]);
            }
        }
        PixelBuffer::new(width, height, data).unwrap()
    }

    #[test]
    fn png_round_trip_preserves_pixels() {
        let codec = codec();
        let pixels = gradient(8, 4);

        let png = codec
            .encode(&pixels, EncodeOptions::new(ImageFormat::Png))
            .unwrap();
        assert_eq!(png.format, ImageFormat::Png);

        let decoded = codec.decode(&png.bytes).unwrap();
        assert_eq!(decoded, pixels);
    }

    #[test]
    fn webp_is_lossless() {
        let codec = codec();
        let pixels = gradient(5, 3);

        let webp = codec
            .encode(&pixels, EncodeOptions::new(ImageFormat::Webp))
            .unwrap();
        let decoded = codec.decode(&webp.bytes).unwrap();

        assert_eq!(decoded, pixels);
    }

    #[test]
    fn jpeg_output_is_opaque_with_source_size() {
        let codec = codec();
        let jpg = codec
            .encode(&gradient(16, 16), EncodeOptions::new(ImageFormat::Jpg))
            .unwrap();

        let decoded = codec.decode(&jpg.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (16, 16));
        assert_eq!(decoded.pixel(0, 0).map(|p| p[3]), Some(255));
    }

    #[test]
    fn width_only_resize_keeps_aspect_ratio() {
        let codec = codec();
        let options = EncodeOptions::new(ImageFormat::Png).with_size(Some(4), None);

        let png = codec.encode(&gradient(8, 6), options).unwrap();

        assert_eq!(codec.decode(&png.bytes).unwrap().dimensions(), (4, 3));
    }

    #[test]
    fn empty_input_is_a_codec_error() {
        let err = codec().decode(&[]).unwrap_err();
        assert_eq!(err.message, "Input buffer is empty");
    }

    #[test]
    fn unrecognized_bytes_are_rejected() {
        assert!(codec().decode(b"definitely not an image").is_err());
    }

    #[test]
    fn avif_is_encoded_but_not_read_back() {
        let codec = codec();

        let avif = codec
            .encode(&gradient(8, 8), EncodeOptions::new(ImageFormat::Avif))
            .unwrap();
        assert_eq!(avif.format, ImageFormat::Avif);
        assert!(!avif.bytes.is_empty());

        let err = codec.decode(&avif.bytes).unwrap_err();
        assert_eq!(err.message, "AVIF decoding is not supported");
    }

    #[test]
    fn decodable_formats_read_back() {
        let codec = codec();

        for format in DECODABLE_FORMATS {
            let encoded = codec
                .encode(&gradient(8, 8), EncodeOptions::new(format))
                .unwrap();
            assert_eq!(codec.decode(&encoded.bytes).unwrap().dimensions(), (8, 8));
        }
    }

    #[test]
    fn jxl_encoding_is_unsupported() {
        let err = codec()
            .encode(&gradient(2, 2), EncodeOptions::new(ImageFormat::Jxl))
            .unwrap_err();
        assert!(err.message.contains("not supported"));
    }

    #[test]
    fn oversized_targets_are_rejected() {
        let codec = ImageCodecAdapter::new(ImageCodecConfig {
            max_dimension: 16,
            ..ImageCodecConfig::default()
        });
        let options = EncodeOptions::new(ImageFormat::Png).with_size(Some(32), Some(32));

        assert!(codec.encode(&gradient(4, 4), options).is_err());
    }

    #[test]
    fn oversized_sources_are_rejected_on_decode() {
        let png = codec()
            .encode(&gradient(8, 8), EncodeOptions::new(ImageFormat::Png))
            .unwrap();
        let small = ImageCodecAdapter::new(ImageCodecConfig {
            max_dimension: 4,
            ..ImageCodecConfig::default()
        });

        assert!(small.decode(&png.bytes).is_err());
    }
}
