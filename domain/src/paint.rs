use std::fmt;

use crate::image::PixelBuffer;

/// Fixed-size RGBA surface a loaded page image is drawn onto.
#[derive(Clone, Default)]
pub struct PaintSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    draws: u32,
}

impl PaintSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resizes the surface to the image's natural size and copies its pixels.
    pub fn draw(&mut self, image: &PixelBuffer) {
        self.width = image.width();
        self.height = image.height();
        self.pixels.clear();
        self.pixels.extend_from_slice(image.as_bytes());
        self.draws = self.draws.saturating_add(1);
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.draws == 0
    }

    #[must_use]
    pub fn draw_count(&self) -> u32 {
        self.draws
    }
}

impl fmt::Debug for PaintSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaintSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("draws", &self.draws)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn draw_sizes_surface_to_natural_dimensions() {
        let mut surface = PaintSurface::new();
        assert!(surface.is_blank());

        let image = PixelBuffer::filled(4, 3, [9, 8, 7, 255]).unwrap();
        surface.draw(&image);

        assert_eq!(surface.dimensions(), (4, 3));
        assert_eq!(surface.pixels(), image.as_bytes());
        assert_eq!(surface.draw_count(), 1);
    }
}
