//! The compositor: background image + text lines + style → flattened raster.
//!
//! Rendering always starts from scratch. The inputs are turned into a display
//! list ([`paint::build_display_list`]) which is then executed on an RGBA
//! buffer ([`raster::rasterize`]). Given the same inputs and the same glyph
//! face, the output is byte-identical.

pub mod glyphs;
pub mod layout;
pub mod paint;
pub mod raster;

use crate::model::{Style, TextLine};
use crate::{CanvasSize, Error, Result};
use glyphs::FontBook;
use image::{DynamicImage, ImageFormat, RgbaImage};
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::path::Path;

/// Flattened output of the compositor.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    image: RgbaImage,
}

impl Raster {
    pub fn from_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self { width, height, image }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// RGBA of the pixel at `(x, y)`; `None` outside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.image.get_pixel_checked(x, y).map(|p| p.0)
    }

    /// Encode as PNG, the client-side download format.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|e| Error::RenderError(format!("PNG encoding failed: {}", e)))?;
        Ok(buffer)
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let png = self.to_png()?;
        std::fs::write(path, png)?;
        Ok(())
    }

    /// Hex SHA-256 over the dimensions and raw pixels.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.width.to_be_bytes());
        hasher.update(self.height.to_be_bytes());
        hasher.update(self.image.as_raw());
        hex::encode(hasher.finalize())
    }
}

/// Renders memes at a fixed canvas size with fonts from a [`FontBook`].
pub struct Compositor {
    canvas: CanvasSize,
    fonts: FontBook,
}

impl Compositor {
    pub fn new(canvas: CanvasSize, fonts: FontBook) -> Self {
        Self { canvas, fonts }
    }

    pub fn from_config(config: &crate::MemeConfig) -> Self {
        Self::new(config.canvas, FontBook::new(config.fonts_dir.clone()))
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    pub fn render(&self, image: &DynamicImage, lines: &[TextLine], style: &Style) -> Raster {
        let commands = paint::build_display_list(lines, style, self.canvas);
        let face = self.fonts.face(style.font_family);
        log::debug!(
            "Rendering {} commands at {}x{} with {}",
            commands.len(),
            self.canvas.width,
            self.canvas.height,
            face.name()
        );
        let pixels = raster::rasterize(
            image,
            &commands,
            &*face,
            self.canvas.width,
            self.canvas.height,
        );
        Raster::from_image(pixels)
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(CanvasSize::default(), FontBook::builtin())
    }
}

/// Render on the default 500×500 canvas with the built-in face.
pub fn render(image: &DynamicImage, lines: &[TextLine], style: &Style) -> Raster {
    Compositor::default().render(image, lines, style)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TextLineId;
    use image::Rgba;

    #[test]
    fn raster_png_and_fingerprint() {
        let src = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255])));
        let lines = vec![TextLine::at(TextLineId(1), 20, 50).with_text("HI")];
        let raster = render(&src, &lines, &Style::default());
        assert_eq!((raster.width, raster.height), (500, 500));
        assert_eq!(raster.pixel(0, 0), Some([1, 2, 3, 255]));
        assert_eq!(raster.pixel(500, 0), None);

        let png = raster.to_png().unwrap();
        assert_eq!(&png[0..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(raster.fingerprint().len(), 64);
    }
}
