/// Executes a display list onto an RGBA buffer

use crate::model::TextColor;
use crate::rendering::glyphs::{shape_text, GlyphFace, TextMask};
use crate::rendering::layout::TextPlacement;
use crate::rendering::paint::PaintCommand;
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};

pub fn rasterize(
    source: &DynamicImage,
    commands: &[PaintCommand],
    face: &dyn GlyphFace,
    width: u32,
    height: u32,
) -> RgbaImage {
    // Starts fully transparent, like a cleared canvas
    let mut canvas = RgbaImage::new(width, height);
    for cmd in commands {
        match cmd {
            PaintCommand::Background { width, height } => {
                draw_background(&mut canvas, source, *width, *height);
            }
            PaintCommand::StrokeText {
                placement,
                text,
                size,
                width,
                color,
            } => {
                let mask = shape_text(face, text, *size).dilated(width / 2.0);
                draw_mask(&mut canvas, &mask, *placement, *color);
            }
            PaintCommand::FillText {
                placement,
                text,
                size,
                color,
            } => {
                let mask = shape_text(face, text, *size);
                draw_mask(&mut canvas, &mask, *placement, *color);
            }
        }
    }
    canvas
}

/// Stretch `source` to exactly `width`×`height` (no aspect preservation) and
/// copy it over the top-left of the canvas.
fn draw_background(canvas: &mut RgbaImage, source: &DynamicImage, width: u32, height: u32) {
    let resized = image::imageops::resize(&source.to_rgba8(), width, height, FilterType::Lanczos3);
    for (x, y, pixel) in resized.enumerate_pixels() {
        if x < canvas.width() && y < canvas.height() {
            canvas.put_pixel(x, y, *pixel);
        }
    }
}

/// Blend `mask` in `color`, centred horizontally on the anchor with its
/// baseline on `placement.baseline_y`.
fn draw_mask(canvas: &mut RgbaImage, mask: &TextMask, placement: TextPlacement, color: TextColor) {
    if mask.is_empty() {
        return;
    }
    let pen_x = (placement.anchor_x - mask.advance / 2.0).round() as i32;
    let baseline = placement.baseline_y.round() as i32;
    let x0 = pen_x + mask.left;
    let y0 = baseline + mask.top;
    let rgba = color.rgba();

    for my in 0..mask.height {
        let py = y0 + my as i32;
        if py < 0 || py >= canvas.height() as i32 {
            continue;
        }
        for mx in 0..mask.width {
            let px = x0 + mx as i32;
            if px < 0 || px >= canvas.width() as i32 {
                continue;
            }
            let coverage = mask.at(mx, my);
            if coverage == 0 {
                continue;
            }
            let dst = canvas.get_pixel_mut(px as u32, py as u32);
            *dst = blend_over(*dst, rgba, coverage);
        }
    }
}

/// Source-over compositing of an opaque color at `coverage`/255 opacity.
pub fn blend_over(dst: Rgba<u8>, src: [u8; 4], coverage: u8) -> Rgba<u8> {
    let a = coverage as u32 * src[3] as u32 / 255;
    let inv = 255 - a;
    let mix = |s: u8, d: u8| ((s as u32 * a + d as u32 * inv + 127) / 255) as u8;
    let out_a = a + (dst[3] as u32 * inv + 127) / 255;
    Rgba([
        mix(src[0], dst[0]),
        mix(src[1], dst[1]),
        mix(src[2], dst[2]),
        out_a.min(255) as u8,
    ])
}
