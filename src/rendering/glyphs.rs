//! Glyph faces and text coverage masks.
//!
//! A [`GlyphFace`] turns characters into 8-bit coverage bitmaps. Real fonts
//! are rasterized with `fontdue`; when no font file is available for a family
//! the [`BlockFace`] stands in, drawing each visible character as a solid
//! cell so that output stays deterministic on machines without fonts.

use crate::model::FontFamily;
use crate::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Coverage bitmap of a single glyph, positioned relative to the pen.
///
/// `xmin` is the offset of the left edge from the pen position, `ymin` the
/// offset of the bottom edge above the baseline (positive is up).
#[derive(Debug, Clone, Default)]
pub struct GlyphBitmap {
    pub width: usize,
    pub height: usize,
    pub xmin: i32,
    pub ymin: i32,
    pub advance: f32,
    pub coverage: Vec<u8>,
}

pub trait GlyphFace: Send + Sync {
    fn name(&self) -> &str;

    /// Rasterize `ch` at a pixel size of `px`.
    fn glyph(&self, ch: char, px: f32) -> GlyphBitmap;
}

/// A TrueType/OpenType face rasterized by fontdue.
pub struct FontdueFace {
    name: String,
    font: fontdue::Font,
}

impl FontdueFace {
    pub fn from_bytes(name: impl Into<String>, data: &[u8]) -> Result<Self> {
        let name = name.into();
        let font = fontdue::Font::from_bytes(data, fontdue::FontSettings::default())
            .map_err(|e| Error::RenderError(format!("Failed to load font {}: {}", name, e)))?;
        Ok(Self { name, font })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(path.display().to_string(), &data)
    }
}

impl GlyphFace for FontdueFace {
    fn name(&self) -> &str {
        &self.name
    }

    fn glyph(&self, ch: char, px: f32) -> GlyphBitmap {
        let (metrics, coverage) = self.font.rasterize(ch, px);
        GlyphBitmap {
            width: metrics.width,
            height: metrics.height,
            xmin: metrics.xmin,
            ymin: metrics.ymin,
            advance: metrics.advance_width,
            coverage,
        }
    }
}

/// Built-in fallback face: every non-whitespace character is a solid cell.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockFace;

impl GlyphFace for BlockFace {
    fn name(&self) -> &str {
        "builtin-block"
    }

    fn glyph(&self, ch: char, px: f32) -> GlyphBitmap {
        let advance = (px * 0.6).round();
        if ch.is_whitespace() {
            return GlyphBitmap { advance, ..Default::default() };
        }
        let width = (px * 0.5).round().max(1.0) as usize;
        let height = (px * 0.7).round().max(1.0) as usize;
        GlyphBitmap {
            width,
            height,
            xmin: (px * 0.05).round() as i32,
            ymin: 0,
            advance,
            coverage: vec![255; width * height],
        }
    }
}

/// Coverage of a whole run of text.
///
/// `left` and `top` locate the mask relative to the pen start and the
/// baseline (y grows downwards). `advance` is the total advance width, which
/// is what centring uses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextMask {
    pub width: usize,
    pub height: usize,
    pub left: i32,
    pub top: i32,
    pub advance: f32,
    pub coverage: Vec<u8>,
}

impl TextMask {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn at(&self, x: usize, y: usize) -> u8 {
        self.coverage[y * self.width + x]
    }

    /// The mask grown by a disk of `radius` pixels, i.e. the area a stroke of
    /// width `2 * radius` centred on the glyph outlines covers together with
    /// the glyph interior.
    pub fn dilated(&self, radius: f32) -> TextMask {
        if self.is_empty() || radius <= 0.0 {
            return self.clone();
        }
        let r = radius.ceil() as i32;
        let r2 = radius * radius;
        let offsets: Vec<(i32, i32)> = (-r..=r)
            .flat_map(|dy| (-r..=r).map(move |dx| (dx, dy)))
            .filter(|&(dx, dy)| (dx * dx + dy * dy) as f32 <= r2)
            .collect();

        let width = self.width + 2 * r as usize;
        let height = self.height + 2 * r as usize;
        let mut coverage = vec![0u8; width * height];
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let mut best = 0u8;
                for &(dx, dy) in &offsets {
                    let sx = x - r + dx;
                    let sy = y - r + dy;
                    if sx < 0 || sy < 0 || sx >= self.width as i32 || sy >= self.height as i32 {
                        continue;
                    }
                    best = best.max(self.at(sx as usize, sy as usize));
                    if best == 255 {
                        break;
                    }
                }
                coverage[y as usize * width + x as usize] = best;
            }
        }
        TextMask {
            width,
            height,
            left: self.left - r,
            top: self.top - r,
            advance: self.advance,
            coverage,
        }
    }
}

/// Lay `text` out on a single line and merge the glyph coverages.
pub fn shape_text(face: &dyn GlyphFace, text: &str, px: f32) -> TextMask {
    let mut pen = 0.0f32;
    let mut placed = Vec::new();
    for ch in text.chars() {
        let g = face.glyph(ch, px);
        let gx = (pen + g.xmin as f32).round() as i32;
        let gy = -(g.ymin + g.height as i32);
        pen += g.advance;
        if g.width > 0 && g.height > 0 {
            placed.push((gx, gy, g));
        }
    }

    let (min_x, min_y, max_x, max_y) = placed.iter().fold(
        (i32::MAX, i32::MAX, i32::MIN, i32::MIN),
        |(x0, y0, x1, y1), (gx, gy, g)| {
            (
                x0.min(*gx),
                y0.min(*gy),
                x1.max(gx + g.width as i32),
                y1.max(gy + g.height as i32),
            )
        },
    );
    if placed.is_empty() {
        return TextMask { advance: pen, ..Default::default() };
    }

    let width = (max_x - min_x) as usize;
    let height = (max_y - min_y) as usize;
    let mut coverage = vec![0u8; width * height];
    for (gx, gy, g) in &placed {
        let ox = (gx - min_x) as usize;
        let oy = (gy - min_y) as usize;
        for row in 0..g.height {
            for col in 0..g.width {
                let a = g.coverage[row * g.width + col];
                let idx = (oy + row) * width + ox + col;
                coverage[idx] = coverage[idx].max(a);
            }
        }
    }

    TextMask {
        width,
        height,
        left: min_x,
        top: min_y,
        advance: pen,
        coverage,
    }
}

/// Resolves font families to faces, loading each font file at most once.
pub struct FontBook {
    dir: Option<PathBuf>,
    faces: Mutex<HashMap<FontFamily, Arc<dyn GlyphFace>>>,
}

impl FontBook {
    /// Look for font files in `dir`, see [`FontFamily::file_candidates`].
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self {
            dir,
            faces: Mutex::new(HashMap::new()),
        }
    }

    /// A book that only ever hands out the [`BlockFace`].
    pub fn builtin() -> Self {
        Self::new(None)
    }

    /// Register a face explicitly, overriding file lookup.
    pub fn insert(&self, family: FontFamily, face: Arc<dyn GlyphFace>) {
        self.faces
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(family, face);
    }

    pub fn face(&self, family: FontFamily) -> Arc<dyn GlyphFace> {
        let mut faces = self.faces.lock().unwrap_or_else(|e| e.into_inner());
        faces
            .entry(family)
            .or_insert_with(|| self.load(family))
            .clone()
    }

    fn load(&self, family: FontFamily) -> Arc<dyn GlyphFace> {
        if let Some(dir) = &self.dir {
            for candidate in family.file_candidates() {
                let path = dir.join(candidate);
                if !path.exists() {
                    continue;
                }
                match FontdueFace::from_file(&path) {
                    Ok(face) => {
                        log::debug!("Loaded font {} for {}", path.display(), family);
                        return Arc::new(face);
                    }
                    Err(e) => log::warn!("Skipping font {}: {}", path.display(), e),
                }
            }
            log::warn!(
                "No font file for {} in {}; using the built-in block face",
                family,
                dir.display()
            );
        }
        Arc::new(BlockFace)
    }
}

impl Default for FontBook {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_face_is_deterministic() {
        let g = BlockFace.glyph('A', 20.0);
        assert_eq!((g.width, g.height, g.xmin, g.ymin), (10, 14, 1, 0));
        assert_eq!(g.advance, 12.0);
        assert!(g.coverage.iter().all(|&c| c == 255));

        let space = BlockFace.glyph(' ', 20.0);
        assert_eq!(space.width, 0);
        assert_eq!(space.advance, 12.0);
    }

    #[test]
    fn shape_text_sits_on_baseline() {
        let m = shape_text(&BlockFace, "AB", 20.0);
        assert_eq!(m.advance, 24.0);
        assert_eq!(m.left, 1);
        assert_eq!(m.top, -14);
        assert_eq!(m.height, 14);
        // Two 10px cells 12px apart: 1..11 and 13..23
        assert_eq!(m.width, 22);
        assert_eq!(m.at(0, 0), 255);
        assert_eq!(m.at(10, 0), 0);
        assert_eq!(m.at(12, 0), 255);
    }

    #[test]
    fn whitespace_only_text_has_empty_mask() {
        let m = shape_text(&BlockFace, "   ", 20.0);
        assert!(m.is_empty());
        assert_eq!(m.advance, 36.0);
    }

    #[test]
    fn dilation_grows_by_radius() {
        let m = shape_text(&BlockFace, "A", 20.0);
        let d = m.dilated(1.0);
        assert_eq!(d.width, m.width + 2);
        assert_eq!(d.height, m.height + 2);
        assert_eq!(d.left, m.left - 1);
        assert_eq!(d.top, m.top - 1);
        // Corners of a radius-1 disk stay empty, edge midpoints are covered
        assert_eq!(d.at(0, 0), 0);
        assert_eq!(d.at(0, 1), 255);
        assert_eq!(d.at(1, 0), 255);
    }

    #[test]
    fn font_book_falls_back_to_block_face() {
        let dir = std::env::temp_dir().join("memegen-no-fonts-here");
        let book = FontBook::new(Some(dir));
        assert_eq!(book.face(FontFamily::Impact).name(), "builtin-block");
        assert_eq!(FontBook::builtin().face(FontFamily::Arial).name(), "builtin-block");
    }

    #[test]
    fn invalid_font_bytes_are_rejected() {
        assert!(FontdueFace::from_bytes("junk", b"not a font").is_err());
    }
}
