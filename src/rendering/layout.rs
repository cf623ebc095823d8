/// Text placement on the output canvas

use crate::model::TextLine;
use crate::CanvasSize;

/// Where one text line is anchored, in canvas pixels.
///
/// `anchor_x` is the horizontal midpoint of the text's advance width and
/// `baseline_y` its alphabetic baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextPlacement {
    pub anchor_x: f32,
    pub baseline_y: f32,
}

/// Horizontal anchor: 50% sits on the midline, every percent away from it
/// moves the text by 1/100 of the canvas width.
pub fn anchor_x(horizontal_position: u32, canvas: CanvasSize) -> f32 {
    let w = canvas.width as f32;
    w / 2.0 + (horizontal_position as f32 - 50.0) * w / 100.0
}

/// Vertical anchor: a direct percentage of the height from the top edge.
pub fn baseline_y(vertical_position: u32, canvas: CanvasSize) -> f32 {
    canvas.height as f32 * vertical_position as f32 / 100.0
}

pub fn place_line(line: &TextLine, canvas: CanvasSize) -> TextPlacement {
    TextPlacement {
        anchor_x: anchor_x(line.horizontal_position, canvas),
        baseline_y: baseline_y(line.vertical_position, canvas),
    }
}

/// Placements for every line, in list order. Blank lines still get a
/// placement; skipping them is the painter's job.
pub fn layout_lines(lines: &[TextLine], canvas: CanvasSize) -> Vec<(TextPlacement, &TextLine)> {
    lines.iter().map(|l| (place_line(l, canvas), l)).collect()
}

/// A rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// The widest box centred on the anchor that still fits the canvas, one
/// font size tall and sitting on the baseline. Used to describe lines to the
/// remote renderer.
pub fn text_box(placement: TextPlacement, font_size: u32, canvas: CanvasSize) -> Rect {
    let ax = placement.anchor_x.round() as i32;
    let half = ax.min(canvas.width as i32 - ax).max(0);
    let baseline = placement.baseline_y.round() as i32;
    Rect {
        x: ax - half,
        y: baseline - font_size as i32,
        width: (half * 2) as u32,
        height: font_size,
    }
}
