/// Display list built from the editor inputs

use crate::model::{Style, TextColor, TextLine};
use crate::rendering::layout::{layout_lines, TextPlacement};
use crate::CanvasSize;

/// Width of the black outline drawn under every text run.
pub const STROKE_WIDTH: f32 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    /// Stretch the source image over the whole canvas.
    Background { width: u32, height: u32 },
    /// Outline pass of a text run, centred on `placement.anchor_x`.
    StrokeText {
        placement: TextPlacement,
        text: String,
        size: f32,
        width: f32,
        color: TextColor,
    },
    /// Fill pass of a text run.
    FillText {
        placement: TextPlacement,
        text: String,
        size: f32,
        color: TextColor,
    },
}

/// Background first, then a stroke/fill pair per non-blank line in list
/// order so that later lines end up on top.
pub fn build_display_list(lines: &[TextLine], style: &Style, canvas: CanvasSize) -> Vec<PaintCommand> {
    let mut cmds = vec![PaintCommand::Background {
        width: canvas.width,
        height: canvas.height,
    }];
    let size = style.font_size as f32;
    for (placement, line) in layout_lines(lines, canvas) {
        if line.is_blank() {
            continue;
        }
        cmds.push(PaintCommand::StrokeText {
            placement,
            text: line.text.clone(),
            size,
            width: STROKE_WIDTH,
            color: TextColor::BLACK,
        });
        cmds.push(PaintCommand::FillText {
            placement,
            text: line.text.clone(),
            size,
            color: style.text_color,
        });
    }
    cmds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TextLineId;

    #[test]
    fn stroke_precedes_fill_and_blank_lines_are_skipped() {
        let lines = vec![
            TextLine::at(TextLineId(1), 20, 50).with_text("TOP"),
            TextLine::at(TextLineId(2), 50, 50).with_text("  "),
            TextLine::at(TextLineId(3), 80, 50).with_text("BOTTOM"),
        ];
        let style = Style::default();
        let cmds = build_display_list(&lines, &style, CanvasSize::default());
        assert_eq!(cmds.len(), 5);
        assert!(matches!(cmds[0], PaintCommand::Background { width: 500, height: 500 }));
        match (&cmds[1], &cmds[2]) {
            (
                PaintCommand::StrokeText { text: a, color, width, .. },
                PaintCommand::FillText { text: b, color: fill, .. },
            ) => {
                assert_eq!(a, "TOP");
                assert_eq!(b, "TOP");
                assert_eq!(*color, TextColor::BLACK);
                assert_eq!(*width, 2.0);
                assert_eq!(*fill, TextColor::WHITE);
            }
            other => panic!("unexpected commands: {:?}", other),
        }
        match &cmds[4] {
            PaintCommand::FillText { text, placement, .. } => {
                assert_eq!(text, "BOTTOM");
                assert_eq!(placement.baseline_y, 400.0);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
