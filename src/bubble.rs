//! Speech bubble sizing.

use crate::constants::{BASELINE_OFFSET, BUBBLE_H_PADDING, BUBBLE_V_PADDING, LINE_HEIGHT};
use crate::layouts::DialogueAnchor;
use crate::text::TextBlock;

/// Ellipse enclosing a dialogue block, plus where each line sits inside it.
#[derive(Clone, Debug, PartialEq)]
pub struct BubbleGeometry {
    /// Centre x
    pub cx: f64,
    /// Centre y
    pub cy: f64,
    /// Horizontal radius
    pub rx: f64,
    /// Vertical radius
    pub ry: f64,
    /// Baseline y for each line, top to bottom
    pub baselines: Vec<f64>,
}

impl BubbleGeometry {
    /// Left edge of the ellipse.
    pub fn left(&self) -> f64 {
        self.cx - self.rx
    }

    /// Right edge of the ellipse.
    pub fn right(&self) -> f64 {
        self.cx + self.rx
    }
}

/// Sizes a bubble around `block`, centred on the anchor.
///
/// The ellipse is then shifted (never resized) to stay within `0..=canvas_width`; when
/// it is wider than the canvas the left edge wins. Returns `None` for an empty block.
pub fn bubble_geometry(
    block: &TextBlock,
    anchor: &DialogueAnchor,
    canvas_width: f64,
) -> Option<BubbleGeometry> {
    if block.is_empty() {
        return None;
    }
    let font_size = anchor.font_size;
    let line_height = font_size * LINE_HEIGHT;
    let text_height = block.len() as f64 * line_height;

    let rx = (block.max_width(font_size) + BUBBLE_H_PADDING) / 2.0;
    let ry = (text_height + BUBBLE_V_PADDING) / 2.0;

    let mut cx = anchor.x;
    if cx + rx > canvas_width {
        cx = canvas_width - rx;
    }
    if cx - rx < 0.0 {
        cx = rx;
    }
    let cy = anchor.y;

    let text_top = cy - text_height / 2.0;
    let baselines = (0..block.len())
        .map(|idx| text_top + line_height * (idx as f64 + BASELINE_OFFSET))
        .collect();

    Some(BubbleGeometry {
        cx,
        cy,
        rx,
        ry,
        baselines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TEST_CANVAS_WIDTH;

    fn anchor(x: f64, y: f64) -> DialogueAnchor {
        DialogueAnchor {
            x,
            y,
            font_size: 18.0,
        }
    }

    #[test]
    fn empty_block_has_no_bubble() {
        assert!(bubble_geometry(&TextBlock::default(), &anchor(200.0, 400.0), 400.0).is_none());
    }

    #[test]
    fn single_short_line_still_has_positive_radii() {
        let block = TextBlock::from_lines([""]);
        let bubble = bubble_geometry(&block, &anchor(200.0, 400.0), TEST_CANVAS_WIDTH)
            .expect("bubble");
        assert!(bubble.rx > 0.0);
        assert!(bubble.ry > 0.0);
        assert_eq!(bubble.rx, BUBBLE_H_PADDING / 2.0);
    }

    #[test]
    fn more_lines_make_a_taller_bubble() {
        let mut previous = 0.0;
        for count in 1..8 {
            let block = TextBlock::from_lines(vec!["hi"; count]);
            let bubble = bubble_geometry(&block, &anchor(200.0, 250.0), TEST_CANVAS_WIDTH)
                .expect("bubble");
            assert!(bubble.ry > previous, "{count} lines: {} <= {previous}", bubble.ry);
            previous = bubble.ry;
        }
    }

    #[test]
    fn radii_follow_the_widest_line() {
        let block = TextBlock::from_lines(["Hello there"]);
        let bubble = bubble_geometry(&block, &anchor(200.0, 440.0), TEST_CANVAS_WIDTH)
            .expect("bubble");
        let expected_rx = (block.max_width(18.0) + BUBBLE_H_PADDING) / 2.0;
        assert!((bubble.rx - expected_rx).abs() < 1e-9);
        assert!((bubble.ry - (18.0 * LINE_HEIGHT + BUBBLE_V_PADDING) / 2.0).abs() < 1e-9);
        assert_eq!(bubble.cx, 200.0);
        assert_eq!(bubble.cy, 440.0);
    }

    #[test]
    fn baselines_are_one_line_apart_and_inside_the_ellipse() {
        let block = TextBlock::from_lines(["one", "two", "three"]);
        let bubble = bubble_geometry(&block, &anchor(200.0, 250.0), TEST_CANVAS_WIDTH)
            .expect("bubble");
        assert_eq!(bubble.baselines.len(), 3);
        let step = 18.0 * LINE_HEIGHT;
        for pair in bubble.baselines.windows(2) {
            assert!((pair[1] - pair[0] - step).abs() < 1e-9);
        }
        let top = bubble.cy - bubble.ry;
        let bottom = bubble.cy + bubble.ry;
        assert!(bubble.baselines.iter().all(|y| *y > top && *y < bottom));
    }

    #[test]
    fn first_baseline_sits_below_the_top_padding() {
        let block = TextBlock::from_lines(["Hello"]);
        let bubble = bubble_geometry(&block, &anchor(200.0, 250.0), TEST_CANVAS_WIDTH)
            .expect("bubble");
        let line_height = 18.0 * LINE_HEIGHT;
        let from_top = bubble.baselines[0] - (bubble.cy - bubble.ry);
        let expected = BUBBLE_V_PADDING / 2.0 + BASELINE_OFFSET * line_height;
        assert!((from_top - expected).abs() < 1e-9, "{from_top} != {expected}");
    }

    #[test]
    fn clamps_left_edge_without_resizing() {
        let block = TextBlock::from_lines(["a fairly long line of dialogue"]);
        let unclamped = bubble_geometry(&block, &anchor(200.0, 250.0), 10_000.0)
            .expect("bubble");
        let bubble = bubble_geometry(&block, &anchor(5.0, 250.0), TEST_CANVAS_WIDTH)
            .expect("bubble");
        assert!(bubble.left() >= 0.0);
        assert_eq!(bubble.rx, unclamped.rx);
        assert_eq!(bubble.left(), 0.0);
    }

    #[test]
    fn clamps_right_edge_without_resizing() {
        let block = TextBlock::from_lines(["another long line"]);
        let bubble = bubble_geometry(&block, &anchor(395.0, 250.0), TEST_CANVAS_WIDTH)
            .expect("bubble");
        assert!((bubble.right() - TEST_CANVAS_WIDTH).abs() < 1e-9);
        assert!(bubble.left() >= 0.0);
    }

    #[test]
    fn oversized_bubble_pins_the_left_edge() {
        let block = TextBlock::from_lines(["漢".repeat(40)]);
        let bubble = bubble_geometry(&block, &anchor(200.0, 250.0), TEST_CANVAS_WIDTH)
            .expect("bubble");
        assert!(bubble.rx * 2.0 > TEST_CANVAS_WIDTH);
        assert_eq!(bubble.left(), 0.0);
    }
}
