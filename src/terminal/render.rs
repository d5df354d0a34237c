use super::buffer::{Cell, DoubleBuffer, Rgb};
use crate::threading::FrameData;

fn pixel(frame: &FrameData, x: usize, y: usize) -> Rgb {
    let idx = (y * frame.width as usize + x) * 4;
    match frame.pixels.get(idx..idx + 3) {
        Some(&[r, g, b]) => [r, g, b],
        _ => [0, 0, 0],
    }
}

/// Fill the top `rows` rows of `buffer` from a frame of `width` x `rows * 2` pixels
pub fn update_buffer_from_frame(buffer: &mut DoubleBuffer, frame: &FrameData, rows: usize) {
    // AIDEV-NOTE: Index with the frame's width, not the terminal's; they differ for a
    // frame or two after a resize.
    let width = buffer.width.min(frame.width as usize);
    let frame_rows = (frame.height as usize).div_ceil(2);
    for y in 0..rows.min(buffer.height).min(frame_rows) {
        for x in 0..width {
            let cell = Cell::Pixels {
                top: pixel(frame, x, y * 2),
                bottom: pixel(frame, x, y * 2 + 1),
            };
            buffer.set_cell(x, y, cell);
        }
    }
}

/// Write `text` into row `y`, padding or truncating to the buffer width
pub fn draw_text_row(buffer: &mut DoubleBuffer, y: usize, text: &str, fg: Rgb, bg: Rgb) {
    let mut chars = text.chars();
    for x in 0..buffer.width {
        let ch = chars.next().unwrap_or(' ');
        buffer.set_cell(x, y, Cell::Text { ch, fg, bg });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_blocks_pair_rows() {
        // 2x2 frame: red, green on top; blue, white below
        let frame = FrameData {
            pixels: vec![
                255, 0, 0, 255, 0, 255, 0, 255, //
                0, 0, 255, 255, 255, 255, 255, 255,
            ],
            width: 2,
            height: 2,
        };
        let mut buffer = DoubleBuffer::new(2, 2);
        update_buffer_from_frame(&mut buffer, &frame, 1);

        let changes = buffer.swap_and_get_changes();
        assert_eq!(
            changes[0],
            (0, 0, Cell::Pixels { top: [255, 0, 0], bottom: [0, 0, 255] })
        );
        assert_eq!(
            changes[1],
            (1, 0, Cell::Pixels { top: [0, 255, 0], bottom: [255, 255, 255] })
        );
    }

    #[test]
    fn test_short_frame_reads_black() {
        let frame = FrameData {
            pixels: vec![10, 20, 30, 255],
            width: 1,
            height: 1,
        };
        let mut buffer = DoubleBuffer::new(1, 1);
        update_buffer_from_frame(&mut buffer, &frame, 1);
        let changes = buffer.swap_and_get_changes();
        assert_eq!(
            changes[0].2,
            Cell::Pixels { top: [10, 20, 30], bottom: [0, 0, 0] }
        );
    }

    #[test]
    fn test_rows_past_frame_are_untouched() {
        let frame = FrameData {
            pixels: vec![10, 20, 30, 255, 40, 50, 60, 255],
            width: 1,
            height: 2,
        };
        let mut buffer = DoubleBuffer::new(1, 3);
        buffer.swap_and_get_changes();

        update_buffer_from_frame(&mut buffer, &frame, 3);
        let changes = buffer.swap_and_get_changes();
        assert_eq!(
            changes,
            vec![(0, 0, Cell::Pixels { top: [10, 20, 30], bottom: [40, 50, 60] })]
        );
    }

    #[test]
    fn test_text_row_pads() {
        let mut buffer = DoubleBuffer::new(4, 1);
        draw_text_row(&mut buffer, 0, "ab", [1, 1, 1], [0, 0, 0]);
        let text: String = buffer
            .swap_and_get_changes()
            .into_iter()
            .map(|(_, _, cell)| match cell {
                Cell::Text { ch, .. } => ch,
                Cell::Pixels { .. } => '?',
            })
            .collect();
        assert_eq!(text, "ab  ");
    }
}
