pub type Rgb = [u8; 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    /// Two stacked pixels drawn as `▀`: foreground on top, background below
    Pixels { top: Rgb, bottom: Rgb },
    Text { ch: char, fg: Rgb, bg: Rgb },
}

impl Default for Cell {
    fn default() -> Self {
        Cell::Text {
            ch: ' ',
            fg: [255, 255, 255],
            bg: [0, 0, 0],
        }
    }
}

impl Cell {
    /// 24-bit ANSI sequence for this cell
    pub fn to_ansi(&self) -> String {
        let (ch, [fr, fg, fb], [br, bg, bb]) = match *self {
            Cell::Pixels { top, bottom } => ('▀', top, bottom),
            Cell::Text { ch, fg, bg } => (ch, fg, bg),
        };
        format!("\x1b[38;2;{fr};{fg};{fb}m\x1b[48;2;{br};{bg};{bb}m{ch}\x1b[0m")
    }
}

// AIDEV-NOTE: Only cells that differ from the last presented frame are redrawn
pub struct DoubleBuffer {
    current: Vec<Cell>,
    next: Vec<Cell>,
    pub width: usize,
    pub height: usize,
    force_redraw: bool,
}

impl DoubleBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        DoubleBuffer {
            current: vec![Cell::default(); width * height],
            next: vec![Cell::default(); width * height],
            width,
            height,
            force_redraw: true,
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if (width, height) != (self.width, self.height) {
            *self = Self::new(width, height);
        }
    }

    pub fn set_cell(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.next[y * self.width + x] = cell;
        }
    }

    pub fn swap_and_get_changes(&mut self) -> Vec<(usize, usize, Cell)> {
        let force = std::mem::take(&mut self.force_redraw);
        let changes = self
            .next
            .iter()
            .zip(&self.current)
            .enumerate()
            .filter(|(_, (next, current))| force || next != current)
            .map(|(i, (next, _))| (i % self.width, i / self.width, *next))
            .collect();

        self.current.copy_from_slice(&self.next);
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_swap_draws_everything() {
        let mut buffer = DoubleBuffer::new(3, 2);
        assert_eq!(buffer.swap_and_get_changes().len(), 6);
        assert!(buffer.swap_and_get_changes().is_empty());
    }

    #[test]
    fn test_only_changed_cells() {
        let mut buffer = DoubleBuffer::new(3, 2);
        buffer.swap_and_get_changes();

        let cell = Cell::Pixels {
            top: [1, 2, 3],
            bottom: [4, 5, 6],
        };
        buffer.set_cell(2, 1, cell);
        buffer.set_cell(9, 9, cell);
        assert_eq!(buffer.swap_and_get_changes(), vec![(2, 1, cell)]);
        assert!(buffer.swap_and_get_changes().is_empty());
    }

    #[test]
    fn test_ansi() {
        let cell = Cell::Pixels {
            top: [255, 0, 0],
            bottom: [0, 0, 255],
        };
        assert_eq!(cell.to_ansi(), "\x1b[38;2;255;0;0m\x1b[48;2;0;0;255m▀\x1b[0m");
    }
}
