use std::time::Instant;

use crate::gpu::BuiltinUniforms;
use crate::threading::{PreviewClock, Pointer};

/// Per-window animation state
pub struct WindowState {
    pub clock: PreviewClock,
    pub pointer: Pointer,
    pub width: u32,
    pub height: u32,
}

impl WindowState {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            clock: PreviewClock::new(Instant::now()),
            pointer: Pointer::default(),
            width,
            height,
        }
    }

    /// Cursor position in window pixels, y down
    pub fn update_cursor_position(&mut self, x: f32, y: f32) {
        self.pointer.set_from(x, y, self.width, self.height);
    }

    pub fn builtins(&self, now: Instant) -> BuiltinUniforms {
        BuiltinUniforms::new(self.width, self.height, self.clock.elapsed(now), self.pointer.0)
    }
}
