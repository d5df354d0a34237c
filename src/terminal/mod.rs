pub mod buffer;
pub mod render;

pub use buffer::{DoubleBuffer, Rgb};
pub use render::{draw_text_row, update_buffer_from_frame};
