pub mod window;
pub mod window_renderer;

pub use window_renderer::WindowRenderer;
