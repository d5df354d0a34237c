pub mod state;
pub mod surfaces;

pub use state::WindowState;
pub use surfaces::SurfaceManager;
