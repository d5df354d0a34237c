pub mod buffer;
pub mod device;
pub mod layout;
pub mod pipeline;
pub mod program;
pub mod uniforms;

pub use buffer::*;
pub use device::*;
pub use pipeline::*;
pub use program::{compile_program, CompileError, CompiledProgram};
pub use uniforms::*;
