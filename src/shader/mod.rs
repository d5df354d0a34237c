pub mod assemble;
pub mod builtins;
pub mod declarations;
pub mod extract;
pub mod lexer;
pub mod params;
pub mod types;

pub use assemble::{assemble, PARAMS_MARKER, PREAMBLE};
pub use declarations::scan_uniform_declarations;
pub use extract::{extract, ExtractOptions};
pub use params::{reconcile, ParamError, ParamValue, ParameterDescriptor, SemanticType};
pub use types::DeclaredType;

/// Document a new session starts with
pub const DEFAULT_DOCUMENT: &str = include_str!("../../shaders/default.hlsl");
