use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use super::layout::{BlockType, ParamLayout};
use crate::shader::builtins::is_reserved;
use crate::shader::{scan_uniform_declarations, DeclaredType, PARAMS_MARKER, PREAMBLE};

/// Full-screen triangle paired with every compiled fragment program
pub const VERTEX_SHADER: &str = include_str!("../../shaders/fullscreen.wgsl");

pub const BUILTINS_BINDING: u32 = 0;
pub const PARAMS_BINDING: u32 = 1;

/// Where a diagnostic points, relative to what the user wrote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLine {
    User(usize),
    Host(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub line: Option<SourceLine>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(SourceLine::User(line)) => write!(f, "line {line}: {}", self.message),
            Some(SourceLine::Host(line)) => write!(f, "preamble line {line}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("program has no '{PARAMS_MARKER}' insertion point")]
    MissingParamsMarker,
    #[error("{}", join_diagnostics(.0))]
    Parse(Vec<Diagnostic>),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("WGSL generation failed: {0}")]
    Backend(String),
}

impl CompileError {
    /// First user-source line the error points at, if known
    pub fn user_line(&self) -> Option<usize> {
        match self {
            CompileError::Parse(diagnostics) => diagnostics.iter().find_map(|d| match d.line {
                Some(SourceLine::User(line)) => Some(line),
                _ => None,
            }),
            _ => None,
        }
    }
}

fn join_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Assembled text with loose parameters gathered into the `Params` block
#[derive(Debug, Clone)]
pub struct LoweredProgram {
    pub glsl: String,
    pub layout: ParamLayout,
    // 1-based line of the first user line in `glsl`, when the preamble is intact
    body_start_line: Option<usize>,
}

impl LoweredProgram {
    fn locate(&self, line: usize) -> SourceLine {
        match self.body_start_line {
            Some(start) if line >= start => SourceLine::User(line - start + 1),
            _ => SourceLine::Host(line),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompiledProgram {
    pub fragment_wgsl: String,
    pub layout: ParamLayout,
}

// AIDEV-NOTE: Vulkan GLSL rejects uniforms outside blocks, so every supported loose
// declaration after the marker becomes a member of the Params block. The last
// declaration of a name defines its slot, matching extraction; earlier ones are
// commented out.
pub fn lower_parameters(assembled: &str) -> Result<LoweredProgram, CompileError> {
    let marker = assembled
        .find(PARAMS_MARKER)
        .ok_or(CompileError::MissingParamsMarker)?;
    let after_marker = marker + PARAMS_MARKER.len();

    let lowerable: Vec<_> = scan_uniform_declarations(assembled)
        .into_iter()
        .filter(|d| d.span.start >= after_marker && !is_reserved(d.name))
        .filter_map(|d| {
            let ty = DeclaredType::parse(d.type_name).and_then(BlockType::from_declared)?;
            Some((d, ty))
        })
        .collect();
    let last_index: HashMap<&str, usize> = lowerable
        .iter()
        .enumerate()
        .map(|(i, (d, _))| (d.name, i))
        .collect();

    let mut layout = ParamLayout::default();
    let mut rest = String::with_capacity(assembled.len() - after_marker);
    let mut cursor = after_marker;

    for (i, (declaration, ty)) in lowerable.iter().enumerate() {
        rest.push_str(&assembled[cursor..declaration.span.start]);
        let original = declaration.text(assembled);
        if last_index.get(declaration.name) == Some(&i) {
            layout.push(declaration.name, *ty);
            rest.push_str(&format!("/* {} -> Params */", declaration.name));
        } else {
            rest.push_str(&format!("/* {} (redeclared) */", declaration.name));
        }
        for _ in original.matches('\n') {
            rest.push('\n');
        }
        cursor = declaration.span.end;
    }
    rest.push_str(&assembled[cursor..]);

    let block = layout.glsl_block(0, PARAMS_BINDING);
    let glsl = format!("{}{block}{rest}", &assembled[..marker]);

    let body_start_line = assembled.starts_with(PREAMBLE).then(|| {
        let body_offset = PREAMBLE.len() + 1;
        assembled[..body_offset].matches('\n').count() + block.matches('\n').count() + 1
    });

    Ok(LoweredProgram {
        glsl,
        layout,
        body_start_line,
    })
}

/// Lower, parse, validate and translate an assembled program to a WGSL fragment shader
pub fn compile_program(assembled: &str) -> Result<CompiledProgram, CompileError> {
    let lowered = lower_parameters(assembled)?;

    let mut frontend = naga::front::glsl::Frontend::default();
    let options = naga::front::glsl::Options::from(naga::ShaderStage::Fragment);
    let module = frontend.parse(&options, &lowered.glsl).map_err(|errors| {
        CompileError::Parse(
            errors
                .errors
                .iter()
                .map(|e| Diagnostic {
                    line: e
                        .meta
                        .is_defined()
                        .then(|| lowered.locate(e.meta.location(&lowered.glsl).line_number as usize)),
                    message: e.kind.to_string(),
                })
                .collect(),
        )
    })?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    let info = validator
        .validate(&module)
        .map_err(|e| CompileError::Validation(e.as_inner().to_string()))?;

    let fragment_wgsl =
        naga::back::wgsl::write_string(&module, &info, naga::back::wgsl::WriterFlags::empty())
            .map_err(|e| CompileError::Backend(e.to_string()))?;

    log::debug!(
        "Compiled program with {} parameter slot(s), {} bytes",
        lowered.layout.slots().len(),
        lowered.layout.size()
    );

    Ok(CompiledProgram {
        fragment_wgsl,
        layout: lowered.layout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{assemble, extract, ExtractOptions, SemanticType, DEFAULT_DOCUMENT};

    #[test]
    fn test_lower_default_document() {
        let lowered = lower_parameters(&assemble(DEFAULT_DOCUMENT)).unwrap();

        let names: Vec<_> = lowered.layout.slots().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["colorAccent", "intensity"]);
        assert_eq!(lowered.layout.slots()[1].offset, 12);
        assert!(lowered.glsl.contains("uniform Params {"));
        assert!(!lowered.glsl.contains("uniform float intensity;"));
        assert!(!lowered.glsl.contains(PARAMS_MARKER));
    }

    #[test]
    fn test_lower_keeps_line_count() {
        let assembled = assemble("uniform float a;\nuniform float3\n  b;\nfloat4 mainImage(float2 uv) { return float4(a); }");
        let lowered = lower_parameters(&assembled).unwrap();
        let block_lines = lowered.layout.glsl_block(0, PARAMS_BINDING).matches('\n').count();
        assert_eq!(
            lowered.glsl.matches('\n').count(),
            assembled.matches('\n').count() + block_lines
        );
    }

    #[test]
    fn test_lower_duplicate_uses_last_declaration() {
        let lowered =
            lower_parameters(&assemble("uniform float a;\nuniform float3 a;\n")).unwrap();
        assert_eq!(lowered.layout.slots().len(), 1);
        assert_eq!(lowered.layout.slots()[0].ty, BlockType::Vec3);
        assert!(lowered.glsl.contains("/* a (redeclared) */\n/* a -> Params */"));
    }

    #[test]
    fn test_duplicate_slot_matches_extracted_parameter() {
        let source = "uniform float a;\nuniform float3 a;\nuniform float2 b;\nuniform float b;\n";
        let params = extract(source, &ExtractOptions::default());
        let lowered = lower_parameters(&assemble(source)).unwrap();

        for param in &params {
            let slot = lowered
                .layout
                .slots()
                .iter()
                .find(|s| s.name == param.name)
                .unwrap();
            let expected = match param.semantic_type {
                SemanticType::Scalar => BlockType::Float,
                SemanticType::Vector2 => BlockType::Vec2,
                SemanticType::Vector3 | SemanticType::Color => BlockType::Vec3,
                SemanticType::Boolean => unreachable!(),
            };
            assert_eq!(slot.ty, expected, "{}", param.name);
        }
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_lower_leaves_unsupported_declarations() {
        let lowered = lower_parameters(&assemble("uniform bool enabled;\n")).unwrap();
        assert!(lowered.layout.slots().is_empty());
        assert!(lowered.glsl.contains("uniform bool enabled;"));
    }

    #[test]
    fn test_missing_marker() {
        assert!(matches!(
            compile_program("#version 450\nvoid main() {}"),
            Err(CompileError::MissingParamsMarker)
        ));
    }

    #[test]
    fn test_user_line_mapping() {
        let lowered = lower_parameters(&assemble("uniform float a;\nfloat x;\n")).unwrap();
        assert_eq!(lowered.locate(1), SourceLine::Host(1));
        let body_start = lowered.body_start_line.unwrap();
        assert_eq!(lowered.locate(body_start), SourceLine::User(1));
        assert_eq!(lowered.locate(body_start + 1), SourceLine::User(2));

        let user_line_two = lowered.glsl.lines().nth(body_start).unwrap();
        assert_eq!(user_line_two, "float x;");
    }

    #[test]
    fn test_default_document_compiles() {
        let compiled = compile_program(&assemble(DEFAULT_DOCUMENT)).unwrap();
        assert!(compiled.fragment_wgsl.contains("@fragment"));
        assert_eq!(compiled.layout.size(), 16);
    }

    #[test]
    fn test_error_points_at_user_line() {
        let source = "uniform float gain;\nfloat4 mainImage(float2 uv) { return float4(undefinedThing); }\n";
        let err = compile_program(&assemble(source)).unwrap_err();
        assert!(matches!(err, CompileError::Parse(_)));
        assert_eq!(err.user_line(), Some(2));
    }
}
