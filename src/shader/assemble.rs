use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use super::builtins::BuiltIn;
use super::declarations::scan_uniform_declarations;

// AIDEV-NOTE: Compatibility preamble prepended to every user program. Declares the
// built-in block, the parameter insertion marker and the mainImage trampoline.
pub const PREAMBLE: &str = include_str!("../../shaders/preamble.glsl");

/// Line in the preamble where the host inserts the block of user parameters
pub const PARAMS_MARKER: &str = "// @user-params";

static BINDING_ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i):\s*(?:SV_Target|SV_Position|TEXCOORD|COLOR)\d*\b").unwrap()
});

static ZERO_VECTOR_INIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(float[234])\s+(\w+)\s*=\s*0\s*;").unwrap());

static ZERO_SCALAR_INIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bfloat\s+(\w+)\s*=\s*0\s*;").unwrap());

/// Turn raw user source into the program handed to the rendering host.
/// Apply exactly once per document; the preamble is not idempotent.
pub fn assemble(source: &str) -> String {
    let body = strip_binding_annotations(source);
    let body = neutralize_builtin_redeclarations(&body);
    let body = coerce_zero_initializers(&body);
    format!("{PREAMBLE}\n{body}")
}

/// `float2 uv : TEXCOORD0` → `float2 uv `
pub fn strip_binding_annotations(source: &str) -> Cow<'_, str> {
    BINDING_ANNOTATION.replace_all(source, "")
}

/// Replace user declarations of host-supplied uniforms with comments, since the
/// preamble already declares them.
pub fn neutralize_builtin_redeclarations(source: &str) -> Cow<'_, str> {
    let redeclared: Vec<_> = scan_uniform_declarations(source)
        .into_iter()
        .filter_map(|d| BuiltIn::lookup(d.name).map(|builtin| (d, builtin)))
        .collect();
    if redeclared.is_empty() {
        return Cow::Borrowed(source);
    }

    let mut output = String::with_capacity(source.len() + 32 * redeclared.len());
    let mut cursor = 0;
    for (declaration, builtin) in redeclared {
        output.push_str(&source[cursor..declaration.span.start]);

        let summary = format!(
            "[Built-in] uniform {} {};",
            builtin.declared_type(),
            declaration.name
        );
        let original = declaration.text(source);
        let rest_of_line = source[declaration.span.end..]
            .split('\n')
            .next()
            .unwrap_or("");
        if rest_of_line.trim().is_empty() && !original.contains('\n') {
            output.push_str(&format!("// {summary}"));
        } else {
            output.push_str(&format!("/* {summary} */"));
        }
        // Keep line numbers stable for error reporting
        for _ in original.matches('\n') {
            output.push('\n');
        }

        cursor = declaration.span.end;
    }
    output.push_str(&source[cursor..]);
    Cow::Owned(output)
}

/// `float3 c = 0;` → `float3 c = float3(0.0);` and `float x = 0;` → `float x = 0.0;`
pub fn coerce_zero_initializers(source: &str) -> String {
    let vectors = ZERO_VECTOR_INIT.replace_all(source, "${1} ${2} = ${1}(0.0);");
    ZERO_SCALAR_INIT
        .replace_all(&vectors, "float ${1} = 0.0;")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::lexer::{tokenize, TokenKind};
    use crate::shader::DEFAULT_DOCUMENT;
    use proptest::prelude::*;

    fn body(assembled: &str) -> &str {
        &assembled[PREAMBLE.len() + 1..]
    }

    /// Declarations of `name` outside comments, e.g. `vec2 resolution;`
    fn active_declarations(source: &str, name: &str) -> usize {
        let tokens = tokenize(source);
        tokens
            .windows(3)
            .filter(|w| {
                w[0].kind == TokenKind::Ident
                    && w[1].text(source) == name
                    && w[2].is_punct(';')
            })
            .count()
    }

    #[test]
    fn test_preamble_declares_every_builtin_once() {
        for builtin in BuiltIn::ALL {
            assert_eq!(active_declarations(PREAMBLE, builtin.name()), 1, "{builtin:?}");
            assert_eq!(active_declarations(PREAMBLE, builtin.alias()), 1, "{builtin:?}");
        }
        assert!(PREAMBLE.contains(PARAMS_MARKER));
        assert!(PREAMBLE.starts_with("#version"));
    }

    #[test]
    fn test_coerce_vector_zero() {
        assert_eq!(coerce_zero_initializers("float3 c = 0;"), "float3 c = float3(0.0);");
        assert_eq!(coerce_zero_initializers("float2 uv=0 ;"), "float2 uv = float2(0.0);");
        assert_eq!(coerce_zero_initializers("float4 o = 0;"), "float4 o = float4(0.0);");
    }

    #[test]
    fn test_coerce_scalar_zero() {
        assert_eq!(coerce_zero_initializers("float x = 0;"), "float x = 0.0;");
    }

    #[test]
    fn test_coerce_leaves_valid_initializers_alone() {
        for source in [
            "float3 c = 0.0;",
            "float x = 0.0;",
            "float x = 10;",
            "float3 c = float3(0.0);",
            "int i = 0;",
            "float x = 0.5;",
        ] {
            assert_eq!(coerce_zero_initializers(source), source);
        }
    }

    #[test]
    fn test_coerce_repeated_patterns() {
        let source = "float3 a = 0;float3 b = 0; float c = 0;\nfloat d = 0;float3 e = 0.0;";
        assert_eq!(
            coerce_zero_initializers(source),
            "float3 a = float3(0.0);float3 b = float3(0.0); float c = 0.0;\nfloat d = 0.0;float3 e = 0.0;"
        );
        let once = coerce_zero_initializers(source);
        assert_eq!(coerce_zero_initializers(&once), once);
    }

    #[test]
    fn test_strip_binding_annotations() {
        assert_eq!(
            strip_binding_annotations("float4 main(float2 uv : TEXCOORD0) : SV_Target {"),
            "float4 main(float2 uv )  {"
        );
        assert_eq!(
            strip_binding_annotations("float4 pos : SV_POSITION;\nfloat4 c : color1;"),
            "float4 pos ;\nfloat4 c ;"
        );
    }

    #[test]
    fn test_strip_keeps_identifiers_that_start_with_keywords() {
        let source = "float3 c = flag ? base : colorAccent;";
        assert_eq!(strip_binding_annotations(source), source);
    }

    #[test]
    fn test_neutralize_line_declaration() {
        let out = neutralize_builtin_redeclarations("uniform float2 resolution;\nfloat x;");
        assert_eq!(out, "// [Built-in] uniform float2 resolution;\nfloat x;");
    }

    #[test]
    fn test_neutralize_mid_line_uses_block_comment() {
        let out = neutralize_builtin_redeclarations("float x; uniform float time; float y;");
        assert_eq!(out, "float x; /* [Built-in] uniform float time; */ float y;");
    }

    #[test]
    fn test_neutralize_aliases_and_multiline() {
        let out = neutralize_builtin_redeclarations("uniform vec2\n  iMouse;\nfloat y;");
        assert_eq!(out, "/* [Built-in] uniform float2 iMouse; */\n\nfloat y;");
        assert_eq!(out.matches('\n').count(), 2);
    }

    #[test]
    fn test_neutralize_leaves_user_uniforms() {
        let source = "uniform float intensity;\n// uniform float time;";
        assert_eq!(neutralize_builtin_redeclarations(source), source);
    }

    #[test]
    fn test_single_active_resolution_after_assembly() {
        let assembled = assemble("uniform float2 resolution;\nfloat4 mainImage(float2 uv) { return float4(resolution, 0.0, 1.0); }");
        assert_eq!(active_declarations(&assembled, "resolution"), 1);
        assert!(body(&assembled).starts_with("// [Built-in] uniform float2 resolution;"));
    }

    #[test]
    fn test_default_document_assembly() {
        let assembled = assemble(DEFAULT_DOCUMENT);
        assert!(assembled.starts_with(PREAMBLE));
        assert_eq!(active_declarations(&assembled, "time"), 1);
        assert_eq!(active_declarations(&assembled, "resolution"), 1);
        assert!(assembled.contains("uniform float3 colorAccent;"));
        assert!(assembled.contains("uniform float intensity;"));
        assert_eq!(
            body(&assembled).lines().count(),
            DEFAULT_DOCUMENT.lines().count()
        );
    }

    #[test]
    fn test_double_assembly_is_detectable() {
        let once = assemble(DEFAULT_DOCUMENT);
        let twice = assemble(&once);
        assert_ne!(once, twice);
        assert_eq!(twice.matches(PARAMS_MARKER).count(), 2);
    }

    proptest! {
        #[test]
        fn prop_plain_text_passes_through(source in "[a-tv-z0-9 ;(){}.,+*\n]*") {
            let assembled = assemble(&source);
            prop_assert!(assembled.starts_with(PREAMBLE));
            prop_assert_eq!(body(&assembled), source.as_str());
        }
    }
}
