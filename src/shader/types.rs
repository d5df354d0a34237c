/// Uniform types the declaration grammar understands. HLSL and GLSL spellings
/// of the same type map to one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredType {
    Float,
    Float2,
    Float3,
    Float4,
    Int,
    UInt,
    Bool,
}

impl DeclaredType {
    pub fn parse(type_name: &str) -> Option<Self> {
        match type_name {
            "float" => Some(DeclaredType::Float),
            "float2" | "vec2" => Some(DeclaredType::Float2),
            "float3" | "vec3" => Some(DeclaredType::Float3),
            "float4" | "vec4" => Some(DeclaredType::Float4),
            "int" => Some(DeclaredType::Int),
            "uint" => Some(DeclaredType::UInt),
            "bool" => Some(DeclaredType::Bool),
            _ => None,
        }
    }

    /// Native GLSL spelling
    pub fn glsl_name(self) -> &'static str {
        match self {
            DeclaredType::Float => "float",
            DeclaredType::Float2 => "vec2",
            DeclaredType::Float3 => "vec3",
            DeclaredType::Float4 => "vec4",
            DeclaredType::Int => "int",
            DeclaredType::UInt => "uint",
            DeclaredType::Bool => "bool",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hlsl_and_glsl_spellings_agree() {
        assert_eq!(DeclaredType::parse("float3"), DeclaredType::parse("vec3"));
        assert_eq!(DeclaredType::parse("vec2"), Some(DeclaredType::Float2));
        assert_eq!(DeclaredType::parse("float4").map(DeclaredType::glsl_name), Some("vec4"));
    }

    #[test]
    fn test_unknown_types() {
        assert_eq!(DeclaredType::parse("sampler2D"), None);
        assert_eq!(DeclaredType::parse("half"), None);
    }
}
