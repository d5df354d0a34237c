/// Uniforms supplied by the rendering host every frame. Users may declare them
/// for readability, but they never become editable parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltIn {
    Time,
    Resolution,
    Mouse,
}

impl BuiltIn {
    pub const ALL: [BuiltIn; 3] = [BuiltIn::Time, BuiltIn::Resolution, BuiltIn::Mouse];

    pub fn name(self) -> &'static str {
        match self {
            BuiltIn::Time => "time",
            BuiltIn::Resolution => "resolution",
            BuiltIn::Mouse => "mouse",
        }
    }

    /// Shadertoy-style engine-prefixed alias
    pub fn alias(self) -> &'static str {
        match self {
            BuiltIn::Time => "iTime",
            BuiltIn::Resolution => "iResolution",
            BuiltIn::Mouse => "iMouse",
        }
    }

    /// Type as written in the HLSL-flavored dialect
    pub fn declared_type(self) -> &'static str {
        match self {
            BuiltIn::Time => "float",
            BuiltIn::Resolution | BuiltIn::Mouse => "float2",
        }
    }

    pub fn lookup(name: &str) -> Option<BuiltIn> {
        Self::ALL
            .into_iter()
            .find(|b| b.name() == name || b.alias() == name)
    }
}

pub fn is_reserved(name: &str) -> bool {
    BuiltIn::lookup(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_names_and_aliases() {
        for name in ["time", "resolution", "mouse", "iTime", "iResolution", "iMouse"] {
            assert!(is_reserved(name), "{name} should be reserved");
        }
        assert!(!is_reserved("Time"));
        assert!(!is_reserved("intensity"));
    }

    #[test]
    fn test_lookup_maps_alias_to_builtin() {
        assert_eq!(BuiltIn::lookup("iMouse"), Some(BuiltIn::Mouse));
        assert_eq!(BuiltIn::lookup("resolution"), Some(BuiltIn::Resolution));
    }
}
