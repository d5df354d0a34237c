use super::builtins::is_reserved;
use super::declarations::scan_uniform_declarations;
use super::lexer::{tokenize, Token, TokenKind};
use super::params::{ParamValue, ParameterDescriptor, SemanticType};
use super::types::DeclaredType;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    /// Seed defaults from literal initializers (`uniform float speed = 2.0;`)
    /// instead of the fixed per-type table.
    pub seed_from_initializer: bool,
}

/// Collect editable parameters from the uniform declarations in `source`.
pub fn extract(source: &str, options: &ExtractOptions) -> Vec<ParameterDescriptor> {
    let mut descriptors: Vec<ParameterDescriptor> = Vec::new();

    for declaration in scan_uniform_declarations(source) {
        if is_reserved(declaration.name) {
            continue;
        }
        let Some(declared) = DeclaredType::parse(declaration.type_name) else {
            continue;
        };
        let Some(semantic_type) = semantic_type_for(declared, declaration.name) else {
            continue;
        };

        let mut descriptor = ParameterDescriptor::with_default(declaration.name, semantic_type);
        if options.seed_from_initializer {
            if let Some(value) = declaration
                .initializer
                .and_then(|expr| parse_literal(expr, semantic_type))
            {
                descriptor.seed(value);
            }
        }

        // Later declarations win but keep the list position of the first one
        match descriptors.iter_mut().find(|d| d.name == descriptor.name) {
            Some(existing) => *existing = descriptor,
            None => descriptors.push(descriptor),
        }
    }

    descriptors
}

fn semantic_type_for(declared: DeclaredType, name: &str) -> Option<SemanticType> {
    match declared {
        DeclaredType::Float => Some(SemanticType::Scalar),
        DeclaredType::Float2 => Some(SemanticType::Vector2),
        DeclaredType::Float3 if looks_like_color(name) => Some(SemanticType::Color),
        DeclaredType::Float3 => Some(SemanticType::Vector3),
        // Host-bound, but no control exists for these yet
        DeclaredType::Float4 | DeclaredType::Int | DeclaredType::UInt | DeclaredType::Bool => None,
    }
}

fn looks_like_color(name: &str) -> bool {
    // "col" also covers "color"
    name.to_lowercase().contains("col")
}

// AIDEV-NOTE: Accepts a bare number or a constructor of numeric literals whose
// arity matches the parameter (or a single splatted component).
fn parse_literal(expr: &str, semantic_type: SemanticType) -> Option<ParamValue> {
    let tokens = tokenize(expr);
    let text = |i: usize| tokens.get(i).map(|t| t.text(expr));

    let components: Vec<f32> = if tokens.first()?.kind == TokenKind::Ident {
        let constructor = DeclaredType::parse(text(0)?)?;
        if !tokens.get(1)?.is_punct('(') || !tokens.last()?.is_punct(')') {
            return None;
        }
        let expected = match constructor {
            DeclaredType::Float2 => SemanticType::Vector2,
            DeclaredType::Float3 if semantic_type == SemanticType::Color => SemanticType::Color,
            DeclaredType::Float3 => SemanticType::Vector3,
            _ => return None,
        };
        if expected != semantic_type {
            return None;
        }
        parse_number_list(expr, &tokens[2..tokens.len() - 1])?
    } else {
        parse_number_list(expr, &tokens)?
    };

    let arity = match semantic_type {
        SemanticType::Scalar => 1,
        SemanticType::Vector2 => 2,
        SemanticType::Vector3 | SemanticType::Color => 3,
        SemanticType::Boolean => return None,
    };
    let component = |i: usize| {
        if components.len() == 1 {
            components[0]
        } else {
            components[i]
        }
    };
    if components.len() != 1 && components.len() != arity {
        return None;
    }

    match semantic_type {
        SemanticType::Scalar if components.len() == 1 => Some(ParamValue::Scalar(components[0])),
        SemanticType::Scalar => None,
        SemanticType::Vector2 => Some(ParamValue::Vector2([component(0), component(1)])),
        SemanticType::Vector3 | SemanticType::Color => Some(ParamValue::Vector3([
            component(0),
            component(1),
            component(2),
        ])),
        SemanticType::Boolean => None,
    }
}

/// `1.0, -2, .5f` → [1.0, -2.0, 0.5]
fn parse_number_list(expr: &str, tokens: &[Token]) -> Option<Vec<f32>> {
    let mut values = Vec::new();
    let mut negative = false;
    let mut expect_value = true;

    for token in tokens {
        match token.kind {
            TokenKind::Punct('-') if expect_value && !negative => negative = true,
            TokenKind::Punct('+') if expect_value && !negative => {}
            TokenKind::Number if expect_value => {
                let raw = token.text(expr).trim_end_matches(['f', 'F']);
                let value: f32 = raw.parse().ok()?;
                values.push(if negative { -value } else { value });
                negative = false;
                expect_value = false;
            }
            TokenKind::Punct(',') if !expect_value => expect_value = true,
            _ => return None,
        }
    }

    if expect_value || values.is_empty() {
        return None;
    }
    Some(values)
}
