use std::ops::Range;

use super::lexer::{tokenize, Token, TokenKind};

/// A `uniform TYPE NAME [= EXPR];` statement found in shader source.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformDeclaration<'a> {
    /// Byte range from the `uniform` keyword through the terminating `;`
    pub span: Range<usize>,
    pub type_name: &'a str,
    pub name: &'a str,
    /// Initializer expression text, without the `=` and `;`
    pub initializer: Option<&'a str>,
}

impl<'a> UniformDeclaration<'a> {
    pub fn text(&self, source: &'a str) -> &'a str {
        &source[self.span.clone()]
    }
}

// AIDEV-NOTE: Shared by the extractor, the assembler's built-in neutralization and
// the host's parameter lowering so all three agree on what counts as a declaration.
pub fn scan_uniform_declarations(source: &str) -> Vec<UniformDeclaration<'_>> {
    let tokens = tokenize(source);
    let mut declarations = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        match match_declaration(source, &tokens, i) {
            Some((declaration, next)) => {
                declarations.push(declaration);
                i = next;
            }
            None => i += 1,
        }
    }

    declarations
}

fn match_declaration<'a>(
    source: &'a str,
    tokens: &[Token],
    start: usize,
) -> Option<(UniformDeclaration<'a>, usize)> {
    let keyword = &tokens[start];
    if keyword.kind != TokenKind::Ident || keyword.text(source) != "uniform" {
        return None;
    }

    let type_token = tokens.get(start + 1).filter(|t| t.kind == TokenKind::Ident)?;
    let name_token = tokens.get(start + 2).filter(|t| t.kind == TokenKind::Ident)?;
    let after_name = tokens.get(start + 3)?;

    let (initializer, end_index) = if after_name.is_punct(';') {
        (None, start + 3)
    } else if after_name.is_punct('=') {
        let semicolon = (start + 4..tokens.len()).find(|&j| tokens[j].is_punct(';'))?;
        if semicolon == start + 4 {
            // `uniform float x = ;`
            return None;
        }
        let expr = tokens[start + 4].span.start..tokens[semicolon - 1].span.end;
        (Some(source[expr].trim()), semicolon)
    } else {
        return None;
    };

    let declaration = UniformDeclaration {
        span: keyword.span.start..tokens[end_index].span.end,
        type_name: type_token.text(source),
        name: name_token.text(source),
        initializer,
    };
    Some((declaration, end_index + 1))
}
