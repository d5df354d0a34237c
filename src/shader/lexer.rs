use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    Ident,
    Number,
    Punct(char),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.clone()]
    }

    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct(c)
    }
}

// AIDEV-NOTE: Minimal shader tokenizer. Comments, string literals and preprocessor
// lines produce no tokens, so declarations inside them are never matched.
pub fn tokenize(source: &str) -> Vec<Token> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    let mut line_start = true;

    while i < bytes.len() {
        let b = bytes[i];

        if b == b'\n' {
            line_start = true;
            i += 1;
            continue;
        }
        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        // Preprocessor directive: skip to end of line, honoring `\` continuations
        if b == b'#' && line_start {
            i = skip_directive(bytes, i);
            continue;
        }
        line_start = false;

        if b == b'/' && bytes.get(i + 1) == Some(&b'/') {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }
        if b == b'/' && bytes.get(i + 1) == Some(&b'*') {
            i = skip_block_comment(bytes, i + 2);
            continue;
        }
        if b == b'"' {
            i = skip_string(bytes, i + 1);
            continue;
        }

        let start = i;
        if b == b'_' || b.is_ascii_alphabetic() {
            while i < bytes.len() && (bytes[i] == b'_' || bytes[i].is_ascii_alphanumeric()) {
                i += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Ident,
                span: start..i,
            });
        } else if b.is_ascii_digit()
            || (b == b'.' && bytes.get(i + 1).is_some_and(|n| n.is_ascii_digit()))
        {
            i = scan_number(bytes, i);
            tokens.push(Token {
                kind: TokenKind::Number,
                span: start..i,
            });
        } else {
            // Multi-byte characters become a single punctuation token
            let c = source[i..].chars().next().unwrap_or('\u{FFFD}');
            i += c.len_utf8();
            tokens.push(Token {
                kind: TokenKind::Punct(c),
                span: start..i,
            });
        }
    }

    tokens
}

fn skip_directive(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if bytes.get(i + 1) == Some(&b'\n') => i += 2,
            b'\\' if bytes.get(i + 1) == Some(&b'\r') && bytes.get(i + 2) == Some(&b'\n') => {
                i += 3
            }
            b'\n' => break,
            _ => i += 1,
        }
    }
    i
}

fn skip_block_comment(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() {
        if bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/') {
            return i + 2;
        }
        i += 1;
    }
    // Unterminated comment runs to end of input
    bytes.len()
}

fn skip_string(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return i + 1,
            b'\n' => return i,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn scan_number(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() {
        let b = bytes[i];
        let exponent_sign = (b == b'+' || b == b'-')
            && i > 0
            && matches!(bytes[i - 1], b'e' | b'E')
            && !is_hex_prefix(bytes, i);
        if b.is_ascii_alphanumeric() || b == b'.' || exponent_sign {
            i += 1;
        } else {
            break;
        }
    }
    i
}

fn is_hex_prefix(bytes: &[u8], end: usize) -> bool {
    // Walk back to the start of the literal and check for 0x
    let mut start = end;
    while start > 0 && (bytes[start - 1].is_ascii_alphanumeric() || bytes[start - 1] == b'.') {
        start -= 1;
    }
    bytes[start..end].starts_with(b"0x") || bytes[start..end].starts_with(b"0X")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(source: &str) -> Vec<&str> {
        tokenize(source).iter().map(|t| t.text(source)).collect()
    }

    #[test]
    fn test_tokenize_declaration() {
        assert_eq!(
            texts("uniform float speed = 1.5;"),
            vec!["uniform", "float", "speed", "=", "1.5", ";"]
        );
    }

    #[test]
    fn test_comments_produce_no_tokens() {
        let source = "// uniform float a;\n/* uniform float b; */ x";
        assert_eq!(texts(source), vec!["x"]);
    }

    #[test]
    fn test_unterminated_block_comment_swallows_rest() {
        assert_eq!(texts("a /* uniform float b;"), vec!["a"]);
    }

    #[test]
    fn test_preprocessor_lines_are_skipped() {
        let source = "#define float2 vec2\n#define LONG a \\\n b\nfloat x;";
        assert_eq!(texts(source), vec!["float", "x", ";"]);
    }

    #[test]
    fn test_hash_mid_line_is_punctuation() {
        assert_eq!(texts("a # b"), vec!["a", "#", "b"]);
    }

    #[test]
    fn test_string_literal_skipped() {
        assert_eq!(texts(r#"x "uniform float y;" z"#), vec!["x", "z"]);
    }

    #[test]
    fn test_number_forms() {
        assert_eq!(texts("1.0e-3 .5 2u 0x1F 3.0f"), vec!["1.0e-3", ".5", "2u", "0x1F", "3.0f"]);
        assert_eq!(texts("1-2"), vec!["1", "-", "2"]);
    }

    #[test]
    fn test_spans_index_into_source() {
        let source = "  float3 col;";
        let tokens = tokenize(source);
        assert_eq!(tokens[1].span, 9..12);
        assert_eq!(tokens[1].kind, TokenKind::Ident);
        assert!(tokens[2].is_punct(';'));
    }
}
