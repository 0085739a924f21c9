//! Tokens for the declarative `Package.swift` subset.

use std::ops::Range;

use logos::Logos;

/// The kind of token produced by the lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
pub enum TokenKind {
    #[token("import")]
    Import,
    #[token("let")]
    Let,
    #[token("var")]
    Var,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("nil")]
    Nil,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    Str,

    #[regex(r"[0-9]+(\.[0-9]+)*")]
    Number,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token("=")]
    Assign,
    #[token("..<")]
    HalfOpenRange,
    #[token("...")]
    ClosedRange,
}

impl TokenKind {
    /// Human-readable name for error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Import => "`import`",
            TokenKind::Let => "`let`",
            TokenKind::Var => "`var`",
            TokenKind::True | TokenKind::False => "boolean",
            TokenKind::Nil => "`nil`",
            TokenKind::Str => "string literal",
            TokenKind::Number => "number",
            TokenKind::Ident => "identifier",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::Comma => "`,`",
            TokenKind::Colon => "`:`",
            TokenKind::Dot => "`.`",
            TokenKind::Assign => "`=`",
            TokenKind::HalfOpenRange => "`..<`",
            TokenKind::ClosedRange => "`...`",
        }
    }
}

/// A token with its kind, byte span, and source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub span: Range<usize>,
    pub text: &'src str,
}

/// A character sequence the lexer does not recognize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub span: Range<usize>,
    pub text: String,
}

/// Split source text into tokens, skipping whitespace and comments.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, LexError> {
    let mut lexer = TokenKind::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(kind) => tokens.push(Token {
                kind,
                span: lexer.span(),
                text: lexer.slice(),
            }),
            Err(()) => {
                return Err(LexError {
                    span: lexer.span(),
                    text: lexer.slice().to_string(),
                })
            }
        }
    }

    Ok(tokens)
}

/// Decode the contents of a string literal token (quotes included).
pub fn unescape(literal: &str) -> Option<String> {
    let inner = literal.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            '\\' => out.push('\\'),
            'u' => {
                if chars.next()? != '{' {
                    return None;
                }
                let hex: String = chars.by_ref().take_while(|c| *c != '}').collect();
                let code = u32::from_str_radix(&hex, 16).ok()?;
                out.push(char::from_u32(code)?);
            }
            _ => return None,
        }
    }

    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize_member_call() {
        assert_eq!(
            kinds(r#".iOS("12.0"),"#),
            vec![
                TokenKind::Dot,
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::Str,
                TokenKind::RParen,
                TokenKind::Comma,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let src = "// swift-tools-version: 5.9\n/* block\n comment */ import PackageDescription";
        assert_eq!(kinds(src), vec![TokenKind::Import, TokenKind::Ident]);
    }

    #[test]
    fn test_keywords_and_ranges() {
        assert_eq!(
            kinds(r#"let package "1.0.0"..<"2.0.0""#),
            vec![
                TokenKind::Let,
                TokenKind::Ident,
                TokenKind::Str,
                TokenKind::HalfOpenRange,
                TokenKind::Str,
            ]
        );
        assert_eq!(kinds("letter"), vec![TokenKind::Ident]);
    }

    #[test]
    fn test_unknown_character() {
        let err = tokenize("name: @").unwrap_err();
        assert_eq!(err.span, 6..7);
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r#""a\"b""#).as_deref(), Some("a\"b"));
        assert_eq!(unescape(r#""\u{41}""#).as_deref(), Some("A"));
        assert_eq!(unescape(r#""bad\q""#), None);
    }
}
