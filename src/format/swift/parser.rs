//! Expression parser for the declarative `Package.swift` subset.
//!
//! Grammar:
//!
//! ```text
//! file     := stmt* EOF
//! stmt     := "import" IDENT | ("let" | "var") IDENT "=" expr
//! expr     := primary (("..<" | "...") primary)?
//! primary  := STRING | NUMBER | "true" | "false" | "nil"
//!           | "[" (expr ("," expr)* ","?)? "]"
//!           | "." IDENT call?
//!           | IDENT call?
//! call     := "(" (arg ("," arg)* ","?)? ")"
//! arg      := (IDENT ":")? expr
//! ```

use std::ops::Range;

use crate::format::swift::lexer::{self, Token, TokenKind};

/// A parse error with the span of the offending token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub span: Range<usize>,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, span: Range<usize>) -> Self {
        SyntaxError {
            message: message.into(),
            span,
        }
    }
}

/// An expression in the manifest.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Str {
        value: String,
        span: Range<usize>,
    },
    Number {
        text: String,
        span: Range<usize>,
    },
    Bool {
        value: bool,
        span: Range<usize>,
    },
    Nil {
        span: Range<usize>,
    },
    Array {
        items: Vec<Expr>,
        span: Range<usize>,
    },
    /// `.name` or `.name(args)`
    Member {
        name: String,
        args: Option<Vec<Arg>>,
        span: Range<usize>,
    },
    /// `Name` or `Name(args)`
    Ident {
        name: String,
        args: Option<Vec<Arg>>,
        span: Range<usize>,
    },
    /// `lower..<upper` or `lower...upper`
    Range {
        lower: Box<Expr>,
        upper: Box<Expr>,
        closed: bool,
        span: Range<usize>,
    },
}

impl Expr {
    pub fn span(&self) -> Range<usize> {
        match self {
            Expr::Str { span, .. }
            | Expr::Number { span, .. }
            | Expr::Bool { span, .. }
            | Expr::Nil { span }
            | Expr::Array { span, .. }
            | Expr::Member { span, .. }
            | Expr::Ident { span, .. }
            | Expr::Range { span, .. } => span.clone(),
        }
    }

    /// Short description for "expected X, found Y" messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Expr::Str { .. } => "a string",
            Expr::Number { .. } => "a number",
            Expr::Bool { .. } => "a boolean",
            Expr::Nil { .. } => "`nil`",
            Expr::Array { .. } => "an array",
            Expr::Member { .. } => "a member expression",
            Expr::Ident { .. } => "an identifier",
            Expr::Range { .. } => "a range",
        }
    }
}

/// A call argument, optionally labelled.
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub label: Option<String>,
    pub value: Expr,
    pub span: Range<usize>,
}

/// A top-level statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Import {
        module: String,
        span: Range<usize>,
    },
    Binding {
        name: String,
        value: Expr,
        span: Range<usize>,
    },
}

/// Parse the whole file into statements.
pub fn parse_file(source: &str) -> Result<Vec<Stmt>, SyntaxError> {
    let tokens = lexer::tokenize(source).map_err(|e| {
        SyntaxError::new(format!("unexpected input `{}`", e.text), e.span)
    })?;

    let mut parser = Parser {
        tokens,
        pos: 0,
        len: source.len(),
        depth: 0,
    };

    let mut stmts = Vec::new();
    while !parser.at_end() {
        stmts.push(parser.stmt()?);
    }
    Ok(stmts)
}

/// Deepest expression nesting accepted. Manifests nest a handful of levels.
const MAX_NESTING: usize = 256;

struct Parser<'src> {
    tokens: Vec<Token<'src>>,
    pos: usize,
    len: usize,
    /// Current expression nesting
    depth: usize,
}

impl<'src> Parser<'src> {
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token<'src>> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn peek_nth_kind(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    fn eof_span(&self) -> Range<usize> {
        self.len..self.len
    }

    fn bump(&mut self) -> Option<Token<'src>> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token<'src>, SyntaxError> {
        match self.tokens.get(self.pos).cloned() {
            Some(tok) if tok.kind == kind => {
                self.pos += 1;
                Ok(tok)
            }
            Some(tok) => Err(SyntaxError::new(
                format!("expected {}, found {}", kind.describe(), tok.kind.describe()),
                tok.span.clone(),
            )),
            None => Err(SyntaxError::new(
                format!("expected {}, found end of file", kind.describe()),
                self.eof_span(),
            )),
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek_kind() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let Some(tok) = self.bump() else {
            return Err(SyntaxError::new("unexpected end of file", self.eof_span()));
        };

        match tok.kind {
            TokenKind::Import => {
                let module = self.expect(TokenKind::Ident)?;
                Ok(Stmt::Import {
                    module: module.text.to_string(),
                    span: tok.span.start..module.span.end,
                })
            }
            TokenKind::Let | TokenKind::Var => {
                let name = self.expect(TokenKind::Ident)?;
                self.expect(TokenKind::Assign)?;
                let value = self.expr()?;
                let end = value.span().end;
                Ok(Stmt::Binding {
                    name: name.text.to_string(),
                    value,
                    span: tok.span.start..end,
                })
            }
            other => Err(SyntaxError::new(
                format!(
                    "expected `import` or `let`, found {}; only declarative manifests are supported",
                    other.describe()
                ),
                tok.span,
            )),
        }
    }

    fn expr(&mut self) -> Result<Expr, SyntaxError> {
        if self.depth == MAX_NESTING {
            let span = self
                .peek()
                .map(|t| t.span.clone())
                .unwrap_or_else(|| self.eof_span());
            return Err(SyntaxError::new(
                format!("expression nested more than {} levels deep", MAX_NESTING),
                span,
            ));
        }

        self.depth += 1;
        let expr = self.range_expr();
        self.depth -= 1;
        expr
    }

    fn range_expr(&mut self) -> Result<Expr, SyntaxError> {
        let lower = self.primary()?;

        let closed = match self.peek_kind() {
            Some(TokenKind::HalfOpenRange) => false,
            Some(TokenKind::ClosedRange) => true,
            _ => return Ok(lower),
        };
        self.pos += 1;

        let upper = self.primary()?;
        let span = lower.span().start..upper.span().end;
        Ok(Expr::Range {
            lower: Box::new(lower),
            upper: Box::new(upper),
            closed,
            span,
        })
    }

    fn primary(&mut self) -> Result<Expr, SyntaxError> {
        let Some(tok) = self.bump() else {
            return Err(SyntaxError::new(
                "expected an expression, found end of file",
                self.eof_span(),
            ));
        };

        match tok.kind {
            TokenKind::Str => {
                let value = lexer::unescape(tok.text).ok_or_else(|| {
                    SyntaxError::new("invalid escape sequence in string", tok.span.clone())
                })?;
                Ok(Expr::Str {
                    value,
                    span: tok.span,
                })
            }
            TokenKind::Number => Ok(Expr::Number {
                text: tok.text.to_string(),
                span: tok.span,
            }),
            TokenKind::True | TokenKind::False => Ok(Expr::Bool {
                value: tok.kind == TokenKind::True,
                span: tok.span,
            }),
            TokenKind::Nil => Ok(Expr::Nil { span: tok.span }),
            TokenKind::LBracket => self.array(tok.span.start),
            TokenKind::Dot => {
                let name = self.expect(TokenKind::Ident)?;
                let (args, end) = self.call_suffix(name.span.end)?;
                Ok(Expr::Member {
                    name: name.text.to_string(),
                    args,
                    span: tok.span.start..end,
                })
            }
            TokenKind::Ident => {
                let (args, end) = self.call_suffix(tok.span.end)?;
                Ok(Expr::Ident {
                    name: tok.text.to_string(),
                    args,
                    span: tok.span.start..end,
                })
            }
            other => Err(SyntaxError::new(
                format!("expected an expression, found {}", other.describe()),
                tok.span,
            )),
        }
    }

    fn array(&mut self, start: usize) -> Result<Expr, SyntaxError> {
        let mut items = Vec::new();
        loop {
            if let Some(tok) = self.peek() {
                if tok.kind == TokenKind::RBracket {
                    let end = tok.span.end;
                    self.pos += 1;
                    return Ok(Expr::Array {
                        items,
                        span: start..end,
                    });
                }
            }

            items.push(self.expr()?);

            if !self.eat(TokenKind::Comma) {
                let close = self.expect(TokenKind::RBracket)?;
                return Ok(Expr::Array {
                    items,
                    span: start..close.span.end,
                });
            }
        }
    }

    /// Parse `(args)` if present. Returns the arguments and the end offset.
    fn call_suffix(&mut self, end: usize) -> Result<(Option<Vec<Arg>>, usize), SyntaxError> {
        if !self.eat(TokenKind::LParen) {
            return Ok((None, end));
        }

        let mut args = Vec::new();
        loop {
            if let Some(tok) = self.peek() {
                if tok.kind == TokenKind::RParen {
                    let end = tok.span.end;
                    self.pos += 1;
                    return Ok((Some(args), end));
                }
            }

            args.push(self.arg()?);

            if !self.eat(TokenKind::Comma) {
                let close = self.expect(TokenKind::RParen)?;
                return Ok((Some(args), close.span.end));
            }
        }
    }

    fn arg(&mut self) -> Result<Arg, SyntaxError> {
        let labelled = self.peek_kind() == Some(TokenKind::Ident)
            && self.peek_nth_kind(1) == Some(TokenKind::Colon);

        if labelled {
            let label = self.expect(TokenKind::Ident)?;
            self.expect(TokenKind::Colon)?;
            let value = self.expr()?;
            let span = label.span.start..value.span().end;
            Ok(Arg {
                label: Some(label.text.to_string()),
                value,
                span,
            })
        } else {
            let value = self.expr()?;
            let span = value.span();
            Ok(Arg {
                label: None,
                value,
                span,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_binding(src: &str) -> Expr {
        let stmts = parse_file(src).unwrap();
        match stmts.into_iter().next().unwrap() {
            Stmt::Binding { value, .. } => value,
            other => panic!("expected binding, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_call_with_labels_and_trailing_comma() {
        let expr = single_binding(r#"let p = Package(name: "x", platforms: [.iOS("12.0"),],)"#);
        match expr {
            Expr::Ident { name, args, .. } => {
                assert_eq!(name, "Package");
                let args = args.unwrap();
                assert_eq!(args.len(), 2);
                assert_eq!(args[0].label.as_deref(), Some("name"));
                match &args[1].value {
                    Expr::Array { items, .. } => assert_eq!(items.len(), 1),
                    other => panic!("expected array, got {other:?}"),
                }
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_member_without_args_and_range() {
        let expr = single_binding(r#"let x = [.v12, "1.0.0"..<"2.0.0"]"#);
        let Expr::Array { items, .. } = expr else {
            panic!("expected array");
        };
        assert!(matches!(&items[0], Expr::Member { name, args: None, .. } if name == "v12"));
        assert!(matches!(&items[1], Expr::Range { closed: false, .. }));
    }

    #[test]
    fn test_imports() {
        let stmts = parse_file("import PackageDescription\nimport Foundation").unwrap();
        assert_eq!(stmts.len(), 2);
    }

    #[test]
    fn test_rejects_imperative_code() {
        let err = parse_file("package.targets.append(x)").unwrap_err();
        assert!(err.message.contains("only declarative manifests"));
        assert_eq!(err.span, 0..7);
    }

    #[test]
    fn test_unclosed_call_reports_eof() {
        let src = r#"let p = Package(name: "x""#;
        let err = parse_file(src).unwrap_err();
        assert!(err.message.contains("end of file"));
        assert_eq!(err.span, src.len()..src.len());
    }

    #[test]
    fn test_deep_nesting_is_an_error() {
        let src = format!("let x = {}", "[".repeat(5000));
        let err = parse_file(&src).unwrap_err();
        assert!(err.message.contains("nested more than 256 levels"));
        assert_eq!(err.span.start, "let x = ".len() + MAX_NESTING);

        let calls = format!("let x = {}", ".f(".repeat(5000));
        assert!(parse_file(&calls).unwrap_err().message.contains("nested"));
    }

    #[test]
    fn test_nesting_below_limit_parses() {
        let src = format!("let x = {}{}", "[".repeat(200), "]".repeat(200));
        assert!(matches!(single_binding(&src), Expr::Array { .. }));
    }
}
