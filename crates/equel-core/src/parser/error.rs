//! Parser error types.

use crate::ast::Query;
use crate::lexer::{Keyword, MacroKind, Span, TokenKind};

/// A token class a failed rule would have accepted at the failure point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    /// A specific keyword.
    Keyword(Keyword),
    /// A specific macro keyword.
    Macro(MacroKind),
    /// Any identifier.
    Identifier,
    /// A string literal.
    StringLiteral,
    /// A numeric literal.
    NumberLiteral,
    /// Any parameter form (`?N`, `:name`, `${name}`).
    Parameter,
    /// A specific operator or punctuation symbol.
    Symbol(&'static str),
    /// End of input.
    EndOfInput,
}

impl Expected {
    /// Derives the expected class for a concrete token kind.
    #[must_use]
    pub fn from_kind(kind: &TokenKind) -> Self {
        match kind {
            TokenKind::Keyword(kw) => Self::Keyword(*kw),
            TokenKind::Macro(m) => Self::Macro(*m),
            TokenKind::Identifier(_) => Self::Identifier,
            TokenKind::String(_) => Self::StringLiteral,
            TokenKind::Integer(_) | TokenKind::Float(_) => Self::NumberLiteral,
            TokenKind::PositionalParam(_)
            | TokenKind::NamedParam(_)
            | TokenKind::ContextParam(_) => Self::Parameter,
            TokenKind::Eq => Self::Symbol("="),
            TokenKind::NotEq => Self::Symbol("<>"),
            TokenKind::Lt => Self::Symbol("<"),
            TokenKind::LtEq => Self::Symbol("<="),
            TokenKind::Gt => Self::Symbol(">"),
            TokenKind::GtEq => Self::Symbol(">="),
            TokenKind::Plus => Self::Symbol("+"),
            TokenKind::Minus => Self::Symbol("-"),
            TokenKind::Star => Self::Symbol("*"),
            TokenKind::Slash => Self::Symbol("/"),
            TokenKind::LeftParen => Self::Symbol("("),
            TokenKind::RightParen => Self::Symbol(")"),
            TokenKind::Comma => Self::Symbol(","),
            TokenKind::Dot => Self::Symbol("."),
            TokenKind::Eof | TokenKind::Error(_) => Self::EndOfInput,
        }
    }
}

impl core::fmt::Display for Expected {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Keyword(kw) => write!(f, "{}", kw.as_str()),
            Self::Macro(m) => write!(f, "{}", m.as_str()),
            Self::Identifier => write!(f, "identifier"),
            Self::StringLiteral => write!(f, "string"),
            Self::NumberLiteral => write!(f, "number"),
            Self::Parameter => write!(f, "parameter"),
            Self::Symbol(s) => write!(f, "'{s}'"),
            Self::EndOfInput => write!(f, "end of input"),
        }
    }
}

/// A parse error: the first unrecoverable mismatch, with the token set that
/// would have been accepted and the token actually found.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message} at position {span}")]
pub struct ParseError {
    /// The error message.
    pub message: String,
    /// The location of the error.
    pub span: Span,
    /// Token classes that would have been accepted at this position.
    pub expected: Vec<Expected>,
    /// The token kind actually found.
    pub found: TokenKind,
}

impl ParseError {
    /// Creates a new parse error with a preformatted message.
    #[must_use]
    pub fn new(message: impl Into<String>, span: Span, found: TokenKind) -> Self {
        Self {
            message: message.into(),
            span,
            expected: Vec::new(),
            found,
        }
    }

    /// Creates an "unexpected token" error from an expected set.
    #[must_use]
    pub fn unexpected(expected: Vec<Expected>, found: TokenKind, span: Span) -> Self {
        let message = format!(
            "Unexpected token: expected {}, found {}",
            render_expected(&expected),
            found.describe()
        );
        Self {
            message,
            span,
            expected,
            found,
        }
    }

    /// Merges the failures of every alternative of an ordered choice into a
    /// single error: the expected set is the union across alternatives and
    /// the position is the furthest any alternative reached.
    #[must_use]
    pub fn merge(failures: Vec<Self>) -> Self {
        let mut expected: Vec<Expected> = Vec::new();
        let mut span = Span::default();
        let mut found = TokenKind::Eof;
        for failure in &failures {
            for exp in &failure.expected {
                if !expected.contains(exp) {
                    expected.push(*exp);
                }
            }
            if failure.span.start >= span.start {
                span = failure.span;
                found = failure.found.clone();
            }
        }
        // A lexical error at the failure point keeps its own message.
        if let TokenKind::Error(message) = &found {
            return Self::new(format!("Lexical error: {message}"), span, found.clone());
        }
        Self::unexpected(expected, found, span)
    }

    /// Renders a caret-style diagnostic against the original source.
    #[must_use]
    pub fn render(&self, source: &str) -> String {
        let start = self.span.start.min(source.len());
        let line_start = source[..start].rfind('\n').map_or(0, |i| i + 1);
        let line_end = source[start..]
            .find('\n')
            .map_or(source.len(), |i| start + i);
        let line_no = source[..start].matches('\n').count() + 1;
        let column = start - line_start + 1;
        let line = &source[line_start..line_end];
        let caret_len = self.span.len().clamp(1, line_end.saturating_sub(start).max(1));

        let mut out = String::new();
        out.push_str(&format!("error: {}\n", self.message));
        out.push_str(&format!("  --> line {line_no}, column {column}\n"));
        out.push_str("   |\n");
        out.push_str(&format!("{line_no:>3}| {line}\n"));
        out.push_str(&format!(
            "   | {}{}\n",
            " ".repeat(column - 1),
            "^".repeat(caret_len)
        ));
        if !self.expected.is_empty() {
            out.push_str(&format!("   = expected {}\n", render_expected(&self.expected)));
        }
        out
    }
}

fn render_expected(expected: &[Expected]) -> String {
    match expected {
        [] => String::from("nothing"),
        [single] => single.to_string(),
        many => {
            let rendered: Vec<String> = many.iter().map(ToString::to_string).collect();
            format!("one of: {}", rendered.join(", "))
        }
    }
}

/// The failure value of a parse: the first error, plus a best-effort partial
/// tree produced after a single resynchronization attempt (for tooling).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{error}")]
pub struct ParseFailure {
    /// The first unrecoverable error.
    pub error: ParseError,
    /// A best-effort partial tree, when the statement head was recognizable.
    pub partial: Option<Query>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_message() {
        let err = ParseError::unexpected(
            vec![Expected::Keyword(Keyword::From)],
            TokenKind::Eof,
            Span::new(10, 10),
        );
        assert!(err.message.contains("FROM"));
        assert_eq!(err.expected, vec![Expected::Keyword(Keyword::From)]);
    }

    #[test]
    fn test_merge_unions_expected() {
        let a = ParseError::unexpected(
            vec![Expected::Identifier],
            TokenKind::Keyword(Keyword::From),
            Span::new(7, 11),
        );
        let b = ParseError::unexpected(
            vec![Expected::Keyword(Keyword::Case), Expected::Identifier],
            TokenKind::Keyword(Keyword::From),
            Span::new(7, 11),
        );
        let merged = ParseError::merge(vec![a, b]);
        assert_eq!(merged.span, Span::new(7, 11));
        assert!(merged.expected.contains(&Expected::Identifier));
        assert!(merged.expected.contains(&Expected::Keyword(Keyword::Case)));
        assert_eq!(merged.expected.len(), 2);
    }

    #[test]
    fn test_merge_keeps_furthest_failure() {
        let near = ParseError::unexpected(
            vec![Expected::Identifier],
            TokenKind::Comma,
            Span::new(3, 4),
        );
        let far = ParseError::unexpected(
            vec![Expected::Keyword(Keyword::And)],
            TokenKind::Eof,
            Span::new(20, 20),
        );
        let merged = ParseError::merge(vec![near, far]);
        assert_eq!(merged.span, Span::new(20, 20));
        assert_eq!(merged.found, TokenKind::Eof);
    }

    #[test]
    fn test_render_caret() {
        let err = ParseError::unexpected(
            vec![Expected::Identifier],
            TokenKind::Keyword(Keyword::From),
            Span::new(7, 11),
        );
        let rendered = err.render("SELECT FROM Customer e");
        assert!(rendered.contains("line 1, column 8"));
        assert!(rendered.contains("^^^^"));
        assert!(rendered.contains("SELECT FROM Customer e"));
    }
}
