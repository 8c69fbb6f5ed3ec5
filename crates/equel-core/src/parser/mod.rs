//! Query parser.
//!
//! A hand-written recursive descent parser. Every rule pulls tokens through
//! a rollback-capable lookahead cursor; rules whose alternatives share an
//! unbounded prefix are resolved by ordered trial parsing.

mod condition;
mod cursor;
mod error;
mod expression;
mod parser;

pub use cursor::{Mark, TokenCursor};
pub use error::{Expected, ParseError, ParseFailure};
pub use parser::Parser;

use crate::ast::Query;
use crate::lexer::Span;

/// A successfully parsed statement plus the source span it consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuery {
    /// The root of the statement.
    pub query: Query,
    /// The span of the consumed source text.
    pub span: Span,
}

/// Parses a single statement.
///
/// On failure the returned [`ParseFailure`] carries the first unrecoverable
/// error (position, expected token set, found token) and a best-effort
/// partial tree produced by a single resynchronization attempt.
///
/// # Errors
///
/// Returns a [`ParseFailure`] if the input is not a valid statement.
pub fn parse(input: &str) -> Result<ParsedQuery, ParseFailure> {
    let mut parser = Parser::new(input);
    let start = parser.cursor.peek_token(0).span.start;

    let outcome = parser
        .parse_statement()
        .and_then(|query| parser.expect_eof().map(|()| query));

    match outcome {
        Ok(query) => {
            let end = parser.cursor.consumed_end();
            Ok(ParsedQuery {
                query,
                span: Span::new(start, end),
            })
        }
        Err(error) => {
            let partial = Parser::new(input).parse_partial();
            Err(ParseFailure { error, partial })
        }
    }
}
