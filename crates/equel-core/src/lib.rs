//! # equel-core
//!
//! A front end for an entity query language: a JPQL-like dialect with
//! SELECT/UPDATE/DELETE statements, joins, subqueries, aggregate and scalar
//! expressions, CASE/COALESCE/NULLIF, extension functions, and custom macros
//! for enum and date-range comparisons.
//!
//! This crate provides:
//! - A hand-written lexer producing typed tokens with byte-offset spans
//! - A recursive descent parser with a rollback-capable lookahead cursor and
//!   ordered trial-parse disambiguation
//! - A typed AST built bottom-up in a single pass, plus a canonical
//!   unparser and a tree-walking visitor interface
//!
//! The parser only recognizes syntax and builds a faithful structural
//! representation: it does not execute queries, resolve names against a
//! schema, or normalize the tree.
//!
//! ## Parsing
//!
//! ```rust
//! use equel_core::ast::QueryBody;
//!
//! let parsed = equel_core::parse("SELECT e FROM Customer e WHERE e.active = TRUE")
//!     .expect("valid query");
//! assert!(matches!(parsed.query.body, QueryBody::Select(_)));
//! ```
//!
//! ## Diagnostics
//!
//! Failures are ordinary return values carrying the failure position, the
//! set of acceptable token kinds, and the token actually found:
//!
//! ```rust
//! let failure = equel_core::parse("SELECT FROM Customer e").unwrap_err();
//! assert_eq!(failure.error.span.start, 7);
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod unparse;
pub mod visit;

pub use ast::{Condition, Expr, Query};
pub use lexer::{Keyword, Lexer, MacroKind, Span, Token, TokenKind};
pub use parser::{parse, Expected, ParseError, ParseFailure, ParsedQuery, Parser};
pub use unparse::canonical;
pub use visit::{walk, NodeRef, Visitor};
