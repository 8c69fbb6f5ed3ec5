//! Statement and clause parsing.
//!
//! One method per grammar production: each looks at enough tokens to choose
//! an alternative, consumes the expected tokens, recursively invokes
//! sub-rules, and builds the corresponding AST node on success. Rules that
//! cannot be chosen by bounded lookahead run their alternatives as trial
//! parses under a cursor checkpoint (see `condition.rs`).

use crate::ast::{
    Assignment, CollectionMember, Condition, DeleteQuery, Expr, GroupBy, Join, JoinKind, OrderBy,
    OrderDirection, OrderItem, Path, Query, QueryBody, RangeVariable, SelectClause, SelectQuery,
    SelectedItem, Source, UpdateQuery,
};
use crate::lexer::{Keyword, Span, Token, TokenKind};

use super::cursor::TokenCursor;
use super::error::{Expected, ParseError};

/// The query parser.
pub struct Parser<'a> {
    source: &'a str,
    pub(crate) cursor: TokenCursor<'a>,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given input.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self {
            source: input,
            cursor: TokenCursor::new(input),
        }
    }

    /// Parses a single statement.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the input is not a valid statement.
    pub fn parse_statement(&mut self) -> Result<Query, ParseError> {
        let kind = self.peek_kind(0);
        match kind {
            TokenKind::Keyword(Keyword::Select) => self.parse_select_query(),
            TokenKind::Keyword(Keyword::Update) => self.parse_update_query(),
            TokenKind::Keyword(Keyword::Delete) => self.parse_delete_query(),
            _ => Err(self.unexpected(vec![
                Expected::Keyword(Keyword::Select),
                Expected::Keyword(Keyword::Update),
                Expected::Keyword(Keyword::Delete),
            ])),
        }
    }

    /// Expects end of input after a statement.
    pub(crate) fn expect_eof(&mut self) -> Result<(), ParseError> {
        if self.cursor.current().is_eof() {
            Ok(())
        } else {
            Err(self.unexpected(vec![Expected::EndOfInput]))
        }
    }

    // --- SELECT ---

    /// Parses a SELECT statement, starting at the SELECT keyword.
    pub(crate) fn parse_select_query(&mut self) -> Result<Query, ParseError> {
        let keyword = self.expect_keyword(Keyword::Select)?;
        let distinct = self.eat_keyword(Keyword::Distinct);
        let items = self.parse_selected_items()?;
        self.expect_keyword(Keyword::From)?;
        let sources = self.parse_sources()?;
        let where_clause = self.parse_where_clause()?;
        let group_by = self.parse_group_by_clause()?;
        let having = self.parse_having_clause()?;
        let order_by = self.parse_order_by_clause()?;

        Ok(Query {
            body: QueryBody::Select(SelectQuery {
                select: SelectClause { distinct, items },
                sources,
                where_clause,
                group_by,
                having,
                order_by,
            }),
            span: keyword.span,
        })
    }

    /// Parses the comma-separated SELECT item list (at least one item).
    fn parse_selected_items(&mut self) -> Result<Vec<SelectedItem>, ParseError> {
        let mut items = vec![self.parse_selected_item()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            items.push(self.parse_selected_item()?);
        }
        Ok(items)
    }

    /// Parses one SELECT item: an expression with an optional alias.
    fn parse_selected_item(&mut self) -> Result<SelectedItem, ParseError> {
        let expr = if self.check_keyword(Keyword::New) {
            self.parse_constructor_expr()?
        } else {
            self.parse_scalar_expr()?
        };
        let alias = self.parse_optional_alias()?;
        Ok(SelectedItem { expr, alias })
    }

    /// Parses `NEW com.acme.Dto(args...)`.
    fn parse_constructor_expr(&mut self) -> Result<Expr, ParseError> {
        self.expect_keyword(Keyword::New)?;
        let (mut class, _) = self.expect_identifier()?;
        while self.check(&TokenKind::Dot) {
            self.advance();
            let (segment, _) = self.expect_name()?;
            class.push('.');
            class.push_str(&segment);
        }
        self.expect_kind(&TokenKind::LeftParen)?;
        let mut args = vec![self.parse_scalar_expr()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            args.push(self.parse_scalar_expr()?);
        }
        self.expect_kind(&TokenKind::RightParen)?;
        Ok(Expr::Constructor { class, args })
    }

    // --- FROM ---

    /// Parses the comma-separated FROM entries (at least one).
    fn parse_sources(&mut self) -> Result<Vec<Source>, ParseError> {
        let mut sources = vec![self.parse_source()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            sources.push(self.parse_source()?);
        }
        Ok(sources)
    }

    /// Parses one FROM entry.
    ///
    /// The leading IN keyword selects the collection-member form; no
    /// backtracking is needed here.
    fn parse_source(&mut self) -> Result<Source, ParseError> {
        if self.check_keyword(Keyword::In) {
            self.advance();
            self.expect_kind(&TokenKind::LeftParen)?;
            let path = self.parse_path()?;
            self.expect_kind(&TokenKind::RightParen)?;
            self.eat_keyword(Keyword::As);
            let (alias, _) = self.expect_identifier()?;
            return Ok(Source::Collection(CollectionMember { path, alias }));
        }

        let (entity, _) = self.expect_name()?;
        self.eat_keyword(Keyword::As);
        let (alias, _) = self.expect_identifier()?;
        let mut joins = Vec::new();
        while self.at_join_start() {
            joins.push(self.parse_join()?);
        }
        Ok(Source::Range(RangeVariable {
            entity,
            alias,
            joins,
        }))
    }

    /// Returns true if the current token can start a join.
    fn at_join_start(&mut self) -> bool {
        matches!(
            self.cursor.peek(0),
            TokenKind::Keyword(Keyword::Join | Keyword::Left | Keyword::Inner)
        )
    }

    /// Detects a FETCH join by peeking past the join-spec prefix.
    ///
    /// The offset of the FETCH candidate is fixed (1-3 tokens) and computed
    /// from the longest join-spec prefix (`LEFT OUTER JOIN`).
    fn join_has_fetch(&mut self) -> bool {
        let after_join = match self.peek_kind(0) {
            TokenKind::Keyword(Keyword::Join) => 1,
            TokenKind::Keyword(Keyword::Inner) => 2,
            TokenKind::Keyword(Keyword::Left) => {
                if matches!(self.peek_kind(1), TokenKind::Keyword(Keyword::Outer)) {
                    3
                } else {
                    2
                }
            }
            _ => return false,
        };
        matches!(
            self.cursor.peek(after_join),
            TokenKind::Keyword(Keyword::Fetch)
        )
    }

    /// Parses one join: `(LEFT (OUTER)? | INNER)? JOIN (FETCH)? path
    /// ((AS)? alias)? (ON condition)?`.
    ///
    /// A FETCH join takes no alias and its kind is `Fetch` regardless of the
    /// LEFT/INNER prefix.
    fn parse_join(&mut self) -> Result<Join, ParseError> {
        let fetch = self.join_has_fetch();
        let mut kind = JoinKind::Inner;
        if self.eat_keyword(Keyword::Left) {
            self.eat_keyword(Keyword::Outer);
            kind = JoinKind::LeftOuter;
        } else {
            self.eat_keyword(Keyword::Inner);
        }
        self.expect_keyword(Keyword::Join)?;
        if fetch {
            self.expect_keyword(Keyword::Fetch)?;
            kind = JoinKind::Fetch;
        }
        let path = self.parse_path()?;
        let alias = if fetch { None } else { self.parse_optional_alias()? };
        let on = if self.eat_keyword(Keyword::On) {
            Some(self.parse_condition()?)
        } else {
            None
        };
        Ok(Join {
            kind,
            path,
            alias,
            on,
        })
    }

    // --- Optional clauses ---

    /// Parses an optional WHERE clause.
    fn parse_where_clause(&mut self) -> Result<Option<Condition>, ParseError> {
        if self.eat_keyword(Keyword::Where) {
            Ok(Some(self.parse_condition()?))
        } else {
            Ok(None)
        }
    }

    /// Parses an optional GROUP BY clause.
    fn parse_group_by_clause(&mut self) -> Result<Option<GroupBy>, ParseError> {
        if !self.eat_keyword(Keyword::Group) {
            return Ok(None);
        }
        self.expect_keyword(Keyword::By)?;
        let mut items = vec![self.parse_scalar_expr()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            items.push(self.parse_scalar_expr()?);
        }
        Ok(Some(GroupBy { items }))
    }

    /// Parses an optional HAVING clause.
    fn parse_having_clause(&mut self) -> Result<Option<Condition>, ParseError> {
        if self.eat_keyword(Keyword::Having) {
            Ok(Some(self.parse_condition()?))
        } else {
            Ok(None)
        }
    }

    /// Parses an optional ORDER BY clause.
    fn parse_order_by_clause(&mut self) -> Result<Option<OrderBy>, ParseError> {
        if !self.eat_keyword(Keyword::Order) {
            return Ok(None);
        }
        self.expect_keyword(Keyword::By)?;
        let mut items = vec![self.parse_order_item()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            items.push(self.parse_order_item()?);
        }
        Ok(Some(OrderBy { items }))
    }

    /// Parses one ORDER BY item with its optional direction.
    fn parse_order_item(&mut self) -> Result<OrderItem, ParseError> {
        let expr = self.parse_scalar_expr()?;
        let direction = if self.eat_keyword(Keyword::Desc) {
            OrderDirection::Desc
        } else {
            self.eat_keyword(Keyword::Asc);
            OrderDirection::Asc
        };
        Ok(OrderItem { expr, direction })
    }

    // --- UPDATE ---

    /// Parses an UPDATE statement, starting at the UPDATE keyword.
    pub(crate) fn parse_update_query(&mut self) -> Result<Query, ParseError> {
        let keyword = self.expect_keyword(Keyword::Update)?;
        let (entity, _) = self.expect_name()?;
        let alias = self.parse_optional_alias()?;
        self.expect_keyword(Keyword::Set)?;
        let mut assignments = vec![self.parse_assignment()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            assignments.push(self.parse_assignment()?);
        }
        let where_clause = self.parse_where_clause()?;
        Ok(Query {
            body: QueryBody::Update(UpdateQuery {
                entity,
                alias,
                assignments,
                where_clause,
            }),
            span: keyword.span,
        })
    }

    /// Parses one SET assignment: `path = new_value`.
    fn parse_assignment(&mut self) -> Result<Assignment, ParseError> {
        let target = self.parse_path()?;
        self.expect_kind(&TokenKind::Eq)?;
        let value = self.parse_new_value()?;
        Ok(Assignment { target, value })
    }

    /// Parses a SET-clause value.
    ///
    /// A bare identifier is both a valid scalar expression head and a valid
    /// entity expression; the alternatives are tried in grammar order (scalar
    /// first) and the first successful trial is committed.
    fn parse_new_value(&mut self) -> Result<Expr, ParseError> {
        let mut failures = Vec::new();
        match self.attempt(Self::parse_scalar_expr) {
            Ok(expr) => return Ok(expr),
            Err(err) => failures.push(err),
        }
        match self.attempt(Self::parse_entity_reference) {
            Ok(expr) => return Ok(expr),
            Err(err) => failures.push(err),
        }
        Err(ParseError::merge(failures))
    }

    /// Parses a bare entity reference (a name with no navigation).
    fn parse_entity_reference(&mut self) -> Result<Expr, ParseError> {
        let (name, span) = self.expect_name()?;
        Ok(Expr::Path(Path {
            root: name,
            fields: Vec::new(),
            span,
        }))
    }

    // --- DELETE ---

    /// Parses a DELETE statement, starting at the DELETE keyword.
    pub(crate) fn parse_delete_query(&mut self) -> Result<Query, ParseError> {
        let keyword = self.expect_keyword(Keyword::Delete)?;
        self.expect_keyword(Keyword::From)?;
        let (entity, _) = self.expect_name()?;
        let alias = self.parse_optional_alias()?;
        let where_clause = self.parse_where_clause()?;
        Ok(Query {
            body: QueryBody::Delete(DeleteQuery {
                entity,
                alias,
                where_clause,
            }),
            span: keyword.span,
        })
    }

    // --- Paths and names ---

    /// Parses a path expression: `alias ('.' field)*`.
    ///
    /// Zero fields is a bare identification variable.
    pub(crate) fn parse_path(&mut self) -> Result<Path, ParseError> {
        let (root, root_span) = self.expect_identifier()?;
        let mut fields = Vec::new();
        let mut end = root_span.end;
        while self.check(&TokenKind::Dot) {
            self.advance();
            let (field, field_span) = self.expect_name()?;
            fields.push(field);
            end = field_span.end;
        }
        Ok(Path {
            root,
            fields,
            span: Span::new(root_span.start, end),
        })
    }

    /// Parses an optional alias: `AS name` or a bare identifier.
    fn parse_optional_alias(&mut self) -> Result<Option<String>, ParseError> {
        if self.eat_keyword(Keyword::As) {
            let (alias, _) = self.expect_identifier()?;
            Ok(Some(alias))
        } else if matches!(self.cursor.peek(0), TokenKind::Identifier(_)) {
            let (alias, _) = self.expect_identifier()?;
            Ok(Some(alias))
        } else {
            Ok(None)
        }
    }

    // --- Recovery ---

    /// Best-effort partial parse after a failure: the statement head is
    /// re-parsed and a single resynchronization (skip to the next clause
    /// keyword) is attempted at the first error. The result is only for
    /// tooling; the overall parse is still reported as failed.
    pub(crate) fn parse_partial(&mut self) -> Option<Query> {
        match self.peek_kind(0) {
            TokenKind::Keyword(Keyword::Select) => self.parse_select_partial(),
            TokenKind::Keyword(Keyword::Update) => self.parse_update_partial(),
            TokenKind::Keyword(Keyword::Delete) => self.parse_delete_partial(),
            _ => None,
        }
    }

    fn parse_select_partial(&mut self) -> Option<Query> {
        let keyword = self.advance();
        let distinct = self.eat_keyword(Keyword::Distinct);
        let mut resynced = false;
        let mut halted = false;

        let items = match self.attempt(Self::parse_selected_items) {
            Ok(items) => items,
            Err(_) => {
                halted = !self.resync_to_clause_keyword(&mut resynced);
                Vec::new()
            }
        };

        let mut sources = Vec::new();
        if !halted && self.eat_keyword(Keyword::From) {
            match self.attempt(Self::parse_sources) {
                Ok(parsed) => sources = parsed,
                Err(_) => halted = !self.resync_to_clause_keyword(&mut resynced),
            }
        }

        let mut where_clause = None;
        if !halted && self.eat_keyword(Keyword::Where) {
            match self.attempt(Self::parse_condition) {
                Ok(cond) => where_clause = Some(cond),
                Err(_) => halted = !self.resync_to_clause_keyword(&mut resynced),
            }
        }

        let mut group_by = None;
        if !halted && self.check_keyword(Keyword::Group) {
            match self.attempt(Self::parse_group_by_partial) {
                Ok(parsed) => group_by = Some(parsed),
                Err(_) => halted = !self.resync_to_clause_keyword(&mut resynced),
            }
        }

        let mut having = None;
        if !halted && self.eat_keyword(Keyword::Having) {
            match self.attempt(Self::parse_condition) {
                Ok(cond) => having = Some(cond),
                Err(_) => halted = !self.resync_to_clause_keyword(&mut resynced),
            }
        }

        let mut order_by = None;
        if !halted && self.check_keyword(Keyword::Order) {
            if let Ok(parsed) = self.attempt(Self::parse_order_by_partial) {
                order_by = Some(parsed);
            }
        }

        Some(Query {
            body: QueryBody::Select(SelectQuery {
                select: SelectClause { distinct, items },
                sources,
                where_clause,
                group_by,
                having,
                order_by,
            }),
            span: keyword.span,
        })
    }

    /// GROUP BY body for recovery (the keyword pair is consumed here).
    fn parse_group_by_partial(&mut self) -> Result<GroupBy, ParseError> {
        self.expect_keyword(Keyword::Group)?;
        self.expect_keyword(Keyword::By)?;
        let mut items = vec![self.parse_scalar_expr()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            items.push(self.parse_scalar_expr()?);
        }
        Ok(GroupBy { items })
    }

    /// ORDER BY body for recovery (the keyword pair is consumed here).
    fn parse_order_by_partial(&mut self) -> Result<OrderBy, ParseError> {
        self.expect_keyword(Keyword::Order)?;
        self.expect_keyword(Keyword::By)?;
        let mut items = vec![self.parse_order_item()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            items.push(self.parse_order_item()?);
        }
        Ok(OrderBy { items })
    }

    fn parse_update_partial(&mut self) -> Option<Query> {
        let keyword = self.advance();
        let (entity, _) = self.attempt(Self::expect_name).ok()?;
        let alias = self.attempt(Self::parse_optional_alias).unwrap_or(None);
        let mut resynced = false;

        let mut assignments = Vec::new();
        if self.eat_keyword(Keyword::Set) {
            loop {
                match self.attempt(Self::parse_assignment) {
                    Ok(assignment) => assignments.push(assignment),
                    Err(_) => {
                        self.resync_to_where(&mut resynced);
                        break;
                    }
                }
                if !self.check(&TokenKind::Comma) {
                    break;
                }
                self.advance();
            }
        } else {
            self.resync_to_where(&mut resynced);
        }

        let mut where_clause = None;
        if self.eat_keyword(Keyword::Where) {
            if let Ok(cond) = self.attempt(Self::parse_condition) {
                where_clause = Some(cond);
            }
        }

        Some(Query {
            body: QueryBody::Update(UpdateQuery {
                entity,
                alias,
                assignments,
                where_clause,
            }),
            span: keyword.span,
        })
    }

    fn parse_delete_partial(&mut self) -> Option<Query> {
        let keyword = self.advance();
        if !self.eat_keyword(Keyword::From) {
            return None;
        }
        let (entity, _) = self.attempt(Self::expect_name).ok()?;
        let alias = self.attempt(Self::parse_optional_alias).unwrap_or(None);

        let mut where_clause = None;
        if self.eat_keyword(Keyword::Where) {
            if let Ok(cond) = self.attempt(Self::parse_condition) {
                where_clause = Some(cond);
            }
        }

        Some(Query {
            body: QueryBody::Delete(DeleteQuery {
                entity,
                alias,
                where_clause,
            }),
            span: keyword.span,
        })
    }

    /// Skips forward to the next clause keyword. Only one resynchronization
    /// is attempted per statement; returns false on a second attempt or at
    /// end of input.
    fn resync_to_clause_keyword(&mut self, resynced: &mut bool) -> bool {
        if *resynced {
            return false;
        }
        *resynced = true;
        loop {
            match self.peek_kind(0) {
                TokenKind::Keyword(
                    Keyword::From
                    | Keyword::Where
                    | Keyword::Group
                    | Keyword::Having
                    | Keyword::Order,
                ) => return true,
                TokenKind::Eof => return false,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Skips forward to WHERE (the UPDATE/DELETE follow set).
    fn resync_to_where(&mut self, resynced: &mut bool) -> bool {
        if *resynced {
            return false;
        }
        *resynced = true;
        loop {
            match self.peek_kind(0) {
                TokenKind::Keyword(Keyword::Where) => return true,
                TokenKind::Eof => return false,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // --- Helper methods ---

    /// Returns the kind of the token `k` positions ahead.
    pub(crate) fn peek_kind(&mut self, k: usize) -> TokenKind {
        self.cursor.peek(k).clone()
    }

    /// Consumes and returns the current token.
    pub(crate) fn advance(&mut self) -> Token {
        self.cursor.advance()
    }

    /// Checks if the current token matches the given kind (by variant).
    pub(crate) fn check(&mut self, kind: &TokenKind) -> bool {
        core::mem::discriminant(self.cursor.peek(0)) == core::mem::discriminant(kind)
    }

    /// Checks if the current token is the given keyword.
    pub(crate) fn check_keyword(&mut self, keyword: Keyword) -> bool {
        matches!(self.cursor.peek(0), TokenKind::Keyword(kw) if *kw == keyword)
    }

    /// Consumes the current token if it is the given keyword.
    pub(crate) fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expects the current token to be the given kind.
    pub(crate) fn expect_kind(&mut self, kind: &TokenKind) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(vec![Expected::from_kind(kind)]))
        }
    }

    /// Expects the current token to be the given keyword.
    pub(crate) fn expect_keyword(&mut self, keyword: Keyword) -> Result<Token, ParseError> {
        if self.check_keyword(keyword) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(vec![Expected::Keyword(keyword)]))
        }
    }

    /// Expects and returns an identifier with its span.
    pub(crate) fn expect_identifier(&mut self) -> Result<(String, Span), ParseError> {
        let kind = self.peek_kind(0);
        match kind {
            TokenKind::Identifier(name) => {
                let token = self.advance();
                Ok((name, token.span))
            }
            _ => Err(self.unexpected(vec![Expected::Identifier])),
        }
    }

    /// Expects an identifier-like name: a plain identifier, or one of the
    /// keyword tokens the dialect accepts positionally as entity or field
    /// names (a fixed compatibility table; entity attributes may literally
    /// be named `from`, `group`, `count`, ...). The name is captured from
    /// the source text, preserving its original case.
    pub(crate) fn expect_name(&mut self) -> Result<(String, Span), ParseError> {
        let kind = self.peek_kind(0);
        match kind {
            TokenKind::Identifier(name) => {
                let token = self.advance();
                Ok((name, token.span))
            }
            TokenKind::Keyword(kw) if kw.usable_as_field() => {
                let token = self.advance();
                Ok((String::from(self.text(token.span)), token.span))
            }
            _ => Err(self.unexpected(vec![Expected::Identifier])),
        }
    }

    /// Returns the source text covered by a span.
    pub(crate) fn text(&self, span: Span) -> &str {
        &self.source[span.start.min(self.source.len())..span.end.min(self.source.len())]
    }

    /// Runs a sub-rule under a checkpoint, rewinding the cursor on failure.
    ///
    /// This is the trial-parse primitive: a failed trial leaves the cursor
    /// exactly where it was, so the next alternative can be attempted.
    pub(crate) fn attempt<T>(
        &mut self,
        rule: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        let mark = self.cursor.mark();
        match rule(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                self.cursor.rewind(mark);
                Err(err)
            }
        }
    }

    /// Builds an "unexpected token" error at the current position.
    ///
    /// A lexical error token is reported as its own message instead of the
    /// rule's expected set.
    pub(crate) fn unexpected(&mut self, expected: Vec<Expected>) -> ParseError {
        let token = self.cursor.current().clone();
        if let TokenKind::Error(message) = &token.kind {
            return ParseError::new(
                format!("Lexical error: {message}"),
                token.span,
                token.kind.clone(),
            );
        }
        ParseError::unexpected(expected, token.kind, token.span)
    }
}
