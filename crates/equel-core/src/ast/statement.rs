//! Statement AST types.

use serde::{Deserialize, Serialize};

use crate::lexer::Span;

use super::expression::{Condition, Expr, Path};

/// Order direction for ORDER BY items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderDirection {
    /// Ascending order (default).
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl OrderDirection {
    /// Returns the source representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Join kind.
///
/// A FETCH join is its own kind: the optional LEFT/INNER prefix of a
/// `JOIN FETCH` is accepted by the grammar but not preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    /// `[INNER] JOIN`.
    Inner,
    /// `LEFT [OUTER] JOIN`.
    LeftOuter,
    /// `JOIN FETCH`.
    Fetch,
}

impl JoinKind {
    /// Returns the canonical source representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "JOIN",
            Self::LeftOuter => "LEFT JOIN",
            Self::Fetch => "JOIN FETCH",
        }
    }
}

/// A JOIN attached to a range-variable declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    /// The kind of join.
    pub kind: JoinKind,
    /// The association path being joined.
    pub path: Path,
    /// The join alias; absent for FETCH joins.
    pub alias: Option<String>,
    /// The ON condition.
    pub on: Option<Condition>,
}

/// A range-variable declaration: `Entity alias` plus its join chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeVariable {
    /// The entity name as written.
    pub entity: String,
    /// The identification variable bound to the entity.
    pub alias: String,
    /// Joins declared against this variable, in source order.
    pub joins: Vec<Join>,
}

/// A collection-member declaration: `IN (path) alias`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionMember {
    /// The collection-valued path.
    pub path: Path,
    /// The identification variable bound to the members.
    pub alias: String,
}

/// One FROM-clause entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Source {
    /// A range-variable declaration.
    Range(RangeVariable),
    /// A collection-member declaration.
    Collection(CollectionMember),
}

impl Source {
    /// Returns the joins of a range-variable source (empty otherwise).
    #[must_use]
    pub fn joins(&self) -> &[Join] {
        match self {
            Self::Range(range) => &range.joins,
            Self::Collection(_) => &[],
        }
    }
}

/// One item of a SELECT clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedItem {
    /// The selected expression.
    pub expr: Expr,
    /// The result alias.
    pub alias: Option<String>,
}

/// The SELECT clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectClause {
    /// Whether DISTINCT was specified.
    pub distinct: bool,
    /// The selected items, in source order (at least one).
    pub items: Vec<SelectedItem>,
}

/// The GROUP BY clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupBy {
    /// Grouping expressions in source order.
    pub items: Vec<Expr>,
}

/// One ORDER BY item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// The ordering expression.
    pub expr: Expr,
    /// The direction (ASC when unspecified).
    pub direction: OrderDirection,
}

/// The ORDER BY clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    /// Order items in source order.
    pub items: Vec<OrderItem>,
}

/// One SET-clause assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// The path being assigned.
    pub target: Path,
    /// The new value.
    pub value: Expr,
}

/// A SELECT query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectQuery {
    /// The SELECT clause.
    pub select: SelectClause,
    /// The FROM entries (at least one).
    pub sources: Vec<Source>,
    /// The WHERE clause.
    pub where_clause: Option<Condition>,
    /// The GROUP BY clause.
    pub group_by: Option<GroupBy>,
    /// The HAVING clause.
    pub having: Option<Condition>,
    /// The ORDER BY clause.
    pub order_by: Option<OrderBy>,
}

/// An UPDATE query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateQuery {
    /// The entity being updated.
    pub entity: String,
    /// The identification variable, when declared.
    pub alias: Option<String>,
    /// SET assignments in source order (at least one).
    pub assignments: Vec<Assignment>,
    /// The WHERE clause.
    pub where_clause: Option<Condition>,
}

/// A DELETE query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteQuery {
    /// The entity deleted from.
    pub entity: String,
    /// The identification variable, when declared.
    pub alias: Option<String>,
    /// The WHERE clause.
    pub where_clause: Option<Condition>,
}

/// The statement-specific clause set of a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryBody {
    /// SELECT statement.
    Select(SelectQuery),
    /// UPDATE statement.
    Update(UpdateQuery),
    /// DELETE statement.
    Delete(DeleteQuery),
}

/// The root of one parsed statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// The statement body.
    pub body: QueryBody,
    /// The span of the introducing keyword (SELECT/UPDATE/DELETE).
    pub span: Span,
}

impl Query {
    /// Returns the SELECT body, if this is a SELECT query.
    #[must_use]
    pub const fn as_select(&self) -> Option<&SelectQuery> {
        match &self.body {
            QueryBody::Select(select) => Some(select),
            _ => None,
        }
    }

    /// Returns the UPDATE body, if this is an UPDATE query.
    #[must_use]
    pub const fn as_update(&self) -> Option<&UpdateQuery> {
        match &self.body {
            QueryBody::Update(update) => Some(update),
            _ => None,
        }
    }

    /// Returns the DELETE body, if this is a DELETE query.
    #[must_use]
    pub const fn as_delete(&self) -> Option<&DeleteQuery> {
        match &self.body {
            QueryBody::Delete(delete) => Some(delete),
            _ => None,
        }
    }

    /// Returns the WHERE clause of whichever body is populated.
    #[must_use]
    pub const fn where_clause(&self) -> Option<&Condition> {
        match &self.body {
            QueryBody::Select(select) => select.where_clause.as_ref(),
            QueryBody::Update(update) => update.where_clause.as_ref(),
            QueryBody::Delete(delete) => delete.where_clause.as_ref(),
        }
    }
}
