//! Abstract Syntax Tree (AST) types for query statements.

mod expression;
mod statement;

pub use expression::{
    AggregateFunction, ArithOp, CaseTest, CaseWhen, ComparisonOp, Condition, DatePart, Expr, InRhs,
    Literal, Parameter, Path, SimpleCondition,
};
pub use statement::{
    Assignment, CollectionMember, DeleteQuery, GroupBy, Join, JoinKind, OrderBy, OrderDirection,
    OrderItem, Query, QueryBody, RangeVariable, SelectClause, SelectQuery, SelectedItem, Source,
    UpdateQuery,
};
