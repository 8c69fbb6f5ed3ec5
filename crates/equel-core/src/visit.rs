//! Tree-walking interface over the AST.
//!
//! [`NodeRef`] lets a consumer enumerate any node's variant tag and its
//! children in parse order without access to parser internals. [`walk`]
//! drives a [`Visitor`] in preorder.

use crate::ast::{
    Assignment, CaseTest, Condition, Expr, GroupBy, InRhs, Join, OrderBy, OrderItem, Path, Query,
    QueryBody, SelectClause, SelectedItem, SimpleCondition, Source,
};

/// A borrowed reference to any AST node.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Query(&'a Query),
    SelectClause(&'a SelectClause),
    SelectedItem(&'a SelectedItem),
    Source(&'a Source),
    Join(&'a Join),
    GroupBy(&'a GroupBy),
    OrderBy(&'a OrderBy),
    OrderItem(&'a OrderItem),
    Assignment(&'a Assignment),
    Condition(&'a Condition),
    SimpleCondition(&'a SimpleCondition),
    Expr(&'a Expr),
    Path(&'a Path),
}

impl<'a> NodeRef<'a> {
    /// Returns the node's variant tag, stable across releases.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Query(query) => match query.body {
                QueryBody::Select(_) => "select-query",
                QueryBody::Update(_) => "update-query",
                QueryBody::Delete(_) => "delete-query",
            },
            Self::SelectClause(_) => "select-clause",
            Self::SelectedItem(_) => "selected-item",
            Self::Source(Source::Range(_)) => "range-variable",
            Self::Source(Source::Collection(_)) => "collection-member",
            Self::Join(_) => "join",
            Self::GroupBy(_) => "group-by",
            Self::OrderBy(_) => "order-by",
            Self::OrderItem(_) => "order-item",
            Self::Assignment(_) => "assignment",
            Self::Condition(condition) => match condition {
                Condition::Or(_) => "or",
                Condition::And(_) => "and",
                Condition::Not(_) => "not",
                Condition::Simple(_) => "simple-condition",
            },
            Self::SimpleCondition(simple) => match simple {
                SimpleCondition::Comparison { .. } => "comparison",
                SimpleCondition::Between { .. } => "between",
                SimpleCondition::In { .. } => "in",
                SimpleCondition::Like { .. } => "like",
                SimpleCondition::NullCheck { .. } => "null-check",
                SimpleCondition::EmptyCheck { .. } => "empty-check",
                SimpleCondition::MemberOf { .. } => "member-of",
                SimpleCondition::Exists { .. } => "exists",
                SimpleCondition::DateBetween { .. } => "date-between",
                SimpleCondition::DateBefore { .. } => "date-before",
                SimpleCondition::DateAfter { .. } => "date-after",
                SimpleCondition::DateEquals { .. } => "date-equals",
                SimpleCondition::DateToday { .. } => "date-today",
            },
            Self::Expr(expr) => match expr {
                Expr::Path(_) => "path",
                Expr::Literal(_) => "literal",
                Expr::Parameter(_) => "parameter",
                Expr::Aggregate { .. } => "aggregate",
                Expr::Function { .. } => "function",
                Expr::Coalesce(_) => "coalesce",
                Expr::NullIf(_, _) => "nullif",
                Expr::Cast { .. } => "cast",
                Expr::Extract { .. } => "extract",
                Expr::Trim(_) => "trim",
                Expr::Case { .. } => "case",
                Expr::Constructor { .. } => "constructor",
                Expr::EnumMacro { .. } => "enum-macro",
                Expr::Arith { .. } => "arith",
                Expr::Neg(_) => "neg",
                Expr::Paren(_) => "paren",
                Expr::Subquery(_) => "subquery",
            },
            Self::Path(_) => "path",
        }
    }

    /// Returns the node's children in parse order.
    #[must_use]
    pub fn children(&self) -> Vec<NodeRef<'a>> {
        match self {
            Self::Query(query) => match &query.body {
                QueryBody::Select(select) => {
                    let mut children = vec![NodeRef::SelectClause(&select.select)];
                    children.extend(select.sources.iter().map(NodeRef::Source));
                    if let Some(where_clause) = &select.where_clause {
                        children.push(NodeRef::Condition(where_clause));
                    }
                    if let Some(group_by) = &select.group_by {
                        children.push(NodeRef::GroupBy(group_by));
                    }
                    if let Some(having) = &select.having {
                        children.push(NodeRef::Condition(having));
                    }
                    if let Some(order_by) = &select.order_by {
                        children.push(NodeRef::OrderBy(order_by));
                    }
                    children
                }
                QueryBody::Update(update) => {
                    let mut children: Vec<NodeRef<'a>> =
                        update.assignments.iter().map(NodeRef::Assignment).collect();
                    if let Some(where_clause) = &update.where_clause {
                        children.push(NodeRef::Condition(where_clause));
                    }
                    children
                }
                QueryBody::Delete(delete) => delete
                    .where_clause
                    .iter()
                    .map(NodeRef::Condition)
                    .collect(),
            },

            Self::SelectClause(clause) => {
                clause.items.iter().map(NodeRef::SelectedItem).collect()
            }
            Self::SelectedItem(item) => vec![NodeRef::Expr(&item.expr)],

            Self::Source(Source::Range(range)) => {
                range.joins.iter().map(NodeRef::Join).collect()
            }
            Self::Source(Source::Collection(member)) => vec![NodeRef::Path(&member.path)],

            Self::Join(join) => {
                let mut children = vec![NodeRef::Path(&join.path)];
                if let Some(on) = &join.on {
                    children.push(NodeRef::Condition(on));
                }
                children
            }

            Self::GroupBy(group_by) => group_by.items.iter().map(NodeRef::Expr).collect(),
            Self::OrderBy(order_by) => order_by.items.iter().map(NodeRef::OrderItem).collect(),
            Self::OrderItem(item) => vec![NodeRef::Expr(&item.expr)],
            Self::Assignment(assignment) => vec![
                NodeRef::Path(&assignment.target),
                NodeRef::Expr(&assignment.value),
            ],

            Self::Condition(condition) => match condition {
                Condition::Or(operands) | Condition::And(operands) => {
                    operands.iter().map(NodeRef::Condition).collect()
                }
                Condition::Not(inner) => vec![NodeRef::Condition(inner)],
                Condition::Simple(simple) => vec![NodeRef::SimpleCondition(simple)],
            },

            Self::SimpleCondition(simple) => match simple {
                SimpleCondition::Comparison { left, right, .. } => {
                    vec![NodeRef::Expr(left), NodeRef::Expr(right)]
                }
                SimpleCondition::Between { target, lo, hi, .. } => vec![
                    NodeRef::Expr(target),
                    NodeRef::Expr(lo),
                    NodeRef::Expr(hi),
                ],
                SimpleCondition::In { target, rhs, .. } => {
                    let mut children = vec![NodeRef::Expr(target)];
                    match rhs {
                        InRhs::List(items) => {
                            children.extend(items.iter().map(NodeRef::Expr));
                        }
                        InRhs::Subquery(subquery) => children.push(NodeRef::Query(subquery)),
                        InRhs::Parameter(_) => {}
                    }
                    children
                }
                SimpleCondition::Like {
                    target, pattern, ..
                } => vec![NodeRef::Expr(target), NodeRef::Expr(pattern)],
                SimpleCondition::NullCheck { target, .. }
                | SimpleCondition::EmptyCheck { target, .. } => vec![NodeRef::Expr(target)],
                SimpleCondition::MemberOf {
                    item, collection, ..
                } => vec![NodeRef::Expr(item), NodeRef::Path(collection)],
                SimpleCondition::Exists { subquery, .. } => vec![NodeRef::Query(subquery)],
                SimpleCondition::DateBetween { target, lo, hi, .. } => vec![
                    NodeRef::Path(target),
                    NodeRef::Expr(lo),
                    NodeRef::Expr(hi),
                ],
                SimpleCondition::DateBefore { target, value }
                | SimpleCondition::DateAfter { target, value }
                | SimpleCondition::DateEquals { target, value } => {
                    vec![NodeRef::Path(target), NodeRef::Expr(value)]
                }
                SimpleCondition::DateToday { target } => vec![NodeRef::Path(target)],
            },

            Self::Expr(expr) => match expr {
                Expr::Path(_)
                | Expr::Literal(_)
                | Expr::Parameter(_)
                | Expr::EnumMacro { .. } => Vec::new(),
                Expr::Aggregate { argument, .. } => vec![NodeRef::Expr(argument)],
                Expr::Function { args, .. }
                | Expr::Coalesce(args)
                | Expr::Constructor { args, .. } => args.iter().map(NodeRef::Expr).collect(),
                Expr::NullIf(first, second) => {
                    vec![NodeRef::Expr(first), NodeRef::Expr(second)]
                }
                Expr::Cast { expr, .. } => vec![NodeRef::Expr(expr)],
                Expr::Extract { source, .. } => vec![NodeRef::Expr(source)],
                Expr::Trim(inner) | Expr::Neg(inner) | Expr::Paren(inner) => {
                    vec![NodeRef::Expr(inner)]
                }
                Expr::Case {
                    operand,
                    whens,
                    otherwise,
                } => {
                    let mut children = Vec::new();
                    if let Some(operand) = operand {
                        children.push(NodeRef::Expr(operand));
                    }
                    for when in whens {
                        match &when.test {
                            CaseTest::Cond(condition) => {
                                children.push(NodeRef::Condition(condition));
                            }
                            CaseTest::Value(value) => children.push(NodeRef::Expr(value)),
                        }
                        children.push(NodeRef::Expr(&when.then));
                    }
                    if let Some(otherwise) = otherwise {
                        children.push(NodeRef::Expr(otherwise));
                    }
                    children
                }
                Expr::Arith { left, right, .. } => {
                    vec![NodeRef::Expr(left), NodeRef::Expr(right)]
                }
                Expr::Subquery(query) => vec![NodeRef::Query(query)],
            },

            Self::Path(_) => Vec::new(),
        }
    }
}

/// A preorder AST visitor.
pub trait Visitor {
    /// Called once per node, parents before children.
    fn visit(&mut self, node: &NodeRef<'_>);
}

/// Walks the tree rooted at `node` in preorder, children in parse order.
pub fn walk<V: Visitor>(node: NodeRef<'_>, visitor: &mut V) {
    visitor.visit(&node);
    for child in node.children() {
        walk(child, visitor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    struct TagCollector {
        tags: Vec<&'static str>,
    }

    impl Visitor for TagCollector {
        fn visit(&mut self, node: &NodeRef<'_>) {
            self.tags.push(node.tag());
        }
    }

    fn tags_of(input: &str) -> Vec<&'static str> {
        let parsed = parse(input).expect("query should parse");
        let mut collector = TagCollector { tags: Vec::new() };
        walk(NodeRef::Query(&parsed.query), &mut collector);
        collector.tags
    }

    #[test]
    fn test_walk_order_is_preorder_parse_order() {
        let tags = tags_of("SELECT e FROM Order e WHERE e.amount > 100");
        assert_eq!(
            tags,
            vec![
                "select-query",
                "select-clause",
                "selected-item",
                "path",
                "range-variable",
                "simple-condition",
                "comparison",
                "path",
                "literal",
            ]
        );
    }

    #[test]
    fn test_walk_finds_parameters() {
        struct ParamFinder {
            count: usize,
        }
        impl Visitor for ParamFinder {
            fn visit(&mut self, node: &NodeRef<'_>) {
                if node.tag() == "parameter" {
                    self.count += 1;
                }
            }
        }

        let parsed = parse("SELECT e FROM T e WHERE e.a = :x AND e.b = ?1 AND e.c = ${u}")
            .expect("query should parse");
        let mut finder = ParamFinder { count: 0 };
        walk(NodeRef::Query(&parsed.query), &mut finder);
        assert_eq!(finder.count, 3);
    }

    #[test]
    fn test_walk_descends_into_subqueries() {
        let tags = tags_of("SELECT e FROM T e WHERE EXISTS (SELECT o FROM O o)");
        assert_eq!(
            tags.iter().filter(|t| **t == "select-query").count(),
            2
        );
        assert!(tags.contains(&"exists"));
    }

    #[test]
    fn test_walk_update() {
        let tags = tags_of("UPDATE T t SET t.a = 1 WHERE t.b IS NULL");
        assert_eq!(tags[0], "update-query");
        assert!(tags.contains(&"assignment"));
        assert!(tags.contains(&"null-check"));
    }

    #[test]
    fn test_join_children() {
        let tags = tags_of("SELECT e FROM C e LEFT JOIN e.orders o ON o.open = TRUE");
        assert!(tags.contains(&"join"));
        // The join's path child precedes its ON condition.
        let join_pos = tags.iter().position(|t| *t == "join").expect("join tag");
        assert_eq!(tags[join_pos + 1], "path");
    }
}
