//! Canonical text rendering of the AST.
//!
//! The canonical form is a fixed spelling of every construct (uppercase
//! keywords, `AS` before aliases, `OF` after MEMBER). Re-parsing the
//! canonical text of a parsed query yields a structurally identical tree,
//! which is what the `format` tooling and the round-trip tests rely on.

use crate::ast::{
    CaseTest, Condition, Expr, GroupBy, InRhs, Join, JoinKind, Literal, OrderBy, Parameter, Path,
    Query, QueryBody, SelectQuery, SimpleCondition, Source,
};

/// Renders a query in canonical textual form.
#[must_use]
pub fn canonical(query: &Query) -> String {
    let mut out = String::new();
    write_query(&mut out, query);
    out
}

fn write_query(out: &mut String, query: &Query) {
    match &query.body {
        QueryBody::Select(select) => write_select(out, select),
        QueryBody::Update(update) => {
            out.push_str("UPDATE ");
            out.push_str(&update.entity);
            if let Some(alias) = &update.alias {
                out.push(' ');
                out.push_str(alias);
            }
            out.push_str(" SET ");
            for (i, assignment) in update.assignments.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_path(out, &assignment.target);
                out.push_str(" = ");
                write_expr(out, &assignment.value);
            }
            if let Some(where_clause) = &update.where_clause {
                out.push_str(" WHERE ");
                write_condition(out, where_clause);
            }
        }
        QueryBody::Delete(delete) => {
            out.push_str("DELETE FROM ");
            out.push_str(&delete.entity);
            if let Some(alias) = &delete.alias {
                out.push(' ');
                out.push_str(alias);
            }
            if let Some(where_clause) = &delete.where_clause {
                out.push_str(" WHERE ");
                write_condition(out, where_clause);
            }
        }
    }
}

fn write_select(out: &mut String, select: &SelectQuery) {
    out.push_str("SELECT ");
    if select.select.distinct {
        out.push_str("DISTINCT ");
    }
    for (i, item) in select.select.items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_expr(out, &item.expr);
        if let Some(alias) = &item.alias {
            out.push_str(" AS ");
            out.push_str(alias);
        }
    }

    out.push_str(" FROM ");
    for (i, source) in select.sources.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_source(out, source);
    }

    if let Some(where_clause) = &select.where_clause {
        out.push_str(" WHERE ");
        write_condition(out, where_clause);
    }
    if let Some(group_by) = &select.group_by {
        write_group_by(out, group_by);
    }
    if let Some(having) = &select.having {
        out.push_str(" HAVING ");
        write_condition(out, having);
    }
    if let Some(order_by) = &select.order_by {
        write_order_by(out, order_by);
    }
}

fn write_source(out: &mut String, source: &Source) {
    match source {
        Source::Range(range) => {
            out.push_str(&range.entity);
            out.push(' ');
            out.push_str(&range.alias);
            for join in &range.joins {
                write_join(out, join);
            }
        }
        Source::Collection(member) => {
            out.push_str("IN (");
            write_path(out, &member.path);
            out.push_str(") ");
            out.push_str(&member.alias);
        }
    }
}

fn write_join(out: &mut String, join: &Join) {
    out.push(' ');
    out.push_str(join.kind.as_str());
    out.push(' ');
    write_path(out, &join.path);
    if join.kind != JoinKind::Fetch {
        if let Some(alias) = &join.alias {
            out.push(' ');
            out.push_str(alias);
        }
    }
    if let Some(on) = &join.on {
        out.push_str(" ON ");
        write_condition(out, on);
    }
}

fn write_group_by(out: &mut String, group_by: &GroupBy) {
    out.push_str(" GROUP BY ");
    for (i, item) in group_by.items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_expr(out, item);
    }
}

fn write_order_by(out: &mut String, order_by: &OrderBy) {
    out.push_str(" ORDER BY ");
    for (i, item) in order_by.items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_expr(out, &item.expr);
        out.push(' ');
        out.push_str(item.direction.as_str());
    }
}

fn write_condition(out: &mut String, condition: &Condition) {
    match condition {
        Condition::Or(operands) => {
            for (i, operand) in operands.iter().enumerate() {
                if i > 0 {
                    out.push_str(" OR ");
                }
                write_condition(out, operand);
            }
        }
        Condition::And(operands) => {
            for (i, operand) in operands.iter().enumerate() {
                if i > 0 {
                    out.push_str(" AND ");
                }
                // OR binds looser than AND; grouped operands need parens to
                // survive re-parsing.
                if matches!(operand, Condition::Or(_)) {
                    out.push('(');
                    write_condition(out, operand);
                    out.push(')');
                } else {
                    write_condition(out, operand);
                }
            }
        }
        Condition::Not(inner) => {
            out.push_str("NOT ");
            if matches!(inner.as_ref(), Condition::Simple(_)) {
                write_condition(out, inner);
            } else {
                out.push('(');
                write_condition(out, inner);
                out.push(')');
            }
        }
        Condition::Simple(simple) => write_simple_condition(out, simple),
    }
}

fn write_simple_condition(out: &mut String, simple: &SimpleCondition) {
    match simple {
        SimpleCondition::Comparison { left, op, right } => {
            write_expr(out, left);
            out.push(' ');
            out.push_str(op.as_str());
            out.push(' ');
            write_expr(out, right);
        }
        SimpleCondition::Between {
            not,
            target,
            lo,
            hi,
        } => {
            write_expr(out, target);
            write_not(out, *not);
            out.push_str(" BETWEEN ");
            write_expr(out, lo);
            out.push_str(" AND ");
            write_expr(out, hi);
        }
        SimpleCondition::In { not, target, rhs } => {
            write_expr(out, target);
            write_not(out, *not);
            out.push_str(" IN ");
            match rhs {
                InRhs::List(items) => {
                    out.push('(');
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        write_expr(out, item);
                    }
                    out.push(')');
                }
                InRhs::Subquery(subquery) => {
                    out.push('(');
                    write_query(out, subquery);
                    out.push(')');
                }
                InRhs::Parameter(parameter) => write_parameter(out, parameter),
            }
        }
        SimpleCondition::Like {
            not,
            target,
            pattern,
            escape,
        } => {
            write_expr(out, target);
            write_not(out, *not);
            out.push_str(" LIKE ");
            write_expr(out, pattern);
            if let Some(escape) = escape {
                out.push_str(" ESCAPE ");
                write_string_literal(out, escape);
            }
        }
        SimpleCondition::NullCheck { not, target } => {
            write_expr(out, target);
            out.push_str(" IS");
            write_not(out, *not);
            out.push_str(" NULL");
        }
        SimpleCondition::EmptyCheck { not, target } => {
            write_expr(out, target);
            out.push_str(" IS");
            write_not(out, *not);
            out.push_str(" EMPTY");
        }
        SimpleCondition::MemberOf {
            not,
            item,
            collection,
        } => {
            write_expr(out, item);
            write_not(out, *not);
            out.push_str(" MEMBER OF ");
            write_path(out, collection);
        }
        SimpleCondition::Exists { not, subquery } => {
            if *not {
                out.push_str("NOT ");
            }
            out.push_str("EXISTS (");
            write_query(out, subquery);
            out.push(')');
        }
        SimpleCondition::DateBetween {
            target,
            lo,
            hi,
            unit,
        } => {
            out.push_str("@BETWEEN(");
            write_path(out, target);
            out.push_str(", ");
            write_expr(out, lo);
            out.push_str(", ");
            write_expr(out, hi);
            out.push_str(", ");
            out.push_str(unit);
            out.push(')');
        }
        SimpleCondition::DateBefore { target, value } => write_date_macro(out, "@DATEBEFORE", target, value),
        SimpleCondition::DateAfter { target, value } => write_date_macro(out, "@DATEAFTER", target, value),
        SimpleCondition::DateEquals { target, value } => write_date_macro(out, "@DATEEQUALS", target, value),
        SimpleCondition::DateToday { target } => {
            out.push_str("@TODAY(");
            write_path(out, target);
            out.push(')');
        }
    }
}

fn write_date_macro(out: &mut String, name: &str, target: &Path, value: &Expr) {
    out.push_str(name);
    out.push('(');
    write_path(out, target);
    out.push_str(", ");
    write_expr(out, value);
    out.push(')');
}

fn write_not(out: &mut String, not: bool) {
    if not {
        out.push_str(" NOT");
    }
}

fn write_expr(out: &mut String, expr: &Expr) {
    match expr {
        Expr::Path(path) => write_path(out, path),
        Expr::Literal(literal) => write_literal(out, literal),
        Expr::Parameter(parameter) => write_parameter(out, parameter),
        Expr::Aggregate {
            function,
            distinct,
            argument,
        } => {
            out.push_str(function.as_str());
            out.push('(');
            if *distinct {
                out.push_str("DISTINCT ");
            }
            write_expr(out, argument);
            out.push(')');
        }
        Expr::Function { name, args } => {
            out.push_str(name);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, arg);
            }
            out.push(')');
        }
        Expr::Coalesce(args) => {
            out.push_str("COALESCE(");
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, arg);
            }
            out.push(')');
        }
        Expr::NullIf(first, second) => {
            out.push_str("NULLIF(");
            write_expr(out, first);
            out.push_str(", ");
            write_expr(out, second);
            out.push(')');
        }
        Expr::Cast { expr, ty } => {
            out.push_str("CAST(");
            write_expr(out, expr);
            out.push_str(" AS ");
            out.push_str(ty);
            out.push(')');
        }
        Expr::Extract { part, source } => {
            out.push_str("EXTRACT(");
            out.push_str(part.as_str());
            out.push_str(" FROM ");
            write_expr(out, source);
            out.push(')');
        }
        Expr::Trim(inner) => {
            out.push_str("TRIM(");
            write_expr(out, inner);
            out.push(')');
        }
        Expr::Case {
            operand,
            whens,
            otherwise,
        } => {
            out.push_str("CASE ");
            if let Some(operand) = operand {
                write_expr(out, operand);
                out.push(' ');
            }
            for when in whens {
                out.push_str("WHEN ");
                match &when.test {
                    CaseTest::Cond(condition) => write_condition(out, condition),
                    CaseTest::Value(value) => write_expr(out, value),
                }
                out.push_str(" THEN ");
                write_expr(out, &when.then);
                out.push(' ');
            }
            if let Some(otherwise) = otherwise {
                out.push_str("ELSE ");
                write_expr(out, otherwise);
                out.push(' ');
            }
            out.push_str("END");
        }
        Expr::Constructor { class, args } => {
            out.push_str("NEW ");
            out.push_str(class);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, arg);
            }
            out.push(')');
        }
        Expr::EnumMacro { value } => {
            out.push_str("@ENUM(");
            out.push_str(value);
            out.push(')');
        }
        Expr::Arith { left, op, right } => {
            write_expr(out, left);
            out.push(' ');
            out.push_str(op.as_str());
            out.push(' ');
            write_expr(out, right);
        }
        Expr::Neg(operand) => {
            out.push('-');
            write_expr(out, operand);
        }
        Expr::Paren(inner) => {
            out.push('(');
            write_expr(out, inner);
            out.push(')');
        }
        Expr::Subquery(query) => {
            out.push('(');
            write_query(out, query);
            out.push(')');
        }
    }
}

fn write_path(out: &mut String, path: &Path) {
    out.push_str(&path.root);
    for field in &path.fields {
        out.push('.');
        out.push_str(field);
    }
}

fn write_literal(out: &mut String, literal: &Literal) {
    match literal {
        Literal::Integer(value) => out.push_str(&value.to_string()),
        Literal::Float(value) => {
            // A float must re-parse as a float: 100 would come back as an
            // integer, so a bare rendering gets a decimal point appended.
            let rendered = value.to_string();
            if rendered.contains('.') || rendered.contains('e') {
                out.push_str(&rendered);
            } else {
                out.push_str(&rendered);
                out.push_str(".0");
            }
        }
        Literal::String(value) => write_string_literal(out, value),
        Literal::Boolean(true) => out.push_str("TRUE"),
        Literal::Boolean(false) => out.push_str("FALSE"),
        Literal::Null => out.push_str("NULL"),
    }
}

fn write_string_literal(out: &mut String, value: &str) {
    out.push('\'');
    out.push_str(&value.replace('\'', "''"));
    out.push('\'');
}

fn write_parameter(out: &mut String, parameter: &Parameter) {
    match parameter {
        Parameter::Positional(index) => {
            out.push('?');
            out.push_str(&index.to_string());
        }
        Parameter::Named(name) => {
            out.push(':');
            out.push_str(name);
        }
        Parameter::Context(name) => {
            out.push_str("${");
            out.push_str(name);
            out.push('}');
        }
    }
}
