//! Conditional expression parsing.
//!
//! The precedence chain is the classic `Expression → Term (OR Term)*`,
//! `Term → Factor (AND Factor)*`, `Factor → (NOT)? Primary`,
//! `Primary → SimpleCondition | '(' Expression ')'`. Left-to-right source
//! order is preserved in the operand lists.
//!
//! Simple conditions cannot be chosen by bounded lookahead: comparison,
//! between, like, in, member-of and the checks all start with the same
//! scalar expression. Each alternative runs as a trial parse under a cursor
//! checkpoint, in the order written in the grammar; the first successful
//! trial is committed and shadows later alternatives. When every trial
//! fails, the rule fails with the union of the expected sets.

use crate::ast::{ComparisonOp, Condition, InRhs, Parameter, SimpleCondition};
use crate::lexer::{Keyword, MacroKind, TokenKind};

use super::error::{Expected, ParseError};
use super::parser::Parser;

impl Parser<'_> {
    /// Parses a conditional expression (the OR level).
    pub(crate) fn parse_condition(&mut self) -> Result<Condition, ParseError> {
        let first = self.parse_condition_term()?;
        let mut operands = vec![first];
        while self.eat_keyword(Keyword::Or) {
            operands.push(self.parse_condition_term()?);
        }
        if operands.len() == 1 {
            Ok(operands.remove(0))
        } else {
            Ok(Condition::Or(operands))
        }
    }

    /// Parses a conditional term (the AND level).
    fn parse_condition_term(&mut self) -> Result<Condition, ParseError> {
        let first = self.parse_condition_factor()?;
        let mut operands = vec![first];
        while self.eat_keyword(Keyword::And) {
            operands.push(self.parse_condition_factor()?);
        }
        if operands.len() == 1 {
            Ok(operands.remove(0))
        } else {
            Ok(Condition::And(operands))
        }
    }

    /// Parses a conditional factor: `(NOT)? primary`.
    ///
    /// `NOT EXISTS` belongs to the exists condition itself, so a NOT right
    /// before EXISTS is left for that alternative to consume.
    fn parse_condition_factor(&mut self) -> Result<Condition, ParseError> {
        if self.check_keyword(Keyword::Not)
            && !matches!(self.peek_kind(1), TokenKind::Keyword(Keyword::Exists))
        {
            self.advance();
            let inner = self.parse_condition_primary()?;
            return Ok(Condition::Not(Box::new(inner)));
        }
        self.parse_condition_primary()
    }

    /// Parses a conditional primary.
    ///
    /// Both alternatives can start with `(` (a comparison's left operand may
    /// be a parenthesized arithmetic expression), so they are tried in
    /// grammar order: simple condition first, then parenthesized condition.
    fn parse_condition_primary(&mut self) -> Result<Condition, ParseError> {
        let mut failures = Vec::new();
        match self.attempt(Self::parse_simple_condition) {
            Ok(inner) => return Ok(Condition::simple(inner)),
            Err(err) => failures.push(err),
        }
        match self.attempt(Self::parse_paren_condition) {
            Ok(condition) => return Ok(condition),
            Err(err) => failures.push(err),
        }
        Err(ParseError::merge(failures))
    }

    /// Parses `( condition )`. The parentheses are not represented in the
    /// tree; grouping survives through the operand structure.
    fn parse_paren_condition(&mut self) -> Result<Condition, ParseError> {
        self.expect_kind(&TokenKind::LeftParen)?;
        let inner = self.parse_condition()?;
        self.expect_kind(&TokenKind::RightParen)?;
        Ok(inner)
    }

    /// Parses a simple condition by ordered trial parsing.
    pub(crate) fn parse_simple_condition(&mut self) -> Result<SimpleCondition, ParseError> {
        // Alternatives in the order written in the grammar. Earlier
        // alternatives shadow later ones when both could match.
        let alternatives: [fn(&mut Self) -> Result<SimpleCondition, ParseError>; 9] = [
            Self::parse_date_macro_condition,
            Self::parse_exists_condition,
            Self::parse_comparison_condition,
            Self::parse_between_condition,
            Self::parse_like_condition,
            Self::parse_in_condition,
            Self::parse_null_check,
            Self::parse_empty_check,
            Self::parse_member_of_condition,
        ];

        let mut failures = Vec::new();
        for alternative in alternatives {
            match self.attempt(alternative) {
                Ok(condition) => return Ok(condition),
                Err(err) => failures.push(err),
            }
        }
        Err(ParseError::merge(failures))
    }

    /// Parses one of the date macro conditions (`@BETWEEN`, `@DATEBEFORE`,
    /// `@DATEAFTER`, `@DATEEQUALS`, `@TODAY`).
    fn parse_date_macro_condition(&mut self) -> Result<SimpleCondition, ParseError> {
        let kind = self.peek_kind(0);
        let TokenKind::Macro(macro_kind) = kind else {
            return Err(self.unexpected(date_macro_starts()));
        };

        match macro_kind {
            MacroKind::Between => {
                self.advance();
                self.expect_kind(&TokenKind::LeftParen)?;
                let target = self.parse_path()?;
                self.expect_kind(&TokenKind::Comma)?;
                let lo = self.parse_scalar_expr()?;
                self.expect_kind(&TokenKind::Comma)?;
                let hi = self.parse_scalar_expr()?;
                self.expect_kind(&TokenKind::Comma)?;
                // Units are written in lowercase and collide with the
                // date-part keywords (day, hour, ...), so this goes through
                // the keyword-as-name rule.
                let (unit, _) = self.expect_name()?;
                self.expect_kind(&TokenKind::RightParen)?;
                Ok(SimpleCondition::DateBetween {
                    target,
                    lo,
                    hi,
                    unit,
                })
            }
            MacroKind::DateBefore | MacroKind::DateAfter | MacroKind::DateEquals => {
                self.advance();
                self.expect_kind(&TokenKind::LeftParen)?;
                let target = self.parse_path()?;
                self.expect_kind(&TokenKind::Comma)?;
                let value = self.parse_scalar_expr()?;
                self.expect_kind(&TokenKind::RightParen)?;
                Ok(match macro_kind {
                    MacroKind::DateBefore => SimpleCondition::DateBefore { target, value },
                    MacroKind::DateAfter => SimpleCondition::DateAfter { target, value },
                    _ => SimpleCondition::DateEquals { target, value },
                })
            }
            MacroKind::Today => {
                self.advance();
                self.expect_kind(&TokenKind::LeftParen)?;
                let target = self.parse_path()?;
                self.expect_kind(&TokenKind::RightParen)?;
                Ok(SimpleCondition::DateToday { target })
            }
            // @ENUM is a scalar leaf, not a condition head.
            MacroKind::Enum => Err(self.unexpected(date_macro_starts())),
        }
    }

    /// Parses `(NOT)? EXISTS (subquery)`.
    fn parse_exists_condition(&mut self) -> Result<SimpleCondition, ParseError> {
        let not = self.eat_keyword(Keyword::Not);
        self.expect_keyword(Keyword::Exists)?;
        let subquery = self.parse_subquery()?;
        Ok(SimpleCondition::Exists {
            not,
            subquery: Box::new(subquery),
        })
    }

    /// Parses `left op right`.
    fn parse_comparison_condition(&mut self) -> Result<SimpleCondition, ParseError> {
        let left = self.parse_scalar_expr()?;
        let op = self.parse_comparison_op()?;
        let right = self.parse_scalar_expr()?;
        Ok(SimpleCondition::Comparison { left, op, right })
    }

    /// Parses a comparison operator token.
    fn parse_comparison_op(&mut self) -> Result<ComparisonOp, ParseError> {
        let kind = self.peek_kind(0);
        let op = match kind {
            TokenKind::Eq => ComparisonOp::Eq,
            TokenKind::NotEq => ComparisonOp::NotEq,
            TokenKind::Lt => ComparisonOp::Lt,
            TokenKind::LtEq => ComparisonOp::LtEq,
            TokenKind::Gt => ComparisonOp::Gt,
            TokenKind::GtEq => ComparisonOp::GtEq,
            _ => {
                return Err(self.unexpected(vec![
                    Expected::Symbol("="),
                    Expected::Symbol("<>"),
                    Expected::Symbol("<"),
                    Expected::Symbol("<="),
                    Expected::Symbol(">"),
                    Expected::Symbol(">="),
                ]));
            }
        };
        self.advance();
        Ok(op)
    }

    /// Parses `target (NOT)? BETWEEN lo AND hi`.
    fn parse_between_condition(&mut self) -> Result<SimpleCondition, ParseError> {
        let target = self.parse_scalar_expr()?;
        let not = self.eat_keyword(Keyword::Not);
        self.expect_keyword(Keyword::Between)?;
        let lo = self.parse_scalar_expr()?;
        self.expect_keyword(Keyword::And)?;
        let hi = self.parse_scalar_expr()?;
        Ok(SimpleCondition::Between {
            not,
            target,
            lo,
            hi,
        })
    }

    /// Parses `target (NOT)? LIKE pattern (ESCAPE 'c')?`.
    fn parse_like_condition(&mut self) -> Result<SimpleCondition, ParseError> {
        let target = self.parse_scalar_expr()?;
        let not = self.eat_keyword(Keyword::Not);
        self.expect_keyword(Keyword::Like)?;
        let pattern = self.parse_scalar_expr()?;
        let escape = if self.eat_keyword(Keyword::Escape) {
            let kind = self.peek_kind(0);
            match kind {
                TokenKind::String(text) => {
                    self.advance();
                    Some(text)
                }
                _ => return Err(self.unexpected(vec![Expected::StringLiteral])),
            }
        } else {
            None
        };
        Ok(SimpleCondition::Like {
            not,
            target,
            pattern,
            escape,
        })
    }

    /// Parses `target (NOT)? IN (items | subquery)` or `target (NOT)? IN param`.
    fn parse_in_condition(&mut self) -> Result<SimpleCondition, ParseError> {
        let target = self.parse_scalar_expr()?;
        let not = self.eat_keyword(Keyword::Not);
        self.expect_keyword(Keyword::In)?;

        let kind = self.peek_kind(0);
        let rhs = match kind {
            TokenKind::LeftParen => {
                if matches!(self.peek_kind(1), TokenKind::Keyword(Keyword::Select)) {
                    InRhs::Subquery(Box::new(self.parse_subquery()?))
                } else {
                    self.advance();
                    let mut items = vec![self.parse_scalar_expr()?];
                    while self.check(&TokenKind::Comma) {
                        self.advance();
                        items.push(self.parse_scalar_expr()?);
                    }
                    self.expect_kind(&TokenKind::RightParen)?;
                    InRhs::List(items)
                }
            }
            TokenKind::PositionalParam(index) => {
                self.advance();
                InRhs::Parameter(Parameter::Positional(index))
            }
            TokenKind::NamedParam(name) => {
                self.advance();
                InRhs::Parameter(Parameter::Named(name))
            }
            TokenKind::ContextParam(name) => {
                self.advance();
                InRhs::Parameter(Parameter::Context(name))
            }
            _ => {
                return Err(self.unexpected(vec![Expected::Symbol("("), Expected::Parameter]));
            }
        };

        Ok(SimpleCondition::In { not, target, rhs })
    }

    /// Parses `target IS (NOT)? NULL`.
    fn parse_null_check(&mut self) -> Result<SimpleCondition, ParseError> {
        let target = self.parse_scalar_expr()?;
        self.expect_keyword(Keyword::Is)?;
        let not = self.eat_keyword(Keyword::Not);
        self.expect_keyword(Keyword::Null)?;
        Ok(SimpleCondition::NullCheck { not, target })
    }

    /// Parses `target IS (NOT)? EMPTY`.
    fn parse_empty_check(&mut self) -> Result<SimpleCondition, ParseError> {
        let target = self.parse_scalar_expr()?;
        self.expect_keyword(Keyword::Is)?;
        let not = self.eat_keyword(Keyword::Not);
        self.expect_keyword(Keyword::Empty)?;
        Ok(SimpleCondition::EmptyCheck { not, target })
    }

    /// Parses `item (NOT)? MEMBER (OF)? collection`.
    fn parse_member_of_condition(&mut self) -> Result<SimpleCondition, ParseError> {
        let item = self.parse_scalar_expr()?;
        let not = self.eat_keyword(Keyword::Not);
        self.expect_keyword(Keyword::Member)?;
        self.eat_keyword(Keyword::Of);
        let collection = self.parse_path()?;
        Ok(SimpleCondition::MemberOf {
            not,
            item,
            collection,
        })
    }
}

/// The expected set reported when no date macro matches.
fn date_macro_starts() -> Vec<Expected> {
    vec![
        Expected::Macro(MacroKind::Between),
        Expected::Macro(MacroKind::DateBefore),
        Expected::Macro(MacroKind::DateAfter),
        Expected::Macro(MacroKind::DateEquals),
        Expected::Macro(MacroKind::Today),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;

    fn parse_condition(input: &str) -> Result<Condition, ParseError> {
        let mut parser = Parser::new(input);
        let condition = parser.parse_condition()?;
        parser.expect_eof()?;
        Ok(condition)
    }

    fn simple(condition: &Condition) -> &SimpleCondition {
        match condition {
            Condition::Simple(inner) => inner,
            other => panic!("expected simple condition, got {other:?}"),
        }
    }

    #[test]
    fn test_comparison() {
        let cond = parse_condition("e.amount > 100").unwrap();
        let SimpleCondition::Comparison { op, .. } = simple(&cond) else {
            panic!("expected comparison");
        };
        assert_eq!(*op, ComparisonOp::Gt);
    }

    #[test]
    fn test_or_and_precedence() {
        // a = 1 OR b = 2 AND c = 3 → Or[a = 1, And[b = 2, c = 3]]
        let cond = parse_condition("e.a = 1 OR e.b = 2 AND e.c = 3").unwrap();
        let Condition::Or(operands) = &cond else {
            panic!("expected OR at the top");
        };
        assert_eq!(operands.len(), 2);
        assert!(matches!(operands[0], Condition::Simple(_)));
        assert!(matches!(&operands[1], Condition::And(inner) if inner.len() == 2));
    }

    #[test]
    fn test_or_operands_keep_source_order() {
        let cond = parse_condition("e.a = 1 OR e.b = 2 OR e.c = 3").unwrap();
        let Condition::Or(operands) = &cond else {
            panic!("expected OR at the top");
        };
        // A single flat list, left-to-right, no reassociation.
        assert_eq!(operands.len(), 3);
        for (operand, field) in operands.iter().zip(["a", "b", "c"]) {
            let SimpleCondition::Comparison { left, .. } = simple(operand) else {
                panic!("expected comparison");
            };
            assert!(matches!(left, Expr::Path(p) if p.fields == vec![String::from(field)]));
        }
    }

    #[test]
    fn test_not_condition() {
        let cond = parse_condition("NOT e.active = TRUE").unwrap();
        assert!(matches!(cond, Condition::Not(_)));
    }

    #[test]
    fn test_parenthesized_condition_groups() {
        let cond = parse_condition("(e.a = 1 OR e.b = 2) AND e.c = 3").unwrap();
        let Condition::And(operands) = &cond else {
            panic!("expected AND at the top");
        };
        assert!(matches!(&operands[0], Condition::Or(inner) if inner.len() == 2));
    }

    #[test]
    fn test_between() {
        let cond = parse_condition("e.amount BETWEEN 10 AND 20").unwrap();
        let SimpleCondition::Between { not, lo, hi, .. } = simple(&cond) else {
            panic!("expected between");
        };
        assert!(!not);
        assert!(matches!(lo, Expr::Literal(crate::ast::Literal::Integer(10))));
        assert!(matches!(hi, Expr::Literal(crate::ast::Literal::Integer(20))));
    }

    #[test]
    fn test_not_between() {
        let cond = parse_condition("e.amount NOT BETWEEN 10 AND 20").unwrap();
        assert!(matches!(
            simple(&cond),
            SimpleCondition::Between { not: true, .. }
        ));
    }

    #[test]
    fn test_like_with_escape() {
        let cond = parse_condition("e.name LIKE 'A!%%' ESCAPE '!'").unwrap();
        let SimpleCondition::Like { escape, .. } = simple(&cond) else {
            panic!("expected like");
        };
        assert_eq!(escape.as_deref(), Some("!"));
    }

    #[test]
    fn test_in_list() {
        let cond = parse_condition("e.status IN ('new', 'open')").unwrap();
        let SimpleCondition::In { rhs, not, .. } = simple(&cond) else {
            panic!("expected in");
        };
        assert!(!not);
        assert!(matches!(rhs, InRhs::List(items) if items.len() == 2));
    }

    #[test]
    fn test_in_parameter() {
        let cond = parse_condition("e.status NOT IN :statuses").unwrap();
        let SimpleCondition::In { rhs, not, .. } = simple(&cond) else {
            panic!("expected in");
        };
        assert!(not);
        assert!(matches!(
            rhs,
            InRhs::Parameter(Parameter::Named(name)) if name == "statuses"
        ));
    }

    #[test]
    fn test_in_subquery() {
        let cond =
            parse_condition("e.id IN (SELECT o.customerId FROM OrderLine o)").unwrap();
        let SimpleCondition::In { rhs, .. } = simple(&cond) else {
            panic!("expected in");
        };
        assert!(matches!(rhs, InRhs::Subquery(_)));
    }

    #[test]
    fn test_null_check_shadows_empty_check() {
        // IS NOT NULL and IS NOT EMPTY share their prefix up to the last
        // keyword; the ordered trials must commit the right alternative.
        let null = parse_condition("e.name IS NOT NULL").unwrap();
        assert!(matches!(
            simple(&null),
            SimpleCondition::NullCheck { not: true, .. }
        ));

        let empty = parse_condition("e.orders IS NOT EMPTY").unwrap();
        assert!(matches!(
            simple(&empty),
            SimpleCondition::EmptyCheck { not: true, .. }
        ));
    }

    #[test]
    fn test_member_of() {
        let cond = parse_condition("e NOT MEMBER OF c.watchers").unwrap();
        let SimpleCondition::MemberOf {
            not, collection, ..
        } = simple(&cond)
        else {
            panic!("expected member-of");
        };
        assert!(not);
        assert_eq!(collection.root, "c");
    }

    #[test]
    fn test_member_without_of() {
        let cond = parse_condition("e MEMBER c.watchers").unwrap();
        assert!(matches!(
            simple(&cond),
            SimpleCondition::MemberOf { not: false, .. }
        ));
    }

    #[test]
    fn test_exists() {
        let cond =
            parse_condition("EXISTS (SELECT o FROM OrderLine o WHERE o.amount > 5)").unwrap();
        assert!(matches!(
            simple(&cond),
            SimpleCondition::Exists { not: false, .. }
        ));
    }

    #[test]
    fn test_not_exists_is_one_condition() {
        // NOT binds to the exists condition, not to a Not wrapper.
        let cond = parse_condition("NOT EXISTS (SELECT o FROM OrderLine o)").unwrap();
        assert!(matches!(
            simple(&cond),
            SimpleCondition::Exists { not: true, .. }
        ));
    }

    #[test]
    fn test_date_macros() {
        let today = parse_condition("@TODAY(e.createdDate)").unwrap();
        let SimpleCondition::DateToday { target } = simple(&today) else {
            panic!("expected @TODAY");
        };
        assert_eq!(target.root, "e");
        assert_eq!(target.fields, vec![String::from("createdDate")]);

        let before = parse_condition("@DATEBEFORE(e.createTs, :start)").unwrap();
        assert!(matches!(simple(&before), SimpleCondition::DateBefore { .. }));

        let between = parse_condition("@BETWEEN(e.createTs, now - 1, now + 1, day)").unwrap();
        let SimpleCondition::DateBetween { unit, .. } = simple(&between) else {
            panic!("expected @BETWEEN");
        };
        assert_eq!(unit, "day");
    }

    #[test]
    fn test_comparison_with_parenthesized_left_operand() {
        // '(' can open either a grouped condition or an arithmetic operand;
        // the simple-condition trial is attempted first and commits here.
        let cond = parse_condition("(e.a + 1) * 2 > e.b").unwrap();
        assert!(matches!(
            simple(&cond),
            SimpleCondition::Comparison { .. }
        ));
    }

    #[test]
    fn test_unsatisfiable_reports_union_of_expected() {
        // A bare path matches no alternative; the reported expected set is
        // the union across every attempted alternative.
        let err = parse_condition("e.a").unwrap_err();
        assert!(err.expected.contains(&Expected::Symbol("=")));
        assert!(err.expected.contains(&Expected::Keyword(Keyword::Between)));
        assert!(err.expected.contains(&Expected::Keyword(Keyword::Like)));
        assert!(err.expected.contains(&Expected::Keyword(Keyword::Is)));
        assert!(err.expected.contains(&Expected::Keyword(Keyword::Member)));
    }

    #[test]
    fn test_enum_macro_in_comparison() {
        let cond = parse_condition("e.status = @ENUM(OrderStatus.PAID)").unwrap();
        let SimpleCondition::Comparison { right, .. } = simple(&cond) else {
            panic!("expected comparison");
        };
        assert!(matches!(
            right,
            Expr::EnumMacro { value } if value == "OrderStatus.PAID"
        ));
    }
}
