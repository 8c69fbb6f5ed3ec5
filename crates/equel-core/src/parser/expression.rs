//! Scalar expression parsing.
//!
//! Arithmetic uses the usual two-level precedence (additive over
//! multiplicative) with left association; everything else is a primary:
//! literals, parameters, paths, aggregates, extension functions, CASE,
//! the `@ENUM` macro, parenthesized expressions and subqueries.

use crate::ast::{
    AggregateFunction, ArithOp, CaseTest, CaseWhen, DatePart, Expr, Literal, Parameter, Query,
};
use crate::lexer::{Keyword, MacroKind, TokenKind};

use super::error::{Expected, ParseError};
use super::parser::Parser;

impl Parser<'_> {
    /// Parses a scalar expression.
    pub(crate) fn parse_scalar_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_additive_expr()
    }

    /// Parses `multiplicative (('+' | '-') multiplicative)*`.
    fn parse_additive_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative_expr()?;
        loop {
            let op = match self.cursor.peek(0) {
                TokenKind::Plus => ArithOp::Add,
                TokenKind::Minus => ArithOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative_expr()?;
            left = Expr::Arith {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    /// Parses `unary (('*' | '/') unary)*`.
    fn parse_multiplicative_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary_expr()?;
        loop {
            let op = match self.cursor.peek(0) {
                TokenKind::Star => ArithOp::Mul,
                TokenKind::Slash => ArithOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary_expr()?;
            left = Expr::Arith {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    /// Parses an optional unary sign before a primary.
    fn parse_unary_expr(&mut self) -> Result<Expr, ParseError> {
        if self.check(&TokenKind::Minus) {
            self.advance();
            let operand = self.parse_unary_expr()?;
            return Ok(Expr::Neg(Box::new(operand)));
        }
        if self.check(&TokenKind::Plus) {
            self.advance();
            return self.parse_unary_expr();
        }
        self.parse_primary_expr()
    }

    /// Parses a primary scalar expression.
    fn parse_primary_expr(&mut self) -> Result<Expr, ParseError> {
        let kind = self.peek_kind(0);
        match kind {
            TokenKind::Integer(value) => {
                self.advance();
                Ok(Expr::Literal(Literal::Integer(value)))
            }
            TokenKind::Float(value) => {
                self.advance();
                Ok(Expr::Literal(Literal::Float(value)))
            }
            TokenKind::String(value) => {
                self.advance();
                Ok(Expr::Literal(Literal::String(value)))
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(Expr::Literal(Literal::Boolean(true)))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(Expr::Literal(Literal::Boolean(false)))
            }
            TokenKind::Keyword(Keyword::Null) => {
                self.advance();
                Ok(Expr::Literal(Literal::Null))
            }

            TokenKind::PositionalParam(index) => {
                self.advance();
                Ok(Expr::Parameter(Parameter::Positional(index)))
            }
            TokenKind::NamedParam(name) => {
                self.advance();
                Ok(Expr::Parameter(Parameter::Named(name)))
            }
            TokenKind::ContextParam(name) => {
                self.advance();
                Ok(Expr::Parameter(Parameter::Context(name)))
            }

            TokenKind::Keyword(Keyword::Count) => self.parse_aggregate_expr(AggregateFunction::Count),
            TokenKind::Keyword(Keyword::Sum) => self.parse_aggregate_expr(AggregateFunction::Sum),
            TokenKind::Keyword(Keyword::Avg) => self.parse_aggregate_expr(AggregateFunction::Avg),
            TokenKind::Keyword(Keyword::Min) => self.parse_aggregate_expr(AggregateFunction::Min),
            TokenKind::Keyword(Keyword::Max) => self.parse_aggregate_expr(AggregateFunction::Max),

            TokenKind::Keyword(Keyword::Coalesce) => self.parse_coalesce_expr(),
            TokenKind::Keyword(Keyword::Nullif) => self.parse_nullif_expr(),
            TokenKind::Keyword(Keyword::Cast) => self.parse_cast_expr(),
            TokenKind::Keyword(Keyword::Extract) => self.parse_extract_expr(),
            TokenKind::Keyword(Keyword::Trim) => self.parse_trim_expr(),
            TokenKind::Keyword(Keyword::Case) => self.parse_case_expr(),

            TokenKind::Macro(MacroKind::Enum) => self.parse_enum_macro(),

            TokenKind::Identifier(_) => {
                if matches!(self.peek_kind(1), TokenKind::LeftParen) {
                    self.parse_function_call()
                } else {
                    Ok(Expr::Path(self.parse_path()?))
                }
            }

            TokenKind::LeftParen => {
                if matches!(self.peek_kind(1), TokenKind::Keyword(Keyword::Select)) {
                    let subquery = self.parse_subquery()?;
                    Ok(Expr::Subquery(Box::new(subquery)))
                } else {
                    self.advance();
                    let inner = self.parse_scalar_expr()?;
                    self.expect_kind(&TokenKind::RightParen)?;
                    Ok(Expr::Paren(Box::new(inner)))
                }
            }

            _ => Err(self.unexpected(scalar_expression_starts())),
        }
    }

    /// Parses `FUNC ( (DISTINCT)? argument )` for an aggregate.
    fn parse_aggregate_expr(&mut self, function: AggregateFunction) -> Result<Expr, ParseError> {
        self.advance();
        self.expect_kind(&TokenKind::LeftParen)?;
        let distinct = self.eat_keyword(Keyword::Distinct);
        let argument = self.parse_scalar_expr()?;
        self.expect_kind(&TokenKind::RightParen)?;
        Ok(Expr::Aggregate {
            function,
            distinct,
            argument: Box::new(argument),
        })
    }

    /// Parses `COALESCE(a, b, ...)`. The grammar requires at least two
    /// arguments, so the first comma is mandatory.
    fn parse_coalesce_expr(&mut self) -> Result<Expr, ParseError> {
        self.advance();
        self.expect_kind(&TokenKind::LeftParen)?;
        let first = self.parse_scalar_expr()?;
        self.expect_kind(&TokenKind::Comma)?;
        let second = self.parse_scalar_expr()?;
        let mut args = vec![first, second];
        while self.check(&TokenKind::Comma) {
            self.advance();
            args.push(self.parse_scalar_expr()?);
        }
        self.expect_kind(&TokenKind::RightParen)?;
        Ok(Expr::Coalesce(args))
    }

    /// Parses `NULLIF(a, b)`.
    fn parse_nullif_expr(&mut self) -> Result<Expr, ParseError> {
        self.advance();
        self.expect_kind(&TokenKind::LeftParen)?;
        let first = self.parse_scalar_expr()?;
        self.expect_kind(&TokenKind::Comma)?;
        let second = self.parse_scalar_expr()?;
        self.expect_kind(&TokenKind::RightParen)?;
        Ok(Expr::NullIf(Box::new(first), Box::new(second)))
    }

    /// Parses `CAST(expr AS type)`.
    fn parse_cast_expr(&mut self) -> Result<Expr, ParseError> {
        self.advance();
        self.expect_kind(&TokenKind::LeftParen)?;
        let expr = self.parse_scalar_expr()?;
        self.expect_keyword(Keyword::As)?;
        let (ty, _) = self.expect_identifier()?;
        self.expect_kind(&TokenKind::RightParen)?;
        Ok(Expr::Cast {
            expr: Box::new(expr),
            ty,
        })
    }

    /// Parses `EXTRACT(part FROM expr)`.
    fn parse_extract_expr(&mut self) -> Result<Expr, ParseError> {
        self.advance();
        self.expect_kind(&TokenKind::LeftParen)?;
        let part = self.parse_date_part()?;
        self.expect_keyword(Keyword::From)?;
        let source = self.parse_scalar_expr()?;
        self.expect_kind(&TokenKind::RightParen)?;
        Ok(Expr::Extract {
            part,
            source: Box::new(source),
        })
    }

    /// Parses a date-part keyword.
    fn parse_date_part(&mut self) -> Result<DatePart, ParseError> {
        let kind = self.peek_kind(0);
        let part = match kind {
            TokenKind::Keyword(Keyword::Year) => DatePart::Year,
            TokenKind::Keyword(Keyword::Month) => DatePart::Month,
            TokenKind::Keyword(Keyword::Day) => DatePart::Day,
            TokenKind::Keyword(Keyword::Hour) => DatePart::Hour,
            TokenKind::Keyword(Keyword::Minute) => DatePart::Minute,
            TokenKind::Keyword(Keyword::Second) => DatePart::Second,
            _ => {
                return Err(self.unexpected(vec![
                    Expected::Keyword(Keyword::Year),
                    Expected::Keyword(Keyword::Month),
                    Expected::Keyword(Keyword::Day),
                    Expected::Keyword(Keyword::Hour),
                    Expected::Keyword(Keyword::Minute),
                    Expected::Keyword(Keyword::Second),
                ]));
            }
        };
        self.advance();
        Ok(part)
    }

    /// Parses `TRIM(expr)`.
    fn parse_trim_expr(&mut self) -> Result<Expr, ParseError> {
        self.advance();
        self.expect_kind(&TokenKind::LeftParen)?;
        let inner = self.parse_scalar_expr()?;
        self.expect_kind(&TokenKind::RightParen)?;
        Ok(Expr::Trim(Box::new(inner)))
    }

    /// Parses a CASE expression, simple or searched.
    ///
    /// The form is decided by whether an operand precedes the first WHEN;
    /// simple arms compare values, searched arms test full conditions.
    fn parse_case_expr(&mut self) -> Result<Expr, ParseError> {
        self.advance();
        let operand = if self.check_keyword(Keyword::When) {
            None
        } else {
            Some(Box::new(self.parse_scalar_expr()?))
        };

        self.expect_keyword(Keyword::When)?;
        let mut whens = Vec::new();
        loop {
            let test = if operand.is_some() {
                CaseTest::Value(self.parse_scalar_expr()?)
            } else {
                CaseTest::Cond(self.parse_condition()?)
            };
            self.expect_keyword(Keyword::Then)?;
            let then = self.parse_scalar_expr()?;
            whens.push(CaseWhen { test, then });
            if !self.eat_keyword(Keyword::When) {
                break;
            }
        }

        let otherwise = if self.eat_keyword(Keyword::Else) {
            Some(Box::new(self.parse_scalar_expr()?))
        } else {
            None
        };
        self.expect_keyword(Keyword::End)?;

        Ok(Expr::Case {
            operand,
            whens,
            otherwise,
        })
    }

    /// Parses `@ENUM(Type.Path.VALUE)`.
    ///
    /// The dotted value is kept as raw text, not decomposed into a path; a
    /// downstream consumer resolves it against the actual enum type.
    fn parse_enum_macro(&mut self) -> Result<Expr, ParseError> {
        self.advance();
        self.expect_kind(&TokenKind::LeftParen)?;
        let (mut value, _) = self.expect_name()?;
        while self.check(&TokenKind::Dot) {
            self.advance();
            let (segment, _) = self.expect_name()?;
            value.push('.');
            value.push_str(&segment);
        }
        self.expect_kind(&TokenKind::RightParen)?;
        Ok(Expr::EnumMacro { value })
    }

    /// Parses a generic extension-function call: `name(args...)`.
    fn parse_function_call(&mut self) -> Result<Expr, ParseError> {
        let (name, _) = self.expect_identifier()?;
        self.expect_kind(&TokenKind::LeftParen)?;
        let mut args = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            args.push(self.parse_scalar_expr()?);
            while self.check(&TokenKind::Comma) {
                self.advance();
                args.push(self.parse_scalar_expr()?);
            }
        }
        self.expect_kind(&TokenKind::RightParen)?;
        Ok(Expr::Function { name, args })
    }

    /// Parses `( SELECT ... )` as a subquery.
    pub(crate) fn parse_subquery(&mut self) -> Result<Query, ParseError> {
        self.expect_kind(&TokenKind::LeftParen)?;
        let query = self.parse_select_query()?;
        self.expect_kind(&TokenKind::RightParen)?;
        Ok(query)
    }
}

/// The token classes that can start a scalar expression, for diagnostics.
fn scalar_expression_starts() -> Vec<Expected> {
    vec![
        Expected::Identifier,
        Expected::NumberLiteral,
        Expected::StringLiteral,
        Expected::Parameter,
        Expected::Symbol("("),
        Expected::Keyword(Keyword::Count),
        Expected::Keyword(Keyword::Sum),
        Expected::Keyword(Keyword::Avg),
        Expected::Keyword(Keyword::Min),
        Expected::Keyword(Keyword::Max),
        Expected::Keyword(Keyword::Case),
        Expected::Keyword(Keyword::Coalesce),
        Expected::Keyword(Keyword::Nullif),
        Expected::Keyword(Keyword::Cast),
        Expected::Keyword(Keyword::Extract),
        Expected::Keyword(Keyword::Trim),
        Expected::Keyword(Keyword::True),
        Expected::Keyword(Keyword::False),
        Expected::Keyword(Keyword::Null),
        Expected::Macro(MacroKind::Enum),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_expr(input: &str) -> Result<Expr, ParseError> {
        let mut parser = Parser::new(input);
        let expr = parser.parse_scalar_expr()?;
        parser.expect_eof()?;
        Ok(expr)
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            parse_expr("42").unwrap(),
            Expr::Literal(Literal::Integer(42))
        );
        assert_eq!(
            parse_expr("'hi'").unwrap(),
            Expr::Literal(Literal::String(String::from("hi")))
        );
        assert_eq!(
            parse_expr("TRUE").unwrap(),
            Expr::Literal(Literal::Boolean(true))
        );
        assert_eq!(parse_expr("NULL").unwrap(), Expr::Literal(Literal::Null));
    }

    #[test]
    fn test_parameters() {
        assert_eq!(
            parse_expr("?1").unwrap(),
            Expr::Parameter(Parameter::Positional(1))
        );
        assert_eq!(
            parse_expr(":id").unwrap(),
            Expr::Parameter(Parameter::Named(String::from("id")))
        );
        assert_eq!(
            parse_expr("${session.userId}").unwrap(),
            Expr::Parameter(Parameter::Context(String::from("session.userId")))
        );
    }

    #[test]
    fn test_arithmetic_precedence() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        let expr = parse_expr("1 + 2 * 3").unwrap();
        let Expr::Arith { op, right, .. } = expr else {
            panic!("expected arithmetic");
        };
        assert_eq!(op, ArithOp::Add);
        assert!(matches!(
            *right,
            Expr::Arith {
                op: ArithOp::Mul,
                ..
            }
        ));
    }

    #[test]
    fn test_arithmetic_left_association() {
        // 10 - 2 - 3 parses as (10 - 2) - 3
        let expr = parse_expr("10 - 2 - 3").unwrap();
        let Expr::Arith { left, op, .. } = expr else {
            panic!("expected arithmetic");
        };
        assert_eq!(op, ArithOp::Sub);
        assert!(matches!(
            *left,
            Expr::Arith {
                op: ArithOp::Sub,
                ..
            }
        ));
    }

    #[test]
    fn test_unary_minus() {
        let expr = parse_expr("-e.balance").unwrap();
        assert!(matches!(expr, Expr::Neg(_)));
    }

    #[test]
    fn test_paren_is_preserved() {
        let expr = parse_expr("(1 + 2) * 3").unwrap();
        let Expr::Arith { left, .. } = expr else {
            panic!("expected arithmetic");
        };
        assert!(matches!(*left, Expr::Paren(_)));
    }

    #[test]
    fn test_path_with_keyword_fields() {
        // Entity attributes may be named after keywords; the path rule
        // accepts them positionally and preserves the source spelling.
        let expr = parse_expr("e.from").unwrap();
        let Expr::Path(path) = expr else {
            panic!("expected path");
        };
        assert_eq!(path.root, "e");
        assert_eq!(path.fields, vec![String::from("from")]);

        let expr = parse_expr("e.order.count").unwrap();
        let Expr::Path(path) = expr else {
            panic!("expected path");
        };
        assert_eq!(
            path.fields,
            vec![String::from("order"), String::from("count")]
        );
    }

    #[test]
    fn test_aggregate_distinct() {
        let expr = parse_expr("COUNT(DISTINCT e.city)").unwrap();
        let Expr::Aggregate {
            function,
            distinct,
            argument,
        } = expr
        else {
            panic!("expected aggregate");
        };
        assert_eq!(function, AggregateFunction::Count);
        assert!(distinct);
        assert!(matches!(*argument, Expr::Path(_)));
    }

    #[test]
    fn test_coalesce_requires_two_arguments() {
        assert!(parse_expr("COALESCE(e.a)").is_err());

        let expr = parse_expr("COALESCE(e.a, e.b, e.c)").unwrap();
        let Expr::Coalesce(args) = expr else {
            panic!("expected coalesce");
        };
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn test_nullif() {
        let expr = parse_expr("NULLIF(e.a, 0)").unwrap();
        assert!(matches!(expr, Expr::NullIf(_, _)));
        assert!(parse_expr("NULLIF(e.a)").is_err());
    }

    #[test]
    fn test_cast() {
        let expr = parse_expr("CAST(e.total AS long)").unwrap();
        let Expr::Cast { ty, .. } = expr else {
            panic!("expected cast");
        };
        assert_eq!(ty, "long");
    }

    #[test]
    fn test_extract() {
        let expr = parse_expr("EXTRACT(YEAR FROM e.createdDate)").unwrap();
        let Expr::Extract { part, .. } = expr else {
            panic!("expected extract");
        };
        assert_eq!(part, DatePart::Year);
    }

    #[test]
    fn test_generic_function() {
        let expr = parse_expr("CONCAT(e.first, ' ', e.last)").unwrap();
        let Expr::Function { name, args } = expr else {
            panic!("expected function");
        };
        assert_eq!(name, "CONCAT");
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn test_searched_case() {
        let expr =
            parse_expr("CASE WHEN e.amount > 100 THEN 'big' ELSE 'small' END").unwrap();
        let Expr::Case {
            operand,
            whens,
            otherwise,
        } = expr
        else {
            panic!("expected case");
        };
        assert!(operand.is_none());
        assert_eq!(whens.len(), 1);
        assert!(matches!(whens[0].test, CaseTest::Cond(_)));
        assert!(otherwise.is_some());
    }

    #[test]
    fn test_simple_case() {
        let expr = parse_expr("CASE e.status WHEN 1 THEN 'new' WHEN 2 THEN 'open' END").unwrap();
        let Expr::Case {
            operand, whens, ..
        } = expr
        else {
            panic!("expected case");
        };
        assert!(operand.is_some());
        assert_eq!(whens.len(), 2);
        assert!(matches!(whens[0].test, CaseTest::Value(_)));
    }

    #[test]
    fn test_enum_macro_keeps_raw_text() {
        let expr = parse_expr("@ENUM(com.acme.OrderStatus.PAID)").unwrap();
        let Expr::EnumMacro { value } = expr else {
            panic!("expected enum macro");
        };
        assert_eq!(value, "com.acme.OrderStatus.PAID");
    }

    #[test]
    fn test_scalar_subquery() {
        let expr = parse_expr("(SELECT MAX(o.amount) FROM OrderLine o)").unwrap();
        assert!(matches!(expr, Expr::Subquery(_)));
    }

    #[test]
    fn test_expected_set_for_missing_expression() {
        let err = parse_expr("").unwrap_err();
        assert!(err.expected.contains(&Expected::Identifier));
        assert!(err.expected.contains(&Expected::Keyword(Keyword::Count)));
        assert!(err.expected.contains(&Expected::Keyword(Keyword::Case)));
    }
}
