//! Expression and condition AST types.

use serde::{Deserialize, Serialize};

use crate::lexer::Span;

use super::statement::Query;

/// A dotted navigation from an alias through entity fields.
///
/// Zero fields means a bare identification variable (`e` alone).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    /// The root identification variable.
    pub root: String,
    /// Field names navigated from the root, in source order.
    pub fields: Vec<String>,
    /// Source span of the whole path.
    pub span: Span,
}

impl Path {
    /// Creates a path from a root alias and field names.
    #[must_use]
    pub fn new(root: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            root: root.into(),
            fields,
            span: Span::default(),
        }
    }

    /// Creates a bare identification variable (no fields).
    #[must_use]
    pub fn variable(root: impl Into<String>) -> Self {
        Self::new(root, Vec::new())
    }

    /// Returns true if this is a bare identification variable.
    #[must_use]
    pub fn is_variable(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A literal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    /// Integer literal.
    Integer(i64),
    /// Float literal.
    Float(f64),
    /// String literal.
    String(String),
    /// Boolean literal.
    Boolean(bool),
    /// NULL literal.
    Null,
}

/// A query parameter placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parameter {
    /// Positional parameter `?N`.
    Positional(u32),
    /// Named parameter `:name`.
    Named(String),
    /// Context parameter `${name}`, resolved by the caller's environment.
    Context(String),
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    /// Returns the source representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl ComparisonOp {
    /// Returns the canonical source representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
        }
    }
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    /// Returns the function name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }
}

/// Date parts accepted by EXTRACT and the date macros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatePart {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl DatePart {
    /// Returns the keyword for this date part.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Year => "YEAR",
            Self::Month => "MONTH",
            Self::Day => "DAY",
            Self::Hour => "HOUR",
            Self::Minute => "MINUTE",
            Self::Second => "SECOND",
        }
    }
}

/// The test of one WHEN arm of a CASE expression.
///
/// Searched CASE arms test a condition; simple CASE arms compare the operand
/// against a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CaseTest {
    /// Searched form: `CASE WHEN condition THEN ...`.
    Cond(Condition),
    /// Simple form: `CASE operand WHEN value THEN ...`.
    Value(Expr),
}

/// One WHEN/THEN arm of a CASE expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseWhen {
    /// The arm's test.
    pub test: CaseTest,
    /// The result when the test matches.
    pub then: Expr,
}

/// A scalar expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// A path expression (or bare identification variable).
    Path(Path),

    /// A literal value.
    Literal(Literal),

    /// A parameter placeholder.
    Parameter(Parameter),

    /// An aggregate invocation, e.g. `COUNT(DISTINCT e.city)`.
    Aggregate {
        /// The aggregate function.
        function: AggregateFunction,
        /// Whether DISTINCT was specified.
        distinct: bool,
        /// The argument expression.
        argument: Box<Expr>,
    },

    /// A generic extension-function call, e.g. `CONCAT(a, b)`.
    Function {
        /// The function name as written (case preserved).
        name: String,
        /// The arguments in source order.
        args: Vec<Expr>,
    },

    /// `COALESCE(a, b, ...)` — at least two arguments.
    Coalesce(Vec<Expr>),

    /// `NULLIF(a, b)`.
    NullIf(Box<Expr>, Box<Expr>),

    /// `CAST(expr AS type)`.
    Cast {
        /// The expression being cast.
        expr: Box<Expr>,
        /// The target type name.
        ty: String,
    },

    /// `EXTRACT(part FROM expr)`.
    Extract {
        /// The date part extracted.
        part: DatePart,
        /// The source expression.
        source: Box<Expr>,
    },

    /// `TRIM(expr)`.
    Trim(Box<Expr>),

    /// A CASE expression (simple or searched).
    Case {
        /// The operand of a simple CASE, absent for the searched form.
        operand: Option<Box<Expr>>,
        /// The WHEN/THEN arms in source order.
        whens: Vec<CaseWhen>,
        /// The ELSE result.
        otherwise: Option<Box<Expr>>,
    },

    /// `NEW com.acme.Dto(args...)` constructor item.
    Constructor {
        /// The dotted class name as written.
        class: String,
        /// Constructor arguments in source order.
        args: Vec<Expr>,
    },

    /// `@ENUM(Type.VALUE)` — the dotted value is kept as raw text because it
    /// is resolved by a downstream consumer, not by the parser.
    EnumMacro {
        /// The dotted enum value text.
        value: String,
    },

    /// A binary arithmetic expression.
    Arith {
        /// Left operand.
        left: Box<Expr>,
        /// Operator.
        op: ArithOp,
        /// Right operand.
        right: Box<Expr>,
    },

    /// Unary minus.
    Neg(Box<Expr>),

    /// A parenthesized expression.
    Paren(Box<Expr>),

    /// A parenthesized subquery used as a value.
    Subquery(Box<Query>),
}

impl Expr {
    /// Creates a path expression.
    #[must_use]
    pub fn path(root: impl Into<String>, fields: &[&str]) -> Self {
        Self::Path(Path::new(
            root,
            fields.iter().map(|f| String::from(*f)).collect(),
        ))
    }

    /// Creates a bare identification variable.
    #[must_use]
    pub fn variable(root: impl Into<String>) -> Self {
        Self::Path(Path::variable(root))
    }

    /// Creates an integer literal.
    #[must_use]
    pub const fn integer(value: i64) -> Self {
        Self::Literal(Literal::Integer(value))
    }

    /// Creates a string literal.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Literal(Literal::String(value.into()))
    }

    /// Creates a boolean literal.
    #[must_use]
    pub const fn boolean(value: bool) -> Self {
        Self::Literal(Literal::Boolean(value))
    }

    /// Creates a named parameter.
    #[must_use]
    pub fn named_param(name: impl Into<String>) -> Self {
        Self::Parameter(Parameter::Named(name.into()))
    }
}

/// The right-hand side of an IN condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InRhs {
    /// A parenthesized item list.
    List(Vec<Expr>),
    /// A parenthesized subquery.
    Subquery(Box<Query>),
    /// A single parameter holding the whole list.
    Parameter(Parameter),
}

/// A boolean condition tree.
///
/// Left-to-right source order is preserved in the operand lists; the parser
/// never reassociates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// OR of two or more operands.
    Or(Vec<Condition>),
    /// AND of two or more operands.
    And(Vec<Condition>),
    /// Negation.
    Not(Box<Condition>),
    /// A simple condition leaf.
    Simple(Box<SimpleCondition>),
}

impl Condition {
    /// Wraps a simple condition.
    #[must_use]
    pub fn simple(inner: SimpleCondition) -> Self {
        Self::Simple(Box::new(inner))
    }
}

/// A simple (non-composite) condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimpleCondition {
    /// `left op right`.
    Comparison {
        left: Expr,
        op: ComparisonOp,
        right: Expr,
    },

    /// `target [NOT] BETWEEN lo AND hi`.
    Between {
        not: bool,
        target: Expr,
        lo: Expr,
        hi: Expr,
    },

    /// `target [NOT] IN (...)` or `target [NOT] IN :param`.
    In {
        not: bool,
        target: Expr,
        rhs: InRhs,
    },

    /// `target [NOT] LIKE pattern [ESCAPE 'c']`.
    Like {
        not: bool,
        target: Expr,
        pattern: Expr,
        escape: Option<String>,
    },

    /// `target IS [NOT] NULL`.
    NullCheck { not: bool, target: Expr },

    /// `target IS [NOT] EMPTY`.
    EmptyCheck { not: bool, target: Expr },

    /// `item [NOT] MEMBER [OF] collection`.
    MemberOf {
        not: bool,
        item: Expr,
        collection: Path,
    },

    /// `[NOT] EXISTS (subquery)`.
    Exists { not: bool, subquery: Box<Query> },

    /// `@BETWEEN(target, lo, hi, unit)`.
    DateBetween {
        target: Path,
        lo: Expr,
        hi: Expr,
        unit: String,
    },

    /// `@DATEBEFORE(target, value)`.
    DateBefore { target: Path, value: Expr },

    /// `@DATEAFTER(target, value)`.
    DateAfter { target: Path, value: Expr },

    /// `@DATEEQUALS(target, value)`.
    DateEquals { target: Path, value: Expr },

    /// `@TODAY(target)`.
    DateToday { target: Path },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_variable() {
        let p = Path::variable("e");
        assert!(p.is_variable());
        assert_eq!(p.root, "e");
        assert!(p.fields.is_empty());
    }

    #[test]
    fn test_expr_builders() {
        let e = Expr::path("e", &["amount"]);
        assert!(matches!(e, Expr::Path(p) if p.fields == vec![String::from("amount")]));

        let lit = Expr::integer(42);
        assert!(matches!(lit, Expr::Literal(Literal::Integer(42))));
    }

    #[test]
    fn test_comparison_op_as_str() {
        assert_eq!(ComparisonOp::NotEq.as_str(), "<>");
        assert_eq!(ComparisonOp::LtEq.as_str(), "<=");
    }

    #[test]
    fn test_condition_simple() {
        let cond = Condition::simple(SimpleCondition::NullCheck {
            not: false,
            target: Expr::path("e", &["name"]),
        });
        assert!(matches!(cond, Condition::Simple(_)));
    }
}
