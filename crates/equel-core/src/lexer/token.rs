//! Token types for the query lexer.

use super::Span;

/// Query language keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    // Statement heads
    Select,
    Update,
    Delete,

    // Clauses
    From,
    Where,
    Group,
    By,
    Having,
    Order,
    Set,

    // Ordering
    Asc,
    Desc,

    // Joins
    Join,
    Left,
    Inner,
    Outer,
    Fetch,
    On,

    // Declarations
    As,
    In,
    New,

    // Logical operators
    Not,
    And,
    Or,

    // Predicates
    Distinct,
    Between,
    Like,
    Escape,
    Is,
    Null,
    Empty,
    Member,
    Of,
    Exists,

    // Boolean literals
    True,
    False,

    // CASE expressions
    Case,
    When,
    Then,
    Else,
    End,

    // Aggregates
    Count,
    Sum,
    Avg,
    Min,
    Max,

    // Extension functions
    Coalesce,
    Nullif,
    Cast,
    Extract,
    Trim,

    // Date parts (also usable as field names)
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl Keyword {
    /// Attempts to parse a keyword from a string (case-insensitive).
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "SELECT" => Some(Self::Select),
            "UPDATE" => Some(Self::Update),
            "DELETE" => Some(Self::Delete),
            "FROM" => Some(Self::From),
            "WHERE" => Some(Self::Where),
            "GROUP" => Some(Self::Group),
            "BY" => Some(Self::By),
            "HAVING" => Some(Self::Having),
            "ORDER" => Some(Self::Order),
            "SET" => Some(Self::Set),
            "ASC" => Some(Self::Asc),
            "DESC" => Some(Self::Desc),
            "JOIN" => Some(Self::Join),
            "LEFT" => Some(Self::Left),
            "INNER" => Some(Self::Inner),
            "OUTER" => Some(Self::Outer),
            "FETCH" => Some(Self::Fetch),
            "ON" => Some(Self::On),
            "AS" => Some(Self::As),
            "IN" => Some(Self::In),
            "NEW" => Some(Self::New),
            "NOT" => Some(Self::Not),
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            "DISTINCT" => Some(Self::Distinct),
            "BETWEEN" => Some(Self::Between),
            "LIKE" => Some(Self::Like),
            "ESCAPE" => Some(Self::Escape),
            "IS" => Some(Self::Is),
            "NULL" => Some(Self::Null),
            "EMPTY" => Some(Self::Empty),
            "MEMBER" => Some(Self::Member),
            "OF" => Some(Self::Of),
            "EXISTS" => Some(Self::Exists),
            "TRUE" => Some(Self::True),
            "FALSE" => Some(Self::False),
            "CASE" => Some(Self::Case),
            "WHEN" => Some(Self::When),
            "THEN" => Some(Self::Then),
            "ELSE" => Some(Self::Else),
            "END" => Some(Self::End),
            "COUNT" => Some(Self::Count),
            "SUM" => Some(Self::Sum),
            "AVG" => Some(Self::Avg),
            "MIN" => Some(Self::Min),
            "MAX" => Some(Self::Max),
            "COALESCE" => Some(Self::Coalesce),
            "NULLIF" => Some(Self::Nullif),
            "CAST" => Some(Self::Cast),
            "EXTRACT" => Some(Self::Extract),
            "TRIM" => Some(Self::Trim),
            "YEAR" => Some(Self::Year),
            "MONTH" => Some(Self::Month),
            "DAY" => Some(Self::Day),
            "HOUR" => Some(Self::Hour),
            "MINUTE" => Some(Self::Minute),
            "SECOND" => Some(Self::Second),
            _ => None,
        }
    }

    /// Returns the keyword as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::From => "FROM",
            Self::Where => "WHERE",
            Self::Group => "GROUP",
            Self::By => "BY",
            Self::Having => "HAVING",
            Self::Order => "ORDER",
            Self::Set => "SET",
            Self::Asc => "ASC",
            Self::Desc => "DESC",
            Self::Join => "JOIN",
            Self::Left => "LEFT",
            Self::Inner => "INNER",
            Self::Outer => "OUTER",
            Self::Fetch => "FETCH",
            Self::On => "ON",
            Self::As => "AS",
            Self::In => "IN",
            Self::New => "NEW",
            Self::Not => "NOT",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Distinct => "DISTINCT",
            Self::Between => "BETWEEN",
            Self::Like => "LIKE",
            Self::Escape => "ESCAPE",
            Self::Is => "IS",
            Self::Null => "NULL",
            Self::Empty => "EMPTY",
            Self::Member => "MEMBER",
            Self::Of => "OF",
            Self::Exists => "EXISTS",
            Self::True => "TRUE",
            Self::False => "FALSE",
            Self::Case => "CASE",
            Self::When => "WHEN",
            Self::Then => "THEN",
            Self::Else => "ELSE",
            Self::End => "END",
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Coalesce => "COALESCE",
            Self::Nullif => "NULLIF",
            Self::Cast => "CAST",
            Self::Extract => "EXTRACT",
            Self::Trim => "TRIM",
            Self::Year => "YEAR",
            Self::Month => "MONTH",
            Self::Day => "DAY",
            Self::Hour => "HOUR",
            Self::Minute => "MINUTE",
            Self::Second => "SECOND",
        }
    }

    /// Returns true if this keyword may appear as a field name inside a path
    /// expression. Entity attributes may legally be named after these words,
    /// so the path rule accepts them positionally.
    #[must_use]
    pub const fn usable_as_field(&self) -> bool {
        matches!(
            self,
            Self::Year
                | Self::Month
                | Self::Day
                | Self::Hour
                | Self::Minute
                | Self::Second
                | Self::Max
                | Self::Min
                | Self::Sum
                | Self::Avg
                | Self::Count
                | Self::As
                | Self::Member
                | Self::Select
                | Self::From
                | Self::Group
                | Self::Order
        )
    }
}

/// Macro keywords recognized directly by the grammar (`@NAME`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroKind {
    /// `@BETWEEN(path, lo, hi, unit)` — date-range comparison.
    Between,
    /// `@DATEBEFORE(path, value)`.
    DateBefore,
    /// `@DATEAFTER(path, value)`.
    DateAfter,
    /// `@DATEEQUALS(path, value)`.
    DateEquals,
    /// `@TODAY(path)`.
    Today,
    /// `@ENUM(Type.VALUE)` — enum constant reference.
    Enum,
}

impl MacroKind {
    /// Attempts to parse a macro name (without the `@`), case-insensitive.
    #[must_use]
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "BETWEEN" => Some(Self::Between),
            "DATEBEFORE" => Some(Self::DateBefore),
            "DATEAFTER" => Some(Self::DateAfter),
            "DATEEQUALS" => Some(Self::DateEquals),
            "TODAY" => Some(Self::Today),
            "ENUM" => Some(Self::Enum),
            _ => None,
        }
    }

    /// Returns the macro as written in source, including the `@`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Between => "@BETWEEN",
            Self::DateBefore => "@DATEBEFORE",
            Self::DateAfter => "@DATEAFTER",
            Self::DateEquals => "@DATEEQUALS",
            Self::Today => "@TODAY",
            Self::Enum => "@ENUM",
        }
    }
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Integer literal (e.g., 42)
    Integer(i64),
    /// Float literal (e.g., 3.14)
    Float(f64),
    /// String literal (e.g., 'hello')
    String(String),

    // Identifiers, keywords, macros
    /// Identifier (e.g., entity or field name)
    Identifier(String),
    /// Reserved keyword
    Keyword(Keyword),
    /// Macro keyword (`@BETWEEN`, `@ENUM`, ...)
    Macro(MacroKind),

    // Parameters
    /// Positional parameter `?N`
    PositionalParam(u32),
    /// Named parameter `:name`
    NamedParam(String),
    /// Context parameter `${name}`
    ContextParam(String),

    // Operators
    /// =
    Eq,
    /// <> or !=
    NotEq,
    /// <
    Lt,
    /// <=
    LtEq,
    /// >
    Gt,
    /// >=
    GtEq,
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,

    // Delimiters
    /// (
    LeftParen,
    /// )
    RightParen,
    /// ,
    Comma,
    /// .
    Dot,

    // Special
    /// End of input
    Eof,
    /// Invalid/unknown token
    Error(String),
}

impl TokenKind {
    /// Returns a short human-readable description, used in diagnostics.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Integer(n) => format!("integer {n}"),
            Self::Float(f) => format!("float {f}"),
            Self::String(s) => format!("string '{s}'"),
            Self::Identifier(name) => format!("identifier '{name}'"),
            Self::Keyword(kw) => kw.as_str().to_string(),
            Self::Macro(m) => m.as_str().to_string(),
            Self::PositionalParam(n) => format!("?{n}"),
            Self::NamedParam(name) => format!(":{name}"),
            Self::ContextParam(name) => format!("${{{name}}}"),
            Self::Eq => "'='".to_string(),
            Self::NotEq => "'<>'".to_string(),
            Self::Lt => "'<'".to_string(),
            Self::LtEq => "'<='".to_string(),
            Self::Gt => "'>'".to_string(),
            Self::GtEq => "'>='".to_string(),
            Self::Plus => "'+'".to_string(),
            Self::Minus => "'-'".to_string(),
            Self::Star => "'*'".to_string(),
            Self::Slash => "'/'".to_string(),
            Self::LeftParen => "'('".to_string(),
            Self::RightParen => "')'".to_string(),
            Self::Comma => "','".to_string(),
            Self::Dot => "'.'".to_string(),
            Self::Eof => "end of input".to_string(),
            Self::Error(msg) => format!("invalid token ({msg})"),
        }
    }
}

/// A token with its span in the source code.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The location in the source code.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns true if this is an EOF token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Returns the keyword if this is a keyword token.
    #[must_use]
    pub const fn as_keyword(&self) -> Option<Keyword> {
        match &self.kind {
            TokenKind::Keyword(kw) => Some(*kw),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_from_str() {
        assert_eq!(Keyword::from_str("SELECT"), Some(Keyword::Select));
        assert_eq!(Keyword::from_str("select"), Some(Keyword::Select));
        assert_eq!(Keyword::from_str("SeLeCt"), Some(Keyword::Select));
        assert_eq!(Keyword::from_str("FETCH"), Some(Keyword::Fetch));
        assert_eq!(Keyword::from_str("not_a_keyword"), None);
    }

    #[test]
    fn test_keyword_as_str() {
        assert_eq!(Keyword::Select.as_str(), "SELECT");
        assert_eq!(Keyword::Member.as_str(), "MEMBER");
        assert_eq!(Keyword::Coalesce.as_str(), "COALESCE");
    }

    #[test]
    fn test_macro_from_name() {
        assert_eq!(MacroKind::from_name("BETWEEN"), Some(MacroKind::Between));
        assert_eq!(MacroKind::from_name("today"), Some(MacroKind::Today));
        assert_eq!(MacroKind::from_name("ENUM"), Some(MacroKind::Enum));
        assert_eq!(MacroKind::from_name("NOPE"), None);
    }

    #[test]
    fn test_keyword_usable_as_field() {
        assert!(Keyword::Year.usable_as_field());
        assert!(Keyword::Count.usable_as_field());
        assert!(Keyword::From.usable_as_field());
        assert!(!Keyword::Where.usable_as_field());
        assert!(!Keyword::Join.usable_as_field());
    }

    #[test]
    fn test_token_is_eof() {
        let eof = Token::new(TokenKind::Eof, Span::new(0, 0));
        let select = Token::new(TokenKind::Keyword(Keyword::Select), Span::new(0, 6));
        assert!(eof.is_eof());
        assert!(!select.is_eof());
    }

    #[test]
    fn test_token_as_keyword() {
        let select = Token::new(TokenKind::Keyword(Keyword::Select), Span::new(0, 6));
        let plus = Token::new(TokenKind::Plus, Span::new(0, 1));
        assert_eq!(select.as_keyword(), Some(Keyword::Select));
        assert_eq!(plus.as_keyword(), None);
    }
}
