//! Query tokenizer implementation.

use super::{Keyword, MacroKind, Span, Token, TokenKind};

/// A lexer that tokenizes query input.
pub struct Lexer<'a> {
    /// The input source code.
    input: &'a str,
    /// The current byte position.
    pos: usize,
    /// The byte position of the start of the current token.
    start: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            start: 0,
        }
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// Returns the next character without advancing.
    fn peek_next(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    /// Advances to the next character and returns it.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Skips whitespace and comments.
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.peek().is_some_and(|c| c.is_whitespace()) {
                self.advance();
            }

            // Single-line comments (-- ...)
            if self.peek() == Some('-') && self.peek_next() == Some('-') {
                self.advance();
                self.advance();
                while self.peek().is_some_and(|c| c != '\n') {
                    self.advance();
                }
                continue;
            }

            // Multi-line comments (/* ... */)
            if self.peek() == Some('/') && self.peek_next() == Some('*') {
                self.advance();
                self.advance();
                loop {
                    match self.advance() {
                        Some('*') if self.peek() == Some('/') => {
                            self.advance();
                            break;
                        }
                        None => break,
                        _ => {}
                    }
                }
                continue;
            }

            break;
        }
    }

    /// Creates a span from start to current position.
    fn make_span(&self) -> Span {
        Span::new(self.start, self.pos)
    }

    /// Creates a token with the current span.
    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.make_span())
    }

    /// Scans an identifier or keyword.
    fn scan_identifier(&mut self) -> Token {
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }

        let text = &self.input[self.start..self.pos];

        if let Some(keyword) = Keyword::from_str(text) {
            self.make_token(TokenKind::Keyword(keyword))
        } else {
            self.make_token(TokenKind::Identifier(String::from(text)))
        }
    }

    /// Scans a number (integer or float).
    fn scan_number(&mut self) -> Token {
        let mut is_float = false;

        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        if self.peek().is_some_and(|c| c == 'e' || c == 'E') {
            is_float = true;
            self.advance();
            if self.peek().is_some_and(|c| c == '+' || c == '-') {
                self.advance();
            }
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let text = &self.input[self.start..self.pos];

        if is_float {
            match text.parse::<f64>() {
                Ok(f) => self.make_token(TokenKind::Float(f)),
                Err(e) => self.make_token(TokenKind::Error(format!("Invalid float: {e}"))),
            }
        } else {
            match text.parse::<i64>() {
                Ok(i) => self.make_token(TokenKind::Integer(i)),
                Err(e) => self.make_token(TokenKind::Error(format!("Invalid integer: {e}"))),
            }
        }
    }

    /// Scans a string literal (single quotes, `''` escapes the quote).
    fn scan_string(&mut self) -> Token {
        self.advance(); // consume opening quote
        let mut value = String::new();

        loop {
            match self.peek() {
                Some('\'') => {
                    if self.peek_next() == Some('\'') {
                        value.push('\'');
                        self.advance();
                        self.advance();
                    } else {
                        break;
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
                None => {
                    return self.make_token(TokenKind::Error(String::from(
                        "Unterminated string literal",
                    )));
                }
            }
        }

        self.advance(); // consume closing quote
        self.make_token(TokenKind::String(value))
    }

    /// Scans a positional parameter (`?N`).
    fn scan_positional_param(&mut self) -> Token {
        self.advance(); // consume ?
        let digits_start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        let digits = &self.input[digits_start..self.pos];
        if digits.is_empty() {
            return self.make_token(TokenKind::Error(String::from(
                "Expected digits after '?' in positional parameter",
            )));
        }
        match digits.parse::<u32>() {
            Ok(n) => self.make_token(TokenKind::PositionalParam(n)),
            Err(e) => self.make_token(TokenKind::Error(format!("Invalid parameter index: {e}"))),
        }
    }

    /// Scans a named parameter (`:name`).
    fn scan_named_param(&mut self) -> Token {
        self.advance(); // consume :
        let name_start = self.pos;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }

        let name = &self.input[name_start..self.pos];
        if name.is_empty() {
            return self.make_token(TokenKind::Error(String::from(
                "Expected name after ':' in named parameter",
            )));
        }
        self.make_token(TokenKind::NamedParam(String::from(name)))
    }

    /// Scans a context parameter (`${name}`); the name may be dotted.
    fn scan_context_param(&mut self) -> Token {
        self.advance(); // consume $
        if self.peek() != Some('{') {
            return self.make_token(TokenKind::Error(String::from(
                "Expected '{' after '$' in context parameter",
            )));
        }
        self.advance(); // consume {
        let name_start = self.pos;
        while self.peek().is_some_and(|c| c != '}') {
            self.advance();
        }
        if self.peek().is_none() {
            return self.make_token(TokenKind::Error(String::from(
                "Unterminated context parameter",
            )));
        }
        let name = String::from(&self.input[name_start..self.pos]);
        self.advance(); // consume }
        if name.is_empty() {
            return self.make_token(TokenKind::Error(String::from("Empty context parameter")));
        }
        self.make_token(TokenKind::ContextParam(name))
    }

    /// Scans a macro keyword (`@NAME`).
    fn scan_macro(&mut self) -> Token {
        self.advance(); // consume @
        let name_start = self.pos;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }

        let name = &self.input[name_start..self.pos];
        match MacroKind::from_name(name) {
            Some(kind) => self.make_token(TokenKind::Macro(kind)),
            None => self.make_token(TokenKind::Error(format!("Unknown macro '@{name}'"))),
        }
    }

    /// Scans the next token.
    #[must_use]
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();
        self.start = self.pos;

        let c = match self.peek() {
            Some(c) => c,
            None => return self.make_token(TokenKind::Eof),
        };

        match c {
            '(' => {
                self.advance();
                self.make_token(TokenKind::LeftParen)
            }
            ')' => {
                self.advance();
                self.make_token(TokenKind::RightParen)
            }
            ',' => {
                self.advance();
                self.make_token(TokenKind::Comma)
            }
            '.' => {
                self.advance();
                self.make_token(TokenKind::Dot)
            }
            '+' => {
                self.advance();
                self.make_token(TokenKind::Plus)
            }
            '-' => {
                self.advance();
                self.make_token(TokenKind::Minus)
            }
            '*' => {
                self.advance();
                self.make_token(TokenKind::Star)
            }
            '/' => {
                self.advance();
                self.make_token(TokenKind::Slash)
            }
            '=' => {
                self.advance();
                self.make_token(TokenKind::Eq)
            }
            '<' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    self.make_token(TokenKind::LtEq)
                } else if self.peek() == Some('>') {
                    self.advance();
                    self.make_token(TokenKind::NotEq)
                } else {
                    self.make_token(TokenKind::Lt)
                }
            }
            '>' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    self.make_token(TokenKind::GtEq)
                } else {
                    self.make_token(TokenKind::Gt)
                }
            }
            '!' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    self.make_token(TokenKind::NotEq)
                } else {
                    self.make_token(TokenKind::Error(String::from("Unexpected character: !")))
                }
            }
            '?' => self.scan_positional_param(),
            ':' => self.scan_named_param(),
            '$' => self.scan_context_param(),
            '@' => self.scan_macro(),
            '\'' => self.scan_string(),
            c if c.is_ascii_digit() => self.scan_number(),
            c if c.is_alphabetic() || c == '_' => self.scan_identifier(),
            _ => {
                self.advance();
                self.make_token(TokenKind::Error(format!("Unexpected character: {c}")))
            }
        }
    }

    /// Tokenizes the entire input and returns all tokens.
    #[must_use]
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.is_eof();
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(input: &str) -> Vec<Token> {
        Lexer::new(input).tokenize()
    }

    fn token_kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_empty_input() {
        let tokens = tokenize("");
        assert_eq!(tokens.len(), 1);
        assert!(matches!(tokens[0].kind, TokenKind::Eof));
    }

    #[test]
    fn test_whitespace_only() {
        let tokens = tokenize("   \n\t  ");
        assert_eq!(tokens.len(), 1);
        assert!(matches!(tokens[0].kind, TokenKind::Eof));
    }

    #[test]
    fn test_single_line_comment() {
        assert_eq!(
            token_kinds("SELECT -- comment\nFROM"),
            vec![
                TokenKind::Keyword(Keyword::Select),
                TokenKind::Keyword(Keyword::From),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_multi_line_comment() {
        assert_eq!(
            token_kinds("SELECT /* comment */ FROM"),
            vec![
                TokenKind::Keyword(Keyword::Select),
                TokenKind::Keyword(Keyword::From),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_case_insensitive() {
        assert_eq!(
            token_kinds("select FROM wHeRe"),
            vec![
                TokenKind::Keyword(Keyword::Select),
                TokenKind::Keyword(Keyword::From),
                TokenKind::Keyword(Keyword::Where),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(
            token_kinds("foo bar_baz _qux"),
            vec![
                TokenKind::Identifier(String::from("foo")),
                TokenKind::Identifier(String::from("bar_baz")),
                TokenKind::Identifier(String::from("_qux")),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            token_kinds("42 3.14 2.5e-3"),
            vec![
                TokenKind::Integer(42),
                TokenKind::Float(3.14),
                TokenKind::Float(2.5e-3),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            token_kinds("'hello' 'it''s'"),
            vec![
                TokenKind::String(String::from("hello")),
                TokenKind::String(String::from("it's")),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let kinds = token_kinds("'oops");
        assert!(matches!(kinds[0], TokenKind::Error(_)));
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            token_kinds("= <> != < <= > >= + - * /"),
            vec![
                TokenKind::Eq,
                TokenKind::NotEq,
                TokenKind::NotEq,
                TokenKind::Lt,
                TokenKind::LtEq,
                TokenKind::Gt,
                TokenKind::GtEq,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_positional_parameter() {
        assert_eq!(
            token_kinds("?1 ?42"),
            vec![
                TokenKind::PositionalParam(1),
                TokenKind::PositionalParam(42),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_bare_question_mark_is_error() {
        let kinds = token_kinds("? ");
        assert!(matches!(kinds[0], TokenKind::Error(_)));
    }

    #[test]
    fn test_named_parameter() {
        assert_eq!(
            token_kinds(":name :user_id"),
            vec![
                TokenKind::NamedParam(String::from("name")),
                TokenKind::NamedParam(String::from("user_id")),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_context_parameter() {
        assert_eq!(
            token_kinds("${session.userId}"),
            vec![
                TokenKind::ContextParam(String::from("session.userId")),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_macros() {
        assert_eq!(
            token_kinds("@BETWEEN @dateBefore @TODAY @ENUM"),
            vec![
                TokenKind::Macro(MacroKind::Between),
                TokenKind::Macro(MacroKind::DateBefore),
                TokenKind::Macro(MacroKind::Today),
                TokenKind::Macro(MacroKind::Enum),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unknown_macro_is_error() {
        let kinds = token_kinds("@FOO");
        assert!(matches!(kinds[0], TokenKind::Error(_)));
    }

    #[test]
    fn test_simple_select() {
        let query = "SELECT e FROM Order e WHERE e.amount > 100";
        assert_eq!(
            token_kinds(query),
            vec![
                TokenKind::Keyword(Keyword::Select),
                TokenKind::Identifier(String::from("e")),
                TokenKind::Keyword(Keyword::From),
                TokenKind::Keyword(Keyword::Order),
                TokenKind::Identifier(String::from("e")),
                TokenKind::Keyword(Keyword::Where),
                TokenKind::Identifier(String::from("e")),
                TokenKind::Dot,
                TokenKind::Identifier(String::from("amount")),
                TokenKind::Gt,
                TokenKind::Integer(100),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_span_tracking() {
        let tokens = tokenize("SELECT id");
        assert_eq!(tokens[0].span, Span::new(0, 6));
        assert_eq!(tokens[1].span, Span::new(7, 9));
    }
}
