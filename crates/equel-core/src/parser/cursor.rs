//! Lookahead cursor over the token stream.
//!
//! Tokens are pulled from the lexer on demand and buffered, so the cursor
//! supports unbounded `peek` and unlimited backtracking via [`Mark`]s.

use crate::lexer::{Lexer, Token, TokenKind};

/// A saved cursor position that can be restored, enabling backtracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark(usize);

/// A cursor over a lazily tokenized input.
pub struct TokenCursor<'a> {
    lexer: Lexer<'a>,
    buffer: Vec<Token>,
    pos: usize,
}

impl<'a> TokenCursor<'a> {
    /// Creates a cursor for the given input.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self {
            lexer: Lexer::new(input),
            buffer: Vec::new(),
            pos: 0,
        }
    }

    /// Ensures the buffer holds the token at `index` (or ends at EOF).
    fn fill_to(&mut self, index: usize) {
        while self.buffer.len() <= index {
            if self.buffer.last().is_some_and(Token::is_eof) {
                break;
            }
            let token = self.lexer.next_token();
            self.buffer.push(token);
        }
    }

    /// Returns the token `k` positions ahead without consuming.
    ///
    /// Peeking beyond end of input returns the EOF token, never fails.
    pub fn peek_token(&mut self, k: usize) -> &Token {
        self.fill_to(self.pos + k);
        let last = self.buffer.len() - 1;
        let index = if self.pos + k < last { self.pos + k } else { last };
        &self.buffer[index]
    }

    /// Returns the kind of the token `k` positions ahead without consuming.
    pub fn peek(&mut self, k: usize) -> &TokenKind {
        &self.peek_token(k).kind
    }

    /// Returns the current token without consuming.
    pub fn current(&mut self) -> &Token {
        self.peek_token(0)
    }

    /// Consumes and returns the current token. EOF is never consumed.
    pub fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if !token.is_eof() {
            self.pos += 1;
        }
        token
    }

    /// Establishes a checkpoint at the current position.
    #[must_use]
    pub const fn mark(&self) -> Mark {
        Mark(self.pos)
    }

    /// Restores a previously established checkpoint.
    pub fn rewind(&mut self, mark: Mark) {
        self.pos = mark.0;
    }

    /// Returns the end offset of the last consumed token (0 if none).
    #[must_use]
    pub fn consumed_end(&self) -> usize {
        if self.pos == 0 {
            0
        } else {
            self.buffer[self.pos - 1].span.end
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Keyword;

    #[test]
    fn test_peek_does_not_consume() {
        let mut cursor = TokenCursor::new("SELECT e FROM");
        assert_eq!(cursor.peek(0), &TokenKind::Keyword(Keyword::Select));
        assert_eq!(cursor.peek(2), &TokenKind::Keyword(Keyword::From));
        assert_eq!(cursor.peek(0), &TokenKind::Keyword(Keyword::Select));
    }

    #[test]
    fn test_peek_past_end_returns_eof() {
        let mut cursor = TokenCursor::new("SELECT");
        assert_eq!(cursor.peek(5), &TokenKind::Eof);
        assert_eq!(cursor.peek(100), &TokenKind::Eof);
    }

    #[test]
    fn test_advance() {
        let mut cursor = TokenCursor::new("SELECT e");
        assert_eq!(
            cursor.advance().kind,
            TokenKind::Keyword(Keyword::Select)
        );
        assert_eq!(
            cursor.advance().kind,
            TokenKind::Identifier(String::from("e"))
        );
        assert_eq!(cursor.advance().kind, TokenKind::Eof);
        // EOF is sticky
        assert_eq!(cursor.advance().kind, TokenKind::Eof);
    }

    #[test]
    fn test_mark_and_rewind() {
        let mut cursor = TokenCursor::new("SELECT e FROM Entity");
        let mark = cursor.mark();
        cursor.advance();
        cursor.advance();
        assert_eq!(cursor.peek(0), &TokenKind::Keyword(Keyword::From));
        cursor.rewind(mark);
        assert_eq!(cursor.peek(0), &TokenKind::Keyword(Keyword::Select));
    }

    #[test]
    fn test_consumed_end() {
        let mut cursor = TokenCursor::new("SELECT e");
        assert_eq!(cursor.consumed_end(), 0);
        cursor.advance();
        assert_eq!(cursor.consumed_end(), 6);
        cursor.advance();
        assert_eq!(cursor.consumed_end(), 8);
    }
}
