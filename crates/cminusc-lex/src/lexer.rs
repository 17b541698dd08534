//! The lexer itself: turns a source string into a stream of [`Token`]s.
//!
//! Constructed with an immutable source string; [`Lexer::next_token`]
//! skips whitespace and comments, then dispatches on the current
//! character. There is no lookahead buffering here — that lives in the
//! parser, which wraps this lexer in its own backtrackable token buffer.

use cminusc_util::Span;

use crate::cursor::Cursor;
use crate::error::{LexError, LexResult};
use crate::token::{Token, TokenKind};

/// Turns a source string into a stream of [`Token`]s, one [`Lexer::next_token`]
/// call at a time.
///
/// # Example
///
/// ```
/// use cminusc_lex::Lexer;
///
/// let mut lexer = Lexer::new("int x;");
/// let tok = lexer.next_token().unwrap();
/// assert_eq!(tok.text, "int");
/// ```
pub struct Lexer<'a> {
    cursor: Cursor<'a>,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer positioned at the start of `source`.
    pub fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
        }
    }

    /// The character the lexer is currently sitting on.
    pub fn current_char(&self) -> char {
        self.cursor.current_char()
    }

    /// The character one position ahead of the current one.
    pub fn peek_char(&self) -> char {
        self.cursor.peek_char(1)
    }

    /// Consumes the current character.
    pub fn advance_char(&mut self) {
        self.cursor.advance_char();
    }

    fn span_from(&self, start_pos: usize, start_line: u32, start_col: u32) -> Span {
        Span::new(start_pos, self.cursor.position(), start_line, start_col)
    }

    /// Skip whitespace and `/* ... */` block comments until neither is at
    /// the cursor. Comments do not nest.
    fn skip_trivia(&mut self) -> LexResult<()> {
        loop {
            match self.cursor.current_char() {
                ' ' | '\t' | '\n' | '\r' => {
                    self.cursor.advance_char();
                }
                '/' if self.cursor.peek_char(1) == '*' => {
                    let start_line = self.cursor.line();
                    let start_col = self.cursor.column();
                    let start_pos = self.cursor.position();
                    self.cursor.advance_char();
                    self.cursor.advance_char();
                    loop {
                        if self.cursor.is_at_end() {
                            return Err(LexError::UnterminatedString {
                                span: self.span_from(start_pos, start_line, start_col),
                            });
                        }
                        if self.cursor.current_char() == '*' && self.cursor.peek_char(1) == '/' {
                            self.cursor.advance_char();
                            self.cursor.advance_char();
                            break;
                        }
                        self.cursor.advance_char();
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Skips whitespace and block comments, then lexes the next token.
    /// Returns a [`TokenKind::Eof`] token (not an error) at end of input,
    /// so callers can loop on `next_token` without special-casing the end.
    ///
    /// # Example
    ///
    /// ```
    /// use cminusc_lex::{Lexer, TokenKind};
    ///
    /// let mut lexer = Lexer::new("42");
    /// let tok = lexer.next_token().unwrap();
    /// assert_eq!(tok.kind, TokenKind::IntLiteral("42".to_string()));
    /// ```
    pub fn next_token(&mut self) -> LexResult<Token> {
        self.skip_trivia()?;

        let start_pos = self.cursor.position();
        let start_line = self.cursor.line();
        let start_col = self.cursor.column();

        let c = self.cursor.current_char();

        if c == '\0' {
            return Ok(Token::new(TokenKind::Eof, "", self.span_from(start_pos, start_line, start_col)));
        }

        // Single-character punctuation.
        let single = match c {
            ',' => Some(TokenKind::Comma),
            '/' => Some(TokenKind::Slash),
            '{' => Some(TokenKind::LBrace),
            '[' => Some(TokenKind::LBracket),
            '(' => Some(TokenKind::LParen),
            '-' => Some(TokenKind::Minus),
            '*' => Some(TokenKind::Star),
            '+' => Some(TokenKind::Plus),
            '}' => Some(TokenKind::RBrace),
            ']' => Some(TokenKind::RBracket),
            ')' => Some(TokenKind::RParen),
            ';' => Some(TokenKind::Semicolon),
            _ => None,
        };
        if let Some(kind) = single {
            self.cursor.advance_char();
            let span = self.span_from(start_pos, start_line, start_col);
            return Ok(Token::new(kind, c.to_string(), span));
        }

        match c {
            '&' => {
                self.cursor.advance_char();
                if self.cursor.current_char() == '&' {
                    self.cursor.advance_char();
                    Ok(Token::new(TokenKind::AndAnd, "&&", self.span_from(start_pos, start_line, start_col)))
                } else {
                    Err(LexError::ExpectedAmpAmp {
                        span: self.span_from(start_pos, start_line, start_col),
                    })
                }
            }
            '|' => {
                self.cursor.advance_char();
                if self.cursor.current_char() == '|' {
                    self.cursor.advance_char();
                    Ok(Token::new(TokenKind::OrOr, "||", self.span_from(start_pos, start_line, start_col)))
                } else {
                    Err(LexError::ExpectedPipePipe {
                        span: self.span_from(start_pos, start_line, start_col),
                    })
                }
            }
            '=' => {
                self.cursor.advance_char();
                if self.cursor.current_char() == '=' {
                    self.cursor.advance_char();
                    Ok(Token::new(TokenKind::EqEq, "==", self.span_from(start_pos, start_line, start_col)))
                } else {
                    Ok(Token::new(TokenKind::Assign, "=", self.span_from(start_pos, start_line, start_col)))
                }
            }
            '>' => {
                self.cursor.advance_char();
                if self.cursor.current_char() == '=' {
                    self.cursor.advance_char();
                    Ok(Token::new(TokenKind::GreaterEq, ">=", self.span_from(start_pos, start_line, start_col)))
                } else {
                    Ok(Token::new(TokenKind::Greater, ">", self.span_from(start_pos, start_line, start_col)))
                }
            }
            '<' => {
                self.cursor.advance_char();
                if self.cursor.current_char() == '=' {
                    self.cursor.advance_char();
                    Ok(Token::new(TokenKind::LessEq, "<=", self.span_from(start_pos, start_line, start_col)))
                } else {
                    Ok(Token::new(TokenKind::Less, "<", self.span_from(start_pos, start_line, start_col)))
                }
            }
            '!' => {
                self.cursor.advance_char();
                if self.cursor.current_char() == '=' {
                    self.cursor.advance_char();
                    Ok(Token::new(TokenKind::NotEq, "!=", self.span_from(start_pos, start_line, start_col)))
                } else {
                    Ok(Token::new(TokenKind::Not, "!", self.span_from(start_pos, start_line, start_col)))
                }
            }
            '"' => self.lex_string(start_pos, start_line, start_col),
            c if c.is_ascii_digit() => Ok(self.lex_number(start_pos, start_line, start_col)),
            c if c.is_ascii_alphabetic() || c == '_' => {
                Ok(self.lex_ident(start_pos, start_line, start_col))
            }
            other => Err(LexError::InvalidToken {
                text: other.to_string(),
                span: self.span_from(start_pos, start_line, start_col),
            }),
        }
    }

    fn lex_string(&mut self, start_pos: usize, start_line: u32, start_col: u32) -> LexResult<Token> {
        self.cursor.advance_char(); // opening quote
        let mut text = String::new();
        loop {
            match self.cursor.current_char() {
                '\0' => {
                    return Err(LexError::UnterminatedString {
                        span: self.span_from(start_pos, start_line, start_col),
                    })
                }
                '\n' => {
                    return Err(LexError::NewlineInString {
                        span: self.span_from(start_pos, start_line, start_col),
                    })
                }
                '"' => {
                    self.cursor.advance_char();
                    break;
                }
                c => {
                    text.push(c);
                    self.cursor.advance_char();
                }
            }
        }
        let span = self.span_from(start_pos, start_line, start_col);
        Ok(Token::new(TokenKind::StringLiteral(text.clone()), text, span))
    }

    fn lex_number(&mut self, start_pos: usize, start_line: u32, start_col: u32) -> Token {
        let mut text = String::new();
        while self.cursor.current_char().is_ascii_digit() {
            text.push(self.cursor.current_char());
            self.cursor.advance_char();
        }
        let mut is_float = false;
        if self.cursor.current_char() == '.' && self.cursor.peek_char(1).is_ascii_digit() {
            is_float = true;
            text.push('.');
            self.cursor.advance_char();
            while self.cursor.current_char().is_ascii_digit() {
                text.push(self.cursor.current_char());
                self.cursor.advance_char();
            }
        }
        let span = self.span_from(start_pos, start_line, start_col);
        let kind = if is_float {
            TokenKind::FloatLiteral(text.clone())
        } else {
            TokenKind::IntLiteral(text.clone())
        };
        Token::new(kind, text, span)
    }

    fn lex_ident(&mut self, start_pos: usize, start_line: u32, start_col: u32) -> Token {
        let mut text = String::new();
        while {
            let c = self.cursor.current_char();
            c.is_ascii_alphanumeric() || c == '_'
        } {
            text.push(self.cursor.current_char());
            self.cursor.advance_char();
        }
        let span = self.span_from(start_pos, start_line, start_col);
        let kind = TokenKind::keyword(&text).unwrap_or_else(|| TokenKind::Ident(text.clone()));
        Token::new(kind, text, span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token().expect("lex error");
            let eof = tok.is_eof();
            out.push(tok.kind);
            if eof {
                break;
            }
        }
        out
    }

    #[test]
    fn single_char_punctuation() {
        assert_eq!(
            kinds(",/ {[(-*+}])"),
            vec![
                TokenKind::Comma,
                TokenKind::Slash,
                TokenKind::LBrace,
                TokenKind::LBracket,
                TokenKind::LParen,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Plus,
                TokenKind::RBrace,
                TokenKind::RBracket,
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn two_char_operators() {
        assert_eq!(
            kinds("&& == >= > <= < != ! ||"),
            vec![
                TokenKind::AndAnd,
                TokenKind::EqEq,
                TokenKind::GreaterEq,
                TokenKind::Greater,
                TokenKind::LessEq,
                TokenKind::Less,
                TokenKind::NotEq,
                TokenKind::Not,
                TokenKind::OrOr,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lone_ampersand_is_fatal() {
        let mut lexer = Lexer::new("&x");
        assert!(matches!(
            lexer.next_token(),
            Err(LexError::ExpectedAmpAmp { .. })
        ));
    }

    #[test]
    fn lone_pipe_is_fatal() {
        let mut lexer = Lexer::new("|x");
        assert!(matches!(
            lexer.next_token(),
            Err(LexError::ExpectedPipePipe { .. })
        ));
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            kinds("int float_var while"),
            vec![
                TokenKind::Int,
                TokenKind::Ident("float_var".to_string()),
                TokenKind::While,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn integer_and_float_literals() {
        assert_eq!(
            kinds("42 3.14 7"),
            vec![
                TokenKind::IntLiteral("42".to_string()),
                TokenKind::FloatLiteral("3.14".to_string()),
                TokenKind::IntLiteral("7".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn trailing_dot_without_digit_is_not_consumed_into_number() {
        // A '.' not followed by a digit is not part of the number; since
        // '.' is otherwise unused in this grammar it is a lexer error.
        let mut lexer = Lexer::new("7.x");
        let first = lexer.next_token().unwrap();
        assert_eq!(first.kind, TokenKind::IntLiteral("7".to_string()));
        assert!(matches!(lexer.next_token(), Err(LexError::InvalidToken { .. })));
    }

    #[test]
    fn string_literal_strips_quotes() {
        let mut lexer = Lexer::new("\"hi\"");
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::StringLiteral("hi".to_string()));
        assert_eq!(tok.text, "hi");
    }

    #[test]
    fn unterminated_string_is_fatal() {
        let mut lexer = Lexer::new("\"abc");
        assert!(matches!(
            lexer.next_token(),
            Err(LexError::UnterminatedString { .. })
        ));
    }

    #[test]
    fn newline_in_string_is_fatal() {
        let mut lexer = Lexer::new("\"abc\ndef\"");
        assert!(matches!(
            lexer.next_token(),
            Err(LexError::NewlineInString { .. })
        ));
    }

    #[test]
    fn block_comments_are_skipped() {
        assert_eq!(
            kinds("int /* comment */ x"),
            vec![TokenKind::Int, TokenKind::Ident("x".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn unterminated_comment_is_fatal() {
        let mut lexer = Lexer::new("/* never closes");
        assert!(matches!(
            lexer.next_token(),
            Err(LexError::UnterminatedString { .. })
        ));
    }

    #[test]
    fn invalid_byte_is_fatal() {
        let mut lexer = Lexer::new("@");
        assert!(matches!(lexer.next_token(), Err(LexError::InvalidToken { .. })));
    }
}
