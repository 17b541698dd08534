//! Buffered, rewindable view over a [`Lexer`]'s token stream.
//!
//! The lexer itself only ever moves forward; backtracking during parsing
//! is implemented here by buffering every token pulled from the lexer in
//! an extensible vector addressed by an integer cursor: `advance` pulls a
//! new token only once the cursor reaches the end of the buffer, and
//! `rewind` moves the cursor backward without discarding anything already
//! buffered.

use cminusc_lex::{LexError, Lexer, Token};

pub struct TokenBuffer<'a> {
    lexer: Lexer<'a>,
    buffer: Vec<Token>,
    position: usize,
}

impl<'a> TokenBuffer<'a> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        Self {
            lexer,
            buffer: Vec::new(),
            position: 0,
        }
    }

    fn ensure_filled(&mut self, index: usize) -> Result<(), LexError> {
        while self.buffer.len() <= index {
            if let Some(last) = self.buffer.last() {
                if last.is_eof() {
                    break;
                }
            }
            let tok = self.lexer.next_token()?;
            self.buffer.push(tok);
        }
        Ok(())
    }

    fn clamped(&self, index: usize) -> usize {
        index.min(self.buffer.len() - 1)
    }

    /// The token the cursor currently sits on, without consuming it.
    pub fn current(&mut self) -> Result<Token, LexError> {
        self.ensure_filled(self.position)?;
        Ok(self.buffer[self.clamped(self.position)].clone())
    }

    /// Advance the cursor by one token, pulling from the lexer if needed.
    /// A no-op once the cursor has reached end-of-input.
    pub fn advance(&mut self) -> Result<(), LexError> {
        self.ensure_filled(self.position)?;
        if !self.buffer[self.clamped(self.position)].is_eof() {
            self.position += 1;
        }
        Ok(())
    }

    /// Entry cursor for a grammar procedure about to attempt an
    /// alternative, to be passed back to [`TokenBuffer::rewind`] on
    /// failure.
    pub fn mark(&self) -> usize {
        self.position
    }

    /// Move the cursor back to a previously recorded mark. Never moves
    /// the cursor forward.
    pub fn rewind(&mut self, mark: usize) {
        debug_assert!(mark <= self.position, "rewind must not move forward");
        self.position = mark;
    }
}
