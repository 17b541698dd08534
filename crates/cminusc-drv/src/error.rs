//! Aggregates every stage's error type behind one enum so the driver has
//! a single place to turn "whichever stage failed" into a process exit.

use cminusc_emit::EmitError;
use cminusc_lex::LexError;
use cminusc_par::ParseError;
use cminusc_util::Stage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CminuscError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error("{0}")]
    Io(String),
}

impl CminuscError {
    /// Which pipeline stage this error originated in, for the two-line
    /// stderr diagnostic.
    pub fn stage(&self) -> Stage {
        match self {
            CminuscError::Lex(_) => Stage::Lexer,
            // The parser wraps every lexer error it encounters in
            // `ParseError::Lex`; unwrap that one level so a lexical
            // failure is still reported as a lexer error, not a parser one.
            CminuscError::Parse(ParseError::Lex(_)) => Stage::Lexer,
            CminuscError::Parse(_) => Stage::Parser,
            CminuscError::Emit(_) => Stage::Emitter,
            CminuscError::Io(_) => Stage::Emitter,
        }
    }
}
