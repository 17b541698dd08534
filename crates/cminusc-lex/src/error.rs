//! Lexer error vocabulary.

use cminusc_util::Span;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LexError {
    #[error("Invalid token '{text}' at {span}")]
    InvalidToken { text: String, span: Span },

    #[error("Newline in string literal at {span}")]
    NewlineInString { span: Span },

    #[error("Unterminated string literal at {span}")]
    UnterminatedString { span: Span },

    #[error("Expected '&' to follow '&' at {span}")]
    ExpectedAmpAmp { span: Span },

    #[error("Expected '|' to follow '|' at {span}")]
    ExpectedPipePipe { span: Span },
}

pub type LexResult<T> = Result<T, LexError>;
