//! Parser error vocabulary.

use cminusc_lex::LexError;
use cminusc_util::Span;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("lexical error: {0}")]
    Lex(#[from] LexError),

    #[error("Expected {expected} after {context} at {span}")]
    Expected {
        expected: String,
        context: String,
        span: Span,
    },

    #[error("Expected an item (function or declaration) at {span}")]
    ExpectedItem { span: Span },

    #[error("Expected a statement at {span}")]
    ExpectedStatement { span: Span },

    #[error("Expected an expression at {span}")]
    ExpectedExpression { span: Span },
}

pub type ParseResult<T> = Result<T, ParseError>;
