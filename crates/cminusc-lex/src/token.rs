//! Token kinds produced by the lexer.

use cminusc_util::Span;

/// A keyword, operator, punctuation mark, or literal recognized by the
/// lexer. Identifiers and literals carry the lexeme text; everything
/// else is identified by its variant alone.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Terminal markers
    Eof,

    // Literals / identifiers
    Ident(String),
    IntLiteral(String),
    FloatLiteral(String),
    StringLiteral(String),

    // Keywords
    Else,
    Exit,
    Float,
    If,
    Int,
    Read,
    Return,
    Void,
    While,
    Write,

    // Operators / punctuation
    AndAnd,
    Assign,
    Comma,
    Slash,
    EqEq,
    GreaterEq,
    Greater,
    LBrace,
    LBracket,
    LParen,
    LessEq,
    Less,
    Minus,
    Star,
    NotEq,
    Not,
    OrOr,
    Plus,
    RBrace,
    RBracket,
    RParen,
    Semicolon,
}

impl TokenKind {
    /// Look up a keyword by its exact spelling; returns `None` for any
    /// identifier that is not one of the fixed reserved words.
    pub fn keyword(text: &str) -> Option<TokenKind> {
        Some(match text {
            "else" => TokenKind::Else,
            "exit" => TokenKind::Exit,
            "float" => TokenKind::Float,
            "if" => TokenKind::If,
            "int" => TokenKind::Int,
            "read" => TokenKind::Read,
            "return" => TokenKind::Return,
            "void" => TokenKind::Void,
            "while" => TokenKind::While,
            "write" => TokenKind::Write,
            _ => return None,
        })
    }
}

/// A lexeme paired with its kind and the span it was scanned from.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}
