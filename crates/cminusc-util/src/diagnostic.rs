//! Shared diagnostic vocabulary.
//!
//! Every stage (lexer, parser, emitter) reports failures as its own
//! `thiserror`-derived error enum; this module only fixes the *shape* that
//! all of them are rendered in, so the driver has one place that turns
//! "whichever stage failed" into the two-line stderr diagnostic required
//! by the error handling design: a "Compilation aborted: <stage> error"
//! line followed by a "-> <message>" line.

use std::fmt;

/// Which pipeline stage produced a fatal error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Lexer,
    Parser,
    Emitter,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Lexer => "lexer",
            Stage::Parser => "parser",
            Stage::Emitter => "emitter",
        };
        f.write_str(name)
    }
}

/// Print the standard two-line fatal diagnostic to stderr.
pub fn report_fatal(stage: Stage, message: impl fmt::Display) {
    eprintln!("Compilation aborted: {stage} error");
    eprintln!("-> {message}");
}
