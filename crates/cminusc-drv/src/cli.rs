//! Command-line surface, parsed with `clap`'s derive API.

use std::path::PathBuf;

use clap::Parser as ClapParser;

#[derive(Debug, ClapParser)]
#[command(name = "cminusc", about = "A single-pass C-- to x86-64 NASM compiler")]
pub struct Cli {
    /// Path to the `.cm` source file to compile.
    pub input: PathBuf,

    /// Output assembly path.
    #[arg(short, long, default_value = "a.asm")]
    pub output: PathBuf,

    /// Enable verbose tracing (one line per grammar reduction and matched token).
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the parsed AST and stop before emission; does not write the output file.
    #[arg(long)]
    pub emit_ast: bool,
}
