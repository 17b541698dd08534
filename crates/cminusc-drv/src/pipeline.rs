//! Orchestrates Lexer → Parser → Emitter for one compilation unit.

use cminusc_emit::emit_program;
use cminusc_par::Parser;

use crate::cli::Cli;
use crate::error::CminuscError;

pub fn run(cli: &Cli) -> Result<(), CminuscError> {
    log::debug!("reading source from {}", cli.input.display());
    let source = std::fs::read_to_string(&cli.input).map_err(|e| {
        CminuscError::Io(format!("could not read '{}': {e}", cli.input.display()))
    })?;

    log::debug!("parsing {} bytes", source.len());
    let program = Parser::new(&source).parse_program()?;

    if cli.emit_ast {
        println!("{}", program.pretty_print());
        return Ok(());
    }

    log::debug!("emitting assembly to {}", cli.output.display());
    emit_program(&program, &cli.output)?;
    log::info!("wrote {}", cli.output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_source(dir: &tempfile::TempDir, name: &str, text: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(text.as_bytes()).unwrap();
        path
    }

    #[test]
    fn compiles_a_valid_source_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_source(&dir, "in.cm", "int main(void) { return 0; }");
        let output = dir.path().join("out.asm");
        let cli = Cli {
            input,
            output: output.clone(),
            verbose: false,
            emit_ast: false,
        };
        run(&cli).expect("compilation should succeed");
        let asm = std::fs::read_to_string(&output).unwrap();
        assert!(asm.contains("main:"));
    }

    #[test]
    fn emit_ast_flag_skips_emission() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_source(&dir, "in.cm", "int main(void) { return 0; }");
        let output = dir.path().join("out.asm");
        let cli = Cli {
            input,
            output: output.clone(),
            verbose: false,
            emit_ast: true,
        };
        run(&cli).expect("--emit-ast run should succeed");
        assert!(!output.exists());
    }

    #[test]
    fn lexer_error_is_reported_as_the_lexer_stage_even_though_the_parser_wraps_it() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_source(&dir, "in.cm", "int main(void) { int x; x = @; }");
        let cli = Cli {
            input,
            output: dir.path().join("out.asm"),
            verbose: false,
            emit_ast: false,
        };
        let err = run(&cli).unwrap_err();
        assert_eq!(err.stage(), cminusc_util::Stage::Lexer);
    }

    #[test]
    fn genuine_parse_error_is_reported_as_the_parser_stage() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_source(&dir, "in.cm", "int main(void) { x + 1; }");
        let cli = Cli {
            input,
            output: dir.path().join("out.asm"),
            verbose: false,
            emit_ast: false,
        };
        let err = run(&cli).unwrap_err();
        assert_eq!(err.stage(), cminusc_util::Stage::Parser);
    }

    #[test]
    fn missing_input_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli {
            input: dir.path().join("does-not-exist.cm"),
            output: dir.path().join("out.asm"),
            verbose: false,
            emit_ast: false,
        };
        let err = run(&cli).unwrap_err();
        assert!(matches!(err, CminuscError::Io(_)));
    }
}
