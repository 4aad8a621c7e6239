//! Symphony Compiler Library
//!
//! Compiles Symphony source text into a quadruple program and plays it on
//! the orchestra VM. The one interface outer layers should build on is
//! [`compile_and_run`]:
//!
//! ```rust
//! let (prints, notes) = symphonyc::compile_and_run(
//!     "program p; print(2 + 3); A();",
//!     None,
//! ).unwrap();
//! assert_eq!(prints, "5");
//! assert_eq!(notes, vec!["A".to_string()]);
//! ```

pub mod builtins;
pub mod codegen;
pub mod config;
pub mod cube;
pub mod directory;
pub mod lexer;
pub mod parser;

pub use codegen::QuadrupleGenerator;
pub use config::{ColorMode, ToolConfig};
pub use directory::Directory;
pub use parser::Parser;
pub use symphony_core::{CompiledProgram, ErrorKind, SymphonyError};

use std::fs;
use std::path::{Path, PathBuf};
use symphony_runtime::Orchestra;
use tracing::debug;

/// Compile Symphony source text into a quadruple program.
pub fn compile(source: &str) -> Result<CompiledProgram, SymphonyError> {
    let program = Parser::new(source).parse()?;
    debug!(
        quads = program.quads.len(),
        functions = program.functions.len(),
        constants = program.constants.len(),
        "compiled"
    );
    Ok(program)
}

/// Compile and execute a program.
///
/// Returns the prints joined into one string, and the notes as a list.
/// `stdin_lines`, if given, is split on `'\n'` and consumed one line per
/// `input` call; leftover lines are an arity error.
pub fn compile_and_run(
    source: &str,
    stdin_lines: Option<&str>,
) -> Result<(String, Vec<String>), SymphonyError> {
    let program = compile(source)?;
    let inputs = split_inputs(stdin_lines);
    let (prints, notes) = Orchestra::play(&program, inputs)?;
    Ok((prints.concat(), notes))
}

fn split_inputs(stdin_lines: Option<&str>) -> Vec<String> {
    match stdin_lines {
        Some(lines) => lines.split('\n').map(str::to_string).collect(),
        None => Vec::new(),
    }
}

/// The `.note` sibling of a source path.
pub fn note_path(source_path: &Path) -> PathBuf {
    source_path.with_extension("note")
}

/// Compile a single file, optionally persisting its `.note` listing.
pub fn compile_file(source_path: &Path, keep_notes: bool) -> Result<CompiledProgram, SymphonyError> {
    let source = fs::read_to_string(source_path).map_err(|e| {
        SymphonyError::io(format!(
            "File {} was not found: {}",
            source_path.display(),
            e
        ))
    })?;
    let program = compile(&source)?;
    if keep_notes {
        let path = note_path(source_path);
        fs::write(&path, program.to_note())
            .map_err(|e| SymphonyError::io(format!("Failed to write {}: {}", path.display(), e)))?;
    }
    Ok(program)
}

/// Compile and run a single file.
pub fn run_file(
    source_path: &Path,
    stdin_lines: Option<&str>,
    keep_notes: bool,
) -> Result<(String, Vec<String>), SymphonyError> {
    let program = compile_file(source_path, keep_notes)?;
    let inputs = split_inputs(stdin_lines);
    let (prints, notes) = Orchestra::play(&program, inputs)?;
    Ok((prints.concat(), notes))
}
