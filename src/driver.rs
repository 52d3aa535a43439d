//! File and directory orchestration
//!
//! Resolves a CLI path argument to a set of `.jack` files, then compiles
//! each independently: one `Tokenizer`/`SymbolTable`/`VMWriter`/
//! `CompilationEngine` per file, so a failure in one file never corrupts
//! another's output.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::engine::CompilationEngine;
use crate::error::CompilerError;

/// Compiles `input` (a single `.jack` file or a directory of them) and
/// returns the list of `.vm` files written.
///
/// If `input` is a directory, every `.jack` file in it (non-recursive) is
/// compiled; a failure on one file is logged and does not prevent the
/// others from compiling, but makes the overall call return the first
/// error encountered after all files have been attempted.
pub fn compile_path(input: &Path) -> Result<Vec<PathBuf>, CompilerError> {
    let sources = discover_sources(input)?;
    info!(count = sources.len(), "discovered source files");

    let mut outputs = Vec::with_capacity(sources.len());
    let mut first_error = None;

    for source_path in &sources {
        match compile_one(source_path) {
            Ok(output_path) => outputs.push(output_path),
            Err(e) => {
                warn!(file = %source_path.display(), error = %e, "compilation failed");
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(outputs),
    }
}

fn discover_sources(input: &Path) -> Result<Vec<PathBuf>, CompilerError> {
    if !input.exists() {
        return Err(CompilerError::InvalidInput(format!(
            "path does not exist: {}",
            input.display()
        )));
    }

    if input.is_dir() {
        let mut files: Vec<PathBuf> = fs::read_dir(input)
            .map_err(|e| CompilerError::io(input, e))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| path.extension().is_some_and(|ext| ext == "jack"))
            .collect();

        if files.is_empty() {
            return Err(CompilerError::InvalidInput(format!(
                "no .jack files found in directory: {}",
                input.display()
            )));
        }

        files.sort();
        Ok(files)
    } else {
        match input.extension() {
            Some(ext) if ext == "jack" => Ok(vec![input.to_path_buf()]),
            _ => Err(CompilerError::InvalidInput(format!(
                "not a .jack file: {}",
                input.display()
            ))),
        }
    }
}

/// Compiles a single `.jack` file to a sibling `.vm` file, removing any
/// partially-written output if compilation fails partway through.
fn compile_one(source_path: &Path) -> Result<PathBuf, CompilerError> {
    debug!(file = %source_path.display(), "compiling");

    let source = fs::read_to_string(source_path).map_err(|e| CompilerError::io(source_path, e))?;
    let output_path = source_path.with_extension("vm");

    let engine = CompilationEngine::new(&source, source_path, &output_path)?;
    if let Err(e) = engine.compile_class() {
        let _ = fs::remove_file(&output_path);
        return Err(e);
    }

    info!(file = %output_path.display(), "wrote VM output");
    Ok(output_path)
}
