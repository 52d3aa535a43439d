//! Error types shared across the compiler
//!
//! Four kinds, matching the four ways a compile can fail: a bad input path,
//! a token the lexer can't classify, a token the parser didn't expect, and
//! an I/O failure reading source or writing VM output.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type returned by every fallible operation in this crate.
#[derive(Debug, Error)]
pub enum CompilerError {
    /// The input path doesn't exist, has the wrong extension, or (for a
    /// directory) contains no `.jack` files.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The tokenizer could not classify a token (unterminated string,
    /// integer literal out of `[0, 32767]`).
    #[error("{file}: lexical error: {message}")]
    Lexical { file: PathBuf, message: String },

    /// A token didn't match what the grammar expected at that position.
    #[error("{file}: parse error near token {token_index}: {message}")]
    Parse {
        file: PathBuf,
        token_index: usize,
        message: String,
    },

    /// Reading a source file or writing a `.vm` file failed.
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, CompilerError>;

impl CompilerError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CompilerError::Io {
            path: path.into(),
            source,
        }
    }
}
