//! Textual VM command emitter
//!
//! A thin, stateless-per-call sink: each `write_*` method formats one VM
//! command and appends it as a line to the output file. No state is
//! retained beyond the open file handle itself.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::CompilerError;

/// One of the eight VM memory segments addressed by `push`/`pop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Local,
    Argument,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Segment::Constant => "constant",
            Segment::Local => "local",
            Segment::Argument => "argument",
            Segment::Static => "static",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
        };
        f.write_str(s)
    }
}

/// One of the nine zero-operand stack-arithmetic/logic commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithCommand {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl fmt::Display for ArithCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArithCommand::Add => "add",
            ArithCommand::Sub => "sub",
            ArithCommand::Neg => "neg",
            ArithCommand::Eq => "eq",
            ArithCommand::Gt => "gt",
            ArithCommand::Lt => "lt",
            ArithCommand::And => "and",
            ArithCommand::Or => "or",
            ArithCommand::Not => "not",
        };
        f.write_str(s)
    }
}

/// Appends textual VM commands to an output file, one per line, LF
/// terminated, no trailing whitespace.
///
/// The output file is opened eagerly at construction and must be flushed
/// with [`VMWriter::close`] to guarantee its contents hit disk; `Drop`
/// makes a best-effort flush too, so a mid-parse error never leaves an
/// unflushed handle dangling.
pub struct VMWriter {
    out: BufWriter<File>,
    path: PathBuf,
}

impl VMWriter {
    pub fn create(path: &Path) -> Result<Self, CompilerError> {
        let file = File::create(path).map_err(|e| CompilerError::io(path, e))?;
        Ok(VMWriter {
            out: BufWriter::new(file),
            path: path.to_path_buf(),
        })
    }

    fn line(&mut self, text: &str) -> Result<(), CompilerError> {
        writeln!(self.out, "{text}").map_err(|e| CompilerError::io(&self.path, e))
    }

    pub fn write_push(&mut self, segment: Segment, index: i32) -> Result<(), CompilerError> {
        self.line(&format!("push {segment} {index}"))
    }

    pub fn write_pop(&mut self, segment: Segment, index: i32) -> Result<(), CompilerError> {
        self.line(&format!("pop {segment} {index}"))
    }

    pub fn write_arithmetic(&mut self, command: ArithCommand) -> Result<(), CompilerError> {
        self.line(&command.to_string())
    }

    pub fn write_label(&mut self, label: &str) -> Result<(), CompilerError> {
        self.line(&format!("label {label}"))
    }

    pub fn write_goto(&mut self, label: &str) -> Result<(), CompilerError> {
        self.line(&format!("goto {label}"))
    }

    pub fn write_if(&mut self, label: &str) -> Result<(), CompilerError> {
        self.line(&format!("if-goto {label}"))
    }

    pub fn write_call(&mut self, name: &str, n_args: u32) -> Result<(), CompilerError> {
        self.line(&format!("call {name} {n_args}"))
    }

    pub fn write_function(&mut self, name: &str, n_locals: u16) -> Result<(), CompilerError> {
        self.line(&format!("function {name} {n_locals}"))
    }

    pub fn write_return(&mut self) -> Result<(), CompilerError> {
        self.line("return")
    }

    /// Flushes and closes the writer. Call this only after the class has
    /// compiled cleanly — a half-written file is the driver's job to
    /// discard, not this writer's.
    pub fn close(mut self) -> Result<(), CompilerError> {
        self.out.flush().map_err(|e| CompilerError::io(&self.path, e))
    }
}

impl Drop for VMWriter {
    fn drop(&mut self) {
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn writes_push_and_pop_in_expected_textual_form() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.vm");
        {
            let mut w = VMWriter::create(&path).unwrap();
            w.write_push(Segment::Constant, 7).unwrap();
            w.write_pop(Segment::Local, 0).unwrap();
            w.write_arithmetic(ArithCommand::Add).unwrap();
            w.close().unwrap();
        }
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "push constant 7\npop local 0\nadd\n");
    }

    #[test]
    fn writes_function_call_and_return() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.vm");
        {
            let mut w = VMWriter::create(&path).unwrap();
            w.write_function("Main.main", 0).unwrap();
            w.write_call("Memory.alloc", 1).unwrap();
            w.write_return().unwrap();
            w.close().unwrap();
        }
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "function Main.main 0\ncall Memory.alloc 1\nreturn\n"
        );
    }

    #[test]
    fn writes_labels_goto_and_if_goto() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.vm");
        {
            let mut w = VMWriter::create(&path).unwrap();
            w.write_label("WHILE_EXP0").unwrap();
            w.write_if("WHILE_END0").unwrap();
            w.write_goto("WHILE_EXP0").unwrap();
            w.close().unwrap();
        }
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "label WHILE_EXP0\nif-goto WHILE_END0\ngoto WHILE_EXP0\n"
        );
    }
}
