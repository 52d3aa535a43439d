//! The recursive-descent, single-pass Jack-to-VM translator
//!
//! Each `compile_*` method corresponds to one grammar nonterminal. There is
//! no intermediate tree: every method both consumes tokens and emits VM
//! code (or defines symbols) as it goes, using one token of lookahead to
//! decide between productions. None of them backtrack.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::CompilerError;
use crate::symbol_table::{Kind, SymbolTable};
use crate::token::Token;
use crate::tokenizer::Tokenizer;
use crate::vm_writer::{ArithCommand, Segment, VMWriter};

const OP_SYMBOLS: &[char] = &['+', '-', '*', '/', '&', '|', '<', '>', '='];

pub struct CompilationEngine {
    tokenizer: Tokenizer,
    symbols: SymbolTable,
    writer: VMWriter,
    file: PathBuf,
    class_name: String,
    if_counter: u32,
    while_counter: u32,
}

impl CompilationEngine {
    pub fn new(source: &str, file: &Path, output_path: &Path) -> Result<Self, CompilerError> {
        let tokenizer = Tokenizer::new(source, file)?;
        let writer = VMWriter::create(output_path)?;
        Ok(CompilationEngine {
            tokenizer,
            symbols: SymbolTable::new(),
            writer,
            file: file.to_path_buf(),
            class_name: String::new(),
            if_counter: 0,
            while_counter: 0,
        })
    }

    /// Compiles the whole class and closes the output file. On success the
    /// `.vm` file is complete and flushed; on failure the caller (the
    /// driver) is responsible for discarding whatever was written.
    pub fn compile_class(mut self) -> Result<(), CompilerError> {
        self.compile_class_inner()?;
        self.writer.close()
    }

    // ---------------------------------------------------------------
    // Token-stream helpers
    // ---------------------------------------------------------------

    fn parse_error(&self, message: impl Into<String>) -> CompilerError {
        CompilerError::Parse {
            file: self.file.clone(),
            token_index: self.tokenizer.position(),
            message: message.into(),
        }
    }

    fn current(&self) -> Result<&Token, CompilerError> {
        self.tokenizer
            .current()
            .ok_or_else(|| self.parse_error("unexpected end of input"))
    }

    fn is_symbol(&self, c: char) -> bool {
        self.tokenizer
            .current()
            .map(|t| t.is_symbol(c))
            .unwrap_or(false)
    }

    fn is_keyword(&self, kw: &str) -> bool {
        self.tokenizer
            .current()
            .map(|t| t.is_keyword(kw))
            .unwrap_or(false)
    }

    fn is_keyword_one_of(&self, kws: &[&str]) -> bool {
        self.tokenizer
            .current()
            .and_then(Token::as_keyword)
            .map(|k| kws.contains(&k))
            .unwrap_or(false)
    }

    fn eat_symbol(&mut self, c: char) -> Result<(), CompilerError> {
        if !self.is_symbol(c) {
            let found = self.current()?.to_string();
            return Err(self.parse_error(format!("expected '{c}', found '{found}'")));
        }
        self.tokenizer.advance();
        Ok(())
    }

    /// Consumes a keyword from `options`, returning which one was found.
    fn eat_keyword_one_of(&mut self, options: &[&str]) -> Result<String, CompilerError> {
        let kw = match self.current()?.as_keyword() {
            Some(kw) if options.contains(&kw) => kw.to_string(),
            other => {
                return Err(self.parse_error(format!(
                    "expected one of {options:?}, found '{:?}'",
                    other
                )))
            }
        };
        self.tokenizer.advance();
        Ok(kw)
    }

    fn eat_identifier(&mut self) -> Result<String, CompilerError> {
        let name = self
            .current()?
            .as_identifier()
            .ok_or_else(|| self.parse_error("expected an identifier"))?
            .to_string();
        self.tokenizer.advance();
        Ok(name)
    }

    /// Defines a symbol and logs the assignment, so `-vv` traces exactly
    /// which name/kind/index triple the symbol table produced.
    fn define(&mut self, name: &str, ty: &str, kind: Kind) {
        self.symbols.define(name, ty, kind);
        debug!(name, ty, ?kind, index = ?self.symbols.index_of(name), "defined symbol");
    }

    /// A Jack type: a primitive keyword (`int`/`char`/`boolean`) or a class
    /// name. Also accepts `void` for return-type position.
    fn eat_type_token(&mut self) -> Result<String, CompilerError> {
        let ty = match self.current()? {
            Token::Keyword(k) if ["int", "char", "boolean", "void"].contains(&k.as_str()) => {
                k.clone()
            }
            Token::Identifier(i) => i.clone(),
            other => {
                return Err(self.parse_error(format!("expected a type, found '{other}'")));
            }
        };
        self.tokenizer.advance();
        Ok(ty)
    }

    // ---------------------------------------------------------------
    // 1) class
    // ---------------------------------------------------------------

    fn compile_class_inner(&mut self) -> Result<(), CompilerError> {
        self.eat_keyword_one_of(&["class"])?;
        self.class_name = self.eat_identifier()?;
        self.eat_symbol('{')?;

        while self.is_keyword_one_of(&["static", "field"]) {
            self.compile_class_var_dec()?;
        }

        while self.is_keyword_one_of(&["constructor", "function", "method"]) {
            self.compile_subroutine()?;
        }

        self.eat_symbol('}')?;
        Ok(())
    }

    // ---------------------------------------------------------------
    // 2) classVarDec
    // ---------------------------------------------------------------

    fn compile_class_var_dec(&mut self) -> Result<(), CompilerError> {
        let kw = self.eat_keyword_one_of(&["static", "field"])?;
        let kind = if kw == "static" { Kind::Static } else { Kind::Field };
        let ty = self.eat_type_token()?;

        loop {
            let name = self.eat_identifier()?;
            self.define(&name, &ty, kind);
            if self.is_symbol(',') {
                self.eat_symbol(',')?;
            } else {
                break;
            }
        }
        self.eat_symbol(';')?;
        Ok(())
    }

    // ---------------------------------------------------------------
    // 3) subroutineDec
    // ---------------------------------------------------------------

    fn compile_subroutine(&mut self) -> Result<(), CompilerError> {
        self.symbols.start_subroutine();

        let subroutine_kind = self.eat_keyword_one_of(&["constructor", "function", "method"])?;
        let _return_type = self.eat_type_token()?;
        let subroutine_name = self.eat_identifier()?;

        if subroutine_kind == "method" {
            let class_name = self.class_name.clone();
            self.define("this", &class_name, Kind::Arg);
        }

        self.eat_symbol('(')?;
        self.compile_parameter_list()?;
        self.eat_symbol(')')?;

        self.compile_subroutine_body(&subroutine_kind, &subroutine_name)
    }

    fn compile_parameter_list(&mut self) -> Result<(), CompilerError> {
        if self.is_symbol(')') {
            return Ok(());
        }
        loop {
            let ty = self.eat_type_token()?;
            let name = self.eat_identifier()?;
            self.define(&name, &ty, Kind::Arg);

            if self.is_symbol(',') {
                self.eat_symbol(',')?;
            } else {
                break;
            }
        }
        Ok(())
    }

    fn compile_subroutine_body(
        &mut self,
        subroutine_kind: &str,
        subroutine_name: &str,
    ) -> Result<(), CompilerError> {
        self.eat_symbol('{')?;

        while self.is_keyword("var") {
            self.compile_var_dec()?;
        }

        let n_locals = self.symbols.var_count(Kind::Var);
        let full_name = format!("{}.{}", self.class_name, subroutine_name);
        self.writer.write_function(&full_name, n_locals)?;

        match subroutine_kind {
            "constructor" => {
                let n_fields = self.symbols.var_count(Kind::Field);
                self.writer.write_push(Segment::Constant, n_fields as i32)?;
                self.writer.write_call("Memory.alloc", 1)?;
                self.writer.write_pop(Segment::Pointer, 0)?;
            }
            "method" => {
                self.writer.write_push(Segment::Argument, 0)?;
                self.writer.write_pop(Segment::Pointer, 0)?;
            }
            _ => {}
        }

        self.compile_statements()?;
        self.eat_symbol('}')?;
        Ok(())
    }

    // ---------------------------------------------------------------
    // 4) varDec
    // ---------------------------------------------------------------

    fn compile_var_dec(&mut self) -> Result<(), CompilerError> {
        self.eat_keyword_one_of(&["var"])?;
        let ty = self.eat_type_token()?;

        loop {
            let name = self.eat_identifier()?;
            self.define(&name, &ty, Kind::Var);
            if self.is_symbol(',') {
                self.eat_symbol(',')?;
            } else {
                break;
            }
        }
        self.eat_symbol(';')?;
        Ok(())
    }

    // ---------------------------------------------------------------
    // 5) statements
    // ---------------------------------------------------------------

    fn compile_statements(&mut self) -> Result<(), CompilerError> {
        loop {
            let kw = match self.tokenizer.current().and_then(Token::as_keyword) {
                Some(kw) => kw.to_string(),
                None => break,
            };
            match kw.as_str() {
                "let" => self.compile_let()?,
                "if" => self.compile_if()?,
                "while" => self.compile_while()?,
                "do" => self.compile_do()?,
                "return" => self.compile_return()?,
                _ => break,
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // 6) let
    // ---------------------------------------------------------------

    fn compile_let(&mut self) -> Result<(), CompilerError> {
        self.eat_keyword_one_of(&["let"])?;
        let var_name = self.eat_identifier()?;
        let (segment, index) = self.resolve_variable(&var_name)?;

        if self.is_symbol('[') {
            self.eat_symbol('[')?;
            self.compile_expression()?;
            self.eat_symbol(']')?;
            self.writer.write_push(segment, index)?;
            self.writer.write_arithmetic(ArithCommand::Add)?;

            self.eat_symbol('=')?;
            self.compile_expression()?;
            self.eat_symbol(';')?;

            self.writer.write_pop(Segment::Temp, 0)?;
            self.writer.write_pop(Segment::Pointer, 1)?;
            self.writer.write_push(Segment::Temp, 0)?;
            self.writer.write_pop(Segment::That, 0)?;
        } else {
            self.eat_symbol('=')?;
            self.compile_expression()?;
            self.eat_symbol(';')?;
            self.writer.write_pop(segment, index)?;
        }
        Ok(())
    }

    /// Looks `name` up as a variable and maps its kind to a VM segment,
    /// failing with a parse error if it was never declared.
    fn resolve_variable(&self, name: &str) -> Result<(Segment, i32), CompilerError> {
        let kind = self
            .symbols
            .kind_of(name)
            .ok_or_else(|| self.parse_error(format!("undefined variable '{name}'")))?;
        let index = self.symbols.index_of(name).unwrap();
        Ok((kind_to_segment(kind), index as i32))
    }

    // ---------------------------------------------------------------
    // 7) if
    // ---------------------------------------------------------------

    fn compile_if(&mut self) -> Result<(), CompilerError> {
        self.eat_keyword_one_of(&["if"])?;
        self.eat_symbol('(')?;
        self.compile_expression()?;
        self.eat_symbol(')')?;

        let n = self.if_counter;
        self.if_counter += 1;
        let label_false = format!("IF_FALSE{n}");
        let label_end = format!("IF_END{n}");
        debug!(%label_false, %label_end, "allocated if labels");

        self.writer.write_arithmetic(ArithCommand::Not)?;
        self.writer.write_if(&label_false)?;

        self.eat_symbol('{')?;
        self.compile_statements()?;
        self.eat_symbol('}')?;

        if self.is_keyword("else") {
            self.writer.write_goto(&label_end)?;
            self.writer.write_label(&label_false)?;

            self.eat_keyword_one_of(&["else"])?;
            self.eat_symbol('{')?;
            self.compile_statements()?;
            self.eat_symbol('}')?;

            self.writer.write_label(&label_end)?;
        } else {
            self.writer.write_label(&label_false)?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // 8) while
    // ---------------------------------------------------------------

    fn compile_while(&mut self) -> Result<(), CompilerError> {
        self.eat_keyword_one_of(&["while"])?;

        let n = self.while_counter;
        self.while_counter += 1;
        let label_exp = format!("WHILE_EXP{n}");
        let label_end = format!("WHILE_END{n}");
        debug!(%label_exp, %label_end, "allocated while labels");

        self.writer.write_label(&label_exp)?;

        self.eat_symbol('(')?;
        self.compile_expression()?;
        self.eat_symbol(')')?;

        self.writer.write_arithmetic(ArithCommand::Not)?;
        self.writer.write_if(&label_end)?;

        self.eat_symbol('{')?;
        self.compile_statements()?;
        self.eat_symbol('}')?;

        self.writer.write_goto(&label_exp)?;
        self.writer.write_label(&label_end)?;
        Ok(())
    }

    // ---------------------------------------------------------------
    // 9) do
    // ---------------------------------------------------------------

    fn compile_do(&mut self) -> Result<(), CompilerError> {
        self.eat_keyword_one_of(&["do"])?;
        let first_name = self.eat_identifier()?;
        self.compile_subroutine_call(first_name)?;
        self.writer.write_pop(Segment::Temp, 0)?;
        self.eat_symbol(';')?;
        Ok(())
    }

    /// Compiles a subroutine call whose leading identifier has already been
    /// consumed (per the "pending identifier" design: the caller reads the
    /// identifier, then hands it here instead of pushing tokens back).
    ///
    /// Resolves which of the three call forms applies from the symbol
    /// table and the `.`/`(` that follows, then emits the receiver (if
    /// any), the argument list, and the `call` instruction.
    fn compile_subroutine_call(&mut self, first_name: String) -> Result<(), CompilerError> {
        let kind = self.symbols.kind_of(&first_name);

        let (full_name, pushed_receiver) = if self.is_symbol('.') {
            self.eat_symbol('.')?;
            let member = self.eat_identifier()?;
            match kind {
                Some(k) => {
                    // varName.method(...) -- method call on a known object
                    let ty = self.symbols.type_of(&first_name).unwrap().to_string();
                    let index = self.symbols.index_of(&first_name).unwrap();
                    self.writer.write_push(kind_to_segment(k), index as i32)?;
                    (format!("{ty}.{member}"), true)
                }
                None => {
                    // ClassName.function(...) / ClassName.constructor(...)
                    (format!("{first_name}.{member}"), false)
                }
            }
        } else {
            // bareName(...) -- implicit method call on the enclosing object
            self.writer.write_push(Segment::Pointer, 0)?;
            (format!("{}.{}", self.class_name, first_name), true)
        };

        self.eat_symbol('(')?;
        let n_expressions = self.compile_expression_list()?;
        self.eat_symbol(')')?;

        let n_args = n_expressions + if pushed_receiver { 1 } else { 0 };
        self.writer.write_call(&full_name, n_args)?;
        Ok(())
    }

    // ---------------------------------------------------------------
    // 10) return
    // ---------------------------------------------------------------

    fn compile_return(&mut self) -> Result<(), CompilerError> {
        self.eat_keyword_one_of(&["return"])?;
        if self.is_symbol(';') {
            self.writer.write_push(Segment::Constant, 0)?;
        } else {
            self.compile_expression()?;
        }
        self.eat_symbol(';')?;
        self.writer.write_return()?;
        Ok(())
    }

    // ---------------------------------------------------------------
    // 11) expression
    // ---------------------------------------------------------------

    fn compile_expression(&mut self) -> Result<(), CompilerError> {
        self.compile_term()?;

        loop {
            let op = match self.tokenizer.current().and_then(Token::as_symbol) {
                Some(op) if OP_SYMBOLS.contains(&op) => op,
                _ => break,
            };
            self.tokenizer.advance();
            self.compile_term()?;

            match op {
                '+' => self.writer.write_arithmetic(ArithCommand::Add)?,
                '-' => self.writer.write_arithmetic(ArithCommand::Sub)?,
                '&' => self.writer.write_arithmetic(ArithCommand::And)?,
                '|' => self.writer.write_arithmetic(ArithCommand::Or)?,
                '<' => self.writer.write_arithmetic(ArithCommand::Lt)?,
                '>' => self.writer.write_arithmetic(ArithCommand::Gt)?,
                '=' => self.writer.write_arithmetic(ArithCommand::Eq)?,
                '*' => self.writer.write_call("Math.multiply", 2)?,
                '/' => self.writer.write_call("Math.divide", 2)?,
                _ => unreachable!("OP_SYMBOLS is exhaustive"),
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // 12) term
    // ---------------------------------------------------------------

    fn compile_term(&mut self) -> Result<(), CompilerError> {
        let token = self.current()?.clone();
        match token {
            Token::IntConst(n) => {
                self.writer.write_push(Segment::Constant, n as i32)?;
                self.tokenizer.advance();
            }
            Token::StringConst(s) => {
                self.tokenizer.advance();
                self.compile_string_constant(&s)?;
            }
            Token::Keyword(kw) => {
                self.tokenizer.advance();
                match kw.as_str() {
                    "true" => {
                        self.writer.write_push(Segment::Constant, 0)?;
                        self.writer.write_arithmetic(ArithCommand::Not)?;
                    }
                    "false" | "null" => {
                        self.writer.write_push(Segment::Constant, 0)?;
                    }
                    "this" => {
                        self.writer.write_push(Segment::Pointer, 0)?;
                    }
                    other => {
                        return Err(self.parse_error(format!("unexpected keyword '{other}' in expression")));
                    }
                }
            }
            Token::Symbol('(') => {
                self.eat_symbol('(')?;
                self.compile_expression()?;
                self.eat_symbol(')')?;
            }
            Token::Symbol(sym @ ('-' | '~')) => {
                self.tokenizer.advance();
                self.compile_term()?;
                let cmd = if sym == '-' { ArithCommand::Neg } else { ArithCommand::Not };
                self.writer.write_arithmetic(cmd)?;
            }
            Token::Symbol(other) => {
                return Err(self.parse_error(format!("unexpected symbol '{other}' in expression")));
            }
            Token::Identifier(name) => {
                self.tokenizer.advance();
                self.compile_term_identifier(name)?;
            }
        }
        Ok(())
    }

    fn compile_term_identifier(&mut self, name: String) -> Result<(), CompilerError> {
        if self.is_symbol('[') {
            let (segment, index) = self.resolve_variable(&name)?;
            self.writer.write_push(segment, index)?;
            self.eat_symbol('[')?;
            self.compile_expression()?;
            self.eat_symbol(']')?;
            self.writer.write_arithmetic(ArithCommand::Add)?;
            self.writer.write_pop(Segment::Pointer, 1)?;
            self.writer.write_push(Segment::That, 0)?;
        } else if self.is_symbol('(') || self.is_symbol('.') {
            self.compile_subroutine_call(name)?;
        } else {
            let (segment, index) = self.resolve_variable(&name)?;
            self.writer.write_push(segment, index)?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // 13) expressionList
    // ---------------------------------------------------------------

    fn compile_expression_list(&mut self) -> Result<u32, CompilerError> {
        if self.is_symbol(')') {
            return Ok(0);
        }
        let mut count = 1;
        self.compile_expression()?;
        while self.is_symbol(',') {
            self.eat_symbol(',')?;
            self.compile_expression()?;
            count += 1;
        }
        Ok(count)
    }

    // ---------------------------------------------------------------
    // String constants
    // ---------------------------------------------------------------

    fn compile_string_constant(&mut self, value: &str) -> Result<(), CompilerError> {
        self.writer.write_push(Segment::Constant, value.chars().count() as i32)?;
        self.writer.write_call("String.new", 1)?;
        for ch in value.chars() {
            self.writer.write_push(Segment::Constant, ch as i32)?;
            self.writer.write_call("String.appendChar", 2)?;
        }
        Ok(())
    }
}

fn kind_to_segment(kind: Kind) -> Segment {
    match kind {
        Kind::Static => Segment::Static,
        Kind::Field => Segment::This,
        Kind::Arg => Segment::Argument,
        Kind::Var => Segment::Local,
    }
}
