//! Source-to-token-stream conversion
//!
//! Comments are stripped first, then the cleaned text is scanned
//! character-by-character into a flat, eagerly-built token list. The
//! tokenizer has no knowledge of grammar; it only classifies lexemes.

use std::path::Path;

use crate::error::CompilerError;
use crate::token::{Token, TokenType};

/// Removes Jack's two comment forms from source text.
///
/// Block comments (`/* ... */`, non-greedy, may span lines) are removed
/// first, then everything from `//` to end-of-line. Applying this twice is
/// a no-op: neither comment form can survive a previous pass.
pub fn strip_comments(source: &str) -> String {
    let without_block = strip_block_comments(source);
    strip_line_comments(&without_block)
}

fn strip_block_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let bytes = source.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if source[i..].starts_with("/*") {
            if let Some(end) = source[i + 2..].find("*/") {
                i = i + 2 + end + 2;
            } else {
                // Unterminated block comment: drop the rest of the file,
                // matching the non-greedy regex's behavior of never
                // matching past end-of-input.
                i = bytes.len();
            }
        } else {
            let ch = source[i..].chars().next().unwrap();
            out.push(ch);
            i += ch.len_utf8();
        }
    }
    out
}

fn strip_line_comments(source: &str) -> String {
    source
        .split('\n')
        .map(|line| match line.find("//") {
            Some(idx) => &line[..idx],
            None => line,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A finite, indexable, one-token-lookahead stream of classified tokens.
pub struct Tokenizer {
    tokens: Vec<Token>,
    pos: usize,
}

impl Tokenizer {
    /// Reads comment-free `source` into a complete token list. `file` is
    /// used only to attach context to a `LexicalError`.
    pub fn new(source: &str, file: &Path) -> Result<Self, CompilerError> {
        let cleaned = strip_comments(source);
        let tokens = scan(&cleaned, file)?;
        Ok(Tokenizer { tokens, pos: 0 })
    }

    pub fn has_more_tokens(&self) -> bool {
        self.pos + 1 < self.tokens.len()
    }

    /// Advances to the next token. A no-op once the stream is exhausted
    /// (mirrors the reference tokenizer: `advance` only moves when
    /// `has_more_tokens` holds).
    pub fn advance(&mut self) {
        if self.has_more_tokens() {
            self.pos += 1;
        }
    }

    pub fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// True once there is no current token to read — only possible when
    /// the token stream itself is empty, since `advance` never steps past
    /// the last token.
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn token_type(&self) -> Option<TokenType> {
        self.current().map(Token::type_name)
    }

    pub fn position(&self) -> usize {
        self.pos
    }
}

fn scan(text: &str, file: &Path) -> Result<Vec<Token>, CompilerError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut inside_string = false;

    for ch in text.chars() {
        if inside_string {
            current.push(ch);
            if ch == '"' {
                tokens.push(raw_to_token(&current, file)?);
                current.clear();
                inside_string = false;
            }
            continue;
        }

        if ch == '"' {
            flush(&mut current, &mut tokens, file)?;
            current.push('"');
            inside_string = true;
        } else if ch.is_whitespace() {
            flush(&mut current, &mut tokens, file)?;
        } else if crate::token::SYMBOLS.contains(ch) {
            flush(&mut current, &mut tokens, file)?;
            tokens.push(raw_to_token(&ch.to_string(), file)?);
        } else {
            current.push(ch);
        }
    }

    if inside_string {
        return Err(CompilerError::Lexical {
            file: file.to_path_buf(),
            message: "unterminated string constant".to_string(),
        });
    }
    flush(&mut current, &mut tokens, file)?;

    Ok(tokens)
}

fn flush(
    current: &mut String,
    tokens: &mut Vec<Token>,
    file: &Path,
) -> Result<(), CompilerError> {
    if !current.is_empty() {
        tokens.push(raw_to_token(current, file)?);
        current.clear();
    }
    Ok(())
}

fn raw_to_token(raw: &str, file: &Path) -> Result<Token, CompilerError> {
    Token::classify(raw).ok_or_else(|| {
        if raw.bytes().all(|b| b.is_ascii_digit()) {
            CompilerError::Lexical {
                file: file.to_path_buf(),
                message: format!("integer constant {raw} out of range [0, 32767]"),
            }
        } else {
            CompilerError::Lexical {
                file: file.to_path_buf(),
                message: format!("could not classify token '{raw}'"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(src: &str) -> Vec<Token> {
        scan(&strip_comments(src), Path::new("<test>")).expect("scan should succeed")
    }

    #[test]
    fn strips_block_comments_across_lines() {
        let src = "class /* hello\nworld */ Foo {}";
        assert_eq!(strip_comments(src), "class  Foo {}");
    }

    #[test]
    fn strip_comments_is_idempotent() {
        let src = "let x = 1; // trailing\n/* block */ let y = 2;";
        let once = strip_comments(src);
        let twice = strip_comments(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn strips_line_comments() {
        let src = "let x = 1; // set x\nlet y = 2;";
        let cleaned = strip_comments(src);
        assert!(!cleaned.contains("set x"));
        assert!(cleaned.contains("let y = 2;"));
    }

    #[test]
    fn scans_symbols_as_single_char_tokens() {
        let tokens = tokenize("{}()");
        assert_eq!(
            tokens,
            vec![
                Token::Symbol('{'),
                Token::Symbol('}'),
                Token::Symbol('('),
                Token::Symbol(')'),
            ]
        );
    }

    #[test]
    fn scans_string_constant_with_embedded_spaces() {
        let tokens = tokenize("\"Hello, World!\"");
        assert_eq!(tokens, vec![Token::StringConst("Hello, World!".into())]);
    }

    #[test]
    fn unterminated_string_is_lexical_error() {
        let err = scan("\"unterminated", Path::new("a.jack")).unwrap_err();
        assert!(matches!(err, CompilerError::Lexical { .. }));
    }

    #[test]
    fn integer_out_of_range_is_lexical_error() {
        let err = scan("40000", Path::new("a.jack")).unwrap_err();
        assert!(matches!(err, CompilerError::Lexical { .. }));
    }

    #[test]
    fn tokenizer_starts_positioned_on_first_token() {
        let t = Tokenizer::new("class Foo {}", Path::new("a.jack")).unwrap();
        assert_eq!(t.current(), Some(&Token::Keyword("class".into())));
    }

    #[test]
    fn advance_past_last_token_is_a_no_op() {
        let mut t = Tokenizer::new("class", Path::new("a.jack")).unwrap();
        assert!(!t.has_more_tokens());
        t.advance();
        t.advance();
        assert_eq!(t.current(), Some(&Token::Keyword("class".into())));
    }

    #[test]
    fn empty_source_has_no_current_token() {
        let t = Tokenizer::new("   \n  ", Path::new("a.jack")).unwrap();
        assert!(t.is_at_end());
        assert_eq!(t.current(), None);
    }
}
