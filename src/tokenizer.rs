//! Lexical analysis of one input line.

use crate::env::Environment;
use crate::expander::Expander;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// How a token behaves in the pipeline grammar.
///
/// The kind is contextual, not purely lexical: the same raw text is a command
/// name right after a pipe and an argument anywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Command,
    Arg,
    VarDecl,
    Pipe,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TokenKind::Command => "command",
            TokenKind::Arg => "argument",
            TokenKind::VarDecl => "variable declaration",
            TokenKind::Pipe => "pipeline",
        })
    }
}

/// A classified piece of the input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    content: String,
    kind: TokenKind,
}

impl Token {
    pub fn new(content: impl Into<String>, kind: TokenKind) -> Self {
        Self {
            content: content.into(),
            kind,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }
}

/// Errors detected while tokenizing, before anything runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyntaxError {
    /// A quote was opened and never closed.
    #[error("syntax error: unterminated quote {0}")]
    UnterminatedQuote(char),
    /// A character that is never valid outside quotes.
    #[error("syntax error: unexpected token {0}")]
    ForbiddenChar(char),
    /// A malformed `$`/`${}` substitution.
    #[error("syntax error: bad substitution")]
    BadSubstitution,
}

/// Matches `identifier=anything`, the shape of a variable declaration.
fn declaration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-zA-Z_]\w*=.*$").expect("declaration pattern"))
}

/// Splits one input line into classified tokens.
///
/// Scanner state lives for a single [`Tokenizer::tokenize`] call, so a failed
/// parse can never leak a stale cursor into the next line.
pub struct Tokenizer<'a> {
    expander: Expander<'a>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(env: &'a Environment) -> Self {
        Self {
            expander: Expander::new(env),
        }
    }

    pub fn tokenize(&self, line: &str) -> Result<Vec<Token>, SyntaxError> {
        Scanner::new(line.trim(), &self.expander).run()
    }
}

struct Scanner<'a, 'e> {
    chars: Vec<char>,
    pos: usize,
    previous: TokenKind,
    expander: &'a Expander<'e>,
}

impl<'a, 'e> Scanner<'a, 'e> {
    fn new(line: &str, expander: &'a Expander<'e>) -> Self {
        Self {
            chars: line.chars().collect(),
            pos: 0,
            previous: TokenKind::Pipe,
            expander,
        }
    }

    fn run(&mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();
        while self.pos < self.chars.len() {
            let token = self.next_token()?;
            // `VAR=1 cmd` splits into two implicit stages; the builder then
            // sees the same shape as an explicit pipe.
            if self.previous == TokenKind::VarDecl && token.kind() == TokenKind::Command {
                tokens.push(Token::new("|", TokenKind::Pipe));
            }
            self.previous = token.kind();
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, SyntaxError> {
        while self.peek() == Some(' ') {
            self.pos += 1;
        }

        if self.peek() == Some('|') {
            self.pos += 1;
            return Ok(Token::new("|", TokenKind::Pipe));
        }

        let mut content = String::new();
        while let Some(ch) = self.peek() {
            match ch {
                ' ' | '|' => break,
                '"' => {
                    let run = self.quoted_run('"')?;
                    content.push_str(&self.expander.expand(&run)?);
                }
                '\'' => content.push_str(&self.quoted_run('\'')?),
                _ => {
                    let run = self.unquoted_run()?;
                    content.push_str(&self.expander.expand(&run)?);
                }
            }
        }

        let kind = self.classify(&content);
        Ok(Token::new(content, kind))
    }

    /// Command position (start of line, after a pipe, after a declaration)
    /// distinguishes declarations from command names; everything else is an
    /// argument.
    fn classify(&self, content: &str) -> TokenKind {
        match self.previous {
            TokenKind::Pipe | TokenKind::VarDecl => {
                if declaration_pattern().is_match(content) {
                    TokenKind::VarDecl
                } else {
                    TokenKind::Command
                }
            }
            _ => TokenKind::Arg,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// Consume a quoted run, returning the text between the quotes.
    fn quoted_run(&mut self, quote: char) -> Result<String, SyntaxError> {
        self.pos += 1;
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch == quote {
                let contents = self.chars[start..self.pos].iter().collect();
                self.pos += 1;
                return Ok(contents);
            }
            self.pos += 1;
        }
        Err(SyntaxError::UnterminatedQuote(quote))
    }

    /// Consume an unquoted run up to a space, quote, pipe, or end of input.
    fn unquoted_run(&mut self) -> Result<String, SyntaxError> {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            match ch {
                ' ' | '"' | '\'' | '|' => break,
                '(' | ')' | '<' | '>' | '\\' => return Err(SyntaxError::ForbiddenChar(ch)),
                _ => self.pos += 1,
            }
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }
}
