//! Turning a token sequence into an executable pipeline.

use crate::builtin::{
    Assign, Cat, CatArgs, Echo, EchoArgs, Exit, ExitArgs, Grep, GrepArgs, Pwd, PwdArgs, Usage, Wc,
    WcArgs,
};
use crate::command::Command;
use crate::external::External;
use crate::tokenizer::{Token, TokenKind};
use argh::{EarlyExit, FromArgs};
use thiserror::Error;

/// Errors detected while assembling the pipeline, after tokenizing succeeded
/// but before any stage runs.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The line ends in a pipe with no segment after it.
    #[error("unexpected end of the pipeline")]
    UnexpectedEnd,
    /// A segment is empty, or does not start with a command name.
    #[error("bad pipeline composition: unexpected {0} token")]
    UnexpectedToken(TokenKind),
    /// A built-in rejected its argument list.
    #[error("{command}: {output}")]
    InvalidArgs { command: String, output: String },
    /// Grep's pattern does not compile.
    #[error("grep: invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Assemble the ordered command sequence for one line of tokens.
///
/// Segments are the maximal token runs between pipe tokens. A segment made
/// up entirely of variable declarations becomes an executable stage only
/// when it is the whole line; anywhere else it is dropped without effect —
/// "assign and run nothing" is only meaningful on its own, a declaration
/// prefix to a command was already split off by the tokenizer.
pub fn build_pipeline(tokens: &[Token]) -> Result<Vec<Box<dyn Command>>, BuildError> {
    let mut pipeline: Vec<Box<dyn Command>> = Vec::new();
    if tokens.is_empty() {
        return Ok(pipeline);
    }

    let mut segment_start = 0;
    for pos in 0..=tokens.len() {
        let at_end = pos == tokens.len();
        if !at_end && tokens[pos].kind() != TokenKind::Pipe {
            continue;
        }

        if pos == segment_start {
            return Err(if at_end {
                BuildError::UnexpectedEnd
            } else {
                BuildError::UnexpectedToken(tokens[pos].kind())
            });
        }

        let segment = &tokens[segment_start..pos];
        let is_first = segment_start == 0;
        let is_sole = is_first && at_end;
        if segment.iter().all(|t| t.kind() == TokenKind::VarDecl) {
            if is_sole {
                pipeline.push(build_assignments(segment));
            }
        } else {
            pipeline.push(build_command(segment, is_first, is_sole)?);
        }
        segment_start = pos + 1;
    }

    Ok(pipeline)
}

/// Dispatch one segment against the registry of built-ins; any unrecognized
/// name becomes an external command carrying the whole segment verbatim.
fn build_command(
    segment: &[Token],
    is_first: bool,
    is_sole: bool,
) -> Result<Box<dyn Command>, BuildError> {
    let head = &segment[0];
    if head.kind() != TokenKind::Command {
        return Err(BuildError::UnexpectedToken(head.kind()));
    }
    let args: Vec<&str> = segment[1..].iter().map(Token::content).collect();

    match head.content() {
        "cat" => builtin("cat", &args, |parsed: CatArgs| {
            Ok(Box::new(Cat::new(parsed, is_first)))
        }),
        "wc" => builtin("wc", &args, |parsed: WcArgs| {
            Ok(Box::new(Wc::new(parsed, is_first)))
        }),
        "echo" => builtin("echo", &args, |parsed: EchoArgs| {
            Ok(Box::new(Echo::new(parsed)))
        }),
        "pwd" => builtin("pwd", &args, |_parsed: PwdArgs| Ok(Box::new(Pwd::new()))),
        "grep" => builtin("grep", &args, |parsed: GrepArgs| {
            Ok(Box::new(Grep::new(parsed)?))
        }),
        "exit" => builtin("exit", &args, |_parsed: ExitArgs| {
            Ok(Box::new(Exit::new(is_sole)))
        }),
        _ => Ok(Box::new(External::new(
            segment.iter().map(|t| t.content().to_string()).collect(),
        ))),
    }
}

/// Parse a built-in's argument grammar. A grammar violation is a build
/// error; a `--help` request turns into a stage that prints the usage text.
fn builtin<T: FromArgs>(
    name: &'static str,
    args: &[&str],
    make: impl FnOnce(T) -> Result<Box<dyn Command>, BuildError>,
) -> Result<Box<dyn Command>, BuildError> {
    match T::from_args(&[name], args) {
        Ok(parsed) => make(parsed),
        Err(EarlyExit {
            output,
            status: Ok(()),
        }) => Ok(Box::new(Usage::new(name, output))),
        Err(EarlyExit { output, .. }) => Err(BuildError::InvalidArgs {
            command: name.to_string(),
            output: output.trim().to_string(),
        }),
    }
}

fn build_assignments(segment: &[Token]) -> Box<dyn Command> {
    let decls = segment
        .iter()
        .map(|token| {
            let (name, value) = token
                .content()
                .split_once('=')
                .unwrap_or((token.content(), ""));
            (name.to_string(), value.to_string())
        })
        .collect();
    Box::new(Assign::new(decls))
}
