use crate::builder::{self, BuildError};
use crate::command::ExecError;
use crate::console::Console;
use crate::env::Environment;
use crate::executor::{self, Flow};
use crate::tokenizer::{SyntaxError, Tokenizer};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use thiserror::Error;
use tracing::debug;

/// Everything that can end a line's processing early, one variant per
/// interpreter phase. The exit signal is deliberately not among them: it is
/// expected control transfer and travels as [`Flow::Exit`].
#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Exec(#[from] ExecError),
}

/// Accepted line shape, shown once at startup.
pub const USAGE: &str =
    "VARIABLE_DECLARATION... or COMMAND [ARG]... [| VARIABLE_DECLARATION... or COMMAND [ARG]...]...";

/// A line-oriented command interpreter.
///
/// Owns the variable [`Environment`] and the shared [`Console`] buffer and
/// drives the tokenizer → builder → executor chain for each input line.
///
/// Example
/// ```
/// use pipeshell::Shell;
/// use pipeshell::console::{Console, SharedSink};
///
/// let sink = SharedSink::new();
/// let mut sh = Shell::with_console(Console::with_sink(Box::new(sink.clone())));
/// sh.eval("greeting=Hello").unwrap();
/// sh.eval("echo $greeting, world").unwrap();
/// assert_eq!(sink.contents(), "Hello, world\n");
/// ```
pub struct Shell {
    env: Environment,
    console: Console,
}

impl Shell {
    /// Shell printing to standard output.
    pub fn new() -> Self {
        Self::with_console(Console::new())
    }

    /// Shell printing to a caller-provided console; tests pair this with
    /// [`SharedSink`](crate::console::SharedSink).
    pub fn with_console(console: Console) -> Self {
        Self {
            env: Environment::new(),
            console,
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Tokenize, build and run one input line.
    pub fn eval(&mut self, line: &str) -> Result<Flow, ShellError> {
        let tokens = Tokenizer::new(&self.env).tokenize(line)?;
        debug!(tokens = tokens.len(), "line tokenized");
        let mut pipeline = builder::build_pipeline(&tokens)?;
        debug!(stages = pipeline.len(), "pipeline built");
        Ok(executor::run_pipeline(
            &mut pipeline,
            &mut self.env,
            &mut self.console,
        )?)
    }

    /// Interactive read-eval loop: print the banner, then evaluate lines
    /// until the exit signal or end of input. Errors are reported as one
    /// message line and the loop resumes.
    pub fn repl(&mut self) -> anyhow::Result<()> {
        println!("Enter the commands in format: {USAGE}");
        let mut editor = DefaultEditor::new()?;
        loop {
            match editor.readline("> ") {
                Ok(line) => {
                    editor.add_history_entry(line.as_str())?;
                    match self.eval(&line) {
                        Ok(Flow::Continue) => {}
                        Ok(Flow::Exit) => break,
                        Err(err) => println!("{err}"),
                    }
                }
                // ^C drops the current line; the session goes on.
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::SharedSink;

    fn shell() -> (Shell, SharedSink) {
        let sink = SharedSink::new();
        let shell = Shell::with_console(Console::with_sink(Box::new(sink.clone())));
        (shell, sink)
    }

    #[test]
    fn echo_prints_its_arguments() {
        let (mut sh, sink) = shell();
        assert_eq!(sh.eval("echo hello world").unwrap(), Flow::Continue);
        assert_eq!(sink.contents(), "hello world\n");
    }

    #[test]
    fn whitespace_only_line_is_a_silent_success() {
        let (mut sh, sink) = shell();
        assert_eq!(sh.eval("   ").unwrap(), Flow::Continue);
        assert_eq!(sink.contents(), "");
    }

    #[test]
    fn pipeline_passes_the_buffer_along() {
        let (mut sh, sink) = shell();
        sh.eval("echo one two three | wc").unwrap();
        assert_eq!(sink.contents(), "1 3 13\n");
    }

    #[test]
    fn declarations_persist_between_lines() {
        let (mut sh, sink) = shell();
        sh.eval("name=World").unwrap();
        sh.eval("echo Hello, $name!").unwrap();
        assert_eq!(sh.env().get("name"), "World");
        assert_eq!(sink.contents(), "Hello, World!\n");
    }

    #[test]
    fn declaration_prefix_runs_the_command_without_binding() {
        // The synthetic pipe turns `v=1 echo hi` into a two-segment line, so
        // the declaration segment is dropped and only the command runs.
        let (mut sh, sink) = shell();
        sh.eval("v=1 echo hi").unwrap();
        assert_eq!(sink.contents(), "hi\n");
        assert_eq!(sh.env().get("v"), "");
    }

    #[test]
    fn piped_declaration_run_is_not_applied() {
        let (mut sh, sink) = shell();
        sh.eval("a=1 | echo visible").unwrap();
        assert_eq!(sink.contents(), "visible\n");
        assert!(sh.env().is_empty());
    }

    #[test]
    fn sole_exit_signals_and_clears_the_environment() {
        let (mut sh, sink) = shell();
        sh.eval("keep=me").unwrap();
        assert_eq!(sh.eval("exit").unwrap(), Flow::Exit);
        assert!(sh.env().is_empty());
        assert_eq!(sink.contents(), "");
    }

    #[test]
    fn mid_pipeline_exit_merely_swallows_the_buffer() {
        let (mut sh, sink) = shell();
        sh.eval("keep=me").unwrap();
        assert_eq!(sh.eval("echo hi | exit").unwrap(), Flow::Continue);
        assert_eq!(sink.contents(), "");
        assert_eq!(sh.env().get("keep"), "me");
    }

    #[test]
    fn substitution_uses_the_state_before_the_line_runs() {
        // `$x` expands while tokenizing, before the declaration executes.
        let (mut sh, sink) = shell();
        sh.eval("x=5").unwrap();
        sh.eval("x=6 | echo $x").unwrap();
        assert_eq!(sink.contents(), "5\n");
    }

    #[test]
    fn errors_name_each_phase() {
        let (mut sh, _sink) = shell();
        assert_eq!(
            sh.eval("echo \"unterminated").unwrap_err().to_string(),
            "syntax error: unterminated quote \""
        );
        assert_eq!(
            sh.eval("cat |").unwrap_err().to_string(),
            "unexpected end of the pipeline"
        );
        assert_eq!(
            sh.eval("| cat").unwrap_err().to_string(),
            "bad pipeline composition: unexpected pipeline token"
        );
        let err = sh
            .eval(&format!("cat missing_file_{}", std::process::id()))
            .unwrap_err();
        assert!(matches!(err, ShellError::Exec(_)));
    }

    #[test]
    fn grep_pipeline_end_to_end() {
        let (mut sh, sink) = shell();
        sh.eval("echo 'needle in a haystack' | grep needle").unwrap();
        assert_eq!(sink.contents(), "needle in a haystack\n");
    }

    #[test]
    #[cfg(unix)]
    fn external_commands_join_the_pipeline() {
        let (mut sh, sink) = shell();
        sh.eval("echo shouted | tr a-z A-Z").unwrap();
        assert_eq!(sink.contents(), "SHOUTED\n");
    }
}
