//! Launching commands that are not built in.

use crate::command::{Command, ExecError, Outcome};
use crate::console::{Bindings, Console};
use crate::env::Environment;
use std::io::Write;
use std::process::{ExitStatus, Stdio};

/// A command forwarded verbatim to the operating system's process launcher.
///
/// The previous stage's text is piped to the child's standard input and the
/// child runs to completion before the pipeline continues. There is no
/// timeout: a hanging child blocks the whole interpreter.
#[derive(Debug)]
pub(crate) struct External {
    argv: Vec<String>,
    io: Bindings,
}

impl External {
    /// `argv` holds the command name followed by its arguments, verbatim.
    pub fn new(argv: Vec<String>) -> Self {
        Self {
            argv,
            io: Bindings::default(),
        }
    }
}

impl Command for External {
    fn name(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or("")
    }

    fn execute(
        &mut self,
        _env: &mut Environment,
        console: &mut Console,
    ) -> Result<Outcome, ExecError> {
        let name = self.argv.first().cloned().unwrap_or_default();
        let mut child = std::process::Command::new(&name)
            .args(&self.argv[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(ExecError::process(&name))?;

        let input = self
            .io
            .input
            .read(console)
            .map_err(ExecError::process(&name))?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input.as_bytes())
                .map_err(ExecError::process(&name))?;
        }

        let output = child
            .wait_with_output()
            .map_err(ExecError::process(&name))?;

        // stderr wins over stdout so failures land in the buffer the same
        // way regular output does.
        let captured = if output.stderr.is_empty() {
            String::from_utf8_lossy(&output.stdout).into_owned()
        } else {
            String::from_utf8_lossy(&output.stderr).into_owned()
        };
        // The flush puts the final newline back.
        let text = captured.strip_suffix('\n').unwrap_or(&captured);
        self.io
            .output
            .write(console, text)
            .map_err(ExecError::write("external"))?;

        let code = match output.status.code() {
            Some(code) => code,
            None => terminated_by_signal(output.status),
        };
        Ok(Outcome::Code(code))
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::SharedSink;

    fn console() -> Console {
        Console::with_sink(Box::new(SharedSink::new()))
    }

    #[test]
    #[cfg(unix)]
    fn captures_stdout_into_the_buffer() {
        let mut env = Environment::new();
        let mut console = console();
        let mut cmd = External::new(vec![
            "sh".to_string(),
            "-c".to_string(),
            "printf 'out'".to_string(),
        ]);
        assert_eq!(
            cmd.execute(&mut env, &mut console).unwrap(),
            Outcome::Code(0)
        );
        assert_eq!(console.read(), "out");
    }

    #[test]
    #[cfg(unix)]
    fn stderr_takes_precedence_over_stdout() {
        let mut env = Environment::new();
        let mut console = console();
        let mut cmd = External::new(vec![
            "sh".to_string(),
            "-c".to_string(),
            "echo good; echo bad 1>&2".to_string(),
        ]);
        cmd.execute(&mut env, &mut console).unwrap();
        assert_eq!(console.read(), "bad");
    }

    #[test]
    #[cfg(unix)]
    fn buffer_text_reaches_child_stdin() {
        let mut env = Environment::new();
        let mut console = console();
        console.write("piped text");
        let mut cmd = External::new(vec!["cat".to_string()]);
        // Not the builtin: dispatched here only in tests, the builder owns
        // the real routing.
        cmd.execute(&mut env, &mut console).unwrap();
        assert_eq!(console.read(), "piped text");
    }

    #[test]
    #[cfg(unix)]
    fn nonzero_status_is_reported_not_raised() {
        let mut env = Environment::new();
        let mut console = console();
        let mut cmd = External::new(vec![
            "sh".to_string(),
            "-c".to_string(),
            "exit 3".to_string(),
        ]);
        assert_eq!(
            cmd.execute(&mut env, &mut console).unwrap(),
            Outcome::Code(3)
        );
    }

    #[test]
    fn unknown_binary_is_an_execution_error() {
        let mut env = Environment::new();
        let mut console = console();
        let name = format!("pipeshell_no_such_binary_{}", std::process::id());
        let mut cmd = External::new(vec![name.clone()]);
        let err = cmd.execute(&mut env, &mut console).unwrap_err();
        assert!(err.to_string().starts_with(&name));
    }
}
