use crate::console::Console;
use crate::env::Environment;
use std::io;
use thiserror::Error;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// What a stage produced: a plain status code, or the interpreter-exit
/// signal. The signal is expected control transfer, not an error, so it
/// travels in the `Ok` channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Code(ExitCode),
    /// Stop the pipeline and tell the read-eval loop to terminate.
    Exit,
}

/// Runtime failure inside a stage.
///
/// Aborts the rest of the pipeline; writes already produced by earlier
/// stages stay as they are.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("{command}: cannot read {path}: {source}")]
    ReadSource {
        command: &'static str,
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("{command}: cannot write output: {source}")]
    WriteOutput {
        command: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("{command}: {source}")]
    Process {
        command: String,
        #[source]
        source: io::Error,
    },
}

impl ExecError {
    pub(crate) fn read(command: &'static str, path: &str) -> impl FnOnce(io::Error) -> ExecError {
        let path = path.to_string();
        move |source| ExecError::ReadSource {
            command,
            path,
            source,
        }
    }

    pub(crate) fn write(command: &'static str) -> impl FnOnce(io::Error) -> ExecError {
        move |source| ExecError::WriteOutput { command, source }
    }

    pub(crate) fn process(command: &str) -> impl FnOnce(io::Error) -> ExecError {
        let command = command.to_string();
        move |source| ExecError::Process { command, source }
    }
}

/// One executable pipeline stage.
///
/// A command owns its two descriptor bindings for exactly one pipeline run
/// and exchanges text with its neighbours through them; the executor only
/// sees this trait.
pub trait Command: std::fmt::Debug {
    /// Name used in logs and dispatch tests.
    fn name(&self) -> &str;

    /// Run the stage against the shared environment and console buffer.
    fn execute(
        &mut self,
        env: &mut Environment,
        console: &mut Console,
    ) -> Result<Outcome, ExecError>;
}
