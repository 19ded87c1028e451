//! Sequential execution of a built pipeline.

use crate::command::{Command, ExecError, Outcome};
use crate::console::Console;
use crate::env::Environment;
use tracing::debug;

/// What the read-eval loop should do after a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// A stage signalled interpreter exit.
    Exit,
}

/// Run every stage front to back, then flush the console exactly once.
///
/// A stage's non-zero exit code does not stop the pipeline — later stages
/// still run against whatever the failed one left in the buffer. A runtime
/// error does stop it, and the flush is skipped, so a failed line prints
/// nothing but its error message. The exit signal aborts the remaining
/// stages immediately; the exit stage has already cleared the environment.
pub fn run_pipeline(
    pipeline: &mut [Box<dyn Command>],
    env: &mut Environment,
    console: &mut Console,
) -> Result<Flow, ExecError> {
    for stage in pipeline.iter_mut() {
        match stage.execute(env, console)? {
            Outcome::Code(0) => {}
            Outcome::Code(code) => {
                debug!(command = stage.name(), code, "stage failed, continuing");
            }
            Outcome::Exit => return Ok(Flow::Exit),
        }
    }
    console.flush().map_err(ExecError::write("console"))?;
    Ok(Flow::Continue)
}
