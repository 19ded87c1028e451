//! The shared console buffer and the descriptor bindings commands talk through.

use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;

/// One process-wide text cell passing output from stage to stage.
///
/// Every write overwrites the previous content, a read returns whatever was
/// written last. Flushing prints the buffer plus a newline to the owned sink
/// and clears it; flushing an empty buffer prints nothing. Execution is
/// strictly sequential, so plain mutable state is enough — no locking.
pub struct Console {
    buffer: String,
    sink: Box<dyn Write>,
}

impl Console {
    /// Console flushing to standard output.
    pub fn new() -> Self {
        Self::with_sink(Box::new(io::stdout()))
    }

    /// Console flushing to a caller-provided sink. Tests pair this with
    /// [`SharedSink`] to inspect what a pipeline printed.
    pub fn with_sink(sink: Box<dyn Write>) -> Self {
        Self {
            buffer: String::new(),
            sink,
        }
    }

    /// Replace the buffer content.
    pub fn write(&mut self, text: &str) {
        self.buffer.clear();
        self.buffer.push_str(text);
    }

    /// The last written content.
    pub fn read(&self) -> &str {
        &self.buffer
    }

    /// Print the buffer to the sink and clear it. Empty buffers flush
    /// silently.
    pub fn flush(&mut self) -> io::Result<()> {
        if !self.buffer.is_empty() {
            writeln!(self.sink, "{}", self.buffer)?;
            self.sink.flush()?;
        }
        self.buffer.clear();
        Ok(())
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

/// One end of a command's IO: the console buffer, or a file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    Console,
    File(PathBuf),
}

impl Descriptor {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Descriptor::File(path.into())
    }

    /// Read the full text behind this descriptor.
    pub fn read(&self, console: &Console) -> io::Result<String> {
        match self {
            Descriptor::Console => Ok(console.read().to_string()),
            Descriptor::File(path) => fs::read_to_string(path),
        }
    }

    /// Overwrite the destination with `text`.
    pub fn write(&self, console: &mut Console, text: &str) -> io::Result<()> {
        match self {
            Descriptor::Console => {
                console.write(text);
                Ok(())
            }
            Descriptor::File(path) => fs::write(path, text),
        }
    }

    pub fn is_console(&self) -> bool {
        matches!(self, Descriptor::Console)
    }
}

/// A command's two descriptor ends, fixed once at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bindings {
    pub input: Descriptor,
    pub output: Descriptor,
}

impl Default for Bindings {
    /// Both ends on the console buffer.
    fn default() -> Self {
        Self {
            input: Descriptor::Console,
            output: Descriptor::Console,
        }
    }
}

/// Clonable in-memory sink capturing everything the console flushes.
///
/// Clones share one underlying buffer, so a test can hand one clone to
/// [`Console::with_sink`] and keep another to read the captured bytes back.
#[derive(Clone, Default)]
pub struct SharedSink {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl SharedSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captured output as text.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.borrow()).into_owned()
    }
}

impl Write for SharedSink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
