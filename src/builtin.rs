//! Built-in commands and their argument grammars.
//!
//! Grammars are declared with [`argh`] and parsed while the pipeline is
//! being built, so a bad flag is reported before anything runs. The commands
//! execute in-process and exchange text through their descriptor bindings.

use crate::command::{Command, ExecError, Outcome};
use crate::console::{Bindings, Console, Descriptor};
use crate::env::Environment;
use argh::FromArgs;
use regex::{Regex, RegexBuilder};
use std::io::{self, BufRead, Read};

/// Sentinel filename standing for "the previous stage's output", or live
/// standard input when the stage opens the pipeline.
const STDIN_MARKER: &str = "-";

#[derive(FromArgs)]
/// Print file contents, or pass the previous stage's output through.
pub(crate) struct CatArgs {
    #[argh(positional, greedy)]
    /// files to print; reads the previous stage's output when empty.
    pub files: Vec<String>,
}

#[derive(Debug)]
pub(crate) struct Cat {
    filenames: Vec<String>,
    interactive: bool,
    io: Bindings,
}

impl Cat {
    /// `interactive` is true when the stage opens the pipeline, in which
    /// case `-` reads live input line by line instead of the buffer.
    pub fn new(args: CatArgs, interactive: bool) -> Self {
        let mut filenames = args.files;
        if filenames.is_empty() {
            filenames.push(STDIN_MARKER.to_string());
        }
        Self {
            filenames,
            interactive,
            io: Bindings::default(),
        }
    }
}

impl Command for Cat {
    fn name(&self) -> &str {
        "cat"
    }

    fn execute(
        &mut self,
        _env: &mut Environment,
        console: &mut Console,
    ) -> Result<Outcome, ExecError> {
        for filename in &self.filenames {
            if filename != STDIN_MARKER {
                let text = Descriptor::file(filename)
                    .read(console)
                    .map_err(ExecError::read("cat", filename))?;
                self.io
                    .output
                    .write(console, &text)
                    .map_err(ExecError::write("cat"))?;
                continue;
            }

            if self.interactive {
                // Echo every line back as it arrives, until end of input.
                let stdin = io::stdin();
                for line in stdin.lock().lines() {
                    let line = line.map_err(ExecError::read("cat", STDIN_MARKER))?;
                    self.io
                        .output
                        .write(console, &line)
                        .map_err(ExecError::write("cat"))?;
                    if self.io.output.is_console() {
                        console.flush().map_err(ExecError::write("cat"))?;
                    }
                }
            } else {
                let text = self
                    .io
                    .input
                    .read(console)
                    .map_err(ExecError::read("cat", STDIN_MARKER))?;
                self.io
                    .output
                    .write(console, &text)
                    .map_err(ExecError::write("cat"))?;
            }
        }
        Ok(Outcome::Code(0))
    }
}

#[derive(FromArgs)]
/// Count lines, words and bytes per input source.
pub(crate) struct WcArgs {
    #[argh(positional, greedy)]
    /// files to count; counts the previous stage's output when empty.
    pub files: Vec<String>,
}

#[derive(Debug)]
pub(crate) struct Wc {
    filenames: Vec<String>,
    interactive: bool,
    tabular: bool,
    io: Bindings,
}

impl Wc {
    pub fn new(args: WcArgs, interactive: bool) -> Self {
        let mut filenames = args.files;
        if filenames.is_empty() {
            filenames.push(STDIN_MARKER.to_string());
        }
        // The filename column only appears when there is more than one
        // source to tell apart.
        let tabular = filenames.len() > 1;
        Self {
            filenames,
            interactive,
            tabular,
            io: Bindings::default(),
        }
    }
}

fn count(text: &str) -> (usize, usize, usize) {
    (
        text.lines().count(),
        text.split_whitespace().count(),
        text.len(),
    )
}

impl Command for Wc {
    fn name(&self) -> &str {
        "wc"
    }

    fn execute(
        &mut self,
        _env: &mut Environment,
        console: &mut Console,
    ) -> Result<Outcome, ExecError> {
        let mut rows = Vec::new();
        for filename in &self.filenames {
            let text = if filename != STDIN_MARKER {
                Descriptor::file(filename)
                    .read(console)
                    .map_err(ExecError::read("wc", filename))?
            } else if self.interactive {
                let mut buf = String::new();
                io::stdin()
                    .lock()
                    .read_to_string(&mut buf)
                    .map_err(ExecError::read("wc", STDIN_MARKER))?;
                buf
            } else {
                self.io
                    .input
                    .read(console)
                    .map_err(ExecError::read("wc", STDIN_MARKER))?
            };

            let (lines, words, bytes) = count(&text);
            let mut row = format!("{} {} {}", lines, words, bytes);
            if self.tabular {
                row.push(' ');
                row.push_str(filename);
            }
            rows.push(row);
        }
        self.io
            .output
            .write(console, &rows.join("\n"))
            .map_err(ExecError::write("wc"))?;
        Ok(Outcome::Code(0))
    }
}

#[derive(FromArgs)]
/// Write the arguments to the output, separated by single spaces.
pub(crate) struct EchoArgs {
    #[argh(positional, greedy)]
    /// values to print as-is.
    pub args: Vec<String>,
}

#[derive(Debug)]
pub(crate) struct Echo {
    text: String,
    io: Bindings,
}

impl Echo {
    pub fn new(args: EchoArgs) -> Self {
        Self {
            text: args.args.join(" "),
            io: Bindings::default(),
        }
    }
}

impl Command for Echo {
    fn name(&self) -> &str {
        "echo"
    }

    fn execute(
        &mut self,
        _env: &mut Environment,
        console: &mut Console,
    ) -> Result<Outcome, ExecError> {
        self.io
            .output
            .write(console, &self.text)
            .map_err(ExecError::write("echo"))?;
        Ok(Outcome::Code(0))
    }
}

#[derive(FromArgs)]
/// Report the current working directory.
pub(crate) struct PwdArgs {}

#[derive(Debug)]
pub(crate) struct Pwd {
    io: Bindings,
}

impl Pwd {
    pub fn new() -> Self {
        Self {
            io: Bindings::default(),
        }
    }
}

impl Command for Pwd {
    fn name(&self) -> &str {
        "pwd"
    }

    fn execute(
        &mut self,
        _env: &mut Environment,
        console: &mut Console,
    ) -> Result<Outcome, ExecError> {
        let dir = std::env::current_dir().map_err(ExecError::process("pwd"))?;
        self.io
            .output
            .write(console, &dir.to_string_lossy())
            .map_err(ExecError::write("pwd"))?;
        Ok(Outcome::Code(0))
    }
}

#[derive(FromArgs)]
/// Search for lines matching a regular expression.
pub(crate) struct GrepArgs {
    #[argh(switch, short = 'i')]
    /// ignore case distinctions
    pub ignore_case: bool,

    #[argh(switch, short = 'w')]
    /// match whole words only
    pub word_regexp: bool,

    #[argh(option, short = 'A', default = "0")]
    /// print NUM lines of trailing context after each match
    pub after_context: usize,

    #[argh(positional)]
    /// the pattern to search for
    pub pattern: String,

    #[argh(positional, greedy)]
    /// files to search; searches the previous stage's output when empty.
    pub files: Vec<String>,
}

#[derive(Debug)]
pub(crate) struct Grep {
    regex: Regex,
    after_context: usize,
    filenames: Vec<String>,
    io: Bindings,
}

impl Grep {
    /// Compiles the pattern up front; `-w` wraps it in word boundaries and
    /// `-i` makes matching case-insensitive. Fails on an invalid pattern.
    pub fn new(args: GrepArgs) -> Result<Self, regex::Error> {
        let pattern = if args.word_regexp {
            format!(r"\b({})\b", args.pattern)
        } else {
            args.pattern
        };
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(args.ignore_case)
            .build()?;

        let mut filenames = args.files;
        if filenames.is_empty() {
            filenames.push(STDIN_MARKER.to_string());
        }
        Ok(Self {
            regex,
            after_context: args.after_context,
            filenames,
            io: Bindings::default(),
        })
    }

    /// Select matching lines plus the trailing-context window. A fresh match
    /// inside the window restarts the countdown.
    fn select_matches(&self, text: &str, selected: &mut Vec<String>) {
        let mut remaining = 0usize;
        for line in text.lines() {
            if self.regex.is_match(line) {
                remaining = self.after_context;
                selected.push(line.to_string());
            } else if remaining > 0 {
                remaining -= 1;
                selected.push(line.to_string());
            }
        }
    }
}

impl Command for Grep {
    fn name(&self) -> &str {
        "grep"
    }

    fn execute(
        &mut self,
        _env: &mut Environment,
        console: &mut Console,
    ) -> Result<Outcome, ExecError> {
        let mut selected = Vec::new();
        for filename in &self.filenames {
            let text = if filename == STDIN_MARKER {
                self.io
                    .input
                    .read(console)
                    .map_err(ExecError::read("grep", STDIN_MARKER))?
            } else {
                Descriptor::file(filename)
                    .read(console)
                    .map_err(ExecError::read("grep", filename))?
            };
            self.select_matches(&text, &mut selected);
        }
        self.io
            .output
            .write(console, &selected.join("\n"))
            .map_err(ExecError::write("grep"))?;
        Ok(Outcome::Code(0))
    }
}

#[derive(FromArgs)]
/// Leave the interpreter.
pub(crate) struct ExitArgs {
    #[argh(positional, greedy)]
    /// accepted and ignored.
    pub _args: Vec<String>,
}

#[derive(Debug)]
pub(crate) struct Exit {
    should_interrupt: bool,
    io: Bindings,
}

impl Exit {
    /// Only the sole stage of a line actually signals termination; a
    /// mid-pipeline exit is a successful no-op.
    pub fn new(should_interrupt: bool) -> Self {
        Self {
            should_interrupt,
            io: Bindings::default(),
        }
    }
}

impl Command for Exit {
    fn name(&self) -> &str {
        "exit"
    }

    fn execute(
        &mut self,
        env: &mut Environment,
        console: &mut Console,
    ) -> Result<Outcome, ExecError> {
        self.io
            .output
            .write(console, "")
            .map_err(ExecError::write("exit"))?;
        if self.should_interrupt {
            env.clear();
            return Ok(Outcome::Exit);
        }
        Ok(Outcome::Code(0))
    }
}

/// A declaration run: `NAME=VALUE ...` applied to the environment in order.
#[derive(Debug)]
pub(crate) struct Assign {
    decls: Vec<(String, String)>,
    io: Bindings,
}

impl Assign {
    pub fn new(decls: Vec<(String, String)>) -> Self {
        Self {
            decls,
            io: Bindings::default(),
        }
    }
}

impl Command for Assign {
    fn name(&self) -> &str {
        "assign"
    }

    fn execute(
        &mut self,
        env: &mut Environment,
        console: &mut Console,
    ) -> Result<Outcome, ExecError> {
        for (name, value) in &self.decls {
            env.set(name.clone(), value.clone());
        }
        self.io
            .output
            .write(console, "")
            .map_err(ExecError::write("assign"))?;
        Ok(Outcome::Code(0))
    }
}

/// Stage standing in for a built-in whose `--help` was requested: prints the
/// generated usage text and succeeds.
#[derive(Debug)]
pub(crate) struct Usage {
    name: String,
    text: String,
    io: Bindings,
}

impl Usage {
    pub fn new(name: &str, text: String) -> Self {
        Self {
            name: name.to_string(),
            text,
            io: Bindings::default(),
        }
    }
}

impl Command for Usage {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(
        &mut self,
        _env: &mut Environment,
        console: &mut Console,
    ) -> Result<Outcome, ExecError> {
        self.io
            .output
            .write(console, self.text.trim_end())
            .map_err(ExecError::write("help"))?;
        Ok(Outcome::Code(0))
    }
}
