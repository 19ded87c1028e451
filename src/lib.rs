//! A tiny line-oriented command interpreter.
//!
//! Each input line is split into tokens honoring quoting and `$`-variable
//! substitution, assembled into a pipeline of command stages and run against
//! a shared console buffer. Built-in commands cover text search, counting,
//! file echoing and variable assignment; any other name is forwarded to the
//! operating system's process launcher.
//!
//! The main entry point is [`Shell`], which owns the variable
//! [`env::Environment`] and the [`console::Console`] buffer and drives the
//! tokenizer → builder → executor chain for each line. The public modules
//! expose the individual phases for embedding and testing.

pub mod builder;
mod builtin;
pub mod command;
pub mod console;
pub mod env;
pub mod executor;
mod expander;
mod external;
pub mod interpreter;
pub mod tokenizer;

pub use interpreter::{Shell, ShellError};
