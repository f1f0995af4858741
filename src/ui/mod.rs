//! Terminal front-end.

pub mod keypad;
mod repl;

pub use repl::{Command, Flow, Repl, spawn_stdin_reader};
