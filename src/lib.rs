//! A small unix shell built around an explicit process-execution engine.
//!
//! The engine is three pieces. [`resolver`] turns a bare command name into
//! the first matching executable on the search path. [`launcher`] is the
//! child-side half of a spawn: it wires the standard streams the way an
//! [`launcher::ExecutionContext`] says, drops every stray pipe descriptor,
//! and replaces the process image. [`coordinator`] is the parent-side half:
//! it classifies a token slice into one of the three supported topologies
//! (single command, two-stage pipe, output redirection), allocates the pipe
//! when one is needed, forks the children, and reaps every one of them.
//!
//! The interactive front end ([`Shell`]) and the built-ins (`cd`, `help`,
//! `exit`) sit on top of the engine and never reach it.

pub mod builtin;
pub mod command;
pub mod coordinator;
pub mod env;
pub mod error;
mod interpreter;
pub mod launcher;
pub mod resolver;

pub use command::{Command, ExitCode, Pipeline};
pub use coordinator::Coordinator;
pub use error::{EngineError, ParseError};
pub use interpreter::Shell;
