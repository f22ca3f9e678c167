use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while classifying a token slice into a [`crate::Pipeline`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty command")]
    EmptyCommand,

    /// A topology operator with nothing on one of its sides.
    #[error("syntax error near `{0}`")]
    MissingOperand(String),

    #[error("pipelines with more than two stages are not supported")]
    TooManyStages,

    /// `|` combined with `>`, or a second `>`. A command line carries at
    /// most one topology-defining operator.
    #[error("`|` and `>` cannot be combined")]
    ConflictingOperators,
}

/// Failures of the execution engine itself.
///
/// Resolution and redirection failures are normally handled inside the
/// affected child (diagnostic plus non-zero exit) and never surface here;
/// the variants exist for the resolver's pure API and for the child-side
/// wiring code. A `Spawn` failure aborts the current command but must not
/// take the interactive session down with it.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Process creation failed. `code` is the negated errno, keeping the
    /// shape of a negative fork return.
    #[error("fork failed, returning {code}")]
    Spawn { code: i32 },

    /// No directory on the search path holds an executable by this name.
    #[error("command not found: {name}")]
    CommandNotFound { name: String },

    /// The `>` target could not be created.
    #[error("{}: {source}", .path.display())]
    RedirectionTarget {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("argument contains an interior NUL byte")]
    InvalidArgument(#[from] std::ffi::NulError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Os(#[from] nix::errno::Errno),
}
