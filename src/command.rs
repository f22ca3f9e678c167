use std::path::PathBuf;

use crate::error::ParseError;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// A single external command: the program name followed by its arguments.
///
/// Invariant: never empty. The constructor is the only way in, so
/// `program()` cannot panic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    tokens: Vec<String>,
}

impl Command {
    pub fn new(tokens: Vec<String>) -> Result<Self, ParseError> {
        if tokens.is_empty() {
            return Err(ParseError::EmptyCommand);
        }
        Ok(Self { tokens })
    }

    /// The bare program name, resolved against the search path at launch.
    pub fn program(&self) -> &str {
        &self.tokens[0]
    }

    /// The full argument vector, program name included, as `execve` wants it.
    pub fn argv(&self) -> &[String] {
        &self.tokens
    }
}

/// The shape of one parsed command line.
///
/// A line carries at most one topology-defining operator; `|` and `>` are
/// mutually exclusive and pipelines are limited to two stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pipeline {
    Simple(Command),
    Piped { producer: Command, consumer: Command },
    Redirected { command: Command, target: PathBuf },
}

impl Pipeline {
    /// Classify a whitespace-split token slice: scan for `|` first, then
    /// `>`, else the line is a single command.
    pub fn classify(tokens: &[String]) -> Result<Self, ParseError> {
        if tokens.is_empty() {
            return Err(ParseError::EmptyCommand);
        }

        let pipes = tokens.iter().filter(|t| *t == "|").count();
        let redirects = tokens.iter().filter(|t| *t == ">").count();
        if pipes > 0 && redirects > 0 || redirects > 1 {
            return Err(ParseError::ConflictingOperators);
        }
        if pipes > 1 {
            return Err(ParseError::TooManyStages);
        }

        if let Some(at) = tokens.iter().position(|t| t == "|") {
            let producer = Command::new(tokens[..at].to_vec())
                .map_err(|_| ParseError::MissingOperand("|".into()))?;
            let consumer = Command::new(tokens[at + 1..].to_vec())
                .map_err(|_| ParseError::MissingOperand("|".into()))?;
            return Ok(Pipeline::Piped { producer, consumer });
        }

        if let Some(at) = tokens.iter().position(|t| t == ">") {
            let command = Command::new(tokens[..at].to_vec())
                .map_err(|_| ParseError::MissingOperand(">".into()))?;
            // The target is the last token, everything before `>` is the command.
            let target = match tokens.last() {
                Some(t) if at < tokens.len() - 1 => PathBuf::from(t),
                _ => return Err(ParseError::MissingOperand(">".into())),
            };
            return Ok(Pipeline::Redirected { command, target });
        }

        Ok(Pipeline::Simple(Command::new(tokens.to_vec())?))
    }
}
