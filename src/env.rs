use std::collections::HashMap;
use std::env as stdenv;
use std::ffi::CString;
use std::path::PathBuf;

use crate::command::ExitCode;

/// Immutable-while-children-run snapshot of the process environment.
///
/// The engine never reads `std::env` implicitly: the search path and the
/// `envp` vector handed to `execve` both come from here, so tests can
/// substitute fake values. The front end owns the only mutable reference
/// and only touches it between commands (`cd`, `exit`).
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of environment variables (e.g. PATH, HOME).
    pub vars: HashMap<String, String>,
    /// The working directory shown in the prompt and used by `cd`.
    pub current_dir: PathBuf,
    /// Set by the `exit` built-in; the REPL checks it after every line.
    pub should_exit: Option<ExitCode>,
}

impl Environment {
    /// Capture the current process state into a new `Environment`.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            current_dir,
            should_exit: None,
        }
    }

    /// Get the value of an environment variable.
    ///
    /// Looks up the key in `self.vars` first, falling back to `std::env::var`.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    /// Set or override an environment variable in `self.vars`.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// The ordered list of directories consulted to resolve a bare command
    /// name, derived from PATH. Empty when PATH is unset.
    pub fn search_path(&self) -> Vec<PathBuf> {
        match self.get_var("PATH") {
            Some(path) => stdenv::split_paths(&path).collect(),
            None => Vec::new(),
        }
    }

    /// The environment in the `KEY=value` form `execve` expects.
    ///
    /// Entries that cannot be represented as C strings are skipped; they
    /// could never have crossed an `execve` boundary to begin with.
    pub fn execve_env(&self) -> Vec<CString> {
        self.vars
            .iter()
            .filter_map(|(k, v)| CString::new(format!("{k}={v}")).ok())
            .collect()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
