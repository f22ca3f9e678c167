use anyhow::Result;
use log::debug;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::builtin::Builtin;
use crate::command::ExitCode;
use crate::coordinator::Coordinator;
use crate::env::Environment;

/// The interactive front end: reads lines, intercepts the built-ins, and
/// hands everything else to the [`Coordinator`].
///
/// Example
/// ```no_run
/// use rshell::Shell;
/// let mut sh = Shell::new();
/// let code = sh.run_line("echo hello world");
/// assert_eq!(code, 0);
/// ```
pub struct Shell {
    env: Environment,
}

impl Shell {
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
        }
    }

    /// Run one already-read input line and return its exit status.
    ///
    /// Tokenization is plain whitespace splitting; a blank line is a
    /// no-op. Engine failures (a failed fork, a syntax error) are reported
    /// on stderr and mapped to status 1 so the shell itself keeps running.
    pub fn run_line(&mut self, line: &str) -> ExitCode {
        let tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        if tokens.is_empty() {
            return 0;
        }

        if let Some(builtin) = Builtin::recognize(&tokens) {
            return builtin.execute(&mut self.env);
        }

        match Coordinator::new(&self.env).run(&tokens) {
            Ok(code) => code,
            Err(err) => {
                eprintln!("{err}");
                1
            }
        }
    }

    /// The read-eval-print loop: `<cwd> $ ` prompt with history. Ctrl-C
    /// abandons the current line, Ctrl-D leaves the shell with status 0,
    /// `exit [status]` leaves with the given status.
    pub fn repl(&mut self) -> Result<ExitCode> {
        let mut rl = DefaultEditor::new()?;

        loop {
            let prompt = format!("{} $ ", self.env.current_dir.display());
            match rl.readline(&prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    let code = self.run_line(&line);
                    debug!("line finished with status {code}");
                    if let Some(status) = self.env.should_exit {
                        return Ok(status);
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => return Ok(0),
                Err(err) => return Err(err.into()),
            }
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_a_no_op() {
        let mut sh = Shell::new();
        assert_eq!(sh.run_line(""), 0);
        assert_eq!(sh.run_line("   \t  "), 0);
    }

    #[test]
    fn builtins_are_intercepted_before_the_engine() {
        let mut sh = Shell::new();
        assert_eq!(sh.run_line("exit 7"), 7);
        assert_eq!(sh.env.should_exit, Some(7));
    }

    #[test]
    fn external_commands_report_their_status() {
        let mut sh = Shell::new();
        assert_eq!(sh.run_line("true"), 0);
        assert_eq!(sh.run_line("false"), 1);
    }

    #[test]
    fn engine_errors_keep_the_shell_alive() {
        let mut sh = Shell::new();
        // dangling operator is a parse error, not a crash
        assert_eq!(sh.run_line("ls |"), 1);
        assert_eq!(sh.env.should_exit, None);
        // and the shell still runs commands afterwards
        assert_eq!(sh.run_line("true"), 0);
    }
}
