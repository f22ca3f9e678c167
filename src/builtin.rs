use std::env as stdenv;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};

use crate::command::ExitCode;
use crate::env::Environment;

/// Commands handled inside the shell process itself.
///
/// Built-ins are intercepted from the token stream before the execution
/// engine ever sees them; none of them has any process-control side.
/// Arguments are parsed with [`argh`] (`FromArgs`), so `--help` works on
/// each of them for free.
pub enum Builtin {
    Cd(Cd),
    Help(Help),
    Exit(Exit),
    /// `argh` rejected the arguments, or `--help` was asked for.
    Invalid { output: String, is_error: bool },
}

impl Builtin {
    /// Recognize a built-in from the first token and parse the rest.
    /// Returns `None` for anything the engine should run.
    pub fn recognize(tokens: &[String]) -> Option<Builtin> {
        let name = tokens.first()?.as_str();
        let args: Vec<&str> = tokens[1..].iter().map(String::as_str).collect();

        fn parse<T: FromArgs>(name: &str, args: &[&str], wrap: fn(T) -> Builtin) -> Builtin {
            match T::from_args(&[name], args) {
                Ok(cmd) => wrap(cmd),
                Err(EarlyExit { output, status }) => Builtin::Invalid {
                    output,
                    is_error: status.is_err(),
                },
            }
        }

        match name {
            "cd" => Some(parse(name, &args, Builtin::Cd)),
            "help" => Some(parse(name, &args, Builtin::Help)),
            "exit" => Some(parse(name, &args, Builtin::Exit)),
            _ => None,
        }
    }

    /// Execute in-process. Failures are reported on stderr and mapped to
    /// status 1; a built-in never takes the shell down.
    pub fn execute(self, env: &mut Environment) -> ExitCode {
        let result = match self {
            Builtin::Cd(cd) => cd.run(env),
            Builtin::Help(help) => help.run(),
            Builtin::Exit(exit) => exit.run(env),
            Builtin::Invalid { output, is_error } => {
                if is_error {
                    eprintln!("{output}");
                    return 1;
                }
                println!("{output}");
                return 0;
            }
        };
        match result {
            Ok(code) => code,
            Err(err) => {
                eprintln!("{err}");
                1
            }
        }
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME environment variable.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory. Defaults to $HOME when omitted.
    pub target: Option<String>,
}

impl Cd {
    fn run(self, env: &mut Environment) -> Result<ExitCode> {
        let target = match &self.target {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => PathBuf::from(
                env.get_var("HOME")
                    .context("cd: no target and HOME not set")?,
            ),
        };

        let new_dir = if target.is_absolute() {
            target
        } else {
            env.current_dir.join(target)
        };

        let canonical = fs::canonicalize(&new_dir)
            .with_context(|| format!("cd: no such file or directory: {}", new_dir.display()))?;

        // children inherit the real cwd, so change both it and the snapshot
        stdenv::set_current_dir(&canonical)
            .with_context(|| format!("cd: can't chdir to {}", canonical.display()))?;
        env.current_dir = canonical;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print a short description of the shell.
pub struct Help {}

impl Help {
    fn run(self) -> Result<ExitCode> {
        println!("rshell: a small unix shell.");
        println!("Built-ins: cd, help, exit.");
        println!("Everything else is resolved against PATH and run in a child process.");
        println!("Two-stage pipes (a | b) and output redirection (a > file) are supported.");
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Leave the shell, optionally with an explicit status.
pub struct Exit {
    #[argh(positional)]
    /// exit status to report; defaults to 0.
    pub status: Option<i32>,
}

impl Exit {
    fn run(self, env: &mut Environment) -> Result<ExitCode> {
        let status = self.status.unwrap_or(0);
        env.should_exit = Some(status);
        Ok(status)
    }
}
