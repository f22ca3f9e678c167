use std::ffi::CString;
use std::fs::OpenOptions;
use std::os::fd::{AsRawFd, BorrowedFd, RawFd};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use nix::libc::{STDIN_FILENO, STDOUT_FILENO};
use nix::unistd::{close, dup2, execve};

use crate::command::Command;
use crate::env::Environment;
use crate::error::EngineError;
use crate::resolver;

/// Where one of a child's standard streams comes from or goes to.
#[derive(Debug)]
pub enum StreamBinding<'a> {
    /// Keep the descriptor inherited from the shell.
    Inherit,
    /// Bind the stream to this pipe end.
    Pipe(BorrowedFd<'a>),
    /// Bind the stream to this file: opened read-only on the input slot,
    /// created without truncation on the output slot.
    File(&'a Path),
}

/// Everything a freshly forked child needs to become its program.
#[derive(Debug)]
pub struct ExecutionContext<'a> {
    pub command: &'a Command,
    pub stdin: StreamBinding<'a>,
    pub stdout: StreamBinding<'a>,
    /// Every pipe descriptor visible to this child, both ends. All of them
    /// are closed once the bindings are applied, including the end that was
    /// just duplicated onto a standard slot.
    pub pipe_fds: &'a [RawFd],
}

/// Child-side half of a spawn: wire the standard streams, drop every pipe
/// descriptor, then replace this process image with the resolved program.
///
/// Runs in the forked child only, never in the coordinating parent. On
/// success the new image takes over and this function does not return; on
/// any failure it writes one diagnostic line to stderr and exits 1.
pub fn launch(ctx: ExecutionContext<'_>, env: &Environment) -> ! {
    if let Err(err) = wire(&ctx.stdin, STDIN_FILENO).and_then(|_| wire(&ctx.stdout, STDOUT_FILENO))
    {
        eprintln!("{err}");
        std::process::exit(1);
    }

    // Bindings are in place; nothing below may touch the pipe again. A
    // stray write end left open here would keep the consumer blocked past
    // the producer's exit.
    for fd in ctx.pipe_fds {
        let _ = close(*fd);
    }

    let program = match resolver::resolve(ctx.command.program(), &env.search_path()) {
        Ok(program) => program,
        Err(_) => could_not_exec(ctx.command.program()),
    };

    // Only reached if execve itself refuses the resolved file.
    let _err = exec_image(&program, ctx.command, env);
    could_not_exec(ctx.command.program())
}

fn wire(binding: &StreamBinding<'_>, slot: RawFd) -> Result<(), EngineError> {
    match binding {
        StreamBinding::Inherit => Ok(()),
        StreamBinding::Pipe(fd) => {
            dup2(fd.as_raw_fd(), slot)?;
            Ok(())
        }
        StreamBinding::File(path) => {
            let open = if slot == STDIN_FILENO {
                OpenOptions::new().read(true).open(path)
            } else {
                // create-if-absent, write-only, no truncation
                OpenOptions::new().create(true).write(true).open(path)
            };
            let file = open.map_err(|source| EngineError::RedirectionTarget {
                path: path.to_path_buf(),
                source,
            })?;
            dup2(file.as_raw_fd(), slot)?;
            // `file` drops here, closing the one-time original descriptor.
            Ok(())
        }
    }
}

/// Replace the process image, passing the full argument vector and the
/// environment snapshot unchanged. Only ever returns an error.
fn exec_image(program: &Path, command: &Command, env: &Environment) -> EngineError {
    let path = match CString::new(program.as_os_str().as_bytes()) {
        Ok(path) => path,
        Err(err) => return err.into(),
    };
    let argv: Result<Vec<CString>, _> = command
        .argv()
        .iter()
        .map(|arg| CString::new(arg.as_str()))
        .collect();
    let argv = match argv {
        Ok(argv) => argv,
        Err(err) => return err.into(),
    };
    match execve(&path, &argv, &env.execve_env()) {
        Ok(never) => match never {},
        Err(errno) => errno.into(),
    }
}

fn could_not_exec(name: &str) -> ! {
    eprintln!("Child: Could not exec {name}");
    std::process::exit(1);
}
