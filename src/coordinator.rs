use std::os::fd::{AsFd, AsRawFd};
use std::path::Path;

use log::debug;
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, fork, pipe};

use crate::command::{Command, ExitCode, Pipeline};
use crate::env::Environment;
use crate::error::EngineError;
use crate::launcher::{self, ExecutionContext, StreamBinding};

/// Parent-side half of the engine: classifies a token slice, allocates the
/// pipe when one is needed, forks the children, and reaps every one of
/// them exactly once.
///
/// The coordinator never execs anything itself. Both stages of a pipe run
/// in forked children; the parent's only jobs are descriptor bookkeeping
/// and waiting.
pub struct Coordinator<'a> {
    env: &'a Environment,
}

impl<'a> Coordinator<'a> {
    pub fn new(env: &'a Environment) -> Self {
        Self { env }
    }

    /// Run one parsed input line. Tokens are already whitespace-split;
    /// built-ins were intercepted by the caller and never reach here.
    ///
    /// Blocks until every spawned child has exited and returns the
    /// command's (for a pipe: the consumer's) exit status. A failed fork
    /// surfaces as [`EngineError::Spawn`] and aborts this command only.
    pub fn run(&self, tokens: &[String]) -> Result<ExitCode, EngineError> {
        match Pipeline::classify(tokens)? {
            Pipeline::Simple(command) => self.run_simple(&command),
            Pipeline::Piped { producer, consumer } => self.run_piped(&producer, &consumer),
            Pipeline::Redirected { command, target } => self.run_redirected(&command, &target),
        }
    }

    fn run_simple(&self, command: &Command) -> Result<ExitCode, EngineError> {
        debug!("topology: simple, program {:?}", command.program());
        let child = self.spawn(ExecutionContext {
            command,
            stdin: StreamBinding::Inherit,
            stdout: StreamBinding::Inherit,
            pipe_fds: &[],
        })?;
        self.reap(child)
    }

    fn run_piped(&self, producer: &Command, consumer: &Command) -> Result<ExitCode, EngineError> {
        debug!(
            "topology: piped, {:?} | {:?}",
            producer.program(),
            consumer.program()
        );
        let (read_end, write_end) = pipe()?;
        let pipe_fds = [read_end.as_raw_fd(), write_end.as_raw_fd()];

        let producer_pid = self.spawn(ExecutionContext {
            command: producer,
            stdin: StreamBinding::Inherit,
            stdout: StreamBinding::Pipe(write_end.as_fd()),
            pipe_fds: &pipe_fds,
        })?;

        let consumer_pid = match self.spawn(ExecutionContext {
            command: consumer,
            stdin: StreamBinding::Pipe(read_end.as_fd()),
            stdout: StreamBinding::Inherit,
            pipe_fds: &pipe_fds,
        }) {
            Ok(pid) => pid,
            Err(err) => {
                // The producer is already running. Close our pipe ends so
                // it sees a dead reader instead of hanging, then reap it.
                drop(read_end);
                drop(write_end);
                let _ = self.reap(producer_pid);
                return Err(err);
            }
        };

        // Both children hold their copies now; the parent's ends must go,
        // or the consumer never observes end-of-input.
        drop(read_end);
        drop(write_end);

        let producer_status = self.reap(producer_pid);
        let consumer_status = self.reap(consumer_pid);
        debug!("piped: producer {producer_status:?}, consumer {consumer_status:?}");
        producer_status?;
        consumer_status
    }

    fn run_redirected(&self, command: &Command, target: &Path) -> Result<ExitCode, EngineError> {
        debug!(
            "topology: redirected, {:?} > {}",
            command.program(),
            target.display()
        );
        let child = self.spawn(ExecutionContext {
            command,
            stdin: StreamBinding::Inherit,
            stdout: StreamBinding::File(target),
            pipe_fds: &[],
        })?;
        self.reap(child)
    }

    /// Fork once. The child half never returns: it launches straight into
    /// the execution context. The parent half yields the handle that
    /// `reap` must consume exactly once.
    fn spawn(&self, ctx: ExecutionContext<'_>) -> Result<Pid, EngineError> {
        match unsafe { fork() } {
            Ok(ForkResult::Child) => launcher::launch(ctx, self.env),
            Ok(ForkResult::Parent { child }) => {
                debug!("spawned {:?} as pid {child}", ctx.command.program());
                Ok(child)
            }
            Err(errno) => Err(EngineError::Spawn {
                code: -(errno as i32),
            }),
        }
    }

    /// Block until `pid` exits; no timeout, no cancellation. Signal deaths
    /// map to `128 + signo`, the usual shell convention.
    fn reap(&self, pid: Pid) -> Result<ExitCode, EngineError> {
        match waitpid(pid, None)? {
            WaitStatus::Exited(_, code) => Ok(code),
            WaitStatus::Signaled(_, signal, _) => Ok(128 + signal as i32),
            other => {
                debug!("unexpected wait status for pid {pid}: {other:?}");
                Ok(1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn temp_target(tag: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "coordinator_tests_{}_{}",
            std::process::id(),
            tag
        ));
        let _ = fs::remove_file(&path);
        path
    }

    #[test]
    fn simple_command_passes_the_exit_status_through() {
        let env = Environment::new();
        let coordinator = Coordinator::new(&env);
        assert_eq!(coordinator.run(&tokens(&["true"])).unwrap(), 0);
        assert_eq!(coordinator.run(&tokens(&["false"])).unwrap(), 1);
    }

    #[test]
    fn redirect_writes_exactly_the_producer_bytes() {
        let env = Environment::new();
        let target = temp_target("redirect");

        let code = Coordinator::new(&env)
            .run(&tokens(&["echo", "x", ">", target.to_str().unwrap()]))
            .unwrap();

        assert_eq!(code, 0);
        assert_eq!(fs::read_to_string(&target).unwrap(), "x\n");
        let _ = fs::remove_file(target);
    }

    #[test]
    fn pipe_delivers_producer_output_to_the_consumer() {
        // tee both proves the pipe carried the bytes and leaves something
        // on disk to assert on
        let env = Environment::new();
        let target = temp_target("pipe");

        let code = Coordinator::new(&env)
            .run(&tokens(&["echo", "hi", "|", "tee", target.to_str().unwrap()]))
            .unwrap();

        assert_eq!(code, 0);
        assert_eq!(fs::read_to_string(&target).unwrap(), "hi\n");
        let _ = fs::remove_file(target);
    }

    #[test]
    fn unresolvable_program_fails_the_child_not_the_shell() {
        let env = Environment::new();
        let code = Coordinator::new(&env)
            .run(&tokens(&["rshell-no-such-program"]))
            .unwrap();
        // the child reported and exited; the parent is still here
        assert_ne!(code, 0);
    }

    #[test]
    fn unresolvable_consumer_does_not_hang_the_pipeline() {
        let env = Environment::new();
        let code = Coordinator::new(&env)
            .run(&tokens(&["echo", "hi", "|", "rshell-no-such-program"]))
            .unwrap();
        assert_ne!(code, 0);
    }

    #[test]
    fn redirect_into_a_missing_directory_is_not_a_crash() {
        let env = Environment::new();
        let target = std::env::temp_dir()
            .join(format!("coordinator_missing_{}", std::process::id()))
            .join("out.txt");

        let code = Coordinator::new(&env)
            .run(&tokens(&["echo", "x", ">", target.to_str().unwrap()]))
            .unwrap();

        assert_ne!(code, 0);
        assert!(!target.exists());
    }

    #[test]
    fn empty_pipe_side_is_a_parse_error_before_any_spawn() {
        let env = Environment::new();
        let err = Coordinator::new(&env).run(&tokens(&["ls", "|"])).unwrap_err();
        assert!(matches!(err, EngineError::Parse(_)));
    }
}
