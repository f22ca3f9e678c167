use argh::FromArgs;
use rshell::Shell;

#[derive(FromArgs)]
/// A small unix shell: two-stage pipes, output redirection, and the cd,
/// help, and exit built-ins.
struct Args {
    /// run a single command line and exit with its status
    #[argh(option, short = 'c')]
    command: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args: Args = argh::from_env();

    let mut shell = Shell::new();
    let status = match args.command {
        Some(line) => shell.run_line(&line),
        None => shell.repl()?,
    };
    std::process::exit(status);
}
