//! `vfsh` - a POSIX-style shell over conversation trees, addressed as a
//! virtual filesystem.
//!
//! This binary is a thin REPL wrapper around `vfsh-core`: it owns stdin/
//! stdout, terminal styling, and process configuration (clap + tracing).
//! Every actual path-parsing, navigation, and command-dispatch decision
//! lives in the core crate, which has no knowledge a terminal exists.

use std::io::{self, Write};

use anyhow::Result;
use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;

use vfsh_core::commands::{register_builtin_commands, session};
use vfsh_core::dispatcher::{CommandResult, Dispatcher, ShellCommand};
use vfsh_core::fixtures::seeded_repository;
use vfsh_core::repl;
use vfsh_core::repository::InMemoryRepository;
use vfsh_core::ShellContext;

/// A POSIX-style shell over conversation trees, addressed as a virtual filesystem.
#[derive(Parser, Debug)]
#[command(name = "vfsh", version, about = "A POSIX-style shell over conversation trees")]
struct Cli {
    /// Seed the in-memory repository with deterministic demo conversations.
    #[arg(long)]
    seed: bool,

    /// Initial VFS working directory.
    #[arg(long, default_value = "/")]
    cwd: String,

    /// Increase log verbosity (-v, -vv, -vvv). Overridden by RUST_LOG if set.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Run a single command line non-interactively and exit with its exit code.
    #[arg(long)]
    command: Option<String>,
}

fn init_logging(verbose: u8) {
    let default_directive = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Replaces the no-op `help` handler with one whose output is baked in,
/// now that every other builtin (including `help` itself) is registered
/// and [`session::render_help`] has a populated dispatcher to read.
struct StaticHelp(String);

impl ShellCommand for StaticHelp {
    fn name(&self) -> &'static str {
        "help"
    }
    fn usage(&self) -> &'static str {
        "help - list available commands"
    }
    fn run(&self, _ctx: &mut ShellContext, _args: &[String], _stdin: &str) -> CommandResult {
        CommandResult::ok(self.0.clone())
    }
}

fn build_dispatcher() -> Dispatcher {
    let mut dispatcher = Dispatcher::new();
    register_builtin_commands(&mut dispatcher);
    let help_text = session::render_help(&dispatcher);
    dispatcher.register(Box::new(StaticHelp(help_text)));
    dispatcher
}

fn print_result(result: &CommandResult) {
    if !result.output.is_empty() {
        print!("{}", result.output);
        let _ = io::stdout().flush();
    }
    if let Some(err) = &result.error {
        eprintln!("{} {err}", style("error:").red().bold());
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let repository: InMemoryRepository = if cli.seed {
        seeded_repository()
    } else {
        InMemoryRepository::new()
    };
    let mut ctx = ShellContext::new(Box::new(repository));
    if cli.cwd != "/" {
        ctx.set_cwd(cli.cwd.clone());
    }
    let dispatcher = build_dispatcher();

    if let Some(line) = cli.command {
        tracing::info!(line = %line, "running single command");
        let result = repl::run_line(&dispatcher, &mut ctx, &line);
        print_result(&result);
        std::process::exit(result.exit_code);
    }

    tracing::info!(seeded = cli.seed, "starting interactive REPL");
    println!("{}", style("vfsh - conversation virtual filesystem shell").bold());
    println!("Type 'help' for a list of commands, 'exit' to quit.\n");

    loop {
        print!("{}", style(repl::prompt(&ctx)).cyan());
        if io::stdout().flush().is_err() {
            break;
        }

        let mut line = String::new();
        let bytes_read = match io::stdin().read_line(&mut line) {
            Ok(n) => n,
            Err(e) => {
                eprintln!("{} {e}", style("error:").red().bold());
                break;
            }
        };
        if bytes_read == 0 {
            println!();
            break;
        }

        let result = repl::run_line(&dispatcher, &mut ctx, &line);
        print_result(&result);

        if ctx.should_exit {
            break;
        }
    }

    Ok(())
}
