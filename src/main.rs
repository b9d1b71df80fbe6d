//! pwqctl - Main entry point
//!
//! Thin dispatch over the library: `show` prints the effective parameter
//! set, `set` reconciles command-line flags against the file, and `module`
//! runs one JSON request document for orchestration tooling. All three sit
//! on the same engine; only the input and output framing differs.

use anyhow::{bail, Context, Result};
use std::io::Read;
use tracing::debug;

use pwqctl::cli::{Cli, Commands};
use pwqctl::engine::{self, PolicyOutcome, PolicyRequest};
use pwqctl::protocol;

/// Initialize tracing to stderr, keeping stdout clean for command output
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse_args();
    debug!("CLI arguments parsed");

    if let Err(err) = run(cli) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Show { json } => {
            let params = engine::show(&cli.path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&params)?);
            } else {
                for (param, value) in &params {
                    println!("{param} = {value}");
                }
            }
        }
        Commands::Set(args) => {
            let desired = args.to_desired_state()?;
            if desired.is_empty() {
                bail!("nothing to do: no parameter flags given (see pwqctl set --help)");
            }
            let request = PolicyRequest {
                path: cli.path,
                desired,
                backup: args.backup,
                check_mode: args.dry_run,
            };
            let outcome = engine::apply_policy(&request)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_outcome(&outcome, args.dry_run);
            }
        }
        Commands::Module { file } => {
            let request = read_request(&file)?;
            match protocol::run_module(&request) {
                Ok(reply) => println!("{reply}"),
                Err(reply) => {
                    println!("{reply}");
                    std::process::exit(1);
                }
            }
        }
    }
    Ok(())
}

fn read_request(file: &str) -> Result<String> {
    if file == "-" {
        let mut request = String::new();
        std::io::stdin()
            .read_to_string(&mut request)
            .context("reading request from stdin")?;
        Ok(request)
    } else {
        std::fs::read_to_string(file).with_context(|| format!("reading request from {file}"))
    }
}

fn print_outcome(outcome: &PolicyOutcome, dry_run: bool) {
    if !outcome.changed {
        println!("unchanged");
        return;
    }
    for change in &outcome.changes {
        println!("{change}");
    }
    if let Some(backup) = &outcome.backup_file {
        println!("backup written to {}", backup.display());
    }
    if let Some(warning) = &outcome.backup_warning {
        println!("warning: backup failed: {warning}");
    }
    if dry_run {
        println!("changed (dry run, nothing written)");
    } else {
        println!("changed");
    }
}
