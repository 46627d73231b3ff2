//! docrepo CLI - notes stored through the generic repository
//!
//! Usage:
//!   docrepo init [dir]                       - Write a default docrepo.json
//!   docrepo --user u1 create --title T       - Create a note
//!   docrepo --user u1 get <id>               - Show a note
//!   docrepo --user u1 list --sort title      - List live notes
//!   docrepo --user u1 update <id> --title T  - Update a note
//!   docrepo --user u1 delete <id>            - Soft-delete a note
//!   docrepo audit --limit 10                 - Show the audit trail

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use cli::commands::{AuditCommand, InitCommand, NoteCommand};
use cli::context::Context;
use console::style;
use shared::{ErrorKind, RepositoryError};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docrepo")]
#[command(about = "docrepo - access-controlled, audited document repository")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (JSON or YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data file, overriding the configured one
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    /// Acting user
    #[arg(short, long, global = true, env = "DOCREPO_USER")]
    user: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a docrepo configuration
    Init(InitCommand),
    /// Show the audit trail
    Audit(AuditCommand),
    #[command(flatten)]
    Note(NoteCommand),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", style("error:").red().bold(), err);
            ExitCode::from(exit_code(&err))
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Init(cmd) = &cli.command {
        let path = cmd.run()?;
        eprintln!("{} Wrote {}", style("✓").green(), path.display());
        return Ok(());
    }

    let mut config = Context::resolve_config(cli.config.as_deref())?;
    if let Some(data) = cli.data {
        config.data_file = data;
    }
    let ctx = Context::open(config)?;

    let output = match &cli.command {
        Commands::Init(_) => return Ok(()),
        Commands::Audit(cmd) => cmd.run(&ctx)?,
        Commands::Note(cmd) => {
            let user = cli
                .user
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("--user (or DOCREPO_USER) is required"))?;
            cmd.run(&ctx, user)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<RepositoryError>().map(RepositoryError::kind) {
        Some(ErrorKind::Forbidden) => 3,
        Some(ErrorKind::NotFound) => 4,
        Some(ErrorKind::ValidationFailed) => 5,
        Some(ErrorKind::Conflict) => 6,
        Some(ErrorKind::StorageFailure) => 7,
        Some(ErrorKind::Internal) | None => 1,
    }
}
