mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "portctl",
    about = "Port configuration for Node.js projects: discover hardcoded ports, generate .devops/ports.conf, validate conflicts",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .devops/ or .git/)
    #[arg(long, global = true, env = "PORTCTL_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show resolved ports and where each value came from
    Show,

    /// Print `export KEY=VALUE` lines for `eval "$(portctl env)"`
    Env,

    /// Write the built-in defaults to the ports configuration file
    Init {
        /// Override the artifact path (default: .devops/ports.conf)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Find hardcoded ports and write them to the ports configuration file
    Migrate {
        /// Report findings without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Back up files before modifying them (no-op: files are not rewritten)
        #[arg(long)]
        backup: bool,

        /// Override the artifact path (default: .devops/ports.conf)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Validate the ports configuration and check for conflicts
    Validate {
        /// Don't probe for ports that are already in use
        #[arg(long)]
        skip_in_use: bool,

        /// Treat in-use ports as failures
        #[arg(long)]
        strict: bool,
    },

    /// Check whether a single port is valid and free
    Check {
        port: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Show => cmd::show::run(&root, cli.json),
        Commands::Env => cmd::env::run(&root),
        Commands::Init { output, force } => {
            cmd::init::run(&root, output.as_deref(), force, cli.json)
        }
        Commands::Migrate {
            dry_run,
            backup,
            output,
        } => cmd::migrate::run(&root, dry_run, backup, output.as_deref(), cli.json),
        Commands::Validate {
            skip_in_use,
            strict,
        } => cmd::validate::run(&root, skip_in_use, strict, cli.json),
        Commands::Check { port } => cmd::check::run(port, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
