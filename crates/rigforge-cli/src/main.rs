//! rigforge CLI - build animation rigs from joint skeletons
//!
//! This binary plays the host editor session: it loads a skeleton, runs the
//! rig compiler inside an undo chunk, and reports the result.

use clap::{ArgAction, Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use rigforge_cli::commands;
use rigforge_cli::commands::build::BuildArgs;

/// rigforge - Rig Graph Compiler
#[derive(Parser)]
#[command(name = "rigforge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a full rig on a skeleton
    Build {
        /// Skeleton preset name or path to a skeleton JSON file
        #[arg(short, long)]
        skeleton: String,

        /// Joint to rig from (default: the skeleton root)
        #[arg(long)]
        root: Option<String>,

        /// Path to a schema catalog JSON file (default: mannequin)
        #[arg(long)]
        schema: Option<String>,

        /// Path to a build configuration JSON file
        #[arg(short, long)]
        config: Option<String>,

        /// Write the rigged scene as JSON to this path
        #[arg(short, long)]
        output: Option<String>,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Print the schema catalog
    Schema {
        /// Path to a schema catalog JSON file (default: mannequin)
        #[arg(long)]
        schema: Option<String>,

        /// Output the catalog as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the built-in skeleton presets
    Presets {
        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Build {
            skeleton,
            root,
            schema,
            config,
            output,
            json,
        } => commands::build::run(&BuildArgs {
            skeleton: &skeleton,
            root: root.as_deref(),
            schema: schema.as_deref(),
            config: config.as_deref(),
            output: output.as_deref(),
            json,
        }),
        Commands::Schema { schema, json } => commands::schema::run(schema.as_deref(), json),
        Commands::Presets { json } => commands::presets::run(json),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}
