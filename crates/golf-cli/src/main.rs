//! Golf CLI
//!
//! Compiles a Golf project directory into a server manifest.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Golf - compile MCP tools, resources and prompts into one server
#[derive(Parser, Debug)]
#[command(name = "golf")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile the project and write the server manifest
    Build {
        /// Project directory
        #[arg(default_value = ".")]
        project: PathBuf,

        /// Output directory [default: PROJECT/dist]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Extraction worker threads [default: available cores]
        #[arg(long, env = "GOLF_JOBS")]
        jobs: Option<usize>,
    },
    /// Compile the project without writing anything
    Check {
        /// Project directory
        #[arg(default_value = ".")]
        project: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_target(false)
        .init();

    let report = match args.command {
        Command::Build {
            project,
            output,
            jobs,
        } => {
            let output = output.unwrap_or_else(|| project.join(commands::DEFAULT_OUTPUT_DIR));
            commands::build(&project, &output, jobs)?
        }
        Command::Check { project } => commands::check(&project)?,
    };

    print!("{report}");
    Ok(())
}
