mod info;
mod kind;
mod render;
mod sections;

use std::io::stderr;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use kind::Kind;
use render::Output;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a file: section counts per record type and the file's
    /// time and position extent.
    Info {
        /// Input file
        input: PathBuf,

        /// File kind. Guessed from the extension when not given.
        #[arg(short, long)]
        kind: Option<Kind>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: Output,
    },
    /// List every section of a file.
    Sections {
        /// Input file
        input: PathBuf,

        /// File kind. Guessed from the extension when not given.
        #[arg(short, long)]
        kind: Option<Kind>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: Output,
    },
    /// Describe every field of one section.
    ///
    /// Section indexes are those listed by the sections command.
    Describe {
        /// Input file
        input: PathBuf,

        /// Section index
        #[arg(short, long)]
        index: usize,

        /// File kind. Guessed from the extension when not given.
        #[arg(short, long)]
        kind: Option<Kind>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: Output,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(stderr)
        .with_ansi(false)
        .without_time()
        .with_env_filter(
            EnvFilter::try_from_env("MARINE_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    debug!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Info {
            input,
            kind,
            format,
        } => info::info(input, Kind::resolve(*kind, input)?, format),
        Commands::Sections {
            input,
            kind,
            format,
        } => sections::sections(input, Kind::resolve(*kind, input)?, format),
        Commands::Describe {
            input,
            index,
            kind,
            format,
        } => sections::describe(input, Kind::resolve(*kind, input)?, *index, format),
    }
}
