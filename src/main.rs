//! # PDF Chat CLI (`pdf-chat`)
//!
//! ## Usage
//!
//! ```bash
//! pdf-chat --config ./config/pdf-chat.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pdf-chat serve` | Start the HTTP chat UI |
//! | `pdf-chat run-tests` | Ingest `./test_data` and ask the test questions |
//! | `pdf-chat compare --cv <pdf> --job <file>` | Compare a CV with a job description |
//!
//! A `.env` file in the working directory is loaded before anything else,
//! so `OPENAI_API_KEY` can live there. Logs go to stderr and are filtered
//! with `RUST_LOG` (default `info,pdf_chat=debug`).

use clap::{Parser, Subcommand};
use pdf_chat::{commands, config, server};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// PDF Chat — ask questions about your PDF documents.
#[derive(Parser)]
#[command(
    name = "pdf-chat",
    about = "PDF Chat — retrieval-augmented chat over your PDF documents",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/pdf-chat.toml`. Built-in defaults are used when
    /// the file does not exist.
    #[arg(long, global = true, default_value = "./config/pdf-chat.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP chat UI on `[server].bind`.
    Serve,

    /// Ingest every PDF in the test folder and ask the test questions.
    ///
    /// Prints each question and answer, then the final history size.
    RunTests,

    /// Run the comparison battery over a CV and a job description.
    Compare {
        /// CV as a PDF file.
        #[arg(long)]
        cv: PathBuf,

        /// Job description as a plain-text file.
        #[arg(long)]
        job: PathBuf,
    },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pdf_chat=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::RunTests => {
            commands::run_tests(&cfg).await?;
        }
        Commands::Compare { cv, job } => {
            commands::run_compare(&cfg, &cv, &job).await?;
        }
    }

    Ok(())
}
