//! `storyreel` CLI - render narrated vertical videos from text passages

mod cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "storyreel")]
#[command(about = "Render narrated vertical videos from short text passages")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/storyreel/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render passages into a narrated video
    Render {
        /// JSON file: array of strings or of {"text", "author"} objects
        passages: PathBuf,

        /// Output MP4
        #[arg(short, long)]
        output: PathBuf,

        /// Spoken-time budget in seconds
        #[arg(long)]
        budget: Option<f64>,

        /// Output width in pixels
        #[arg(long)]
        width: Option<u32>,

        /// Output height in pixels
        #[arg(long)]
        height: Option<u32>,

        /// Footage search text (default: the first passage)
        #[arg(short, long)]
        query: Option<String>,

        /// Scratch directory, wiped before and removed after the job
        #[arg(long)]
        workspace: Option<PathBuf>,

        /// Narrate links instead of stripping them
        #[arg(long)]
        keep_links: bool,

        /// Print the render report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show which passages fit the time budget, without rendering
    Budget {
        /// JSON passages file
        passages: PathBuf,

        /// Spoken-time budget in seconds
        #[arg(long)]
        budget: Option<f64>,

        /// Characters narrated per second
        #[arg(long)]
        rate: Option<f64>,

        /// Count links toward the estimate
        #[arg(long)]
        keep_links: bool,
    },

    /// Print dimensions and duration of a media file
    Probe {
        /// Media file
        file: PathBuf,
    },

    /// Search and download background footage
    Footage {
        /// Search text
        query: String,

        /// Minimum clip duration in seconds
        #[arg(long, default_value = "50")]
        min_duration: f64,

        /// Output file
        #[arg(short, long, default_value = "footage.mp4")]
        output: PathBuf,
    },

    /// Check external tools and credentials
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = storyreel::config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Render {
            passages,
            output,
            budget,
            width,
            height,
            query,
            workspace,
            keep_links,
            json,
        } => {
            let overrides = cmd::render::RenderOverrides {
                budget,
                width,
                height,
                query,
                workspace,
                keep_links,
                json,
            };
            cmd::render::cmd_render(&config, &passages, &output, overrides).await?;
        }
        Commands::Budget {
            passages,
            budget,
            rate,
            keep_links,
        } => {
            cmd::budget::cmd_budget(&config, &passages, budget, rate, keep_links)?;
        }
        Commands::Probe { file } => {
            cmd::probe::cmd_probe(&config, &file).await?;
        }
        Commands::Footage {
            query,
            min_duration,
            output,
        } => {
            cmd::footage::cmd_footage(&config, &query, min_duration, &output).await?;
        }
        Commands::Check => {
            cmd::check::cmd_check(&config).await?;
        }
    }

    Ok(())
}
