use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ingestor")]
#[command(about = "Multi-source content ingestion (YouTube channels, news feeds, news pages)")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch every enabled source and print the results
    Run {
        /// Only keep items published within this many hours
        #[arg(long)]
        hours_back: Option<u32>,

        /// Bypass the content cache for this run
        #[arg(long)]
        no_cache: bool,

        /// Print the full run result as JSON
        #[arg(long)]
        json: bool,

        /// Write the JSON result to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List configured sources
    Sources,

    /// Delete every cached payload
    ClearCache,
}
