use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cvm-fii")]
#[command(about = "Download CVM quarterly FII disclosures and consolidate them into one file per report type")]
#[command(version)]
pub struct Cli {
    /// Base directory for archives, extracted files and consolidated output
    /// (overrides CVM_FII_BASE_DIR)
    #[arg(short, long, global = true)]
    pub base_dir: Option<PathBuf>,

    /// Disable progress bars
    #[arg(long, global = true)]
    pub no_progress: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download and extract all archives, then consolidate them
    Run {
        /// Print the consolidation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download and extract archives only
    Fetch,

    /// Consolidate files already present in the base directory
    Consolidate {
        /// Print the consolidation report as JSON
        #[arg(long)]
        json: bool,
    },
}
