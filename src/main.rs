use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};

use cvm_fii::acquisition::{self, LISTING_URL};
use cvm_fii::cli::{Cli, Commands};
use cvm_fii::config::Config;
use cvm_fii::consolidation;
use cvm_fii::models::ConsolidationReport;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    // Set default log level to INFO if not specified
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "cvm_fii=info");
    }

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(base_dir) = &cli.base_dir {
        config = config.with_base_dir(base_dir);
    }

    // Initialize logging to both console and file
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let file_appender = tracing_appender::rolling::never(&config.log_dir, "cvm-fii.log");

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::from_default_env()),
        )
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(EnvFilter::from_default_env()),
        )
        .init();

    config.validate()?;
    let show_progress = !cli.no_progress;
    let base_dir = config.base_dir.clone();

    match &cli.command {
        Commands::Run { json } => {
            if let Err(e) = acquisition::acquire(&config, &base_dir, LISTING_URL, show_progress).await {
                error!("CRITICAL: acquisition failed: {}", e);
                return Ok(ExitCode::FAILURE);
            }
            Ok(run_consolidation(&base_dir, show_progress, *json))
        }

        Commands::Fetch => {
            match acquisition::acquire(&config, &base_dir, LISTING_URL, show_progress).await {
                Ok(summary) => {
                    info!(
                        "Fetched {} archives into {}",
                        summary.extracted_archives,
                        base_dir.display()
                    );
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    error!("CRITICAL: acquisition failed: {}", e);
                    Ok(ExitCode::FAILURE)
                }
            }
        }

        Commands::Consolidate { json } => Ok(run_consolidation(&base_dir, show_progress, *json)),
    }
}

fn run_consolidation(base_dir: &std::path::Path, show_progress: bool, json: bool) -> ExitCode {
    let report = match consolidation::consolidate(base_dir, show_progress) {
        Ok(report) => report,
        Err(e) if e.is_critical() => {
            error!("CRITICAL: {}", e);
            return ExitCode::FAILURE;
        }
        Err(e) => {
            error!("Consolidation failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{}", text),
            Err(e) => error!("Failed to serialize report: {}", e),
        }
    } else {
        print_report(&report);
    }

    if report.is_success() {
        info!(">>> Process completed successfully! <<<");
        ExitCode::SUCCESS
    } else {
        warn!(
            "{} consolidated files could not be written",
            report.failed_writes.len()
        );
        ExitCode::FAILURE
    }
}

fn print_report(report: &ConsolidationReport) {
    println!(
        "Consolidated {} report types from {} files ({} unclassified, {} unreadable):",
        report.outputs.len(),
        report.discovered,
        report.unclassified.len(),
        report.unreadable.len()
    );
    for output in &report.outputs {
        println!(
            "  {} - {} files, {} rows -> {}",
            output.key,
            output.merged_files,
            output.rows,
            output.path.display()
        );
        for source in &output.sources {
            println!("      {}", source.display());
        }
    }
    for failed in &report.failed_writes {
        println!("  {} - FAILED: {}", failed.key, failed.reason);
    }
}
