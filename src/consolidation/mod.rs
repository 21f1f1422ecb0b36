//! Consolidation of extracted CVM tables into one file per report type
//!
//! Files under the base directory are discovered, classified by file name,
//! read, grouped by report type and written back as `consolidado_<type>.csv`.

pub mod classify;
pub mod discovery;
pub mod group;
pub mod reader;
pub mod writer;

use crate::errors::ConsolidationError;
use crate::models::{
    ConsolidationReport, FailedWrite, OutputSummary, UnreadableFile, CVM_DIALECT,
};
use crate::progress::progress_bar;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

pub use classify::{classify, classify_path, Classification};
pub use discovery::discover_csv_files;
pub use group::{concat, ConsolidationGroup};
pub use reader::read_row_set;
pub use writer::{persist_table, write_table};

/// Consolidate every report file under `base_dir`.
///
/// Fails only on the critical conditions (nothing discovered, nothing
/// grouped); unreadable inputs and failed output writes are recorded in the
/// returned report.
pub fn consolidate(
    base_dir: &Path,
    show_progress: bool,
) -> Result<ConsolidationReport, ConsolidationError> {
    info!(">>> Starting consolidation under {}", base_dir.display());

    let files = discover_csv_files(base_dir)?;
    let mut report = ConsolidationReport::new(base_dir);
    report.discovered = files.len();
    info!("Found {} .csv files", files.len());

    let group = group_files(&files, &mut report, show_progress);

    if !report.unclassified.is_empty() {
        info!(
            "{} files did not match the report naming convention and were skipped",
            report.unclassified.len()
        );
    }

    if group.is_empty() {
        return Err(ConsolidationError::NoGroups {
            base_dir: base_dir.to_path_buf(),
            discovered: report.discovered,
            unclassified: report.unclassified.len(),
            unreadable: report.unreadable.len(),
        });
    }

    info!(">>> Saving consolidated files ({} report types)", group.len());
    write_groups(group, base_dir, &mut report);

    Ok(report)
}

fn group_files(
    files: &[PathBuf],
    report: &mut ConsolidationReport,
    show_progress: bool,
) -> ConsolidationGroup {
    let mut group = ConsolidationGroup::new();
    let pb = progress_bar(files.len() as u64, "Reading and grouping files", show_progress);

    for path in files {
        pb.inc(1);

        let Classification::Classified { key, year } = classify_path(path) else {
            debug!("Skipping unclassified file {}", path.display());
            report.unclassified.push(path.clone());
            continue;
        };

        match read_row_set(path, CVM_DIALECT) {
            Ok(row_set) => {
                debug!("Read {} rows of '{}' from {}", row_set.len(), key, path.display());
                group.push(key, year, row_set);
            }
            Err(e) => {
                warn!("Could not read file {}: {}", path.display(), e);
                report.unreadable.push(UnreadableFile {
                    path: path.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    pb.finish_and_clear();
    group
}

fn write_groups(group: ConsolidationGroup, base_dir: &Path, report: &mut ConsolidationReport) {
    for (key, entry) in group.into_entries() {
        info!(
            "Consolidating {} files of type '{}'...",
            entry.row_sets.len(),
            key
        );

        let table = concat(key.clone(), &entry.row_sets);
        let output_path = base_dir.join(key.output_file_name());

        match persist_table(&table, &output_path, CVM_DIALECT, CVM_DIALECT) {
            Ok(()) => {
                info!("-> Consolidated file saved to: {}", output_path.display());
                report.outputs.push(OutputSummary {
                    key,
                    path: output_path,
                    merged_files: entry.row_sets.len(),
                    years: entry.years.into_iter().collect(),
                    rows: table.len(),
                    columns: table.columns.len(),
                    sources: table.sources,
                });
            }
            Err(e) => {
                error!("Failed to write consolidated file for '{}': {}", key, e);
                report.failed_writes.push(FailedWrite {
                    key,
                    path: output_path,
                    reason: e.to_string(),
                });
            }
        }
    }
}
