use crate::errors::ConsolidationError;
use crate::models::CSV_EXTENSION;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Every `.csv` file anywhere under `base_dir`, sorted by path.
///
/// An unreadable base directory or an empty tree is a critical condition and
/// reported as an error. Entries below the base that cannot be read are
/// logged and skipped.
pub fn discover_csv_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConsolidationError> {
    collect_csv_files(base_dir, WalkDir::new(base_dir).sort_by_file_name())
}

fn collect_csv_files(
    base_dir: &Path,
    entries: impl IntoIterator<Item = walkdir::Result<DirEntry>>,
) -> Result<Vec<PathBuf>, ConsolidationError> {
    let mut files = Vec::new();

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) if source.path().map_or(true, |p| p == base_dir) => {
                return Err(ConsolidationError::Walk {
                    path: base_dir.to_path_buf(),
                    source,
                });
            }
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", base_dir.display(), e);
                continue;
            }
        };

        if entry.file_type().is_file() && has_csv_extension(entry.path()) {
            files.push(entry.into_path());
        }
    }

    debug!("Discovered {} .csv files under {}", files.len(), base_dir.display());

    if files.is_empty() {
        return Err(ConsolidationError::NoInputFiles(base_dir.to_path_buf()));
    }

    Ok(files)
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == CSV_EXTENSION)
}
