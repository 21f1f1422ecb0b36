use crate::errors::AcquisitionError;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::ZipArchive;

/// Expand every entry of `zip_path` into `dest_dir`, returning the number of
/// files written. Entries whose path would escape `dest_dir` are skipped.
pub fn extract_archive(zip_path: &Path, dest_dir: &Path) -> Result<usize, AcquisitionError> {
    let corrupt = |source: zip::result::ZipError| AcquisitionError::CorruptArchive {
        path: zip_path.to_path_buf(),
        source,
    };

    let file = File::open(zip_path)?;
    let mut archive = ZipArchive::new(file).map_err(corrupt)?;
    let mut extracted = 0;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(corrupt)?;

        let Some(relative) = entry.enclosed_name().map(|p| p.to_path_buf()) else {
            warn!(
                "Skipping entry with unsafe path {} in {}",
                entry.name(),
                zip_path.display()
            );
            continue;
        };
        let out_path = dest_dir.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        write_entry(&mut entry, &out_path)?;
        debug!("Extracted {}", out_path.display());
        extracted += 1;
    }

    Ok(extracted)
}

/// Copy one entry to `<out_path>.part` and rename it into place once the
/// whole entry has been read, so a read or checksum failure never leaves a
/// truncated file under the final name.
fn write_entry(entry: &mut impl Read, out_path: &Path) -> std::io::Result<()> {
    let staging = staging_path(out_path);
    let copied = File::create(&staging).and_then(|mut out_file| {
        std::io::copy(entry, &mut out_file)?;
        out_file.sync_all()
    });

    match copied.and_then(|()| std::fs::rename(&staging, out_path)) {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = std::fs::remove_file(&staging);
            Err(e)
        }
    }
}

fn staging_path(out_path: &Path) -> PathBuf {
    let mut name = out_path.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn build_zip(path: &Path, entries: &[(&str, &str)]) {
        let mut writer = ZipWriter::new(File::create(path).unwrap());
        for (name, contents) in entries {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_extracts_entries_into_destination() {
        let temp_dir = TempDir::new().unwrap();
        let zip_path = temp_dir.path().join("inf_trimestral_fii_2022.zip");
        build_zip(
            &zip_path,
            &[
                ("inf_trimestral_fii_ativo_2022.csv", "A;B\n1;2\n"),
                ("sub/inf_trimestral_fii_rendimento_2022.csv", "A\n1\n"),
            ],
        );

        let count = extract_archive(&zip_path, temp_dir.path()).unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            std::fs::read_to_string(temp_dir.path().join("inf_trimestral_fii_ativo_2022.csv"))
                .unwrap(),
            "A;B\n1;2\n"
        );
        assert!(temp_dir
            .path()
            .join("sub")
            .join("inf_trimestral_fii_rendimento_2022.csv")
            .exists());
    }

    #[test]
    fn test_unsafe_entries_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("dados");
        std::fs::create_dir_all(&dest).unwrap();
        let zip_path = dest.join("inf_trimestral_fii_2022.zip");
        build_zip(&zip_path, &[("../escaped.csv", "x"), ("ok.csv", "y")]);

        let count = extract_archive(&zip_path, &dest).unwrap();

        assert_eq!(count, 1);
        assert!(!temp_dir.path().join("escaped.csv").exists());
        assert!(dest.join("ok.csv").exists());
    }

    struct FailingReader {
        sent: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.sent {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "Invalid checksum",
                ));
            }
            self.sent = true;
            buf[..4].copy_from_slice(b"A;B\n");
            Ok(4)
        }
    }

    #[test]
    fn test_failed_entry_leaves_no_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let out_path = temp_dir.path().join("inf_trimestral_fii_ativo_2022.csv");

        let err = write_entry(&mut FailingReader { sent: false }, &out_path).unwrap_err();

        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
        assert!(!out_path.exists());
        assert!(!staging_path(&out_path).exists());
    }

    #[test]
    fn test_entry_replaces_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let out_path = temp_dir.path().join("inf_trimestral_fii_ativo_2022.csv");
        std::fs::write(&out_path, "stale").unwrap();

        write_entry(&mut "A;B\n1;2\n".as_bytes(), &out_path).unwrap();

        assert_eq!(std::fs::read_to_string(&out_path).unwrap(), "A;B\n1;2\n");
        assert!(!staging_path(&out_path).exists());
    }

    #[test]
    fn test_corrupt_archive_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let zip_path = temp_dir.path().join("inf_trimestral_fii_2022.zip");
        std::fs::write(&zip_path, b"this is not a zip file").unwrap();

        let err = extract_archive(&zip_path, temp_dir.path()).unwrap_err();
        assert!(matches!(err, AcquisitionError::CorruptArchive { .. }));
    }
}
