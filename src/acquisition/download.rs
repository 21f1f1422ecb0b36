use crate::errors::AcquisitionError;
use reqwest::{Client, Url};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Archive was already present locally
    Cached,
    /// Archive was fetched; holds the number of bytes written
    Downloaded(u64),
}

/// Retry policy for archive downloads
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

/// Download `url` to `dest` unless `dest` already exists.
///
/// The body is streamed to `<dest>.part` and renamed once complete.
pub async fn ensure_archive(
    client: &Client,
    url: &Url,
    dest: &Path,
    policy: RetryPolicy,
) -> Result<DownloadOutcome, AcquisitionError> {
    if fs::try_exists(dest).await? {
        debug!("Archive already present, skipping download: {}", dest.display());
        return Ok(DownloadOutcome::Cached);
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).await?;
    }

    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| url.to_string());
    let part = part_path(dest);
    let attempts = policy.attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        debug!("Downloading {} (attempt {}/{})", url, attempt, attempts);

        match fetch_to_file(client, url, &part).await {
            Ok(bytes) => {
                fs::rename(&part, dest).await?;
                return Ok(DownloadOutcome::Downloaded(bytes));
            }
            Err(AcquisitionError::Http(source)) => {
                let _ = fs::remove_file(&part).await;
                if attempt >= attempts {
                    return Err(AcquisitionError::Download {
                        name,
                        attempts: attempt,
                        source,
                    });
                }
                warn!("Download of {} failed ({}), retrying", name, source);
                tokio::time::sleep(policy.delay).await;
            }
            Err(e) => {
                let _ = fs::remove_file(&part).await;
                return Err(e);
            }
        }
    }
}

async fn fetch_to_file(client: &Client, url: &Url, part: &Path) -> Result<u64, AcquisitionError> {
    let mut response = client.get(url.clone()).send().await?.error_for_status()?;

    let mut file = fs::File::create(part).await?;
    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    Ok(written)
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}
