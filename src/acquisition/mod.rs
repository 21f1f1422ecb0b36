//! Download and extraction of the quarterly FII archives published by CVM

pub mod download;
pub mod extract;
pub mod listing;

use crate::config::Config;
use crate::errors::AcquisitionError;
use crate::models::AcquisitionSummary;
use crate::progress::progress_bar;
use reqwest::{Client, Url};
use std::path::Path;
use tracing::{info, warn};

pub use download::{ensure_archive, DownloadOutcome, RetryPolicy};
pub use extract::extract_archive;
pub use listing::{archive_url, fetch_archive_names, parse_archive_names};

/// CVM open data directory holding the quarterly FII archives
pub const LISTING_URL: &str = "https://dados.cvm.gov.br/dados/FII/DOC/INF_TRIMESTRAL/DADOS/";

/// Fetch every archive linked from `listing_url` into `base_dir` and expand it there.
///
/// Only an unreachable listing is fatal. Failed downloads and corrupt
/// archives are logged, counted and skipped.
pub async fn acquire(
    config: &Config,
    base_dir: &Path,
    listing_url: &str,
    show_progress: bool,
) -> Result<AcquisitionSummary, AcquisitionError> {
    let listing_url =
        Url::parse(listing_url).map_err(|_| AcquisitionError::InvalidUrl(listing_url.to_string()))?;

    let client = Client::builder()
        .user_agent(&config.http.user_agent)
        .timeout(config.http_timeout())
        .build()?;

    std::fs::create_dir_all(base_dir)?;

    info!(">>> Fetching archive list from {}", listing_url);
    let names = fetch_archive_names(&client, &listing_url).await?;
    info!("Found {} archives", names.len());

    let policy = RetryPolicy {
        attempts: config.http.download_retries,
        delay: config.retry_delay(),
    };
    let mut summary = AcquisitionSummary {
        listed: names.len(),
        ..Default::default()
    };
    let pb = progress_bar(names.len() as u64, "Checking / extracting archives", show_progress);

    for name in &names {
        pb.inc(1);
        let zip_path = base_dir.join(name);

        let fetched = match archive_url(&listing_url, name) {
            Ok(url) => ensure_archive(&client, &url, &zip_path, policy).await,
            Err(e) => Err(e),
        };
        match fetched {
            Ok(DownloadOutcome::Cached) => summary.cached += 1,
            Ok(DownloadOutcome::Downloaded(bytes)) => {
                info!("Downloaded {} ({} bytes)", name, bytes);
                summary.downloaded += 1;
            }
            Err(e) => {
                warn!("Skipping archive {}: {}", name, e);
                summary.failed_downloads += 1;
                continue;
            }
        }

        match extract_archive(&zip_path, base_dir) {
            Ok(count) => {
                summary.extracted_archives += 1;
                summary.extracted_files += count;
            }
            Err(e) => {
                warn!("Archive {} could not be extracted, skipping: {}", name, e);
                summary.failed_extractions += 1;
            }
        }
    }

    pb.finish_and_clear();
    info!(
        "Acquisition finished: {} downloaded, {} cached, {} failed, {} files extracted",
        summary.downloaded, summary.cached, summary.failed_downloads, summary.extracted_files
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, contents) in entries {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn test_config(base_dir: &Path) -> Config {
        let mut config = Config::default().with_base_dir(base_dir);
        config.http.download_retries = 1;
        config.http.retry_delay_ms = 0;
        config
    }

    #[tokio::test]
    async fn test_acquire_then_consolidate() {
        let mock_server = MockServer::start().await;
        let listing = r#"<a href="inf_trimestral_fii_2022.zip">a</a>
            <a href="inf_trimestral_fii_2023.zip">b</a>
            <a href="inf_trimestral_fii_2024.zip">c</a>"#;

        Mock::given(method("GET"))
            .and(path("/DADOS/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(listing))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/DADOS/inf_trimestral_fii_2022.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(zip_bytes(&[(
                "inf_trimestral_fii_rendimento_2022.csv",
                "A;B\n1;2\n3;4\n5;6\n",
            )])))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/DADOS/inf_trimestral_fii_2023.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"corrupt".to_vec()))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/DADOS/inf_trimestral_fii_2024.zip"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        let config = test_config(base);
        let url = format!("{}/DADOS/", mock_server.uri());

        let summary = acquire(&config, base, &url, false).await.unwrap();

        assert_eq!(summary.listed, 3);
        assert_eq!(summary.downloaded, 2);
        assert_eq!(summary.failed_downloads, 1);
        assert_eq!(summary.extracted_archives, 1);
        assert_eq!(summary.failed_extractions, 1);
        assert_eq!(summary.extracted_files, 1);

        let report = crate::consolidation::consolidate(base, false).unwrap();
        assert_eq!(report.outputs.len(), 1);
        assert_eq!(report.outputs[0].rows, 3);

        // a second run reuses the cached archives
        let again = acquire(&config, base, &url, false).await.unwrap();
        assert_eq!(again.cached, 2);
        assert_eq!(again.downloaded, 0);
    }

    #[tokio::test]
    async fn test_unreachable_listing_is_fatal() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        let url = format!("{}/DADOS/", mock_server.uri());

        let err = acquire(&config, temp_dir.path(), &url, false).await.unwrap_err();
        assert!(matches!(err, AcquisitionError::Listing { .. }));
    }

    #[tokio::test]
    async fn test_invalid_listing_url() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        let err = acquire(&config, temp_dir.path(), "not a url", false)
            .await
            .unwrap_err();
        assert!(matches!(err, AcquisitionError::InvalidUrl(_)));
    }
}
