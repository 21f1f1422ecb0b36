//! Archive discovery from the CVM open data directory listing

use crate::errors::AcquisitionError;
use regex::Regex;
use reqwest::{Client, Url};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::debug;

fn archive_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^inf_trimestral_fii_\d+\.zip$").expect("archive pattern is a valid regex")
    })
}

/// Fetch the listing page at `listing_url` and return the archive names it links to.
pub async fn fetch_archive_names(
    client: &Client,
    listing_url: &Url,
) -> Result<Vec<String>, AcquisitionError> {
    debug!("Fetching archive listing from: {}", listing_url);

    let listing_err = |source: reqwest::Error| AcquisitionError::Listing {
        url: listing_url.to_string(),
        source,
    };

    let html = client
        .get(listing_url.clone())
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(listing_err)?
        .text()
        .await
        .map_err(listing_err)?;

    Ok(parse_archive_names(&html))
}

/// Archive names linked from a listing page, deduplicated, in page order.
pub fn parse_archive_names(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = match Selector::parse("a[href]") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    let mut seen = HashSet::new();
    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| href.rsplit('/').next())
        .filter(|name| archive_name_pattern().is_match(name))
        .filter(|name| seen.insert(name.to_string()))
        .map(str::to_string)
        .collect()
}

/// URL of `archive_name` relative to the listing page
pub fn archive_url(listing_url: &Url, archive_name: &str) -> Result<Url, AcquisitionError> {
    listing_url
        .join(archive_name)
        .map_err(|_| AcquisitionError::InvalidUrl(format!("{}{}", listing_url, archive_name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LISTING: &str = r#"<html><body><pre>
        <a href="../">../</a>
        <a href="inf_trimestral_fii_2016.zip">inf_trimestral_fii_2016.zip</a>
        <a href="inf_trimestral_fii_2017.zip">inf_trimestral_fii_2017.zip</a>
        <a href="/dados/FII/DOC/INF_TRIMESTRAL/DADOS/inf_trimestral_fii_2018.zip">2018</a>
        <a href="inf_trimestral_fii_2016.zip">again</a>
        <a href="meta_inf_trimestral_fii.txt">meta</a>
        <a href="inf_trimestral_fii_2019.zip.md5">md5</a>
    </pre></body></html>"#;

    #[test]
    fn test_parse_archive_names() {
        let names = parse_archive_names(LISTING);
        assert_eq!(
            names,
            vec![
                "inf_trimestral_fii_2016.zip",
                "inf_trimestral_fii_2017.zip",
                "inf_trimestral_fii_2018.zip",
            ]
        );
    }

    #[test]
    fn test_archive_url_is_relative_to_listing() {
        let listing = Url::parse("https://example.com/dados/FII/DADOS/").unwrap();
        let url = archive_url(&listing, "inf_trimestral_fii_2020.zip").unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/dados/FII/DADOS/inf_trimestral_fii_2020.zip"
        );
    }

    #[tokio::test]
    async fn test_fetch_archive_names_from_server() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/DADOS/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LISTING))
            .mount(&mock_server)
            .await;

        let url = Url::parse(&format!("{}/DADOS/", mock_server.uri())).unwrap();
        let names = fetch_archive_names(&Client::new(), &url).await.unwrap();
        assert_eq!(names.len(), 3);
    }

    #[tokio::test]
    async fn test_listing_http_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let url = Url::parse(&format!("{}/DADOS/", mock_server.uri())).unwrap();
        let err = fetch_archive_names(&Client::new(), &url).await.unwrap_err();
        assert!(matches!(err, AcquisitionError::Listing { .. }));
    }
}
