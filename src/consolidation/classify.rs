//! Report type detection from CVM file names

use crate::models::ReportTypeKey;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Literal prefix of every quarterly FII report file
pub const FILE_PREFIX: &str = "inf_trimestral_fii_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Classified { key: ReportTypeKey, year: u16 },
    Unclassified,
}

impl Classification {
    pub fn key(&self) -> Option<&ReportTypeKey> {
        match self {
            Classification::Classified { key, .. } => Some(key),
            Classification::Unclassified => None,
        }
    }
}

fn report_file_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^inf_trimestral_fii_(.+)_(\d{4})\.csv$")
            .expect("report file pattern is a valid regex")
    })
}

/// Classify a bare file name such as `inf_trimestral_fii_rendimento_2023.csv`
pub fn classify(file_name: &str) -> Classification {
    let Some(captures) = report_file_pattern().captures(file_name) else {
        return Classification::Unclassified;
    };

    let year = match captures[2].parse::<u16>() {
        Ok(year) => year,
        Err(_) => return Classification::Unclassified,
    };

    Classification::Classified {
        key: ReportTypeKey::from_token(&captures[1]),
        year,
    }
}

/// Classify the file name component of `path`
pub fn classify_path(path: &Path) -> Classification {
    match path.file_name().and_then(|name| name.to_str()) {
        Some(name) => classify(name),
        None => Classification::Unclassified,
    }
}
