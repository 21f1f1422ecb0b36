use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Extension of the delimited text files published inside the archives
pub const CSV_EXTENSION: &str = "csv";

/// Prefix of every consolidated output file
pub const OUTPUT_PREFIX: &str = "consolidado_";

/// Normalized report category, e.g. `Alienacao Imovel`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportTypeKey(String);

impl ReportTypeKey {
    /// Build a key from the raw category token of a file name (`alienacao_imovel`).
    pub fn from_token(token: &str) -> Self {
        let key = token
            .replace('_', " ")
            .split(' ')
            .map(title_case_word)
            .collect::<Vec<_>>()
            .join(" ");
        ReportTypeKey(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical lowercase token: `Alienacao Imovel` -> `alienacao_imovel`
    pub fn file_token(&self) -> String {
        self.0.to_lowercase().replace(' ', "_")
    }

    /// Name of the consolidated output file for this report type
    pub fn output_file_name(&self) -> String {
        format!("{}{}.{}", OUTPUT_PREFIX, self.file_token(), CSV_EXTENSION)
    }
}

impl fmt::Display for ReportTypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Field delimiter and decimal separator of a delimited text file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub delimiter: u8,
    pub decimal: char,
}

/// Dialect used by CVM open data files and by the consolidated outputs
pub const CVM_DIALECT: Dialect = Dialect {
    delimiter: b';',
    decimal: ',',
};

/// An ordered table read from one delimited text file.
///
/// Every row holds exactly one value per column; values are raw text.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSet {
    source: PathBuf,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RowSet {
    pub fn new(source: impl Into<PathBuf>, columns: Vec<String>) -> Self {
        Self {
            source: source.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding missing trailing fields with empty values.
    /// Extra fields beyond the header are dropped.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` in row `row`
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).map(|r| r[index].as_str())
    }
}

/// Row-wise concatenation of every RowSet of one report type
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidatedTable {
    pub key: ReportTypeKey,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub sources: Vec<PathBuf>,
}

impl ConsolidatedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).map(|r| r[index].as_str())
    }
}

/// Outcome of a consolidation run, printed as a summary or as JSON
#[derive(Debug, Clone, Serialize)]
pub struct ConsolidationReport {
    pub base_dir: PathBuf,
    pub generated_at: DateTime<Utc>,
    pub discovered: usize,
    pub unclassified: Vec<PathBuf>,
    pub unreadable: Vec<UnreadableFile>,
    pub outputs: Vec<OutputSummary>,
    pub failed_writes: Vec<FailedWrite>,
}

impl ConsolidationReport {
    pub fn new(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            generated_at: Utc::now(),
            discovered: 0,
            unclassified: Vec::new(),
            unreadable: Vec::new(),
            outputs: Vec::new(),
            failed_writes: Vec::new(),
        }
    }

    /// True when every report type was written
    pub fn is_success(&self) -> bool {
        self.failed_writes.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UnreadableFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputSummary {
    pub key: ReportTypeKey,
    pub path: PathBuf,
    pub merged_files: usize,
    pub years: Vec<u16>,
    pub rows: usize,
    pub columns: usize,
    /// Input files merged into the output, in concatenation order
    pub sources: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedWrite {
    pub key: ReportTypeKey,
    pub path: PathBuf,
    pub reason: String,
}

/// Counters from the acquisition stage
#[derive(Debug, Clone, Default, Serialize)]
pub struct AcquisitionSummary {
    pub listed: usize,
    pub downloaded: usize,
    pub cached: usize,
    pub failed_downloads: usize,
    pub extracted_archives: usize,
    pub failed_extractions: usize,
    pub extracted_files: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_normalization() {
        let key = ReportTypeKey::from_token("alienacao_imovel");
        assert_eq!(key.as_str(), "Alienacao Imovel");
        assert_eq!(key.file_token(), "alienacao_imovel");
        assert_eq!(key.output_file_name(), "consolidado_alienacao_imovel.csv");
    }

    #[test]
    fn test_key_title_cases_each_word() {
        assert_eq!(ReportTypeKey::from_token("RENDIMENTO").as_str(), "Rendimento");
        assert_eq!(
            ReportTypeKey::from_token("imovel_renda_acabado").as_str(),
            "Imovel Renda Acabado"
        );
        assert_eq!(ReportTypeKey::from_token("ativo").file_token(), "ativo");
    }

    #[test]
    fn test_row_set_pads_short_rows() {
        let mut rows = RowSet::new("a.csv", vec!["A".into(), "B".into(), "C".into()]);
        rows.push_row(vec!["1".into()]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows.get(0, "A"), Some("1"));
        assert_eq!(rows.get(0, "C"), Some(""));
        assert_eq!(rows.get(0, "Z"), None);
    }
}
