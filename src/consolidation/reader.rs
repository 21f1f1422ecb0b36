//! Reader for CVM delimited text files (Latin-1, `;` separated, `,` decimals)

use crate::errors::ReadError;
use crate::models::{Dialect, RowSet};
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::path::Path;

/// Read `path` into a RowSet using `dialect`.
pub fn read_row_set(path: &Path, dialect: Dialect) -> Result<RowSet, ReadError> {
    let bytes = std::fs::read(path).map_err(|source| ReadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    parse_row_set(path, &decode_latin1(&bytes), dialect)
}

/// ISO-8859-1 maps every byte to the code point of the same value.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn parse_row_set(path: &Path, text: &str, dialect: Dialect) -> Result<RowSet, ReadError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(dialect.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(ReadError::MissingHeader);
    }

    let columns = unique_column_names(headers.iter());
    let mut row_set = RowSet::new(path, columns);
    let width = row_set.columns().len();

    for record in reader.records() {
        let record = record?;
        if record.len() > width {
            return Err(ReadError::TooManyFields {
                line: record.position().map_or(0, |p| p.line()),
                expected: width,
                found: record.len(),
            });
        }
        row_set.push_row(record.iter().map(str::to_string).collect());
    }

    Ok(row_set)
}

/// Give every header a distinct name: an empty name at index `i` becomes
/// `Unnamed: i` and a repeated `name` becomes `name.1`, `name.2`, ...
fn unique_column_names<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let raw: Vec<String> = headers
        .enumerate()
        .map(|(i, name)| {
            if name.trim().is_empty() {
                format!("Unnamed: {}", i)
            } else {
                name.to_string()
            }
        })
        .collect();

    let mut taken: HashSet<String> = raw.iter().cloned().collect();
    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(raw.len());

    for name in raw {
        if seen.insert(name.clone()) {
            columns.push(name);
            continue;
        }
        let mut suffix = 1;
        let mut candidate = format!("{}.{}", name, suffix);
        while taken.contains(&candidate) {
            suffix += 1;
            candidate = format!("{}.{}", name, suffix);
        }
        taken.insert(candidate.clone());
        seen.insert(candidate.clone());
        columns.push(candidate);
    }

    columns
}
