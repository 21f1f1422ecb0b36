use crate::errors::ConsolidationError;
use crate::models::{ConsolidatedTable, Dialect};
use csv::WriterBuilder;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Serialize `table` to `path` as UTF-8 with BOM and a header row.
///
/// Numeric text is rewritten from the `input` decimal separator to the
/// `output` one; other values are written verbatim.
pub fn write_table(
    table: &ConsolidatedTable,
    path: &Path,
    input: Dialect,
    output: Dialect,
) -> Result<(), ConsolidationError> {
    let write_err = |source: std::io::Error| ConsolidationError::Write {
        path: path.to_path_buf(),
        source,
    };
    let csv_err = |source: csv::Error| ConsolidationError::Serialize {
        path: path.to_path_buf(),
        source,
    };

    let mut file = BufWriter::new(File::create(path).map_err(write_err)?);
    file.write_all(UTF8_BOM).map_err(write_err)?;

    let mut writer = WriterBuilder::new()
        .delimiter(output.delimiter)
        .from_writer(file);

    writer.write_record(&table.columns).map_err(csv_err)?;
    for row in &table.rows {
        writer
            .write_record(
                row.iter()
                    .map(|value| reformat_decimal(value, input.decimal, output.decimal)),
            )
            .map_err(csv_err)?;
    }

    writer.flush().map_err(write_err)?;
    Ok(())
}

/// Write `table` next to `path` and move it into place once complete, so a
/// failed write never leaves a truncated output under the final name.
pub fn persist_table(
    table: &ConsolidatedTable,
    path: &Path,
    input: Dialect,
    output: Dialect,
) -> Result<(), ConsolidationError> {
    let staging = path.with_extension("csv.tmp");
    if let Err(e) = write_table(table, &staging, input, output) {
        let _ = std::fs::remove_file(&staging);
        return Err(e);
    }
    std::fs::rename(&staging, path).map_err(|source| {
        let _ = std::fs::remove_file(&staging);
        ConsolidationError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Rewrite numeric-looking text (`-12,5`) from one decimal separator to another.
pub fn reformat_decimal(value: &str, from: char, to: char) -> String {
    if from == to || !is_decimal_number(value, from) {
        return value.to_string();
    }
    value.replacen(from, &to.to_string(), 1)
}

fn is_decimal_number(value: &str, decimal: char) -> bool {
    let digits = value.strip_prefix(['-', '+']).unwrap_or(value);
    let mut parts = digits.splitn(2, decimal);
    let whole = parts.next().unwrap_or("");
    let fraction = parts.next();

    let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    match fraction {
        Some(fraction) => all_digits(whole) && all_digits(fraction),
        None => false,
    }
}
