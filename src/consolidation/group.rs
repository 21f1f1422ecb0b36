use crate::models::{ConsolidatedTable, ReportTypeKey, RowSet};
use std::collections::{BTreeSet, HashMap};

/// Row sets accumulated for one report type
#[derive(Debug, Default)]
pub struct GroupEntry {
    pub row_sets: Vec<RowSet>,
    pub years: BTreeSet<u16>,
}

/// Report type -> row sets, keys kept in first-encounter order
#[derive(Debug, Default)]
pub struct ConsolidationGroup {
    order: Vec<ReportTypeKey>,
    entries: HashMap<ReportTypeKey, GroupEntry>,
}

impl ConsolidationGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: ReportTypeKey, year: u16, row_set: RowSet) {
        if !self.entries.contains_key(&key) {
            self.order.push(key.clone());
        }
        let entry = self.entries.entry(key).or_default();
        entry.row_sets.push(row_set);
        entry.years.insert(year);
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, key: &ReportTypeKey) -> Option<&GroupEntry> {
        self.entries.get(key)
    }

    /// Consume the group, yielding entries in first-encounter order
    pub fn into_entries(mut self) -> Vec<(ReportTypeKey, GroupEntry)> {
        self.order
            .into_iter()
            .filter_map(|key| self.entries.remove(&key).map(|entry| (key, entry)))
            .collect()
    }
}

/// Concatenate row sets, preserving set order and row order.
///
/// Columns are the union of all column names in first-seen order; a row
/// whose source lacks a column gets an empty value there.
pub fn concat(key: ReportTypeKey, row_sets: &[RowSet]) -> ConsolidatedTable {
    let mut columns: Vec<String> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for row_set in row_sets {
        for column in row_set.columns() {
            if !index.contains_key(column.as_str()) {
                index.insert(column.as_str(), columns.len());
                columns.push(column.clone());
            }
        }
    }

    let total: usize = row_sets.iter().map(RowSet::len).sum();
    let mut rows = Vec::with_capacity(total);

    for row_set in row_sets {
        let positions: Vec<usize> = row_set
            .columns()
            .iter()
            .map(|c| index[c.as_str()])
            .collect();

        for source_row in row_set.rows() {
            let mut row = vec![String::new(); columns.len()];
            for (value, &position) in source_row.iter().zip(&positions) {
                row[position] = value.clone();
            }
            rows.push(row);
        }
    }

    ConsolidatedTable {
        key,
        columns,
        rows,
        sources: row_sets.iter().map(|r| r.source().to_path_buf()).collect(),
    }
}
