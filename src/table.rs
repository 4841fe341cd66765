//! Accumulation of normalized records across shards.
//!
//! [`AccumulatedTable`] is append-only: shards are added in enumeration order
//! and rows keep their in-shard order. The header is the key order of the first
//! record; a column first seen in a later record is appended after the known
//! ones, and records lacking a column render it as an empty cell.

use crate::normalize::NormalizedRecord;
use indexmap::IndexSet;
use serde::Serialize;

/// Every normalized record of a run, in output order.
#[derive(Clone, Debug, Default)]
pub struct AccumulatedTable {
    columns: IndexSet<String>,
    records: Vec<NormalizedRecord>,
}

/// Per-column fill statistics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ColumnStats {
    pub name: String,
    /// Records with a non-empty cell in this column.
    pub non_empty: usize,
    /// Records with an empty or missing cell in this column.
    pub empty: usize,
}

impl AccumulatedTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record after all existing ones.
    pub fn push(&mut self, record: NormalizedRecord) {
        for key in record.keys() {
            if !self.columns.contains(key) {
                self.columns.insert(key.clone());
            }
        }
        self.records.push(record);
    }

    /// Append a shard's records after all existing ones.
    pub fn extend(&mut self, records: impl IntoIterator<Item = NormalizedRecord>) {
        for record in records {
            self.push(record);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Header, in output order.
    #[must_use]
    pub fn columns(&self) -> Vec<&str> {
        self.columns.iter().map(String::as_str).collect()
    }

    #[must_use]
    pub fn records(&self) -> &[NormalizedRecord] {
        &self.records
    }

    /// Cells of record `i` aligned to [`columns`](Self::columns).
    #[must_use]
    pub fn row(&self, i: usize) -> Option<Vec<&str>> {
        let record = self.records.get(i)?;
        Some(
            self.columns
                .iter()
                .map(|c| record.get(c).map_or("", String::as_str))
                .collect(),
        )
    }

    /// All rows aligned to the header.
    pub fn rows(&self) -> impl Iterator<Item = Vec<&str>> + '_ {
        (0..self.records.len()).filter_map(|i| self.row(i))
    }

    /// Fill counts for every column, in header order.
    #[must_use]
    pub fn column_stats(&self) -> Vec<ColumnStats> {
        self.columns
            .iter()
            .map(|name| {
                let non_empty = self
                    .records
                    .iter()
                    .filter(|r| r.get(name).is_some_and(|v| !v.is_empty()))
                    .count();
                ColumnStats {
                    name: name.clone(),
                    non_empty,
                    empty: self.records.len() - non_empty,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> NormalizedRecord {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn preserves_append_order() {
        let mut t = AccumulatedTable::new();
        t.extend(vec![record(&[("id", "1")]), record(&[("id", "2")])]);
        t.extend(vec![record(&[("id", "3")])]);
        let ids: Vec<_> = t.rows().map(|r| r[0].to_string()).collect();
        assert_eq!(ids, ["1", "2", "3"]);
    }

    #[test]
    fn header_follows_first_record() {
        let mut t = AccumulatedTable::new();
        t.push(record(&[("question", "q"), ("answer", "a"), ("image", "No image")]));
        assert_eq!(t.columns(), ["question", "answer", "image"]);
    }

    #[test]
    fn late_columns_are_appended_and_backfilled() {
        let mut t = AccumulatedTable::new();
        t.push(record(&[("a", "1")]));
        t.push(record(&[("a", "2"), ("b", "x")]));
        assert_eq!(t.columns(), ["a", "b"]);
        assert_eq!(t.row(0).unwrap(), ["1", ""]);
        assert_eq!(t.row(1).unwrap(), ["2", "x"]);
    }

    #[test]
    fn stats_count_empty_cells() {
        let mut t = AccumulatedTable::new();
        t.push(record(&[("a", "1"), ("b", "")]));
        t.push(record(&[("a", ""), ("b", "")]));
        let stats = t.column_stats();
        assert_eq!(stats[0].non_empty, 1);
        assert_eq!(stats[0].empty, 1);
        assert_eq!(stats[1].non_empty, 0);
        assert_eq!(stats[1].empty, 2);
    }
}
