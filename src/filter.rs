//! Precomputed per-row search strings and the two-tier matcher over them.

use serde_json::Value;

use crate::column::ColumnSet;
use crate::row::{Row, value_text};

/// Below this many boundary matches the matcher widens to plain substrings.
pub const MIN_BOUNDARY_MATCHES: usize = 50;

#[derive(Debug, Clone)]
pub struct FilterEntry {
    /// Lowercased field values, each followed by a space, with a leading space.
    pub query: String,
    /// Dataset index of the row this entry was built from.
    pub row: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FilterIndex {
    entries: Vec<FilterEntry>,
    min_boundary_matches: usize,
}

impl FilterIndex {
    /// Indexes every row. Only columns marked filterable contribute when any
    /// column is marked; otherwise every key of the row does.
    pub fn build(rows: &[Row], columns: &ColumnSet, min_boundary_matches: usize) -> Self {
        let restrict = columns.any_filterable();
        let entries = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                let mut query = String::from(" ");
                for (key, value) in row {
                    let include = !restrict
                        || columns.by_field(key).is_some_and(|d| d.is_filterable());
                    if include {
                        query.push_str(&index_text(value));
                        query.push(' ');
                    }
                }
                FilterEntry {
                    query: query.to_lowercase(),
                    row: idx,
                }
            })
            .collect();
        Self {
            entries,
            min_boundary_matches,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[FilterEntry] {
        &self.entries
    }

    /// Dataset indices matching `text`, in dataset order.
    ///
    /// First keeps entries where the query starts a value; when that leaves
    /// fewer than the configured minimum, falls back to matching anywhere.
    pub fn matches(&self, text: &str) -> Vec<usize> {
        let needle = text.to_lowercase();
        let boundary = format!(" {needle}");
        let first = self.collect(&boundary);
        if first.len() >= self.min_boundary_matches {
            return first;
        }
        self.collect(&needle)
    }

    fn collect(&self, needle: &str) -> Vec<usize> {
        self.entries
            .iter()
            .filter(|e| e.query.contains(needle))
            .map(|e| e.row)
            .collect()
    }
}

/// Search text of a value. Unlike the display text, null stays searchable
/// as `null`.
fn index_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        other => value_text(other),
    }
}
