use crate::core::flatten::PROJECT_ID_COLUMN;
use crate::domain::model::{FlatRow, Table};
use std::collections::{HashMap, HashSet};

/// Collapses rows for the same project and collects the header union.
///
/// When a project shows up more than once, the first value seen for a column
/// is kept and columns only present on later copies are added. Headers and
/// rows both follow first-seen order.
pub fn build_table(rows: Vec<FlatRow>) -> Table {
    let mut headers = Vec::new();
    let mut seen_headers = HashSet::new();
    let mut merged: Vec<FlatRow> = Vec::new();
    let mut index_by_id: HashMap<String, usize> = HashMap::new();

    for row in rows {
        for key in row.keys() {
            if seen_headers.insert(key.to_string()) {
                headers.push(key.to_string());
            }
        }

        let Some(id) = row.get(PROJECT_ID_COLUMN).map(ToString::to_string) else {
            merged.push(row);
            continue;
        };

        match index_by_id.get(&id) {
            Some(&position) => {
                let existing = &mut merged[position];
                for (column, value) in row.iter() {
                    existing.insert_if_absent(column, value);
                }
            }
            None => {
                index_by_id.insert(id, merged.len());
                merged.push(row);
            }
        }
    }

    Table {
        headers,
        rows: merged,
    }
}

impl Table {
    /// Renders the table as comma-separated text.
    ///
    /// Header names are quoted. Cell values are written as they are, so any
    /// escaping has to happen while flattening.
    pub fn to_csv(&self) -> String {
        let header_line = self
            .headers
            .iter()
            .map(|header| format!("\"{}\"", header))
            .collect::<Vec<_>>()
            .join(",");

        let data_lines = self
            .rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .map(|header| row.get(header).map(ToString::to_string).unwrap_or_default())
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!("{}\n{}", header_line, data_lines)
    }
}
