//! Row model handed to [`crate::RemoteDataTable`].

use std::collections::BTreeMap;

/// One row of server data, keyed by column id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableRow {
    /// Stable row identity used for selection.
    pub id: String,
    /// Display text per column id.
    pub cells: BTreeMap<String, String>,
}

impl TableRow {
    /// Creates an empty row.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cells: BTreeMap::new(),
        }
    }

    /// Adds a cell.
    pub fn cell(mut self, column_id: impl Into<String>, text: impl Into<String>) -> Self {
        self.cells.insert(column_id.into(), text.into());
        self
    }

    /// Display text for a column, empty when the row has none.
    pub fn text(&self, column_id: &str) -> &str {
        self.cells.get(column_id).map(String::as_str).unwrap_or("")
    }
}

/// Min/max of the numeric cells of a column on the loaded page.
pub fn faceted_range(rows: &[TableRow], column_id: &str) -> Option<(f64, f64)> {
    rows.iter()
        .filter_map(|row| row.cells.get(column_id)?.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .fold(None, |range, value| match range {
            None => Some((value, value)),
            Some((lo, hi)) => Some((f64::min(lo, value), f64::max(hi, value))),
        })
}

/// Row ids of a page, in display order.
pub(crate) fn row_ids(rows: &[TableRow]) -> Vec<String> {
    rows.iter().map(|row| row.id.clone()).collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn faceted_range_skips_non_numeric_cells() {
        let rows = vec![
            TableRow::new("1").cell("age", "31"),
            TableRow::new("2").cell("age", "n/a"),
            TableRow::new("3").cell("age", " 19 "),
            TableRow::new("4"),
        ];
        assert_eq!(faceted_range(&rows, "age"), Some((19.0, 31.0)));
        assert_eq!(faceted_range(&rows, "name"), None);
    }

    #[test]
    fn missing_cells_render_empty() {
        let row = TableRow::new("7").cell("name", "Ada");
        assert_eq!(row.text("name"), "Ada");
        assert_eq!(row.text("email"), "");
        assert_eq!(row_ids(&[row]), vec!["7".to_string()]);
    }
}
