use std::fmt;

use chrono::NaiveDateTime;

/// An untyped cell as read from the source file.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    Text(String),
    Number(f64),
    /// Only produced by native spreadsheet date cells.
    DateTime(NaiveDateTime),
    #[default]
    Empty,
}

impl Cell {
    /// Build a cell from raw text. Blank text is empty; everything else stays text, so codes
    /// with leading zeros and long access keys keep every digit.
    pub fn from_text(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Cell::Empty;
        }
        Cell::Text(raw.to_string())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Trimmed, uppercased rendering used by the text predicates.
    pub fn normalized(&self) -> String {
        self.to_string().trim().to_uppercase()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(text) => f.write_str(text),
            Cell::Number(value) => write!(f, "{value}"),
            Cell::DateTime(value) => write!(f, "{}", value.format("%Y-%m-%d %H:%M:%S")),
            Cell::Empty => Ok(()),
        }
    }
}

/// Rectangular table without a header row; row 0 is data.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    rows: Vec<Vec<Cell>>,
    width: usize,
}

impl RawTable {
    /// Ragged rows are padded with [`Cell::Empty`] up to the widest row.
    pub fn from_rows(mut rows: Vec<Vec<Cell>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, Cell::Empty);
        }
        Self { rows, width }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.width == 0
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|cells| cells.get(column))
    }

    /// Copy of the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> RawTable {
        let rows = indices
            .iter()
            .filter_map(|&idx| self.rows.get(idx).cloned())
            .collect();
        RawTable {
            rows,
            width: self.width,
        }
    }

    /// Copy of the table without the listed column positions. Positions past the last column
    /// are ignored.
    pub fn drop_columns(&self, positions: &[usize]) -> RawTable {
        let keep: Vec<usize> = (0..self.width)
            .filter(|col| !positions.contains(col))
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| keep.iter().map(|&col| row[col].clone()).collect())
            .collect();
        RawTable {
            rows,
            width: keep.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_text_keeps_digits_as_written() {
        assert_eq!(Cell::from_text("00123"), Cell::Text("00123".into()));
        assert_eq!(
            Cell::from_text("35240112345678000190550010000012341000012345"),
            Cell::Text("35240112345678000190550010000012341000012345".into())
        );
        assert_eq!(Cell::from_text(" 1234.50 "), Cell::Text(" 1234.50 ".into()));
        assert_eq!(Cell::from_text("   "), Cell::Empty);
    }

    #[test]
    fn ragged_rows_are_padded() {
        let table = RawTable::from_rows(vec![
            vec![Cell::from_text("a")],
            vec![Cell::from_text("b"), Cell::from_text("c"), Cell::from_text("d")],
        ]);
        assert_eq!(table.width(), 3);
        assert_eq!(table.cell(0, 2), Some(&Cell::Empty));
    }

    #[test]
    fn drop_columns_ignores_missing_positions() {
        let table = RawTable::from_rows(vec![vec![
            Cell::from_text("a"),
            Cell::from_text("b"),
            Cell::from_text("c"),
        ]]);
        let dropped = table.drop_columns(&[0, 2, 9]);
        assert_eq!(dropped.width(), 1);
        assert_eq!(dropped.cell(0, 0), Some(&Cell::Text("b".into())));
    }
}
