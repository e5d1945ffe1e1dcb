use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, DataType, Range, Reader, Xls, Xlsx};

use crate::errors::ParserError;
use crate::model::{Cell, RawTable};
use crate::registry::TableParser;

/// Zip-based workbooks (`.xlsx`, `.xlsm`).
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxParser;

impl XlsxParser {
    const NAME: &'static str = "XLSX";
}

impl TableParser for XlsxParser {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(&self, content: &[u8]) -> Result<RawTable, ParserError> {
        read_first_sheet::<Xlsx<_>>(Self::NAME, content)
    }
}

/// Legacy BIFF workbooks (`.xls`).
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsParser;

impl XlsParser {
    const NAME: &'static str = "XLS";
}

impl TableParser for XlsParser {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(&self, content: &[u8]) -> Result<RawTable, ParserError> {
        read_first_sheet::<Xls<_>>(Self::NAME, content)
    }
}

fn read_first_sheet<'a, R>(parser: &'static str, content: &'a [u8]) -> Result<RawTable, ParserError>
where
    R: Reader<Cursor<&'a [u8]>>,
    R::Error: std::fmt::Display,
{
    // A fresh cursor per attempt: no strategy sees another's read position.
    let mut workbook: R =
        open_workbook_from_rs(Cursor::new(content)).map_err(|err| ParserError::FormatMismatch {
            parser,
            reason: format!("not a readable workbook: {err}"),
        })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ParserError::FormatMismatch {
            parser,
            reason: "workbook has no worksheets".to_string(),
        })?
        .map_err(|err| ParserError::FormatMismatch {
            parser,
            reason: format!("first worksheet unreadable: {err}"),
        })?;

    Ok(range_to_table(&range))
}

fn range_to_table(range: &Range<Data>) -> RawTable {
    // Keep absolute column positions when the used range does not start at column A.
    let leading = range
        .start()
        .map(|(_, column)| column as usize)
        .unwrap_or(0);

    let rows = range
        .rows()
        .map(|row| {
            let mut cells = vec![Cell::Empty; leading];
            cells.extend(row.iter().map(convert_cell));
            cells
        })
        .collect();

    RawTable::from_rows(rows)
}

fn convert_cell(cell: &Data) -> Cell {
    match cell {
        Data::Int(value) => Cell::Number(*value as f64),
        Data::Float(value) => Cell::Number(*value),
        Data::String(text) if text.trim().is_empty() => Cell::Empty,
        Data::String(text) => Cell::Text(text.clone()),
        Data::Bool(value) => Cell::Text(if *value { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_datetime()
            .map(Cell::DateTime)
            .unwrap_or_else(|| Cell::Text(cell.to_string())),
        Data::DurationIso(text) => Cell::Text(text.clone()),
        Data::Error(_) | Data::Empty => Cell::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_zip_bytes_are_a_format_mismatch() {
        let err = XlsxParser.parse(b"<html><table></table></html>").unwrap_err();
        assert!(matches!(err, ParserError::FormatMismatch { parser: "XLSX", .. }));
    }

    #[test]
    fn non_cfb_bytes_are_a_format_mismatch() {
        let err = XlsParser.parse(b"a\tb\tc\n").unwrap_err();
        assert!(matches!(err, ParserError::FormatMismatch { parser: "XLS", .. }));
    }

    #[test]
    fn spreadsheet_cells_map_to_untyped_cells() {
        assert_eq!(convert_cell(&Data::Int(3)), Cell::Number(3.0));
        assert_eq!(convert_cell(&Data::String("  ".into())), Cell::Empty);
        assert_eq!(convert_cell(&Data::Bool(true)), Cell::Text("TRUE".into()));
        assert_eq!(convert_cell(&Data::Empty), Cell::Empty);
    }
}
