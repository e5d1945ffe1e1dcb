use cargas_parser::{Cell, RawTable};
use chrono::{NaiveDate, NaiveDateTime};
use rust_xlsxwriter::{Format, FormatBorder, Workbook};
use tracing::debug;

use crate::error::{PipelineError, Result};

const MAX_ROWS: usize = 1_048_576;
const MAX_COLUMNS: usize = 16_384;
const DATE_FORMAT: &str = "dd/mm/yyyy hh:mm";

/// Output layout with 0-based source positions.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportLayout {
    pub drop_columns: Vec<usize>,
    /// Source column whose numbers get the currency format, if it survives the drop.
    pub currency_column: Option<usize>,
    pub currency_format: String,
    pub column_width: f64,
    pub currency_width: f64,
    pub sheet_name: String,
}

impl Default for ExportLayout {
    fn default() -> Self {
        Self {
            drop_columns: vec![21, 20, 19, 18, 17, 16, 13, 12, 9, 6, 5, 4, 3, 2, 0],
            currency_column: Some(14),
            currency_format: "R$ #,##0.00".to_string(),
            column_width: 12.0,
            currency_width: 15.0,
            sheet_name: "Sheet1".to_string(),
        }
    }
}

impl ExportLayout {
    /// Source positions that remain, in output order.
    pub fn kept_columns(&self, width: usize) -> Vec<usize> {
        (0..width)
            .filter(|column| !self.drop_columns.contains(column))
            .collect()
    }

    /// Output position of the currency column for a source table `width` columns wide.
    pub fn currency_output_column(&self, width: usize) -> Option<usize> {
        let source = self.currency_column?;
        self.kept_columns(width)
            .iter()
            .position(|&column| column == source)
    }
}

#[derive(Debug, Clone)]
pub struct ExportedWorkbook {
    pub bytes: Vec<u8>,
    pub rows: usize,
    pub columns: usize,
    pub currency_column: Option<usize>,
}

/// Drop the configured columns and write the rest as a headerless xlsx sheet.
pub fn export(table: &RawTable, layout: &ExportLayout) -> Result<ExportedWorkbook> {
    let output = table.drop_columns(&layout.drop_columns);
    let currency_column = layout.currency_output_column(table.width());

    if output.height() > MAX_ROWS || output.width() > MAX_COLUMNS {
        return Err(PipelineError::OutputTooLarge {
            rows: output.height(),
            columns: output.width(),
        });
    }

    let border = Format::new().set_border(FormatBorder::Thin);
    let currency = border.clone().set_num_format(&layout.currency_format);
    let date = border.clone().set_num_format(DATE_FORMAT);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&layout.sheet_name)?;

    for column in 0..output.width() {
        let width = if Some(column) == currency_column {
            layout.currency_width
        } else {
            layout.column_width
        };
        worksheet.set_column_width(column as u16, width)?;
    }

    for (row_idx, row) in output.rows().iter().enumerate() {
        let row_num = row_idx as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            let col_num = col_idx as u16;
            let is_currency = Some(col_idx) == currency_column;
            match cell {
                Cell::Text(text) => match is_currency.then(|| parse_amount(text)).flatten() {
                    Some(amount) => {
                        worksheet.write_number_with_format(row_num, col_num, amount, &currency)?;
                    }
                    None => {
                        worksheet.write_string_with_format(row_num, col_num, text, &border)?;
                    }
                },
                Cell::Number(value) => {
                    let format = if is_currency {
                        &currency
                    } else {
                        &border
                    };
                    worksheet.write_number_with_format(row_num, col_num, *value, format)?;
                }
                Cell::DateTime(value) => {
                    worksheet.write_number_with_format(
                        row_num,
                        col_num,
                        excel_serial(*value),
                        &date,
                    )?;
                }
                Cell::Empty => {}
            }
        }
    }

    let bytes = workbook.save_to_buffer()?;
    debug!(
        rows = output.height(),
        columns = output.width(),
        currency_column,
        size = bytes.len(),
        "workbook written"
    );

    Ok(ExportedWorkbook {
        bytes,
        rows: output.height(),
        columns: output.width(),
        currency_column,
    })
}

/// Monetary text as exported by the source system: `1234.5`, `1.234,56` or `R$ 1.234,56`.
fn parse_amount(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let trimmed = trimmed.strip_prefix("R$").unwrap_or(trimmed).trim();
    if let Ok(value) = trimmed.parse::<f64>() {
        return value.is_finite().then_some(value);
    }
    if !trimmed.contains(',') {
        return None;
    }
    let value = trimmed.replace('.', "").replace(',', ".").parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

fn excel_serial(value: NaiveDateTime) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
        .unwrap_or_default()
        .and_time(chrono::NaiveTime::MIN);
    (value - epoch).num_milliseconds() as f64 / 86_400_000.0
}
