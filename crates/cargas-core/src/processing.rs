use cargas_parser::ParserAttempt;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::export::export;
use crate::filters::{FilterPipeline, FilterResult, StageCount};
use crate::ingestion::{load_file, FileInput};
use crate::shift::ShiftWindow;

/// Serializable summary of one run, for the operator.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub file_hash: String,
    pub format: &'static str,
    pub rejected_formats: Vec<ParserAttempt>,
    pub reference_date: NaiveDate,
    pub window: ShiftWindow,
    pub loaded_rows: usize,
    pub loaded_columns: usize,
    pub funnel: Vec<StageCount>,
    pub invalid_dates: usize,
    pub outside_window: usize,
    pub exported_rows: usize,
    pub exported_columns: usize,
    pub currency_column: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub workbook: Vec<u8>,
    pub filter: FilterResult,
    pub report: RunReport,
}

/// Load, filter and export one uploaded report.
pub fn process(
    input: &FileInput<'_>,
    config: &PipelineConfig,
    reference_date: NaiveDate,
) -> Result<RunOutput> {
    config.validate()?;
    let columns = config.column_map()?;
    let layout = config.export_layout()?;
    let window = ShiftWindow::with_times(reference_date, config.shift);

    let loaded = load_file(input, config.min_columns()?)?;
    columns.check_width(loaded.table.width())?;

    info!(start = %window.start, end = %window.end, "filtering shipments");
    let filter = FilterPipeline::new(columns, window, &config.rules).apply(&loaded.table)?;
    for entry in &filter.funnel {
        info!(stage = %entry.stage, rows = entry.rows, "stage complete");
    }

    let selected = filter.select(&loaded.table);
    let exported = export(&selected, &layout)?;
    info!(
        rows = exported.rows,
        columns = exported.columns,
        invalid_dates = filter.invalid_dates,
        "report exported"
    );

    let report = RunReport {
        file_hash: loaded.hash,
        format: loaded.parser,
        rejected_formats: loaded.attempts,
        reference_date,
        window,
        loaded_rows: loaded.table.height(),
        loaded_columns: loaded.table.width(),
        funnel: filter.funnel.clone(),
        invalid_dates: filter.invalid_dates,
        outside_window: filter.outside_window,
        exported_rows: exported.rows,
        exported_columns: exported.columns,
        currency_column: exported.currency_column,
    };

    Ok(RunOutput {
        workbook: exported.bytes,
        filter,
        report,
    })
}
