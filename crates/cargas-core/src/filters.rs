use std::collections::HashSet;
use std::fmt;

use cargas_parser::RawTable;
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

use crate::columns::{ColumnMap, ColumnRole};
use crate::config::FilterRules;
use crate::error::Result;
use crate::shift::ShiftWindow;
use crate::timestamp::parse_ship_time;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterStage {
    Time,
    Site,
    Tier,
    StateException,
    CarrierBlock,
}

impl FilterStage {
    pub const ORDER: [FilterStage; 5] = [
        FilterStage::Time,
        FilterStage::Site,
        FilterStage::Tier,
        FilterStage::StateException,
        FilterStage::CarrierBlock,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterStage::Time => "time",
            FilterStage::Site => "site",
            FilterStage::Tier => "tier",
            FilterStage::StateException => "state_exception",
            FilterStage::CarrierBlock => "carrier_block",
        }
    }
}

impl fmt::Display for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageCount {
    pub stage: FilterStage,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterResult {
    pub input_rows: usize,
    /// Rows left after each stage, in stage order.
    pub funnel: Vec<StageCount>,
    /// Rows dropped by the time stage because the ship time did not parse.
    pub invalid_dates: usize,
    /// Rows dropped by the time stage with a valid ship time outside the window.
    pub outside_window: usize,
    /// Surviving row indices into the source table, in source order.
    #[serde(skip)]
    pub rows: Vec<usize>,
}

impl FilterResult {
    pub fn count_after(&self, stage: FilterStage) -> Option<usize> {
        self.funnel
            .iter()
            .find(|entry| entry.stage == stage)
            .map(|entry| entry.rows)
    }

    /// Copy the surviving rows out of `table`.
    pub fn select(&self, table: &RawTable) -> RawTable {
        table.select_rows(&self.rows)
    }
}

/// Filter rules in uppercase, ready for comparison against normalized cells.
#[derive(Debug, Clone)]
struct NormalizedRules {
    sites: HashSet<String>,
    tiers: HashSet<String>,
    exception_state: String,
    exception_tier: String,
    blocked_carriers: HashSet<String>,
}

impl NormalizedRules {
    fn new(rules: &FilterRules) -> Self {
        let set = |values: &[String]| -> HashSet<String> {
            values.iter().map(|value| normalize(value)).collect()
        };
        Self {
            sites: set(&rules.sites),
            tiers: set(&rules.tiers),
            exception_state: normalize(&rules.state_exception.state),
            exception_tier: normalize(&rules.state_exception.tier),
            blocked_carriers: set(&rules.blocked_carriers),
        }
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_uppercase()
}

/// The five shipment filters bound to one column map and shift window.
#[derive(Debug, Clone)]
pub struct FilterPipeline {
    columns: ColumnMap,
    window: ShiftWindow,
    rules: NormalizedRules,
}

impl FilterPipeline {
    pub fn new(columns: ColumnMap, window: ShiftWindow, rules: &FilterRules) -> Self {
        Self {
            columns,
            window,
            rules: NormalizedRules::new(rules),
        }
    }

    /// Run every stage in order. Fails before any stage runs if a role column is missing.
    pub fn apply(&self, table: &RawTable) -> Result<FilterResult> {
        self.columns.check_width(table.width())?;

        let mut rows: Vec<usize> = (0..table.height()).collect();
        let mut funnel = Vec::with_capacity(FilterStage::ORDER.len());
        let mut invalid_dates = 0usize;
        let mut outside_window = 0usize;

        for stage in FilterStage::ORDER {
            match stage {
                FilterStage::Time => rows.retain(|&row| match self.ship_time(table, row) {
                    Some(timestamp) if self.window.contains(timestamp) => true,
                    Some(_) => {
                        outside_window += 1;
                        false
                    }
                    None => {
                        invalid_dates += 1;
                        false
                    }
                }),
                FilterStage::Site => rows.retain(|&row| {
                    self.rules
                        .sites
                        .contains(&self.value(table, row, ColumnRole::Site))
                }),
                FilterStage::Tier => rows.retain(|&row| {
                    self.rules
                        .tiers
                        .contains(&self.value(table, row, ColumnRole::Tier))
                }),
                FilterStage::StateException => rows.retain(|&row| {
                    !(self.value(table, row, ColumnRole::State) == self.rules.exception_state
                        && self.value(table, row, ColumnRole::Tier) == self.rules.exception_tier)
                }),
                FilterStage::CarrierBlock => rows.retain(|&row| {
                    !self
                        .rules
                        .blocked_carriers
                        .contains(&self.value(table, row, ColumnRole::Carrier))
                }),
            }
            funnel.push(StageCount {
                stage,
                rows: rows.len(),
            });
        }

        debug!(
            input_rows = table.height(),
            kept = rows.len(),
            invalid_dates,
            outside_window,
            "filter pipeline finished"
        );

        Ok(FilterResult {
            input_rows: table.height(),
            funnel,
            invalid_dates,
            outside_window,
            rows,
        })
    }

    fn ship_time(&self, table: &RawTable, row: usize) -> Option<NaiveDateTime> {
        table
            .cell(row, self.columns.get(ColumnRole::ShipTime))
            .and_then(parse_ship_time)
    }

    fn value(&self, table: &RawTable, row: usize, role: ColumnRole) -> String {
        table
            .cell(row, self.columns.get(role))
            .map(|cell| cell.normalized())
            .unwrap_or_default()
    }
}
