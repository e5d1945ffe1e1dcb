use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::columns::{ColumnIndices, ColumnMap, IndexBase};
use crate::error::{PipelineError, Result};
use crate::export::ExportLayout;
use crate::shift::ShiftTimes;

/// Everything a run needs besides the input bytes and the reference date.
///
/// Every key is optional in TOML; missing keys take the defaults below.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Numbering convention for `columns`, `export.drop_columns` and `export.currency_column`.
    pub index_base: IndexBase,
    pub columns: ColumnIndices,
    pub shift: ShiftTimes,
    pub rules: FilterRules,
    pub export: ExportSettings,
    pub loader: LoaderSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterRules {
    pub sites: Vec<String>,
    pub tiers: Vec<String>,
    pub state_exception: StateException,
    pub blocked_carriers: Vec<String>,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            sites: strings(&["CD POUSO ALEGRE", "POUSO ALEGRE HPC"]),
            tiers: strings(&["SILVER", "GOLD", "DIAMOND"]),
            state_exception: StateException::default(),
            blocked_carriers: strings(&[
                "JSL S A",
                "TRANSANTA RITA LTDA",
                "T G LOGISTICA E TRANSPORTES LTDA",
                "TRANSANTA RITA TRANSPORTES LTDA",
            ]),
        }
    }
}

/// Rows matching both values are dropped even though the tier is allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateException {
    pub state: String,
    pub tier: String,
}

impl Default for StateException {
    fn default() -> Self {
        Self {
            state: "MG".to_string(),
            tier: "SILVER".to_string(),
        }
    }
}

/// Export layout as written by the caller, positions in the run's [`IndexBase`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub drop_columns: Vec<usize>,
    /// Source column holding the monetary value; located again after the drop.
    pub currency_column: usize,
    pub currency_format: String,
    pub column_width: f64,
    pub currency_width: f64,
    pub sheet_name: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            drop_columns: vec![21, 20, 19, 18, 17, 16, 13, 12, 9, 6, 5, 4, 3, 2, 0],
            currency_column: 14,
            currency_format: "R$ #,##0.00".to_string(),
            column_width: 12.0,
            currency_width: 15.0,
            sheet_name: "Sheet1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderSettings {
    /// Minimum accepted table width. Defaults to the highest role column plus one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_columns: Option<usize>,
}

impl PipelineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|err| PipelineError::Config(format!("cannot serialize configuration: {err}")))
    }

    /// Reject settings that cannot be resolved regardless of the input file.
    pub fn validate(&self) -> Result<()> {
        self.column_map()?;
        self.export_layout()?;
        if self.loader.min_columns == Some(0) {
            return Err(PipelineError::Config(
                "loader.min_columns must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn column_map(&self) -> Result<ColumnMap> {
        ColumnMap::from_indices(&self.columns, self.index_base)
    }

    pub fn min_columns(&self) -> Result<usize> {
        match self.loader.min_columns {
            Some(min) => Ok(min),
            None => Ok(self.column_map()?.required_width()),
        }
    }

    /// Export settings with every position converted to 0-based.
    pub fn export_layout(&self) -> Result<ExportLayout> {
        let drop_columns = self
            .export
            .drop_columns
            .iter()
            .map(|&position| {
                self.index_base
                    .to_zero_based(position, "export.drop_columns entry")
            })
            .collect::<Result<Vec<_>>>()?;
        let currency_column = self
            .index_base
            .to_zero_based(self.export.currency_column, "export.currency_column")?;

        Ok(ExportLayout {
            drop_columns,
            currency_column: Some(currency_column),
            currency_format: self.export.currency_format.clone(),
            column_width: self.export.column_width,
            currency_width: self.export.currency_width,
            sheet_name: self.export.sheet_name.clone(),
        })
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::ColumnRole;

    #[test]
    fn empty_toml_is_the_default_config() {
        let config = PipelineConfig::from_toml_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.min_columns().unwrap(), 16);
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let text = PipelineConfig::default().to_toml_string().unwrap();
        let parsed = PipelineConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, PipelineConfig::default());
    }

    #[test]
    fn one_based_config_applies_to_every_position() {
        let config = PipelineConfig::from_toml_str(
            r#"
            index_base = "one"

            [columns]
            ship_time = 12
            site = 5
            state = 9
            carrier = 11
            tier = 16

            [export]
            drop_columns = [1, 3]
            currency_column = 15
            "#,
        )
        .unwrap();

        let map = config.column_map().unwrap();
        assert_eq!(map.get(ColumnRole::ShipTime), 11);
        let layout = config.export_layout().unwrap();
        assert_eq!(layout.drop_columns, vec![0, 2]);
        assert_eq!(layout.currency_column, Some(14));
    }

    #[test]
    fn one_based_zero_position_is_rejected() {
        let err = PipelineConfig::from_toml_str(
            r#"
            index_base = "one"

            [export]
            drop_columns = [0]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [rules.state_exception]
            state = "SP"

            [shift]
            start = "18:30:00"
            "#,
        )
        .unwrap();
        assert_eq!(config.rules.state_exception.state, "SP");
        assert_eq!(config.rules.state_exception.tier, "SILVER");
        assert_eq!(config.shift.end, ShiftTimes::default().end);
        assert_eq!(config.rules.tiers, FilterRules::default().tiers);
    }

    #[test]
    fn invalid_toml_is_reported() {
        let err = PipelineConfig::from_toml_str("index_base = \"two\"").unwrap_err();
        assert!(matches!(err, PipelineError::ConfigToml(_)));
    }
}
