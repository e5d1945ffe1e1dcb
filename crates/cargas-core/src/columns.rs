use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Logical fields the filters read, each bound to one column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    ShipTime,
    Site,
    State,
    Carrier,
    Tier,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 5] = [
        ColumnRole::ShipTime,
        ColumnRole::Site,
        ColumnRole::State,
        ColumnRole::Carrier,
        ColumnRole::Tier,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnRole::ShipTime => "ship_time",
            ColumnRole::Site => "site",
            ColumnRole::State => "state",
            ColumnRole::Carrier => "carrier",
            ColumnRole::Tier => "tier",
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numbering convention for every positional setting of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexBase {
    #[default]
    Zero,
    One,
}

impl IndexBase {
    /// Convert a configured position to a 0-based index. `what` names the setting in errors.
    pub fn to_zero_based(&self, position: usize, what: &str) -> Result<usize> {
        match self {
            IndexBase::Zero => Ok(position),
            IndexBase::One => position.checked_sub(1).ok_or_else(|| {
                PipelineError::Config(format!(
                    "{what} is 0 but column numbering is 1-based (first column is 1)"
                ))
            }),
        }
    }
}

/// Column positions as the caller wrote them, in the run's [`IndexBase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnIndices {
    pub ship_time: usize,
    pub site: usize,
    pub state: usize,
    pub carrier: usize,
    pub tier: usize,
}

impl Default for ColumnIndices {
    fn default() -> Self {
        // Column L, E, I, K and P of the shipment report.
        Self {
            ship_time: 11,
            site: 4,
            state: 8,
            carrier: 10,
            tier: 15,
        }
    }
}

impl ColumnIndices {
    pub fn get(&self, role: ColumnRole) -> usize {
        match role {
            ColumnRole::ShipTime => self.ship_time,
            ColumnRole::Site => self.site,
            ColumnRole::State => self.state,
            ColumnRole::Carrier => self.carrier,
            ColumnRole::Tier => self.tier,
        }
    }
}

/// Validated, 0-based role → column mapping. The only place positions enter the filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    indices: ColumnIndices,
}

impl ColumnMap {
    /// Convert `raw` to 0-based indices without checking them against a table.
    pub fn from_indices(raw: &ColumnIndices, base: IndexBase) -> Result<Self> {
        let convert = |role: ColumnRole| base.to_zero_based(raw.get(role), role.as_str());
        Ok(Self {
            indices: ColumnIndices {
                ship_time: convert(ColumnRole::ShipTime)?,
                site: convert(ColumnRole::Site)?,
                state: convert(ColumnRole::State)?,
                carrier: convert(ColumnRole::Carrier)?,
                tier: convert(ColumnRole::Tier)?,
            },
        })
    }

    /// Convert and bounds-check `raw` against a table `width` columns wide.
    pub fn resolve(raw: &ColumnIndices, base: IndexBase, width: usize) -> Result<Self> {
        let map = Self::from_indices(raw, base)?;
        map.check_width(width)?;
        Ok(map)
    }

    pub fn check_width(&self, width: usize) -> Result<()> {
        for role in ColumnRole::ALL {
            let column = self.get(role);
            if column >= width {
                return Err(PipelineError::Schema {
                    role,
                    column,
                    width,
                });
            }
        }
        Ok(())
    }

    pub fn get(&self, role: ColumnRole) -> usize {
        self.indices.get(role)
    }

    /// Smallest table width that satisfies every role.
    pub fn required_width(&self) -> usize {
        ColumnRole::ALL
            .iter()
            .map(|role| self.get(*role) + 1)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_zero_based_report_columns() {
        let map = ColumnMap::resolve(&ColumnIndices::default(), IndexBase::Zero, 22).unwrap();
        assert_eq!(map.get(ColumnRole::ShipTime), 11);
        assert_eq!(map.get(ColumnRole::Tier), 15);
        assert_eq!(map.required_width(), 16);
    }

    #[test]
    fn one_based_positions_shift_down_by_one() {
        let raw = ColumnIndices {
            ship_time: 12,
            site: 5,
            state: 9,
            carrier: 11,
            tier: 16,
        };
        let one = ColumnMap::resolve(&raw, IndexBase::One, 16).unwrap();
        let zero = ColumnMap::resolve(&ColumnIndices::default(), IndexBase::Zero, 16).unwrap();
        assert_eq!(one, zero);
    }

    #[test]
    fn one_based_zero_is_a_config_error() {
        let raw = ColumnIndices {
            site: 0,
            ..ColumnIndices::default()
        };
        let err = ColumnMap::from_indices(&raw, IndexBase::One).unwrap_err();
        assert!(matches!(err, PipelineError::Config(message) if message.contains("site")));
    }

    #[test]
    fn out_of_range_names_the_role() {
        let err = ColumnMap::resolve(&ColumnIndices::default(), IndexBase::Zero, 12).unwrap_err();
        match err {
            PipelineError::Schema {
                role,
                column,
                width,
            } => {
                assert_eq!(role, ColumnRole::Tier);
                assert_eq!(column, 15);
                assert_eq!(width, 12);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
