use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Clock times bounding an operational shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftTimes {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Default for ShiftTimes {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(7, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

/// Inclusive `[start, end]` interval a shipment must fall in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShiftWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl ShiftWindow {
    /// The night shift of `reference_date`: 17:00 that day through 07:00 the next day.
    pub fn for_date(reference_date: NaiveDate) -> Self {
        Self::with_times(reference_date, ShiftTimes::default())
    }

    /// The end falls on the following day unless it is later than the start.
    pub fn with_times(reference_date: NaiveDate, times: ShiftTimes) -> Self {
        let start = reference_date.and_time(times.start);
        let end_date = if times.end > times.start {
            reference_date
        } else {
            reference_date
                .checked_add_days(Days::new(1))
                .unwrap_or(reference_date)
        };
        Self {
            start,
            end: end_date.and_time(times.end),
        }
    }

    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }
}
