use cargas_parser::Cell;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

/// Day-first formats; ambiguous numeric dates read day before month. Two-digit years come
/// first because `%Y` would accept `24` as the year 24.
const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%y %H:%M:%S",
    "%d/%m/%y %H:%M",
    "%d-%m-%y %H:%M:%S",
    "%d-%m-%y %H:%M",
    "%d.%m.%y %H:%M:%S",
    "%d.%m.%y %H:%M",
    "%d/%m/%Y %H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S%.f",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%d/%m/%y",
    "%d-%m-%y",
    "%d.%m.%y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y-%m-%d",
];

/// Parsed years before this are typos or truncated years, not shipments.
const MIN_YEAR: i32 = 1900;

/// Serial day numbers in this range are treated as spreadsheet dates (1900-01-01..9999-12-31).
const SERIAL_RANGE: std::ops::RangeInclusive<f64> = 1.0..=2_958_465.0;

/// Read a ship-time cell. `None` marks an invalid date.
pub fn parse_ship_time(cell: &Cell) -> Option<NaiveDateTime> {
    match cell {
        Cell::DateTime(value) => Some(*value),
        Cell::Number(serial) => from_excel_serial(*serial),
        Cell::Text(text) => parse_day_first(text).or_else(|| {
            // Serials exported as text by delimited and HTML reports.
            text.trim().parse::<f64>().ok().and_then(from_excel_serial)
        }),
        Cell::Empty => None,
    }
}

pub fn parse_day_first(text: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATE_FORMATS.iter().find_map(|fmt| {
                NaiveDate::parse_from_str(trimmed, fmt)
                    .ok()
                    .map(|date| date.and_time(chrono::NaiveTime::MIN))
            })
        })?;
    (parsed.year() >= MIN_YEAR).then_some(parsed)
}

/// Days since 1899-12-30, the spreadsheet epoch that absorbs the 1900 leap-year bug.
fn from_excel_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !SERIAL_RANGE.contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_time(chrono::NaiveTime::MIN);
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}
