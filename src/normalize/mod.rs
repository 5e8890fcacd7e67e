//! Column normalization: turns the designated timestamp cells of a raw sheet
//! into times of day. Malformed values become absent, never errors.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use tracing::trace;

use crate::config::ColumnNames;
use crate::model::{AttendanceRecord, CellValue, RawRecord, RawSheet};

pub const SECONDS_PER_DAY: u32 = 86_400;

const TIME_FORMATS: &[&str] = &[
    "%H:%M:%S",
    "%H:%M:%S%.f",
    "%H:%M",
    "%I:%M:%S %p",
    "%I:%M %p",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%d %I:%M:%S %p",
    "%Y-%m-%d %I:%M %p",
    "%Y/%m/%d %I:%M:%S %p",
    "%Y/%m/%d %I:%M %p",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Normalizes every row of `sheet`. The output has one record per input row.
pub fn normalize_sheet(sheet: &RawSheet, columns: &ColumnNames) -> Vec<AttendanceRecord> {
    sheet
        .rows
        .iter()
        .map(|row| normalize_record(row, columns))
        .collect()
}

/// Normalizes one raw row.
///
/// Clock-in/clock-out cells are parsed into times of day. Cells under the
/// derived flag headers are dropped since classification recomputes them.
/// Everything else is kept verbatim.
pub fn normalize_record(row: &RawRecord, columns: &ColumnNames) -> AttendanceRecord {
    let mut record = AttendanceRecord::default();

    for (column, cell) in row {
        if *column == columns.clock_in {
            record.clock_in = time_field(column, cell);
        } else if *column == columns.clock_out {
            record.clock_out = time_field(column, cell);
        } else if columns.is_flag(column) {
            continue;
        } else {
            if *column == columns.employee_name {
                record.employee_name = employee_name(cell);
            }
            record.fields.insert(column.clone(), cell.clone());
        }
    }

    record
}

fn time_field(column: &str, cell: &CellValue) -> Option<NaiveTime> {
    let parsed = parse_time_of_day(cell);
    if parsed.is_none() {
        trace!(column, value = %cell, "unparseable timestamp treated as absent");
    }
    parsed
}

fn employee_name(cell: &CellValue) -> Option<String> {
    let text = cell.to_string();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Extracts the time of day from a cell holding a timestamp.
///
/// Text is parsed with [`parse_timestamp`]. Numeric cells are read as
/// spreadsheet serial numbers. Booleans and error cells yield `None`.
pub fn parse_time_of_day(cell: &CellValue) -> Option<NaiveTime> {
    match cell {
        CellValue::String(text) => parse_timestamp(text),
        CellValue::DateTime(serial) | CellValue::Float(serial) => serial_to_time(*serial),
        CellValue::Int(days) => serial_to_time(*days as f64),
        CellValue::Duration(_) | CellValue::Boolean(_) | CellValue::Error(_) => None,
    }
}

/// Parses a textual timestamp and keeps only its time of day.
///
/// Accepts bare times, date-times, RFC 3339 (the offset is discarded and
/// the wall-clock time kept) and bare dates, which map to midnight.
pub fn parse_timestamp(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(time) = TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(text, format).ok())
    {
        return Some(time);
    }

    if let Some(datetime) = DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
    {
        return Some(datetime.time());
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime.naive_local().time());
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .map(|_| NaiveTime::default())
}

/// Converts a spreadsheet serial number (days, fractional part = time of
/// day) into a time of day rounded to the second.
///
/// Fractions that round up to the next midnight stay on the same day as
/// 23:59:59.
pub fn serial_to_time(serial: f64) -> Option<NaiveTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let seconds = ((serial.fract() * f64::from(SECONDS_PER_DAY)).round() as u32)
        .min(SECONDS_PER_DAY - 1);
    NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)
}

/// Converts a time of day into the fraction-of-day form spreadsheets use.
pub fn time_to_serial(time: NaiveTime) -> f64 {
    let seconds = f64::from(time.num_seconds_from_midnight())
        + f64::from(time.nanosecond()) / 1_000_000_000.0;
    seconds / f64::from(SECONDS_PER_DAY)
}

/// Formats a time of day as `HH:MM:SS`.
pub fn format_time_of_day(time: NaiveTime) -> String {
    time.format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Thresholds;
    use proptest::prelude::*;

    fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    fn text(value: &str) -> CellValue {
        CellValue::String(value.to_string())
    }

    #[test]
    fn parses_common_timestamp_layouts() {
        assert_eq!(parse_timestamp("09:20:00"), Some(hms(9, 20, 0)));
        assert_eq!(parse_timestamp(" 9:05 "), Some(hms(9, 5, 0)));
        assert_eq!(parse_timestamp("2025-07-01 18:00:00"), Some(hms(18, 0, 0)));
        assert_eq!(parse_timestamp("2025/07/01 08:59"), Some(hms(8, 59, 0)));
        assert_eq!(parse_timestamp("2025-07-01T09:15:30"), Some(hms(9, 15, 30)));
        assert_eq!(
            parse_timestamp("2025-07-01T18:20:00+08:00"),
            Some(hms(18, 20, 0))
        );
        assert_eq!(parse_timestamp("2025-07-01"), Some(hms(0, 0, 0)));
    }

    #[test]
    fn parses_twelve_hour_clock_text() {
        assert_eq!(parse_timestamp("9:20 AM"), Some(hms(9, 20, 0)));
        assert_eq!(parse_timestamp("09:20 am"), Some(hms(9, 20, 0)));
        assert_eq!(parse_timestamp("6:00:00 PM"), Some(hms(18, 0, 0)));
        assert_eq!(parse_timestamp("12:05 AM"), Some(hms(0, 5, 0)));
        assert_eq!(parse_timestamp("12:30 PM"), Some(hms(12, 30, 0)));
        assert_eq!(parse_timestamp("2025-07-01 6:10 PM"), Some(hms(18, 10, 0)));
        assert_eq!(parse_timestamp("13:00 PM"), None);
    }

    #[test]
    fn malformed_timestamps_are_absent() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("absent"), None);
        assert_eq!(parse_timestamp("25:00:00"), None);
        assert_eq!(parse_time_of_day(&CellValue::Boolean(true)), None);
        assert_eq!(parse_time_of_day(&CellValue::Error("#N/A".into())), None);
        assert_eq!(parse_time_of_day(&CellValue::Float(f64::NAN)), None);
        assert_eq!(parse_time_of_day(&CellValue::Float(-1.0)), None);
    }

    #[test]
    fn serial_numbers_keep_only_the_time_of_day() {
        // 2025-07-01 09:20:00
        let serial = 45839.0 + (9.0 * 3600.0 + 20.0 * 60.0) / 86_400.0;
        assert_eq!(
            parse_time_of_day(&CellValue::DateTime(serial)),
            Some(hms(9, 20, 0))
        );
        assert_eq!(serial_to_time(0.999_999_9), Some(hms(23, 59, 59)));
        assert_eq!(parse_time_of_day(&CellValue::Int(45839)), Some(hms(0, 0, 0)));
    }

    #[test]
    fn record_splits_designated_and_pass_through_columns() {
        let columns = ColumnNames::default();
        let mut row = RawRecord::new();
        row.insert("name".into(), text(" Zhang "));
        row.insert("clock-in".into(), text("09:20:00"));
        row.insert("clock-out".into(), text(""));
        row.insert("dept".into(), text("R&D"));
        row.insert("is_late".into(), CellValue::Boolean(false));

        let record = normalize_record(&row, &columns);

        assert_eq!(record.employee_name.as_deref(), Some("Zhang"));
        assert_eq!(record.clock_in, Some(hms(9, 20, 0)));
        assert_eq!(record.clock_out, None);
        assert_eq!(record.fields.get("dept"), Some(&text("R&D")));
        assert_eq!(record.fields.get("name"), Some(&text(" Zhang ")));
        assert!(!record.fields.contains_key("clock-in"));
        assert!(!record.fields.contains_key("is_late"));
    }

    #[test]
    fn sheet_without_timestamp_columns_yields_absent_times() {
        let columns = ColumnNames::default();
        let mut row = RawRecord::new();
        row.insert("name".into(), text("Li"));
        let sheet = RawSheet {
            source: "a.xlsx".into(),
            name: "Sheet1".into(),
            columns: vec!["name".into()],
            rows: vec![row.clone(), row],
        };

        let records = normalize_sheet(&sheet, &columns);

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.clock_in.is_none() && r.clock_out.is_none()));
    }

    #[test]
    fn clock_out_just_before_midnight_is_not_an_early_leave() {
        let columns = ColumnNames::default();
        let mut row = RawRecord::new();
        row.insert("name".into(), text("Zhang"));
        row.insert(
            "clock-out".into(),
            CellValue::DateTime(45839.0 + 86_399.7 / 86_400.0),
        );

        let record = normalize_record(&row, &columns);
        assert_eq!(record.clock_out, Some(hms(23, 59, 59)));

        let classified = Thresholds::default().classify(record);
        assert!(!classified.is_early_leave);
    }

    #[test]
    fn time_serial_conversion_is_reversible() {
        let time = hms(18, 15, 0);
        assert_eq!(serial_to_time(time_to_serial(time)), Some(time));
    }

    proptest! {
        #[test]
        fn normalize_then_format_round_trips(h in 0u32..24, m in 0u32..60, s in 0u32..60) {
            let rendered = format!("{h:02}:{m:02}:{s:02}");
            let parsed = parse_timestamp(&rendered).unwrap();
            prop_assert_eq!(format_time_of_day(parsed), rendered.clone());

            let dated = format!("2025-07-01 {rendered}");
            let parsed = parse_timestamp(&dated).unwrap();
            prop_assert_eq!(format_time_of_day(parsed), rendered);
        }
    }
}
