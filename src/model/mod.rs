use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// A raw spreadsheet cell value as read from an input workbook. Blank cells
/// are never represented; they are simply missing from the owning record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum CellValue {
    /// Text cell.
    String(String),
    /// Integer cell.
    Int(i64),
    /// Floating point cell.
    Float(f64),
    /// Boolean cell.
    Boolean(bool),
    /// Date/time cell, kept as the spreadsheet serial number (days since
    /// 1899-12-30, fractional part is the time of day).
    DateTime(f64),
    /// Duration cell, kept as a fractional number of days.
    Duration(f64),
    /// Cell holding a spreadsheet error such as `#DIV/0!`.
    Error(String),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(value) => write!(f, "{value}"),
            CellValue::Int(value) => write!(f, "{value}"),
            CellValue::Float(value) => write!(f, "{value}"),
            CellValue::Boolean(value) => write!(f, "{value}"),
            CellValue::DateTime(value) | CellValue::Duration(value) => write!(f, "{value}"),
            CellValue::Error(value) => write!(f, "{value}"),
        }
    }
}

/// One data row of a sheet keyed by column header.
pub type RawRecord = BTreeMap<String, CellValue>;

/// One tabular page of an input workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    /// Name of the upload the sheet came from, used in diagnostics.
    pub source: String,
    /// Sheet name inside the workbook.
    pub name: String,
    /// Header row, in sheet order, with blank and repeated names resolved.
    pub columns: Vec<String>,
    /// Data rows in sheet order.
    pub rows: Vec<RawRecord>,
}

impl RawSheet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns `true` when the header row declares the given column.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|existing| existing == column)
    }
}

/// A row whose clock-in/clock-out cells have been normalized to times of day.
///
/// The two time fields are either a valid time or `None`; malformed source
/// values never survive normalization. Every other source cell is kept
/// verbatim in `fields`, the employee-name cell included.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttendanceRecord {
    pub employee_name: Option<String>,
    pub clock_in: Option<NaiveTime>,
    pub clock_out: Option<NaiveTime>,
    pub fields: BTreeMap<String, CellValue>,
}

/// An [`AttendanceRecord`] with its derived lateness flags.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRecord {
    pub record: AttendanceRecord,
    pub is_late: bool,
    pub is_early_leave: bool,
}

/// A column of the merged dataset and where its values come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    /// Normalized clock-in time.
    ClockIn(String),
    /// Normalized clock-out time.
    ClockOut(String),
    /// Derived `is_late` flag.
    Late(String),
    /// Derived `is_early_leave` flag.
    EarlyLeave(String),
    /// Pass-through source column.
    Field(String),
}

impl Column {
    /// Header text written to the export.
    pub fn header(&self) -> &str {
        match self {
            Column::ClockIn(name)
            | Column::ClockOut(name)
            | Column::Late(name)
            | Column::EarlyLeave(name)
            | Column::Field(name) => name,
        }
    }
}

/// Every classified record of one merge invocation, in file, sheet, then
/// row order, with the union of all source columns.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedDataset {
    pub columns: Vec<Column>,
    pub records: Vec<ClassifiedRecord>,
    /// Set when at least one input sheet declared the employee-name column.
    pub has_employee_column: bool,
}

impl MergedDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(Column::header)
    }
}

/// Summary counts over a [`MergedDataset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_records: usize,
    /// Distinct employee names; `None` when no input had a name column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employees: Option<usize>,
    pub late: usize,
    pub early_leave: usize,
}
