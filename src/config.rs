use std::fmt;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::classify::Thresholds;
use crate::error::{Result, ToolError};

/// Sheet name used for the exported workbook unless configured otherwise.
pub const DEFAULT_SHEET_NAME: &str = "Attendance Summary";

/// Header names of the columns the pipeline interprets. Every other column
/// is carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub employee_name: String,
    pub clock_in: String,
    pub clock_out: String,
    pub late: String,
    pub early_leave: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            employee_name: "name".to_string(),
            clock_in: "clock-in".to_string(),
            clock_out: "clock-out".to_string(),
            late: "is_late".to_string(),
            early_leave: "is_early_leave".to_string(),
        }
    }
}

impl ColumnNames {
    /// Returns `true` for the two derived flag columns.
    pub fn is_flag(&self, column: &str) -> bool {
        column == self.late || column == self.early_leave
    }

    /// Returns `true` for the two designated timestamp columns.
    pub fn is_timestamp(&self, column: &str) -> bool {
        column == self.clock_in || column == self.clock_out
    }
}

/// Settings for one merge invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub columns: ColumnNames,
    pub sheet_name: String,
    /// Business-hour cutoffs. Not read from configuration files.
    #[serde(skip)]
    pub thresholds: Thresholds,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            columns: ColumnNames::default(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            thresholds: Thresholds::default(),
        }
    }
}

impl PipelineConfig {
    /// Loads a JSON configuration file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ToolError::MissingInput(path.to_path_buf()));
        }
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

/// An inclusive reporting period. Construction rejects reversed bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(ToolError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}
