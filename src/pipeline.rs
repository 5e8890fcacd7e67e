use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::aggregate::{self, SheetBatch};
use crate::classify::classify_all;
use crate::config::{DateRange, PipelineConfig};
use crate::error::{Result, ToolError};
use crate::io::{excel_read, excel_write};
use crate::model::{MergedDataset, SummaryStats};
use crate::normalize::normalize_sheet;

/// One uploaded workbook, fully received in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookInput {
    /// Display name used in errors, usually the upload's file name.
    pub name: String,
    pub bytes: Vec<u8>,
}

impl WorkbookInput {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Reads a workbook from disk, naming it after the file.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ToolError::MissingInput(path.to_path_buf()));
        }
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, fs::read(path)?))
    }
}

/// Everything one merge invocation produces.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub dataset: MergedDataset,
    pub summary: SummaryStats,
    /// Reporting period supplied by the caller, if any.
    pub period: Option<DateRange>,
    /// The exported single-sheet `.xlsx` payload.
    pub workbook: Vec<u8>,
}

/// Loads, normalizes, classifies, merges and exports a batch of workbooks.
///
/// Inputs are processed in the order given, then sheet by sheet, then row by
/// row. The first unreadable input aborts the whole batch; nothing is
/// exported in that case.
#[instrument(level = "info", skip_all, fields(files = inputs.len()))]
pub fn merge_workbooks(
    inputs: &[WorkbookInput],
    period: Option<DateRange>,
    config: &PipelineConfig,
) -> Result<MergeOutcome> {
    if let Some(period) = &period {
        info!(%period, "reporting period");
    }

    let mut batches: Vec<SheetBatch> = Vec::new();
    for input in inputs {
        let sheets = excel_read::read_sheets(&input.name, &input.bytes)?;
        debug!(source = %input.name, sheet_count = sheets.len(), "workbook loaded");

        for sheet in sheets {
            let records = normalize_sheet(&sheet, &config.columns);
            let records = classify_all(records, &config.thresholds);
            batches.push(SheetBatch {
                columns: sheet.columns,
                records,
            });
        }
    }

    let dataset = aggregate::merge(batches, &config.columns)?;
    let summary = aggregate::summarize(&dataset);
    info!(
        total = summary.total_records,
        employees = ?summary.employees,
        late = summary.late,
        early_leave = summary.early_leave,
        "attendance merged"
    );

    let workbook = excel_write::write_dataset(&dataset, &config.sheet_name)?;

    Ok(MergeOutcome {
        dataset,
        summary,
        period,
        workbook,
    })
}

/// Merges workbook files from disk and writes the export to `output`.
#[instrument(level = "info", skip_all, fields(output = %output.display()))]
pub fn merge_files(
    inputs: &[PathBuf],
    output: &Path,
    period: Option<DateRange>,
    config: &PipelineConfig,
) -> Result<MergeOutcome> {
    let inputs = inputs
        .iter()
        .map(|path| WorkbookInput::from_path(path))
        .collect::<Result<Vec<_>>>()?;

    let outcome = merge_workbooks(&inputs, period, config)?;
    fs::write(output, &outcome.workbook)?;
    info!(bytes = outcome.workbook.len(), "merged workbook written");
    Ok(outcome)
}
