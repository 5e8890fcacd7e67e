use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tracing::{debug, instrument};

use crate::error::{Result, ToolError};
use crate::model::{CellValue, Column, MergedDataset};
use crate::normalize::time_to_serial;

/// Worksheet rows available below the header row.
const MAX_RECORDS: usize = 1_048_575;
const MAX_COLUMNS: usize = 16_384;
const MAX_STRING_CHARS: usize = 32_767;
/// Largest integer an IEEE double, and therefore a spreadsheet number, holds exactly.
const MAX_EXACT_INTEGER: u64 = 1 << 53;

const TIME_NUM_FORMAT: &str = "hh:mm:ss";
const DATETIME_NUM_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";
const DURATION_NUM_FORMAT: &str = "[h]:mm:ss";

struct CellFormats {
    header: Format,
    time: Format,
    datetime: Format,
    duration: Format,
}

impl CellFormats {
    fn new() -> Self {
        Self {
            header: Format::new().set_bold(),
            time: Format::new().set_num_format(TIME_NUM_FORMAT),
            datetime: Format::new().set_num_format(DATETIME_NUM_FORMAT),
            duration: Format::new().set_num_format(DURATION_NUM_FORMAT),
        }
    }
}

/// Serialises the merged dataset into a single-sheet `.xlsx` payload.
///
/// The header row lists the dataset columns in order, followed by one row
/// per record. Times of day are written as spreadsheet times and the flag
/// columns as native booleans. Absent values leave the cell blank.
#[instrument(level = "debug", skip(dataset), fields(records = dataset.len()))]
pub fn write_dataset(dataset: &MergedDataset, sheet_name: &str) -> Result<Vec<u8>> {
    check_dimensions(dataset)?;

    let formats = CellFormats::new();
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (col_idx, column) in dataset.columns.iter().enumerate() {
        worksheet.write_string_with_format(
            0,
            col_idx as u16,
            column.header(),
            &formats.header,
        )?;
    }

    for (record_idx, classified) in dataset.records.iter().enumerate() {
        let row = (record_idx + 1) as u32;
        let record = &classified.record;

        for (col_idx, column) in dataset.columns.iter().enumerate() {
            let col = col_idx as u16;
            match column {
                Column::ClockIn(_) => {
                    if let Some(time) = record.clock_in {
                        worksheet.write_number_with_format(
                            row,
                            col,
                            time_to_serial(time),
                            &formats.time,
                        )?;
                    }
                }
                Column::ClockOut(_) => {
                    if let Some(time) = record.clock_out {
                        worksheet.write_number_with_format(
                            row,
                            col,
                            time_to_serial(time),
                            &formats.time,
                        )?;
                    }
                }
                Column::Late(_) => {
                    worksheet.write_boolean(row, col, classified.is_late)?;
                }
                Column::EarlyLeave(_) => {
                    worksheet.write_boolean(row, col, classified.is_early_leave)?;
                }
                Column::Field(name) => {
                    if let Some(value) = record.fields.get(name) {
                        let position = CellPosition {
                            column: name,
                            record: record_idx + 1,
                            row,
                            col,
                        };
                        write_cell(worksheet, &position, value, &formats)?;
                    }
                }
            }
        }
    }

    if !dataset.records.is_empty() && !dataset.columns.is_empty() {
        let last_col = (dataset.columns.len() - 1) as u16;
        worksheet.autofilter(0, 0, dataset.records.len() as u32, last_col)?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    let buffer = workbook.save_to_buffer()?;
    debug!(bytes = buffer.len(), "workbook serialised");
    Ok(buffer)
}

struct CellPosition<'a> {
    column: &'a str,
    record: usize,
    row: u32,
    col: u16,
}

fn write_cell(
    worksheet: &mut Worksheet,
    position: &CellPosition<'_>,
    value: &CellValue,
    formats: &CellFormats,
) -> Result<()> {
    let (row, col) = (position.row, position.col);

    match value {
        CellValue::String(text) => {
            if text.chars().count() > MAX_STRING_CHARS {
                return Err(unrepresentable(
                    position,
                    format!("text longer than {MAX_STRING_CHARS} characters"),
                ));
            }
            worksheet.write_string(row, col, text)?;
        }
        CellValue::Int(number) => {
            if number.unsigned_abs() <= MAX_EXACT_INTEGER {
                worksheet.write_number(row, col, *number as f64)?;
            } else {
                worksheet.write_string(row, col, &number.to_string())?;
            }
        }
        CellValue::Float(number) => {
            worksheet.write_number(row, col, finite(position, *number)?)?;
        }
        CellValue::Boolean(flag) => {
            worksheet.write_boolean(row, col, *flag)?;
        }
        CellValue::DateTime(serial) => {
            let serial = finite(position, *serial)?;
            worksheet.write_number_with_format(row, col, serial, &formats.datetime)?;
        }
        CellValue::Duration(days) => {
            let days = finite(position, *days)?;
            worksheet.write_number_with_format(row, col, days, &formats.duration)?;
        }
        CellValue::Error(text) => {
            worksheet.write_string(row, col, text)?;
        }
    }

    Ok(())
}

fn finite(position: &CellPosition<'_>, number: f64) -> Result<f64> {
    if number.is_finite() {
        Ok(number)
    } else {
        Err(unrepresentable(position, format!("non-finite number {number}")))
    }
}

fn check_dimensions(dataset: &MergedDataset) -> Result<()> {
    if dataset.columns.len() > MAX_COLUMNS {
        let column = dataset
            .columns
            .get(MAX_COLUMNS)
            .map(|column| column.header().to_string())
            .unwrap_or_default();
        return Err(ToolError::Serialization {
            column,
            row: 0,
            reason: format!("more than {MAX_COLUMNS} columns"),
        });
    }
    if dataset.records.len() > MAX_RECORDS {
        return Err(ToolError::Serialization {
            column: String::new(),
            row: MAX_RECORDS + 1,
            reason: format!("more than {MAX_RECORDS} records"),
        });
    }
    Ok(())
}

fn unrepresentable(position: &CellPosition<'_>, reason: String) -> ToolError {
    ToolError::Serialization {
        column: position.column.to_string(),
        row: position.record,
        reason,
    }
}
