use std::collections::HashSet;
use std::io::{Cursor, Read, Seek};

use calamine::{DataType, Range, Reader, Xls, Xlsx};
use tracing::{debug, instrument};

use crate::error::{Result, ToolError};
use crate::model::{CellValue, RawRecord, RawSheet};

/// Leading bytes of a zip archive (`.xlsx`).
const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";
/// Leading bytes of an OLE compound document (`.xls`).
const CFB_SIGNATURE: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Parses one uploaded workbook into its sheets, in workbook order.
///
/// The first non-blank row of each sheet is taken as the header. Fully blank
/// rows are skipped and blank cells are left out of the row records.
/// `source_name` only identifies the upload in errors and logs.
#[instrument(level = "debug", skip(bytes), fields(size = bytes.len()))]
pub fn read_sheets(source_name: &str, bytes: &[u8]) -> Result<Vec<RawSheet>> {
    let cursor = Cursor::new(bytes);

    if bytes.starts_with(ZIP_SIGNATURE) {
        let mut workbook: Xlsx<_> =
            Xlsx::new(cursor).map_err(|err| unreadable(source_name, err))?;
        read_all_sheets(&mut workbook, source_name)
    } else if bytes.starts_with(CFB_SIGNATURE) {
        let mut workbook: Xls<_> = Xls::new(cursor).map_err(|err| unreadable(source_name, err))?;
        read_all_sheets(&mut workbook, source_name)
    } else {
        Err(unreadable(
            source_name,
            "payload is neither an .xlsx nor an .xls container",
        ))
    }
}

fn read_all_sheets<RS, R>(workbook: &mut R, source_name: &str) -> Result<Vec<RawSheet>>
where
    RS: Read + Seek,
    R: Reader<RS>,
    <R as Reader<RS>>::Error: std::fmt::Display,
{
    let names: Vec<String> = workbook.sheet_names().to_owned();
    let mut sheets = Vec::with_capacity(names.len());

    for name in names {
        let range = match workbook.worksheet_range(&name) {
            Some(result) => result.map_err(|err| unreadable(source_name, err))?,
            None => continue,
        };
        let sheet = sheet_from_range(source_name, &name, &range);
        debug!(
            sheet = %sheet.name,
            columns = sheet.columns.len(),
            rows = sheet.len(),
            "sheet loaded"
        );
        sheets.push(sheet);
    }

    Ok(sheets)
}

fn sheet_from_range(source_name: &str, sheet_name: &str, range: &Range<DataType>) -> RawSheet {
    let mut rows = range.rows().skip_while(|row| is_blank_row(row));
    let columns = rows.next().map(header_names).unwrap_or_default();

    let records = rows
        .filter(|row| !is_blank_row(row))
        .map(|row| row_to_record(&columns, row))
        .collect();

    RawSheet {
        source: source_name.to_string(),
        name: sheet_name.to_string(),
        columns,
        rows: records,
    }
}

/// Resolves header cells into unique column names. Blank headers become
/// `Unnamed: <index>` and repeats get a `.1`, `.2`, ... suffix.
fn header_names(row: &[DataType]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(row.len());

    for (idx, cell) in row.iter().enumerate() {
        let text = cell_to_string(Some(cell)).trim().to_string();
        let base = if text.is_empty() {
            format!("Unnamed: {idx}")
        } else {
            text
        };

        let mut candidate = base.clone();
        let mut counter = 0;
        while used.contains(&candidate) {
            counter += 1;
            candidate = format!("{base}.{counter}");
        }
        used.insert(candidate.clone());
        names.push(candidate);
    }

    names
}

fn row_to_record(columns: &[String], row: &[DataType]) -> RawRecord {
    columns
        .iter()
        .zip(row.iter())
        .filter_map(|(column, cell)| cell_value(cell).map(|value| (column.clone(), value)))
        .collect()
}

fn is_blank_row(row: &[DataType]) -> bool {
    row.iter().all(|cell| cell_value(cell).is_none())
}

fn cell_value(cell: &DataType) -> Option<CellValue> {
    match cell {
        DataType::Empty => None,
        DataType::String(value) if value.is_empty() => None,
        DataType::String(value) => Some(CellValue::String(value.clone())),
        DataType::Float(value) => Some(CellValue::Float(*value)),
        DataType::Int(value) => Some(CellValue::Int(*value)),
        DataType::Bool(value) => Some(CellValue::Boolean(*value)),
        DataType::DateTime(value) => Some(CellValue::DateTime(*value)),
        DataType::Duration(value) => Some(CellValue::Duration(*value)),
        DataType::Error(error) => Some(CellValue::Error(error.to_string())),
        other => Some(CellValue::String(other.to_string())),
    }
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn unreadable(source_name: &str, reason: impl std::fmt::Display) -> ToolError {
    ToolError::UnreadableWorkbook {
        source_name: source_name.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_repeated_headers_are_made_unique() {
        let row = vec![
            DataType::String("name".into()),
            DataType::Empty,
            DataType::String("name".into()),
            DataType::String("name.1".into()),
        ];
        assert_eq!(
            header_names(&row),
            vec!["name", "Unnamed: 1", "name.1", "name.1.1"]
        );
    }

    #[test]
    fn blank_cells_are_left_out_of_records() {
        let columns = vec!["name".to_string(), "clock-in".to_string()];
        let row = vec![DataType::String("Zhang".into()), DataType::Empty];
        let record = row_to_record(&columns, &row);
        assert_eq!(record.len(), 1);
        assert_eq!(
            record.get("name"),
            Some(&CellValue::String("Zhang".into()))
        );
    }

    #[test]
    fn non_spreadsheet_payload_is_unreadable() {
        let error = read_sheets("notes.txt", b"just some text").unwrap_err();
        match error {
            ToolError::UnreadableWorkbook { source_name, .. } => {
                assert_eq!(source_name, "notes.txt")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn corrupt_zip_payload_is_unreadable() {
        let error = read_sheets("broken.xlsx", b"PK\x03\x04garbage").unwrap_err();
        assert!(matches!(error, ToolError::UnreadableWorkbook { .. }));
    }
}
