//! Spreadsheet adapters: the workbook loader and the merged-workbook exporter.

pub mod excel_read;
pub mod excel_write;
