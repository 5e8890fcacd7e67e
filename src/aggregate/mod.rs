//! Folds the classified sheets of a batch into one dataset and summarises it.

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use crate::config::ColumnNames;
use crate::error::{Result, ToolError};
use crate::model::{ClassifiedRecord, Column, MergedDataset, SummaryStats};

/// The classified rows of one input sheet together with its header row.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetBatch {
    pub columns: Vec<String>,
    pub records: Vec<ClassifiedRecord>,
}

/// Concatenates sheet batches in the order given.
///
/// The merged column set is the union of every sheet's headers in first-seen
/// order. The two flag columns keep their position when an input already
/// carried them and are appended otherwise. Duplicate rows are kept.
///
/// Returns [`ToolError::EmptyInput`] when the batches hold no rows at all.
pub fn merge(batches: Vec<SheetBatch>, names: &ColumnNames) -> Result<MergedDataset> {
    let mut columns: Vec<Column> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut records: Vec<ClassifiedRecord> = Vec::new();
    let mut has_employee_column = false;

    for batch in batches {
        for header in batch.columns {
            if header == names.employee_name {
                has_employee_column = true;
            }
            if seen.insert(header.clone()) {
                columns.push(column_kind(header, names));
            }
        }
        records.extend(batch.records);
    }

    if records.is_empty() {
        return Err(ToolError::EmptyInput);
    }

    for flag in [
        Column::Late(names.late.clone()),
        Column::EarlyLeave(names.early_leave.clone()),
    ] {
        if seen.insert(flag.header().to_string()) {
            columns.push(flag);
        }
    }

    debug!(
        columns = columns.len(),
        records = records.len(),
        "sheets merged"
    );

    Ok(MergedDataset {
        columns,
        records,
        has_employee_column,
    })
}

fn column_kind(header: String, names: &ColumnNames) -> Column {
    if header == names.clock_in {
        Column::ClockIn(header)
    } else if header == names.clock_out {
        Column::ClockOut(header)
    } else if header == names.late {
        Column::Late(header)
    } else if header == names.early_leave {
        Column::EarlyLeave(header)
    } else {
        Column::Field(header)
    }
}

/// Computes the summary counts of a merged dataset.
pub fn summarize(dataset: &MergedDataset) -> SummaryStats {
    let employees = dataset.has_employee_column.then(|| {
        dataset
            .records
            .iter()
            .filter_map(|classified| classified.record.employee_name.as_deref())
            .collect::<BTreeSet<_>>()
            .len()
    });

    SummaryStats {
        total_records: dataset.records.len(),
        employees,
        late: dataset.records.iter().filter(|r| r.is_late).count(),
        early_leave: dataset.records.iter().filter(|r| r.is_early_leave).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttendanceRecord;

    fn classified(name: Option<&str>, is_late: bool, is_early_leave: bool) -> ClassifiedRecord {
        ClassifiedRecord {
            record: AttendanceRecord {
                employee_name: name.map(str::to_string),
                ..AttendanceRecord::default()
            },
            is_late,
            is_early_leave,
        }
    }

    fn batch(columns: &[&str], records: Vec<ClassifiedRecord>) -> SheetBatch {
        SheetBatch {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            records,
        }
    }

    #[test]
    fn union_columns_follow_first_seen_order() {
        let names = ColumnNames::default();
        let dataset = merge(
            vec![
                batch(
                    &["name", "clock-in", "dept"],
                    vec![classified(Some("Zhang"), false, false)],
                ),
                batch(
                    &["clock-out", "name", "note"],
                    vec![classified(Some("Li"), false, false)],
                ),
            ],
            &names,
        )
        .unwrap();

        let headers: Vec<&str> = dataset.headers().collect();
        assert_eq!(
            headers,
            vec![
                "name",
                "clock-in",
                "dept",
                "clock-out",
                "note",
                "is_late",
                "is_early_leave"
            ]
        );
        assert_eq!(dataset.columns[1], Column::ClockIn("clock-in".into()));
        assert_eq!(dataset.columns[3], Column::ClockOut("clock-out".into()));
    }

    #[test]
    fn existing_flag_columns_keep_their_position() {
        let names = ColumnNames::default();
        let dataset = merge(
            vec![batch(
                &["is_late", "name"],
                vec![classified(Some("Zhang"), true, false)],
            )],
            &names,
        )
        .unwrap();

        let headers: Vec<&str> = dataset.headers().collect();
        assert_eq!(headers, vec!["is_late", "name", "is_early_leave"]);
        assert_eq!(dataset.columns[0], Column::Late("is_late".into()));
    }

    #[test]
    fn rows_are_concatenated_without_dedup() {
        let names = ColumnNames::default();
        let dataset = merge(
            vec![
                batch(&["name"], vec![classified(Some("Zhang"), true, false)]),
                batch(&["name"], vec![]),
                batch(
                    &["name"],
                    vec![
                        classified(Some("Zhang"), true, false),
                        classified(Some("Li"), false, true),
                    ],
                ),
            ],
            &names,
        )
        .unwrap();

        let order: Vec<_> = dataset
            .records
            .iter()
            .map(|r| r.record.employee_name.clone().unwrap())
            .collect();
        assert_eq!(order, vec!["Zhang", "Zhang", "Li"]);

        let summary = summarize(&dataset);
        assert_eq!(summary.total_records, 3);
        assert_eq!(summary.employees, Some(2));
        assert_eq!(summary.late, 2);
        assert_eq!(summary.early_leave, 1);
    }

    #[test]
    fn employee_count_is_omitted_without_a_name_column() {
        let names = ColumnNames::default();
        let dataset = merge(
            vec![batch(&["clock-in"], vec![classified(None, false, false)])],
            &names,
        )
        .unwrap();
        assert_eq!(summarize(&dataset).employees, None);
    }

    #[test]
    fn no_rows_is_an_empty_input_error() {
        let names = ColumnNames::default();
        assert!(matches!(merge(Vec::new(), &names), Err(ToolError::EmptyInput)));
        assert!(matches!(
            merge(vec![batch(&["name", "clock-in"], vec![])], &names),
            Err(ToolError::EmptyInput)
        ));
    }
}
