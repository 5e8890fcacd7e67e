//! Late-arrival and early-leave classification against fixed business hours.

use chrono::NaiveTime;

use crate::model::{AttendanceRecord, ClassifiedRecord};

/// Latest clock-in, as `(hour, minute)`, that is still on time.
pub const DEFAULT_START_OF_DAY: (u32, u32) = (9, 15);
/// Earliest clock-out, as `(hour, minute)`, that is not an early leave.
pub const DEFAULT_END_OF_DAY: (u32, u32) = (18, 15);

/// The pair of cutoffs a record is classified against. Both comparisons are
/// strict: clocking in or out exactly at a cutoff is not a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub start_of_day: NaiveTime,
    pub end_of_day: NaiveTime,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            start_of_day: hour_minute(DEFAULT_START_OF_DAY),
            end_of_day: hour_minute(DEFAULT_END_OF_DAY),
        }
    }
}

fn hour_minute((hour, minute): (u32, u32)) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}

impl Thresholds {
    pub fn is_late(&self, clock_in: Option<NaiveTime>) -> bool {
        clock_in.is_some_and(|time| time > self.start_of_day)
    }

    pub fn is_early_leave(&self, clock_out: Option<NaiveTime>) -> bool {
        clock_out.is_some_and(|time| time < self.end_of_day)
    }

    /// Attaches both flags to `record`. Absent times never count as violations.
    pub fn classify(&self, record: AttendanceRecord) -> ClassifiedRecord {
        let is_late = self.is_late(record.clock_in);
        let is_early_leave = self.is_early_leave(record.clock_out);
        ClassifiedRecord {
            record,
            is_late,
            is_early_leave,
        }
    }
}

/// Classifies a batch of records, preserving their order.
pub fn classify_all(
    records: Vec<AttendanceRecord>,
    thresholds: &Thresholds,
) -> Vec<ClassifiedRecord> {
    records
        .into_iter()
        .map(|record| thresholds.classify(record))
        .collect()
}
