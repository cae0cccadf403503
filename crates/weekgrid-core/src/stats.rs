use serde::Serialize;
use weekgrid_shared::{
  AttendanceStatus,
  WorkScheduleDto
};

use crate::time::parse_time;

/// Summary cards shown above the weekly
/// calendar.
#[derive(
  Debug, Clone, Default, PartialEq, Serialize,
)]
pub struct WeeklyStats {
  pub total_hours:    f64,
  pub present_hours:  f64,
  pub unmarked_count: usize,
  pub record_count:   usize
}

impl WeeklyStats {
  pub fn from_records<'a, I>(
    records: I
  ) -> Self
  where
    I: IntoIterator<
      Item = &'a WorkScheduleDto
    >
  {
    let mut stats = Self::default();

    for record in records {
      let hours = record_hours(record);
      stats.record_count += 1;
      stats.total_hours += hours;
      match record.attendance_status {
        | AttendanceStatus::Present => {
          stats.present_hours += hours;
        }
        | AttendanceStatus::NotMarked => {
          stats.unmarked_count += 1;
        }
        | AttendanceStatus::Absent => {}
      }
    }

    stats
  }
}

/// Hours a record covers: the backend's
/// `duration` when present, otherwise
/// derived from its times.
pub fn record_hours(
  record: &WorkScheduleDto
) -> f64 {
  if let Some(duration) = record.duration
    && duration.is_finite()
  {
    return duration;
  }

  match (
    parse_time(&record.start_time),
    parse_time(&record.end_time)
  ) {
    | (Ok(start), Ok(end)) if end > start => {
      end - start
    }
    | _ => 0.0
  }
}
