//! Week navigation and the per-day
//! column layout of a week of schedules.

use chrono::{
  Datelike,
  Duration,
  NaiveDate,
  Weekday
};
use serde::Serialize;
use tracing::{
  debug,
  info,
  warn
};
use weekgrid_shared::WorkScheduleDto;

use crate::grid::SlotGrid;
use crate::lanes::{
  LaneSlot,
  assign_lanes
};
use crate::layout::{
  BlockLayout,
  LayoutParams,
  ScheduleBlock
};

pub fn start_of_week(
  date: NaiveDate,
  week_start: Weekday
) -> NaiveDate {
  let offset = (7
    + date.weekday().num_days_from_monday()
    - week_start.num_days_from_monday())
    % 7;
  date - Duration::days(i64::from(offset))
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
)]
pub struct WeekRange {
  pub start: NaiveDate
}

impl WeekRange {
  pub fn containing(
    date: NaiveDate,
    week_start: Weekday
  ) -> Self {
    Self {
      start: start_of_week(
        date, week_start
      )
    }
  }

  pub fn end(&self) -> NaiveDate {
    self.start + Duration::days(6)
  }

  pub fn days(&self) -> [NaiveDate; 7] {
    std::array::from_fn(|offset| {
      self.start
        + Duration::days(offset as i64)
    })
  }

  pub fn shift(
    &self,
    weeks: i64
  ) -> Self {
    Self {
      start: self.start
        + Duration::weeks(weeks)
    }
  }

  pub fn contains(
    &self,
    date: NaiveDate
  ) -> bool {
    date >= self.start
      && date <= self.end()
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlacedBlock {
  pub id:         i64,
  pub label:      String,
  pub color:      String,
  pub start_time: String,
  pub end_time:   String,
  pub layout:     BlockLayout,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub lane:       Option<LaneSlot>
}

#[derive(Debug, Clone, Serialize)]
pub struct DayColumn {
  pub date:   NaiveDate,
  pub blocks: Vec<PlacedBlock>
}

impl DayColumn {
  pub fn rendered(
    &self
  ) -> impl Iterator<Item = &PlacedBlock>
  {
    self
      .blocks
      .iter()
      .filter(|block| {
        block.layout.is_placed()
      })
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekLayout {
  pub week:    WeekRange,
  pub columns: Vec<DayColumn>,
  /// Records dropped before layout, with
  /// the reason.
  pub skipped: Vec<SkippedRecord>
}

impl WeekLayout {
  pub fn placed_count(&self) -> usize {
    self
      .columns
      .iter()
      .map(|column| column.rendered().count())
      .sum()
  }

  pub fn suppressed_count(
    &self
  ) -> usize {
    self
      .columns
      .iter()
      .map(|column| {
        column.blocks.len()
          - column.rendered().count()
      })
      .sum()
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedRecord {
  pub id:     i64,
  pub reason: String
}

impl From<&WorkScheduleDto>
  for ScheduleBlock
{
  fn from(
    record: &WorkScheduleDto
  ) -> Self {
    Self {
      id:         record.id,
      start_time: record.start_time.clone(),
      end_time:   record.end_time.clone(),
      label:      record.content.clone(),
      color:      record.display_color()
    }
  }
}

/// Lays out every record of `week`, one
/// column per day. Each block is computed
/// on its own; a record that cannot be
/// placed is reported, never fatal.
#[tracing::instrument(
  skip_all,
  fields(week = %week.start, records = records.len(), lanes = lanes)
)]
pub fn layout_week(
  records: &[WorkScheduleDto],
  week: WeekRange,
  grid: &SlotGrid,
  params: &LayoutParams,
  lanes: bool
) -> WeekLayout {
  let mut columns = week
    .days()
    .into_iter()
    .map(|date| {
      DayColumn {
        date,
        blocks: vec![]
      }
    })
    .collect::<Vec<_>>();
  let mut skipped = vec![];

  for record in records {
    let date = match NaiveDate::parse_from_str(
      record.work_date.trim(),
      "%Y-%m-%d"
    ) {
      | Ok(date) => date,
      | Err(err) => {
        warn!(
          id = record.id,
          work_date = %record.work_date,
          error = %err,
          "skipping record with invalid workDate"
        );
        skipped.push(SkippedRecord {
          id:     record.id,
          reason: format!(
            "invalid workDate {:?}",
            record.work_date
          )
        });
        continue;
      }
    };

    if !week.contains(date) {
      debug!(id = record.id, %date, "record outside displayed week");
      skipped.push(SkippedRecord {
        id:     record.id,
        reason: format!(
          "{date} is outside the week"
        )
      });
      continue;
    }

    let block = ScheduleBlock::from(record);
    let layout = params.layout(&block, grid);
    let column_idx =
      (date - week.start).num_days()
        as usize;

    columns[column_idx].blocks.push(
      PlacedBlock {
        id: block.id,
        label: block.label,
        color: block.color,
        start_time: block.start_time,
        end_time: block.end_time,
        layout,
        lane: None
      }
    );
  }

  if lanes {
    for column in &mut columns {
      let spans = column
        .blocks
        .iter()
        .map(|block| block.layout.span())
        .collect::<Vec<_>>();
      for (block, lane) in column
        .blocks
        .iter_mut()
        .zip(assign_lanes(&spans))
      {
        block.lane = lane;
      }
    }
  }

  let layout = WeekLayout {
    week,
    columns,
    skipped
  };
  info!(
    placed = layout.placed_count(),
    suppressed = layout.suppressed_count(),
    skipped = layout.skipped.len(),
    "laid out week"
  );
  layout
}
