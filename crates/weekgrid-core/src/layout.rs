//! Pixel geometry for one schedule block
//! on the weekly calendar.

use serde::Serialize;
use tracing::{
  debug,
  trace
};

use crate::grid::{
  Side,
  SlotGrid,
  SlotPosition
};
use crate::time::parse_time;

pub const DEFAULT_ROW_HEIGHT: f64 = 68.0;
pub const DEFAULT_HEADER_ROWS: u32 = 1;

/// The slice of a schedule record the
/// layout needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleBlock {
  pub id:         i64,
  pub start_time: String,
  pub end_time:   String,
  pub label:      String,
  pub color:      String
}

impl ScheduleBlock {
  pub fn new(
    id: i64,
    start_time: impl Into<String>,
    end_time: impl Into<String>
  ) -> Self {
    Self {
      id,
      start_time: start_time.into(),
      end_time: end_time.into(),
      label: String::new(),
      color: String::new()
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SuppressReason {
  /// Start or end is not a valid `HH:MM`.
  InvalidTime,
  /// Start falls outside the grid.
  StartOutsideGrid,
  /// End falls before the first tick.
  EndBeforeGrid,
  /// End is at or before start.
  EmptyDuration
}

impl SuppressReason {
  pub fn as_str(self) -> &'static str {
    match self {
      | Self::InvalidTime => "invalid-time",
      | Self::StartOutsideGrid => {
        "start-outside-grid"
      }
      | Self::EndBeforeGrid => {
        "end-before-grid"
      }
      | Self::EmptyDuration => {
        "empty-duration"
      }
    }
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Serialize,
)]
#[serde(
  tag = "status",
  rename_all = "snake_case"
)]
pub enum BlockLayout {
  Placed {
    top_offset: f64,
    height:     f64
  },
  Suppressed {
    reason: SuppressReason
  }
}

impl BlockLayout {
  pub fn is_placed(&self) -> bool {
    matches!(self, Self::Placed { .. })
  }

  /// `(top, bottom)` in pixels when the
  /// block is rendered.
  pub fn span(&self) -> Option<(f64, f64)> {
    match *self {
      | Self::Placed {
        top_offset,
        height
      } => {
        Some((top_offset, top_offset + height))
      }
      | Self::Suppressed { .. } => None
    }
  }

  fn suppressed(
    reason: SuppressReason
  ) -> Self {
    Self::Suppressed { reason }
  }
}

/// Per-view constants: pixel height of one
/// grid row and how many header rows sit
/// above the first tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
  pub row_height:  f64,
  pub header_rows: u32
}

impl Default for LayoutParams {
  fn default() -> Self {
    Self {
      row_height:  DEFAULT_ROW_HEIGHT,
      header_rows: DEFAULT_HEADER_ROWS
    }
  }
}

impl LayoutParams {
  #[tracing::instrument(
    level = "debug",
    skip(self, block, grid),
    fields(block_id = block.id)
  )]
  pub fn layout(
    &self,
    block: &ScheduleBlock,
    grid: &SlotGrid
  ) -> BlockLayout {
    let parsed = parse_time(
      &block.start_time
    )
    .and_then(|start| {
      parse_time(&block.end_time)
        .map(|end| (start, end))
    });

    let (start, end) = match parsed {
      | Ok(times) => times,
      | Err(err) => {
        debug!(error = %err, "suppressing block with invalid time");
        return BlockLayout::suppressed(
          SuppressReason::InvalidTime
        );
      }
    };

    let layout =
      self.layout_span(start, end, grid);
    if let BlockLayout::Suppressed {
      reason
    } = layout
    {
      debug!(
        reason = reason.as_str(),
        start = %block.start_time,
        end = %block.end_time,
        "block not rendered"
      );
    }
    layout
  }

  /// Layout for fractional-hour `start`
  /// and `end`.
  pub fn layout_span(
    &self,
    start: f64,
    end: f64,
    grid: &SlotGrid
  ) -> BlockLayout {
    let offset = f64::from(self.header_rows);

    let start_index =
      match grid.locate(start) {
        | SlotPosition::Found(index) => {
          index + offset
        }
        | SlotPosition::NotFound(_) => {
          return BlockLayout::suppressed(
            SuppressReason::StartOutsideGrid
          );
        }
      };

    // An end at or past the last tick is
    // clipped to that tick's line.
    let end_index = match grid.locate(end)
    {
      | SlotPosition::Found(index) => {
        index + offset
      }
      | SlotPosition::NotFound(
        Side::After
      ) => {
        grid.len().saturating_sub(1) as f64
          + offset
      }
      | SlotPosition::NotFound(
        Side::Before
      ) => {
        return BlockLayout::suppressed(
          SuppressReason::EndBeforeGrid
        );
      }
    };

    let duration = end_index - start_index;
    trace!(
      start_index,
      end_index,
      duration,
      "computed row span"
    );

    if duration <= 0.0 {
      return BlockLayout::suppressed(
        SuppressReason::EmptyDuration
      );
    }

    BlockLayout::Placed {
      top_offset: start_index
        * self.row_height,
      height:     duration * self.row_height
    }
  }
}
