//! Calendar rows as a fixed list of
//! fractional-hour ticks, plus the
//! locator that maps a time onto them.

use serde::Serialize;

use crate::error::GridError;
use crate::time::TimeOfDay;

/// Which end of the grid a time fell off.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Side {
  Before,
  After
}

/// Result of locating a time on a
/// [`SlotGrid`].
#[derive(
  Debug, Clone, Copy, PartialEq, Serialize,
)]
#[serde(
  tag = "kind",
  content = "value",
  rename_all = "snake_case"
)]
pub enum SlotPosition {
  /// Row index, fractional when the time
  /// lies strictly between two ticks.
  Found(f64),
  /// No pair of adjacent ticks contains
  /// the time.
  NotFound(Side)
}

impl SlotPosition {
  pub fn index(self) -> Option<f64> {
    match self {
      | Self::Found(index) => Some(index),
      | Self::NotFound(_) => None
    }
  }

  /// Numeric form used by the web
  /// calendar, where "not found" came back
  /// as `len - 1`.
  pub fn legacy_index(
    self,
    grid_len: usize
  ) -> f64 {
    match self {
      | Self::Found(index) => index,
      | Self::NotFound(_) => {
        grid_len.saturating_sub(1) as f64
      }
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotGrid {
  ticks: Vec<f64>
}

impl SlotGrid {
  pub fn new(
    ticks: Vec<f64>
  ) -> Result<Self, GridError> {
    if ticks.len() < 2 {
      return Err(GridError::TooFewTicks(
        ticks.len()
      ));
    }

    for (index, value) in
      ticks.iter().enumerate()
    {
      if !value.is_finite() {
        return Err(
          GridError::NonFinite { index }
        );
      }
      if index > 0
        && ticks[index - 1] >= *value
      {
        return Err(
          GridError::NotIncreasing {
            index,
            previous: ticks[index - 1],
            value: *value
          }
        );
      }
    }

    Ok(Self { ticks })
  }

  /// Builds a grid from clock labels such
  /// as `["07:00", "08:00"]`.
  pub fn from_labels<S>(
    labels: &[S]
  ) -> Result<Self, GridError>
  where
    S: AsRef<str>
  {
    let ticks = labels
      .iter()
      .map(|label| {
        TimeOfDay::parse(label.as_ref())
          .map(TimeOfDay::fractional_hours)
      })
      .collect::<Result<Vec<_>, _>>()?;
    Self::new(ticks)
  }

  /// Ticks from `start` to `end`
  /// inclusive, every `step_minutes`.
  pub fn hourly(
    start: TimeOfDay,
    end: TimeOfDay,
    step_minutes: u32
  ) -> Result<Self, GridError> {
    if step_minutes == 0 {
      return Err(GridError::ZeroStep);
    }

    let first =
      start.minutes_since_midnight();
    let last = end.minutes_since_midnight();
    let ticks = (first..=last)
      .step_by(step_minutes as usize)
      .map(|minutes| {
        f64::from(minutes) / 60.0
      })
      .collect();
    Self::new(ticks)
  }

  pub fn ticks(&self) -> &[f64] {
    &self.ticks
  }

  pub fn len(&self) -> usize {
    self.ticks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.ticks.is_empty()
  }

  /// Clock labels for each tick, e.g. for
  /// the left-hand time column.
  pub fn labels(&self) -> Vec<String> {
    self
      .ticks
      .iter()
      .map(|tick| {
        let minutes =
          (tick * 60.0).round() as u32;
        format!(
          "{:02}:{:02}",
          minutes / 60,
          minutes % 60
        )
      })
      .collect()
  }

  /// Exact tick matches resolve to the
  /// integer index; anything strictly
  /// between two ticks is interpolated.
  /// Times before the first tick, at the
  /// last tick or beyond it are not found.
  pub fn locate(
    &self,
    time: f64
  ) -> SlotPosition {
    for (i, pair) in
      self.ticks.windows(2).enumerate()
    {
      let (slot_start, slot_end) =
        (pair[0], pair[1]);

      if time == slot_start {
        return SlotPosition::Found(
          i as f64
        );
      }
      if time > slot_start
        && time < slot_end
      {
        let fraction = (time - slot_start)
          / (slot_end - slot_start);
        return SlotPosition::Found(
          i as f64 + fraction
        );
      }
    }

    if time < self.ticks[0] {
      SlotPosition::NotFound(Side::Before)
    } else {
      SlotPosition::NotFound(Side::After)
    }
  }
}

impl Default for SlotGrid {
  /// 07:00 through 22:00, one row per hour.
  fn default() -> Self {
    Self {
      ticks: (7..=22)
        .map(f64::from)
        .collect()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::{
    Side,
    SlotGrid,
    SlotPosition
  };
  use crate::error::GridError;
  use crate::time::TimeOfDay;

  #[test]
  fn exact_tick_is_not_interpolated() {
    let grid = SlotGrid::default();
    assert_eq!(
      grid.locate(7.0),
      SlotPosition::Found(0.0)
    );
    assert_eq!(
      grid.locate(21.0),
      SlotPosition::Found(14.0)
    );
  }

  #[test]
  fn interpolates_between_ticks() {
    let grid = SlotGrid::default();
    assert_eq!(
      grid.locate(7.5),
      SlotPosition::Found(0.5)
    );
    assert_eq!(
      grid.locate(10.25),
      SlotPosition::Found(3.25)
    );
  }

  #[test]
  fn interpolation_follows_uneven_ticks() {
    let grid =
      SlotGrid::new(vec![8.0, 9.0, 11.0])
        .expect("valid grid");
    assert_eq!(
      grid.locate(10.0),
      SlotPosition::Found(1.5)
    );
  }

  #[test]
  fn out_of_range_is_explicit() {
    let grid = SlotGrid::default();
    let after = grid.locate(23.0);
    assert_eq!(
      after,
      SlotPosition::NotFound(Side::After)
    );
    assert_eq!(
      after.legacy_index(grid.len()),
      (grid.len() - 1) as f64
    );
    assert_eq!(
      grid.locate(22.0),
      SlotPosition::NotFound(Side::After)
    );
    assert_eq!(
      grid.locate(6.5),
      SlotPosition::NotFound(Side::Before)
    );
    assert_eq!(
      grid.locate(f64::NAN),
      SlotPosition::NotFound(Side::After)
    );
  }

  #[test]
  fn hourly_matches_default() {
    let grid = SlotGrid::hourly(
      TimeOfDay::new(7, 0).expect("start"),
      TimeOfDay::new(22, 0).expect("end"),
      60
    )
    .expect("hourly grid");
    assert_eq!(grid, SlotGrid::default());
    assert_eq!(grid.len(), 16);
    assert_eq!(grid.labels()[0], "07:00");
    assert_eq!(grid.labels()[15], "22:00");
  }

  #[test]
  fn half_hour_grid_from_labels() {
    let grid = SlotGrid::from_labels(&[
      "08:00", "08:30", "09:00"
    ])
    .expect("grid from labels");
    assert_eq!(
      grid.ticks(),
      &[8.0, 8.5, 9.0]
    );
    assert_eq!(
      grid.locate(8.75),
      SlotPosition::Found(1.5)
    );
  }

  #[test]
  fn rejects_invalid_grids() {
    assert_eq!(
      SlotGrid::new(vec![7.0]),
      Err(GridError::TooFewTicks(1))
    );
    assert!(matches!(
      SlotGrid::new(vec![7.0, 7.0]),
      Err(GridError::NotIncreasing {
        index: 1,
        ..
      })
    ));
    assert!(matches!(
      SlotGrid::new(vec![7.0, f64::NAN]),
      Err(GridError::NonFinite {
        index: 1
      })
    ));
    assert!(matches!(
      SlotGrid::from_labels(&["07:00", "x"]),
      Err(GridError::Time(_))
    ));
  }
}
