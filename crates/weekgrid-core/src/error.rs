//! Typed errors raised by the layout
//! primitives.

use thiserror::Error;

#[derive(
  Debug, Clone, PartialEq, Eq, Error,
)]
pub enum TimeError {
  #[error(
    "invalid time format: {input:?} \
     (expected HH:MM)"
  )]
  InvalidTimeFormat { input: String },

  #[error(
    "time out of range: {input:?} \
     (hour 0-23, minute 0-59)"
  )]
  OutOfRange { input: String }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
  #[error(
    "slot grid needs at least two \
     ticks, got {0}"
  )]
  TooFewTicks(usize),

  #[error(
    "slot grid must be strictly \
     increasing: tick {index} ({value}) \
     does not follow {previous}"
  )]
  NotIncreasing {
    index:    usize,
    previous: f64,
    value:    f64
  },

  #[error(
    "slot grid tick {index} is not a \
     finite number"
  )]
  NonFinite { index: usize },

  #[error("slot grid step must be positive")]
  ZeroStep,

  #[error(transparent)]
  Time(#[from] TimeError)
}
