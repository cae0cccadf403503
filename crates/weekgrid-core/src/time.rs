use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{
  Deserialize,
  Deserializer,
  Serialize,
  Serializer
};

use crate::error::TimeError;

/// Wall-clock time as the schedule API
/// sends it (`HH:MM`, occasionally
/// `HH:MM:SS`).
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
)]
pub struct TimeOfDay {
  hour:   u8,
  minute: u8,
  second: u8
}

impl TimeOfDay {
  pub fn new(
    hour: u32,
    minute: u32
  ) -> Option<Self> {
    if hour > 23 || minute > 59 {
      return None;
    }
    Some(Self {
      hour:   hour as u8,
      minute: minute as u8,
      second: 0
    })
  }

  #[tracing::instrument(level = "trace")]
  pub fn parse(
    input: &str
  ) -> Result<Self, TimeError> {
    let invalid = || {
      TimeError::InvalidTimeFormat {
        input: input.to_string()
      }
    };

    let captures = clock_regex()
      .and_then(|re| {
        re.captures(input.trim())
      })
      .ok_or_else(invalid)?;

    let field = |name: &str| {
      captures
        .name(name)
        .map(|m| m.as_str().parse::<u32>())
        .transpose()
        .map_err(|_| invalid())
    };

    let hour =
      field("hour")?.ok_or_else(invalid)?;
    let minute = field("minute")?
      .ok_or_else(invalid)?;
    let second =
      field("second")?.unwrap_or(0);

    if hour > 23
      || minute > 59
      || second > 59
    {
      return Err(
        TimeError::OutOfRange {
          input: input.to_string()
        }
      );
    }

    Ok(Self {
      hour:   hour as u8,
      minute: minute as u8,
      second: second as u8
    })
  }

  pub fn hour(self) -> u32 {
    u32::from(self.hour)
  }

  pub fn minute(self) -> u32 {
    u32::from(self.minute)
  }

  pub fn minutes_since_midnight(
    self
  ) -> u32 {
    self.hour() * 60 + self.minute()
  }

  /// `07:30` is `7.5`.
  pub fn fractional_hours(self) -> f64 {
    f64::from(self.hour)
      + f64::from(self.minute) / 60.0
      + f64::from(self.second) / 3600.0
  }
}

/// Parses `HH:MM` straight into
/// fractional hours.
pub fn parse_time(
  input: &str
) -> Result<f64, TimeError> {
  TimeOfDay::parse(input)
    .map(TimeOfDay::fractional_hours)
}

fn clock_regex() -> Option<&'static Regex>
{
  static CLOCK_RE: OnceLock<
    Option<Regex>
  > = OnceLock::new();
  CLOCK_RE
    .get_or_init(|| {
      Regex::new(
        r"^(?P<hour>\d{1,2}):(?P<minute>\d{2})(?::(?P<second>\d{2}))?$",
      )
      .map_err(|err| {
        tracing::error!(error = %err, "clock regex failed to compile");
        err
      })
      .ok()
    })
    .as_ref()
}

impl fmt::Display for TimeOfDay {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(
      f,
      "{:02}:{:02}",
      self.hour, self.minute
    )
  }
}

impl FromStr for TimeOfDay {
  type Err = TimeError;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}

impl Serialize for TimeOfDay {
  fn serialize<S>(
    &self,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    serializer
      .serialize_str(&self.to_string())
  }
}

impl<'de> Deserialize<'de> for TimeOfDay {
  fn deserialize<D>(
    deserializer: D
  ) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw =
      String::deserialize(deserializer)?;
    Self::parse(&raw)
      .map_err(serde::de::Error::custom)
  }
}

#[cfg(test)]
mod tests {
  use super::{
    TimeOfDay,
    parse_time
  };
  use crate::error::TimeError;

  #[test]
  fn parses_fractional_hours() {
    assert_eq!(
      parse_time("07:00"),
      Ok(7.0)
    );
    assert_eq!(
      parse_time("07:30"),
      Ok(7.5)
    );
    assert_eq!(
      parse_time("23:45"),
      Ok(23.75)
    );
  }

  #[test]
  fn accepts_backend_seconds_and_short_hours(
  ) {
    assert_eq!(
      parse_time("7:15"),
      Ok(7.25)
    );
    assert_eq!(
      parse_time(" 09:00:00 "),
      Ok(9.0)
    );
    let time = TimeOfDay::parse("9:05")
      .expect("parse short hour");
    assert_eq!(time.to_string(), "09:05");
  }

  #[test]
  fn rejects_malformed_input() {
    for raw in
      ["", "abc", "7", "07:5", "07-30", "07:30pm", "NaN:00"]
    {
      assert!(
        matches!(
          TimeOfDay::parse(raw),
          Err(
            TimeError::InvalidTimeFormat { .. }
          )
        ),
        "{raw:?} should be rejected"
      );
    }
  }

  #[test]
  fn rejects_out_of_range_values() {
    assert!(matches!(
      TimeOfDay::parse("24:00"),
      Err(TimeError::OutOfRange { .. })
    ));
    assert!(matches!(
      TimeOfDay::parse("12:60"),
      Err(TimeError::OutOfRange { .. })
    ));
  }

  #[test]
  fn serde_uses_clock_strings() {
    let time = TimeOfDay::new(8, 5)
      .expect("valid time");
    let encoded =
      serde_json::to_string(&time)
        .expect("encode");
    assert_eq!(encoded, "\"08:05\"");
    assert!(
      serde_json::from_str::<TimeOfDay>(
        "\"25:00\""
      )
      .is_err()
    );
  }
}
