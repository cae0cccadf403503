//! Week expressions (`next`, `-2w`,
//! `2026-10-19`, ...) and the calendar
//! date "today" falls on.

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  Datelike,
  NaiveDate,
  TimeDelta,
  Utc,
  Weekday
};
use chrono_tz::Tz;
use regex::Regex;

pub const DEFAULT_TIMEZONE: &str =
  "Asia/Ho_Chi_Minh";

/// Years a resolved week may fall in.
const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

pub fn parse_timezone(
  raw: &str
) -> anyhow::Result<Tz> {
  let trimmed = raw.trim();
  trimmed.parse::<Tz>().map_err(|err| {
    anyhow!(
      "unknown timezone {trimmed:?}: \
       {err}"
    )
  })
}

/// The calendar date `now` falls on in
/// `tz`.
#[must_use]
pub fn local_date(
  now: DateTime<Utc>,
  tz: Tz
) -> NaiveDate {
  now.with_timezone(&tz).date_naive()
}

/// Resolves a date expression relative to
/// `today`. Week-relative words (`next`,
/// `prev`) move by whole weeks.
#[tracing::instrument(skip(today))]
pub fn parse_date_expr(
  input: &str,
  today: NaiveDate
) -> anyhow::Result<NaiveDate> {
  let date = resolve_date_expr(
    input, today
  )
  .with_context(|| {
    "supported formats: \
     today/this/next/prev, \
     tomorrow/yesterday, weekday \
     names (e.g. monday), +Nd/-Nd, \
     +Nw/-Nw, YYYY-MM-DD, DD/MM/YYYY, \
     RFC3339"
  })?;

  if !(MIN_YEAR..=MAX_YEAR)
    .contains(&date.year())
  {
    return Err(anyhow!(
      "date {date} is out of range \
       (years {MIN_YEAR} to {MAX_YEAR})"
    ));
  }
  Ok(date)
}

fn resolve_date_expr(
  input: &str,
  today: NaiveDate
) -> anyhow::Result<NaiveDate> {
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();

  let step = match lower.as_str() {
    | "" | "now" | "today" | "this"
    | "current" => Some(TimeDelta::zero()),
    | "tomorrow" => TimeDelta::try_days(1),
    | "yesterday" => {
      TimeDelta::try_days(-1)
    }
    | "next" => TimeDelta::try_weeks(1),
    | "prev" | "previous" | "last" => {
      TimeDelta::try_weeks(-1)
    }
    | _ => None
  };
  if let Some(step) = step {
    return shift_date(today, step, token);
  }

  if let Some(target) =
    parse_weekday_name(&lower)
  {
    return Ok(next_weekday_date(
      today, target
    ));
  }

  let rel_re = Regex::new(
    r"^(?P<sign>[+-])(?P<num>\d+)(?P<unit>[dw])$"
  )
  .map_err(|e| {
    anyhow!(
      "internal regex compile \
       failure: {e}"
    )
  })?;

  if let Some(caps) =
    rel_re.captures(&lower)
  {
    let field = |name: &str| {
      caps
        .name(name)
        .map(|m| m.as_str())
        .ok_or_else(|| {
          anyhow!("missing relative {name}")
        })
    };

    let num: i64 = field("num")?
      .parse()
      .with_context(|| {
        format!(
          "relative offset too large: \
           {token}"
        )
      })?;
    let num = if field("sign")? == "-" {
      -num
    } else {
      num
    };

    let delta = match field("unit")? {
      | "d" => TimeDelta::try_days(num),
      | "w" => TimeDelta::try_weeks(num),
      | unit => {
        return Err(anyhow!(
          "unknown relative unit: \
           {unit}"
        ));
      }
    }
    .ok_or_else(|| {
      anyhow!(
        "relative offset too large: \
         {token}"
      )
    })?;

    return shift_date(today, delta, token);
  }

  for fmt in ["%Y-%m-%d", "%d/%m/%Y"] {
    if let Ok(date) =
      NaiveDate::parse_from_str(
        token, fmt
      )
    {
      return Ok(date);
    }
  }

  if let Ok(dt) =
    DateTime::parse_from_rfc3339(token)
  {
    return Ok(dt.date_naive());
  }

  Err(anyhow!(
    "unrecognized date expression: \
     {input}"
  ))
}

fn shift_date(
  today: NaiveDate,
  delta: TimeDelta,
  token: &str
) -> anyhow::Result<NaiveDate> {
  today
    .checked_add_signed(delta)
    .ok_or_else(|| {
      anyhow!(
        "{token:?} moves past the \
         supported date range"
      )
    })
}

pub(crate) fn parse_weekday_name(
  token: &str
) -> Option<Weekday> {
  match token.trim() {
    | "monday" | "mon" => {
      Some(Weekday::Mon)
    }
    | "tuesday" | "tue" | "tues" => {
      Some(Weekday::Tue)
    }
    | "wednesday" | "wed" => {
      Some(Weekday::Wed)
    }
    | "thursday" | "thu" | "thur"
    | "thurs" => Some(Weekday::Thu),
    | "friday" | "fri" => {
      Some(Weekday::Fri)
    }
    | "saturday" | "sat" => {
      Some(Weekday::Sat)
    }
    | "sunday" | "sun" => {
      Some(Weekday::Sun)
    }
    | _ => None
  }
}

/// The next `target` strictly after
/// `from`.
fn next_weekday_date(
  from: NaiveDate,
  target: Weekday
) -> NaiveDate {
  let mut delta = (7
    + target.num_days_from_monday()
    - from.weekday().num_days_from_monday())
    % 7;
  if delta == 0 {
    delta = 7;
  }
  from
    .checked_add_days(chrono::Days::new(
      u64::from(delta)
    ))
    .unwrap_or(from)
}

#[cfg(test)]
mod tests {
  use chrono::{
    NaiveDate,
    TimeZone,
    Utc
  };

  use super::{
    local_date,
    parse_date_expr,
    parse_timezone
  };

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn parses_absolute_dates() {
    let today = date(2026, 10, 19);
    assert_eq!(
      parse_date_expr("2026-10-22", today)
        .expect("iso date"),
      date(2026, 10, 22)
    );
    assert_eq!(
      parse_date_expr("22/10/2026", today)
        .expect("dmy date"),
      date(2026, 10, 22)
    );
    assert_eq!(
      parse_date_expr(
        "2026-10-22T23:30:00+07:00",
        today
      )
      .expect("rfc3339"),
      date(2026, 10, 22)
    );
  }

  #[test]
  fn parses_week_relative_words() {
    let today = date(2026, 10, 19);
    assert_eq!(
      parse_date_expr("next", today)
        .expect("next"),
      date(2026, 10, 26)
    );
    assert_eq!(
      parse_date_expr("prev", today)
        .expect("prev"),
      date(2026, 10, 12)
    );
    assert_eq!(
      parse_date_expr("-2w", today)
        .expect("minus two weeks"),
      date(2026, 10, 5)
    );
    assert_eq!(
      parse_date_expr("+3d", today)
        .expect("plus three days"),
      date(2026, 10, 22)
    );
    assert_eq!(
      parse_date_expr("", today)
        .expect("empty is today"),
      today
    );
  }

  #[test]
  fn parses_weekday_name() {
    let today = date(2026, 2, 17);
    assert_eq!(
      parse_date_expr("wednesday", today)
        .expect("parse weekday"),
      date(2026, 2, 18)
    );
    assert_eq!(
      parse_date_expr("tue", today)
        .expect("same weekday"),
      date(2026, 2, 24)
    );
  }

  #[test]
  fn huge_offsets_are_errors() {
    let today = date(2026, 10, 19);
    for expr in [
      "+100000000w",
      "+99999999999999d",
      "-99999999999999w",
      "+99999999999999999999d",
      "+500000w"
    ] {
      assert!(
        parse_date_expr(expr, today)
          .is_err(),
        "{expr} should be rejected"
      );
    }
  }

  #[test]
  fn rejects_unknown_expressions() {
    let today = date(2026, 10, 19);
    assert!(
      parse_date_expr("someday", today)
        .is_err()
    );
  }

  #[test]
  fn local_date_follows_timezone() {
    let late = Utc
      .with_ymd_and_hms(2026, 10, 18, 20, 0, 0)
      .single()
      .expect("valid instant");
    let hcm = parse_timezone("Asia/Ho_Chi_Minh")
      .expect("known zone");
    assert_eq!(
      local_date(late, hcm),
      date(2026, 10, 19)
    );
    assert_eq!(
      local_date(late, chrono_tz::UTC),
      date(2026, 10, 18)
    );
    assert!(
      parse_timezone("Mars/Olympus")
        .is_err()
    );
  }
}
