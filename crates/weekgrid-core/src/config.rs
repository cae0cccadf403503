use std::collections::BTreeMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use chrono::Weekday;
use chrono_tz::Tz;
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::datetime::{
  DEFAULT_TIMEZONE,
  parse_timezone
};
use crate::grid::SlotGrid;
use crate::layout::{
  DEFAULT_HEADER_ROWS,
  DEFAULT_ROW_HEIGHT,
  LayoutParams
};
use crate::time::TimeOfDay;

const RC_ENV_VAR: &str = "WEEKGRIDRC";
const RC_FILE_NAME: &str = ".weekgridrc";
const TIMEZONE_ENV_VAR: &str =
  "WEEKGRID_TIMEZONE";

#[derive(Debug, Clone)]
pub struct Config {
  map:              BTreeMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    let mut map = BTreeMap::new();
    for (key, value) in [
      ("grid.start", "07:00"),
      ("grid.end", "22:00"),
      ("grid.step", "60"),
      (
        "layout.row_height",
        "68"
      ),
      ("layout.header_rows", "1"),
      ("layout.lanes", "off"),
      ("week.start", "monday"),
      ("week.timezone", DEFAULT_TIMEZONE),
      ("default.command", "layout"),
      ("output", "table"),
      ("color", "on")
    ] {
      map.insert(
        key.to_string(),
        value.to_string()
      );
    }

    Self {
      map,
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Self::default();

    let rc = resolve_rc_path(rc_override)?;
    if let Some(path) = rc {
      info!(rc = %path.display(), "loading weekgridrc");
      cfg.load_file(&path)?;
    } else {
      warn!(
        "no weekgridrc found; using \
         defaults"
      );
    }

    if let Ok(raw) =
      std::env::var(TIMEZONE_ENV_VAR)
      && !raw.trim().is_empty()
    {
      debug!(timezone = %raw, "timezone from environment");
      cfg.map.insert(
        "week.timezone".to_string(),
        raw.trim().to_string()
      );
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> Option<bool> {
    self
      .map
      .get(key)
      .map(|v| parse_bool(v))
  }

  pub fn iter(
    &self
  ) -> impl Iterator<Item = (&String, &String)>
  {
    self.map.iter()
  }

  /// The calendar rows. An explicit
  /// `grid.slots` list wins over
  /// `grid.start`/`grid.end`/`grid.step`.
  pub fn slot_grid(
    &self
  ) -> anyhow::Result<SlotGrid> {
    if let Some(raw) = self
      .get("grid.slots")
      .filter(|raw| !raw.trim().is_empty())
    {
      let labels = raw
        .split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .collect::<Vec<_>>();
      return SlotGrid::from_labels(
        labels.as_slice()
      )
        .with_context(|| {
          format!(
            "invalid grid.slots: {raw}"
          )
        });
    }

    let start = self.time_key(
      "grid.start"
    )?;
    let end = self.time_key("grid.end")?;
    let step = self
      .number_key::<u32>("grid.step")?
      .unwrap_or(60);

    SlotGrid::hourly(start, end, step)
      .with_context(|| {
        format!(
          "invalid grid range {start} \
           to {end} every {step} \
           minutes"
        )
      })
  }

  pub fn layout_params(
    &self
  ) -> anyhow::Result<LayoutParams> {
    let row_height = self
      .number_key::<f64>(
        "layout.row_height"
      )?
      .unwrap_or(DEFAULT_ROW_HEIGHT);
    if !row_height.is_finite()
      || row_height <= 0.0
    {
      return Err(anyhow!(
        "layout.row_height must be a \
         positive number, got \
         {row_height}"
      ));
    }

    let header_rows = self
      .number_key::<u32>(
        "layout.header_rows"
      )?
      .unwrap_or(DEFAULT_HEADER_ROWS);

    Ok(LayoutParams {
      row_height,
      header_rows
    })
  }

  pub fn lanes_enabled(&self) -> bool {
    self
      .get_bool("layout.lanes")
      .unwrap_or(false)
  }

  pub fn week_start(
    &self
  ) -> anyhow::Result<Weekday> {
    let raw = self
      .get("week.start")
      .unwrap_or_else(|| {
        "monday".to_string()
      });
    crate::datetime::parse_weekday_name(
      &raw.trim().to_ascii_lowercase()
    )
    .ok_or_else(|| {
      anyhow!(
        "invalid week.start: {raw}"
      )
    })
  }

  /// Zone "today" is resolved in when
  /// picking the week to show.
  pub fn timezone(
    &self
  ) -> anyhow::Result<Tz> {
    let raw = self
      .get("week.timezone")
      .unwrap_or_else(|| {
        DEFAULT_TIMEZONE.to_string()
      });
    parse_timezone(&raw).context(
      "invalid week.timezone"
    )
  }

  fn time_key(
    &self,
    key: &str
  ) -> anyhow::Result<TimeOfDay> {
    let raw =
      self.get(key).ok_or_else(|| {
        anyhow!("missing config key {key}")
      })?;
    TimeOfDay::parse(&raw).with_context(
      || format!("invalid {key}")
    )
  }

  fn number_key<T>(
    &self,
    key: &str
  ) -> anyhow::Result<Option<T>>
  where
    T: std::str::FromStr,
    T::Err: std::fmt::Display
  {
    self
      .get(key)
      .map(|raw| {
        raw.trim().parse::<T>().map_err(
          |err| {
            anyhow!(
              "invalid {key} value \
               {raw:?}: {err}"
            )
          }
        )
      })
      .transpose()
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let expanded = expand_tilde(path);
    let path = fs::canonicalize(&expanded)
      .with_context(|| {
        format!(
          "failed to resolve {}",
          expanded.display()
        )
      })?;
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    self
      .loaded_files
      .push(path.clone());

    let base_dir = path
      .parent()
      .map(|p| p.to_path_buf())
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let mut line = raw_line.trim();
      if line.is_empty()
        || line.starts_with('#')
      {
        continue;
      }

      if let Some((before, _)) =
        line.split_once('#')
      {
        line = before.trim();
      }

      if line.is_empty() {
        continue;
      }

      if let Some(include_rest) =
        line.strip_prefix("include ")
      {
        let include_path =
          resolve_include_path(
            &base_dir,
            include_rest.trim()
          )?;
        debug!(
            file = %path.display(),
            include = %include_path.display(),
            line = line_num + 1,
            "processing include"
        );

        if !include_path.exists() {
          warn!(include = %include_path.display(), "include file does not exist; skipping");
        } else if self.loaded_files.contains(
          &fs::canonicalize(&include_path)?
        ) {
          warn!(include = %include_path.display(), "include already loaded; skipping");
        } else {
          self
            .load_file(&include_path)?;
        }
        continue;
      }

      let (k, v) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            path.display(),
            line_num + 1,
            raw_line
          )
        })?;

      let key = k.trim().to_string();
      let value = v.trim().to_string();
      trace!(key = %key, value = %value, "loaded config key");
      self.map.insert(key, value);
    }

    Ok(())
  }
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_rc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(rc_env) =
    std::env::var(RC_ENV_VAR)
  {
    if rc_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      rc_env
    )));
  }

  let Some(home) = dirs::home_dir()
  else {
    warn!(
      "cannot determine home \
       directory; skipping \
       weekgridrc lookup"
    );
    return Ok(None);
  };
  let candidate = home.join(RC_FILE_NAME);
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.trim().is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let raw = PathBuf::from(include);
  let expanded = expand_tilde(&raw);
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> bool {
  matches!(
    s.trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}

#[cfg(test)]
mod tests {
  use std::fs;

  use chrono::Weekday;
  use tempfile::tempdir;

  use super::Config;
  use crate::grid::SlotGrid;
  use crate::layout::LayoutParams;

  #[test]
  fn defaults_describe_the_web_calendar() {
    let cfg = Config::default();
    assert_eq!(
      cfg.slot_grid().expect("grid"),
      SlotGrid::default()
    );
    assert_eq!(
      cfg
        .layout_params()
        .expect("params"),
      LayoutParams::default()
    );
    assert!(!cfg.lanes_enabled());
    assert_eq!(
      cfg.week_start().expect("week"),
      Weekday::Mon
    );
  }

  #[test]
  fn loads_file_with_include_and_overrides(
  ) {
    let temp = tempdir().expect("tempdir");
    let extra = temp.path().join("extra.rc");
    fs::write(
      &extra,
      "layout.lanes = yes\n"
    )
    .expect("write include");
    let rc = temp.path().join("main.rc");
    fs::write(
      &rc,
      "# calendar\ngrid.slots = 08:00, \
       08:30, 09:00 # half hours\ninclude \
       extra.rc\nlayout.row_height = 40\n"
    )
    .expect("write rc");

    let mut cfg = Config::load(Some(rc.as_path()))
      .expect("load config");
    cfg.apply_overrides([(
      "rc.layout.header_rows".to_string(),
      "0".to_string()
    )]);

    assert_eq!(cfg.loaded_files.len(), 2);
    assert!(cfg.lanes_enabled());
    assert_eq!(
      cfg.slot_grid().expect("grid").ticks(),
      &[8.0, 8.5, 9.0]
    );
    assert_eq!(
      cfg
        .layout_params()
        .expect("params"),
      LayoutParams {
        row_height:  40.0,
        header_rows: 0
      }
    );
  }

  #[test]
  fn self_include_through_other_path_is_skipped(
  ) {
    let temp = tempdir().expect("tempdir");
    let conf = temp.path().join("conf");
    fs::create_dir(&conf)
      .expect("create conf dir");
    let rc = conf.join("main.rc");
    fs::write(
      &rc,
      "include ../conf/main.rc\ninclude \
       ./main.rc\nlayout.row_height = 50\n"
    )
    .expect("write rc");

    let cfg = Config::load(Some(rc.as_path()))
      .expect("load config");
    assert_eq!(
      cfg.loaded_files,
      vec![
        fs::canonicalize(&rc)
          .expect("canonical rc")
      ]
    );
    assert_eq!(
      cfg
        .layout_params()
        .expect("params")
        .row_height,
      50.0
    );
  }

  #[test]
  fn mutual_includes_load_each_file_once(
  ) {
    let temp = tempdir().expect("tempdir");
    let a = temp.path().join("a.rc");
    let b = temp.path().join("b.rc");
    fs::write(
      &a,
      "include b.rc\ngrid.start = 08:00\n"
    )
    .expect("write a");
    fs::write(
      &b,
      "include ./a.rc\ngrid.end = 12:00\n"
    )
    .expect("write b");

    let cfg = Config::load(Some(a.as_path()))
      .expect("load config");
    assert_eq!(cfg.loaded_files.len(), 2);
    assert_eq!(
      cfg.slot_grid().expect("grid").len(),
      5
    );
  }

  #[test]
  fn timezone_key_is_validated() {
    let mut cfg = Config::default();
    assert_eq!(
      cfg.timezone().expect("default zone"),
      chrono_tz::Asia::Ho_Chi_Minh
    );
    cfg.apply_overrides([(
      "rc.week.timezone".to_string(),
      "Europe/Paris".to_string()
    )]);
    assert_eq!(
      cfg.timezone().expect("paris"),
      chrono_tz::Europe::Paris
    );
    cfg.apply_overrides([(
      "week.timezone".to_string(),
      "Nowhere/Land".to_string()
    )]);
    let err =
      cfg.timezone().expect_err("bad zone");
    assert!(
      format!("{err:#}")
        .contains("week.timezone")
    );
  }

  #[test]
  fn invalid_values_name_their_key() {
    let mut cfg = Config::default();
    cfg.apply_overrides([(
      "layout.row_height".to_string(),
      "tall".to_string()
    )]);
    let err = cfg
      .layout_params()
      .expect_err("bad row height");
    assert!(
      err
        .to_string()
        .contains("layout.row_height")
    );

    cfg.apply_overrides([(
      "grid.end".to_string(),
      "06:00".to_string()
    )]);
    assert!(cfg.slot_grid().is_err());
  }

  #[test]
  fn rejects_lines_without_equals() {
    let temp = tempdir().expect("tempdir");
    let rc = temp.path().join("bad.rc");
    fs::write(&rc, "grid.start 07:00\n")
      .expect("write rc");
    assert!(
      Config::load(Some(rc.as_path()))
        .is_err()
    );
  }
}
