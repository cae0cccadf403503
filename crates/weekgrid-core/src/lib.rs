pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod error;
pub mod grid;
pub mod lanes;
pub mod layout;
pub mod records;
pub mod render;
pub mod stats;
pub mod time;
pub mod week;

use std::ffi::OsString;

use clap::Parser;
use tracing::{
  debug,
  info
};

pub use error::{
  GridError,
  TimeError
};
pub use grid::{
  Side,
  SlotGrid,
  SlotPosition
};
pub use lanes::{
  LaneSlot,
  assign_lanes
};
pub use layout::{
  BlockLayout,
  LayoutParams,
  ScheduleBlock,
  SuppressReason
};
pub use time::{
  TimeOfDay,
  parse_time
};
pub use week::{
  WeekLayout,
  WeekRange,
  layout_week,
  start_of_week
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting weekgrid"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let mut renderer =
    render::Renderer::new(&cfg)?;
  let inv = cli::Invocation::parse(
    &cfg, cli.rest
  )?;

  commands::dispatch(
    &cfg,
    &mut renderer,
    inv
  )?;

  info!("done");
  Ok(())
}
