use std::io::Write;
use std::path::Path;

use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use crate::cli::Invocation;
use crate::config::Config;
use crate::datetime::{local_date, parse_date_expr};
use crate::grid::SlotGrid;
use crate::layout::LayoutParams;
use crate::records::{filter_teacher, load_records};
use crate::render::Renderer;
use crate::stats::WeeklyStats;
use crate::time::parse_time;
use crate::week::{WeekRange, layout_week};

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "layout", "export", "stats", "grid", "locate", "week", "_show", "_commands", "help",
        "version",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(cfg, renderer, inv))]
pub fn dispatch<W: Write>(
    cfg: &Config,
    renderer: &mut Renderer<W>,
    inv: Invocation,
) -> anyhow::Result<()> {
    let now = Utc::now();
    let command = inv.command.as_str();

    debug!(
        command,
        modifiers = ?inv.modifiers,
        args = ?inv.args,
        "dispatching command"
    );

    match command {
        "layout" => {
            if output_is_json(cfg) {
                cmd_export(cfg, renderer, &inv, now)
            } else {
                cmd_layout(cfg, renderer, &inv, now)
            }
        }
        "export" => cmd_export(cfg, renderer, &inv, now),
        "stats" => cmd_stats(cfg, renderer, &inv, now),
        "grid" => cmd_grid(cfg, renderer),
        "locate" => cmd_locate(cfg, renderer, &inv),
        "week" => cmd_week(cfg, renderer, &inv, now),
        "_show" => cmd_show(cfg, renderer),
        "_commands" => cmd_commands(renderer),
        "help" => cmd_help(renderer),
        "version" => renderer.print_line(env!("CARGO_PKG_VERSION")),
        other => Err(anyhow!("unknown command: {other}")),
    }
}

struct WeekInput {
    week: WeekRange,
    records: Vec<weekgrid_shared::WorkScheduleDto>,
}

fn resolve_week(cfg: &Config, inv: &Invocation, now: DateTime<Utc>) -> anyhow::Result<WeekRange> {
    let expr = inv
        .modifier("week")
        .map(str::to_string)
        .or_else(|| cfg.get("week"))
        .unwrap_or_else(|| "today".to_string());
    week_containing(cfg, &expr, now)
}

fn week_containing(cfg: &Config, expr: &str, now: DateTime<Utc>) -> anyhow::Result<WeekRange> {
    let today = local_date(now, cfg.timezone()?);
    let anchor = parse_date_expr(expr, today).with_context(|| format!("invalid week: {expr}"))?;
    Ok(WeekRange::containing(anchor, cfg.week_start()?))
}

fn load_week_input(cfg: &Config, inv: &Invocation, now: DateTime<Utc>) -> anyhow::Result<WeekInput> {
    let week = resolve_week(cfg, inv, now)?;

    let path = inv.args.first().cloned().or_else(|| cfg.get("data.file"));
    let mut records = load_records(path.as_deref().map(Path::new))?;

    if let Some(raw) = inv.modifier("teacher") {
        let teacher_id: i64 = raw
            .trim()
            .parse()
            .with_context(|| format!("invalid teacher id: {raw}"))?;
        records = filter_teacher(records, teacher_id);
        debug!(teacher_id, remaining = records.len(), "filtered by teacher");
    }

    Ok(WeekInput { week, records })
}

fn layout_inputs(cfg: &Config) -> anyhow::Result<(SlotGrid, LayoutParams)> {
    Ok((cfg.slot_grid()?, cfg.layout_params()?))
}

fn output_is_json(cfg: &Config) -> bool {
    cfg.get("output")
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("json"))
}

#[instrument(skip(cfg, renderer, inv, now))]
fn cmd_layout(
    cfg: &Config,
    renderer: &mut Renderer<impl Write>,
    inv: &Invocation,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command layout");
    let input = load_week_input(cfg, inv, now)?;
    let (grid, params) = layout_inputs(cfg)?;

    let layout = layout_week(&input.records, input.week, &grid, &params, cfg.lanes_enabled());
    renderer.print_week_layout(&layout)
}

#[instrument(skip(cfg, renderer, inv, now))]
fn cmd_export(
    cfg: &Config,
    renderer: &mut Renderer<impl Write>,
    inv: &Invocation,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command export");
    let input = load_week_input(cfg, inv, now)?;
    let (grid, params) = layout_inputs(cfg)?;

    let layout = layout_week(&input.records, input.week, &grid, &params, cfg.lanes_enabled());
    renderer.print_json(&layout)
}

#[instrument(skip(cfg, renderer, inv, now))]
fn cmd_stats(
    cfg: &Config,
    renderer: &mut Renderer<impl Write>,
    inv: &Invocation,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command stats");
    let input = load_week_input(cfg, inv, now)?;

    let in_week = input.records.iter().filter(|record| {
        chrono::NaiveDate::parse_from_str(record.work_date.trim(), "%Y-%m-%d")
            .is_ok_and(|date| input.week.contains(date))
    });
    let stats = WeeklyStats::from_records(in_week);

    if output_is_json(cfg) {
        renderer.print_json(&stats)
    } else {
        renderer.print_stats(input.week, &stats)
    }
}

#[instrument(skip(cfg, renderer))]
fn cmd_grid(cfg: &Config, renderer: &mut Renderer<impl Write>) -> anyhow::Result<()> {
    let (grid, params) = layout_inputs(cfg)?;
    renderer.print_grid(&grid, &params)
}

#[instrument(skip(cfg, renderer, inv))]
fn cmd_locate(
    cfg: &Config,
    renderer: &mut Renderer<impl Write>,
    inv: &Invocation,
) -> anyhow::Result<()> {
    if inv.args.is_empty() {
        return Err(anyhow!("locate: expected one or more HH:MM times"));
    }

    let grid = cfg.slot_grid()?;
    let mut rows = Vec::with_capacity(inv.args.len());
    for raw in &inv.args {
        let hours = parse_time(raw).with_context(|| format!("locate: {raw}"))?;
        rows.push((raw.clone(), hours, grid.locate(hours)));
    }
    renderer.print_locations(&rows, grid.len())
}

#[instrument(skip(cfg, renderer, inv, now))]
fn cmd_week(
    cfg: &Config,
    renderer: &mut Renderer<impl Write>,
    inv: &Invocation,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    let week = match inv.args.first() {
        Some(expr) => week_containing(cfg, expr, now)?,
        None => resolve_week(cfg, inv, now)?,
    };
    renderer.print_week_range(week)
}

fn cmd_show(cfg: &Config, renderer: &mut Renderer<impl Write>) -> anyhow::Result<()> {
    for (k, v) in cfg.iter() {
        renderer.print_line(format!("{k}={v}"))?;
    }
    Ok(())
}

fn cmd_commands(renderer: &mut Renderer<impl Write>) -> anyhow::Result<()> {
    for command in known_command_names() {
        renderer.print_line(command)?;
    }
    Ok(())
}

const HELP: &[&str] = &[
    "usage: weekgrid [options] [week:<expr>] [teacher:<id>] <command> [file|-]",
    "",
    "  layout   lay out the week's blocks (default)",
    "  export   same as layout, as JSON",
    "  stats    total, present and unmarked hours for the week",
    "  grid     show the slot grid rows and pixel offsets",
    "  locate   show where HH:MM times fall on the grid",
    "  week     show the dates of a week (today, next, prev, YYYY-MM-DD)",
];

fn cmd_help(renderer: &mut Renderer<impl Write>) -> anyhow::Result<()> {
    for line in HELP {
        renderer.print_line(line)?;
    }
    Ok(())
}
