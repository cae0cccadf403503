use std::fmt::Display;
use std::io::{self, IsTerminal, Write};

use anyhow::{Context, anyhow};
use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::grid::{SlotGrid, SlotPosition};
use crate::layout::{BlockLayout, LayoutParams};
use crate::stats::WeeklyStats;
use crate::week::{WeekLayout, WeekRange};

/// Writes command output to `W`, stdout unless a caller supplies another
/// writer.
#[derive(Debug)]
pub struct Renderer<W = io::Stdout> {
    color: bool,
    out: W,
}

impl Renderer<io::Stdout> {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let tty = io::stdout().is_terminal();
        Self::with_writer(cfg, io::stdout(), tty)
    }
}

impl<W: Write> Renderer<W> {
    /// ANSI colour is used only when `color` is on and `tty` is true.
    pub fn with_writer(cfg: &Config, out: W, tty: bool) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self {
            color: color && tty,
            out,
        })
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn print_line(&mut self, line: impl Display) -> anyhow::Result<()> {
        writeln!(self.out, "{line}")?;
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    pub fn print_week_layout(&mut self, layout: &WeekLayout) -> anyhow::Result<()> {
        writeln!(
            self.out,
            "Week {} to {}",
            layout.week.start.format("%d/%m/%Y"),
            layout.week.end().format("%d/%m/%Y")
        )?;
        writeln!(self.out)?;

        let headers = vec![
            "Day".to_string(),
            "ID".to_string(),
            "Time".to_string(),
            "Top".to_string(),
            "Height".to_string(),
            "Lane".to_string(),
            "Content".to_string(),
        ];

        let mut rows = Vec::new();
        for column in &layout.columns {
            let day = column.date.format("%a %d/%m").to_string();
            for block in &column.blocks {
                let (top, height) = match block.layout {
                    BlockLayout::Placed { top_offset, height } => {
                        (format_px(top_offset), format_px(height))
                    }
                    BlockLayout::Suppressed { reason } => {
                        (self.paint(reason.as_str(), "31"), String::new())
                    }
                };
                let lane = block
                    .lane
                    .map(|slot| format!("{}/{}", slot.lane + 1, slot.lanes))
                    .unwrap_or_default();

                rows.push(vec![
                    day.clone(),
                    self.paint(&block.id.to_string(), "33"),
                    format!("{}-{}", block.start_time, block.end_time),
                    top,
                    height,
                    lane,
                    block.label.clone(),
                ]);
            }
        }

        if rows.is_empty() {
            writeln!(self.out, "No schedules this week.")?;
        } else {
            write_table(&mut self.out, headers, rows)?;
        }

        writeln!(self.out)?;
        writeln!(
            self.out,
            "{} placed, {} not rendered, {} skipped",
            layout.placed_count(),
            layout.suppressed_count(),
            layout.skipped.len()
        )?;
        for skipped in &layout.skipped {
            writeln!(self.out, "  skipped {}: {}", skipped.id, skipped.reason)?;
        }

        Ok(())
    }

    #[tracing::instrument(skip_all)]
    pub fn print_stats(&mut self, week: WeekRange, stats: &WeeklyStats) -> anyhow::Result<()> {
        writeln!(self.out, "week       {} to {}", week.start, week.end())?;
        writeln!(self.out, "schedules  {}", stats.record_count)?;
        writeln!(self.out, "total      {:.1}h", stats.total_hours)?;
        writeln!(self.out, "present    {:.1}h", stats.present_hours)?;
        writeln!(self.out, "unmarked   {}", stats.unmarked_count)?;
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    pub fn print_grid(&mut self, grid: &SlotGrid, params: &LayoutParams) -> anyhow::Result<()> {
        let headers = vec!["Row".to_string(), "Time".to_string(), "Top".to_string()];
        let rows = grid
            .labels()
            .into_iter()
            .enumerate()
            .map(|(idx, label)| {
                let row = idx as f64 + f64::from(params.header_rows);
                vec![
                    row.to_string(),
                    label,
                    format_px(row * params.row_height),
                ]
            })
            .collect();
        write_table(&mut self.out, headers, rows)
    }

    #[tracing::instrument(skip_all)]
    pub fn print_locations(
        &mut self,
        rows: &[(String, f64, SlotPosition)],
        grid_len: usize,
    ) -> anyhow::Result<()> {
        let headers = vec![
            "Time".to_string(),
            "Hours".to_string(),
            "Index".to_string(),
            "Legacy".to_string(),
        ];
        let rows = rows
            .iter()
            .map(|(raw, hours, position)| {
                let index = match position {
                    SlotPosition::Found(index) => format!("{index:.3}"),
                    SlotPosition::NotFound(side) => {
                        self.paint(&format!("not found ({side:?})").to_lowercase(), "31")
                    }
                };
                vec![
                    raw.clone(),
                    format!("{hours:.3}"),
                    index,
                    format!("{:.3}", position.legacy_index(grid_len)),
                ]
            })
            .collect();
        write_table(&mut self.out, headers, rows)
    }

    pub fn print_week_range(&mut self, week: WeekRange) -> anyhow::Result<()> {
        for day in week.days() {
            writeln!(self.out, "{}", day.format("%a %Y-%m-%d"))?;
        }
        Ok(())
    }

    pub fn print_json<T: Serialize>(&mut self, value: &T) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(&mut self.out, value).context("failed writing JSON")?;
        writeln!(self.out)?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn format_px(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}px")
    } else {
        format!("{value:.2}px")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
