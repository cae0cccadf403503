use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, anyhow};
use tracing::{debug, info};
use weekgrid_shared::{ApiResponse, WorkScheduleDto};

/// Reads schedule records from `path`, or stdin when the path is `-` or absent.
#[tracing::instrument(skip(path))]
pub fn load_records(path: Option<&Path>) -> anyhow::Result<Vec<WorkScheduleDto>> {
    let text = match path {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        _ => {
            let mut stdin = String::new();
            io::stdin()
                .read_to_string(&mut stdin)
                .context("failed reading stdin")?;
            stdin
        }
    };

    let records = parse_records(&text)?;
    info!(count = records.len(), "loaded schedule records");
    Ok(records)
}

/// Accepts a bare JSON array, the API's `{success, message, data}` envelope,
/// or one record per line.
pub fn parse_records(text: &str) -> anyhow::Result<Vec<WorkScheduleDto>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("no schedule records in input"));
    }

    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).context("failed parsing JSON array");
    }

    if trimmed.starts_with('{') {
        let value: serde_json::Value = match serde_json::from_str(trimmed) {
            Ok(value) => value,
            Err(err) => {
                debug!(error = %err, "input is not a single JSON document, trying lines");
                return parse_lines(trimmed);
            }
        };

        if value.get("data").is_some() || value.get("success").is_some() {
            let envelope: ApiResponse<Vec<WorkScheduleDto>> =
                serde_json::from_value(value).context("failed parsing API response")?;
            if !envelope.success {
                return Err(anyhow!(
                    "API response reported failure: {}",
                    envelope
                        .message
                        .unwrap_or_else(|| "no message".to_string())
                ));
            }
            return Ok(envelope.data.unwrap_or_default());
        }

        let record: WorkScheduleDto =
            serde_json::from_value(value).context("failed parsing schedule record")?;
        return Ok(vec![record]);
    }

    parse_lines(trimmed)
}

fn parse_lines(trimmed: &str) -> anyhow::Result<Vec<WorkScheduleDto>> {
    let mut out = Vec::new();
    for (idx, line) in trimmed.lines().enumerate() {
        let token = line.trim();
        if token.is_empty() {
            continue;
        }
        let item: WorkScheduleDto = serde_json::from_str(token)
            .with_context(|| format!("failed parsing record line {}", idx + 1))?;
        out.push(item);
    }
    Ok(out)
}

/// Keeps only the records of one teacher.
pub fn filter_teacher(records: Vec<WorkScheduleDto>, teacher_id: i64) -> Vec<WorkScheduleDto> {
    records
        .into_iter()
        .filter(|record| record.teacher_id == Some(teacher_id))
        .collect()
}
