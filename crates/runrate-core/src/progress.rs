use runrate_parser::schema::{REQUIRED_MARKER, TOTAL_TARGET_COLUMN, WEEK_PREFIX};
use runrate_parser::{CleanTable, GroupRecord};
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

/// Cumulative progress for one group against its total target.
///
/// `weekly_values` has missing weeks already zero-filled; `next_period_index`
/// is derived from the un-flattened cells, so a recorded zero and a blank
/// cell both mark the week as unfilled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupProgress {
    pub key: String,
    pub weekly_values: Vec<f64>,
    pub cumulative: Vec<f64>,
    pub total_target: f64,
    pub completion_fraction: f64,
    pub next_period_index: Option<usize>,
    pub remaining_target: f64,
    pub required_run_rate: Option<f64>,
}

/// Weekly observation columns of a table: names with the `Week-` prefix that
/// are not run-rate columns, in spreadsheet column order. The order is taken
/// from the header as-is; `Week-2, Week-1` would be summed in that literal
/// order.
pub fn weekly_columns(table: &CleanTable) -> Vec<&str> {
    table
        .field_columns()
        .into_iter()
        .filter(|name| name.starts_with(WEEK_PREFIX) && !name.contains(REQUIRED_MARKER))
        .collect()
}

/// Numeric suffix of a `Week-N` label. Label-parsing only; it never changes
/// summation order.
pub fn week_number(label: &str) -> Option<u32> {
    label
        .strip_prefix(WEEK_PREFIX)
        .and_then(|suffix| suffix.trim().parse::<u32>().ok())
}

/// Computes progress for the first record matching `key` exactly.
pub fn compute(table: &CleanTable, key: &str) -> Result<GroupProgress> {
    let record = table.find(key).ok_or_else(|| ReportError::GroupNotFound {
        key: key.to_string(),
        key_name: table.key_name().to_string(),
    })?;
    Ok(progress_for(table, record))
}

pub(crate) fn progress_for(table: &CleanTable, record: &GroupRecord) -> GroupProgress {
    let weeks = weekly_columns(table);
    let raw: Vec<Option<f64>> = weeks.iter().map(|week| record.value(week)).collect();

    let weekly_values: Vec<f64> = raw.iter().map(|value| value.unwrap_or(0.0)).collect();
    let mut cumulative = Vec::with_capacity(weekly_values.len());
    let mut running = 0.0;
    for value in &weekly_values {
        running += value;
        cumulative.push(running);
    }

    let total_target = match record.value(TOTAL_TARGET_COLUMN) {
        Some(target) if target > 0.0 => target,
        _ => {
            tracing::debug!(key = record.key(), "no usable total target, treating as 0");
            0.0
        }
    };

    let achieved = cumulative.last().copied().unwrap_or(0.0);
    let completion_fraction = if total_target > 0.0 {
        achieved / total_target
    } else {
        0.0
    };

    let next_period_index = raw
        .iter()
        .position(|value| !matches!(value, Some(v) if *v > 0.0));

    let remaining_target = match next_period_index {
        None | Some(0) => 0.0,
        Some(idx) => total_target - cumulative[idx - 1],
    };

    let required_run_rate = next_period_index.map(|idx| {
        let periods_left = (weekly_values.len() - idx) as f64;
        remaining_target / periods_left
    });

    GroupProgress {
        key: record.key().to_string(),
        weekly_values,
        cumulative,
        total_target,
        completion_fraction,
        next_period_index,
        remaining_target,
        required_run_rate,
    }
}
