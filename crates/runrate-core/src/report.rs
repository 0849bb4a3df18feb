use std::collections::HashSet;

use chrono::{DateTime, Utc};
use polars::prelude::*;
use runrate_parser::{CleanTable, ViewKind};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::progress::{progress_for, weekly_columns, GroupProgress};

/// Everything the render surface needs for one worksheet view: per-group
/// progress, the leaderboard pick, and view-wide totals. Recomputed on every
/// page load and discarded after hand-off.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewReport {
    pub view: ViewKind,
    pub generated_at: DateTime<Utc>,
    pub groups: Vec<GroupProgress>,
    pub top_group: Option<String>,
    pub grand_total: f64,
    pub combined_target: f64,
    pub overall_completion: f64,
}

impl ViewReport {
    pub fn build(table: &CleanTable, view: ViewKind) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut groups = Vec::new();
        for record in table.records() {
            // duplicate keys: the first record wins, as in lookup
            if !seen.insert(record.key().to_string()) {
                tracing::debug!(key = record.key(), "duplicate group key, keeping first record");
                continue;
            }
            groups.push(progress_for(table, record));
        }

        let top_group = groups
            .iter()
            .max_by(|a, b| {
                let a_total = a.cumulative.last().copied().unwrap_or(0.0);
                let b_total = b.cumulative.last().copied().unwrap_or(0.0);
                a_total.partial_cmp(&b_total).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|progress| progress.key.clone());

        let grand_total: f64 = groups
            .iter()
            .map(|progress| progress.cumulative.last().copied().unwrap_or(0.0))
            .sum();
        let combined_target: f64 = groups.iter().map(|progress| progress.total_target).sum();
        let overall_completion = if combined_target > 0.0 {
            grand_total / combined_target
        } else {
            0.0
        };

        Ok(Self {
            view,
            generated_at: Utc::now(),
            groups,
            top_group,
            grand_total,
            combined_target,
            overall_completion,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Chart-ready reshape of a clean table: one row per weekly column, one
/// nullable value column per group. Duplicate group keys keep the first
/// record, matching [`ViewReport::build`].
pub fn trend_frame(table: &CleanTable) -> Result<DataFrame> {
    let weeks = weekly_columns(table);

    let labels: Vec<&str> = weeks.to_vec();
    let mut cols: Vec<Column> = Vec::with_capacity(table.records().len() + 1);
    cols.push(Series::new("week".into(), labels).into());

    let mut seen = HashSet::new();
    for record in table.records() {
        if !seen.insert(record.key().to_string()) {
            continue;
        }
        let values: Vec<Option<f64>> = weeks.iter().map(|week| record.value(week)).collect();
        cols.push(Series::new(record.key().into(), values).into());
    }

    Ok(DataFrame::new(cols)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use runrate_parser::{normalize, RawGrid};

    fn sample_table() -> CleanTable {
        let grid = RawGrid::new(
            [
                vec!["Channel Performance Tracker"],
                vec!["", "Week-1", "Week-2", "Required run-rate", "Total Target"],
                vec!["Search", "100", "200", "", "1000"],
                vec!["Display", "50", "", "", "500"],
                vec!["Email", "30", "40", "", "100"],
            ]
            .into_iter()
            .map(|row| row.into_iter().map(str::to_string).collect())
            .collect(),
        );
        normalize(&grid, ViewKind::Channel).expect("normalize sample grid")
    }

    #[test]
    fn report_totals_and_leaderboard() {
        let report = ViewReport::build(&sample_table(), ViewKind::Channel).expect("build report");

        assert_eq!(report.groups.len(), 3);
        assert_eq!(report.top_group.as_deref(), Some("Search"));
        assert_eq!(report.grand_total, 420.0);
        assert_eq!(report.combined_target, 1600.0);
        assert_eq!(report.overall_completion, 420.0 / 1600.0);
    }

    #[test]
    fn empty_table_builds_empty_report() {
        let grid = RawGrid::new(vec![
            vec!["title".to_string()],
            vec!["".to_string(), "Week-1".to_string()],
        ]);
        let table = normalize(&grid, ViewKind::Pod).expect("normalize");
        let report = ViewReport::build(&table, ViewKind::Pod).expect("build report");

        assert!(report.groups.is_empty());
        assert_eq!(report.top_group, None);
        assert_eq!(report.grand_total, 0.0);
        assert_eq!(report.overall_completion, 0.0);
    }

    #[test]
    fn duplicate_keys_keep_first_record() {
        let grid = RawGrid::new(
            [
                vec!["title"],
                vec!["", "Week-1", "Total Target"],
                vec!["Search", "10", "100"],
                vec!["Search", "90", "100"],
            ]
            .into_iter()
            .map(|row| row.into_iter().map(str::to_string).collect())
            .collect(),
        );
        let table = normalize(&grid, ViewKind::Channel).expect("normalize");
        let report = ViewReport::build(&table, ViewKind::Channel).expect("build report");

        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].cumulative, vec![10.0]);
    }

    #[test]
    fn trend_frame_has_week_rows_and_group_columns() {
        let df = trend_frame(&sample_table()).expect("trend frame");

        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 4);
        assert!(df.column("week").is_ok());
        assert!(df.column("Display").is_ok());
    }

    #[test]
    fn report_round_trips_through_json() {
        let report = ViewReport::build(&sample_table(), ViewKind::Channel).expect("build report");
        let json = report.to_json().expect("serialize report");
        let back: ViewReport = serde_json::from_str(&json).expect("deserialize report");

        assert_eq!(back.view, ViewKind::Channel);
        assert_eq!(back.groups, report.groups);
        assert_eq!(back.top_group, report.top_group);
    }
}
