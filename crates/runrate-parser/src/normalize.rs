use std::collections::{HashMap, HashSet};

use crate::errors::NormalizeError;
use crate::model::{CleanTable, GroupRecord, RawGrid, ViewKind};
use crate::schema::{RUN_RATE_LABEL, RUN_RATE_SUFFIX, WEEK_PREFIX};

/// Normalizes a raw worksheet grid for the given view. Row 0 is discarded as
/// the title row, row 1 supplies the column schema, rows 2+ become records.
pub fn normalize(grid: &RawGrid, view: ViewKind) -> Result<CleanTable, NormalizeError> {
    normalize_with_key(grid, view.key_name())
}

/// Same as [`normalize`] but with an explicit key column name.
pub fn normalize_with_key(grid: &RawGrid, key_name: &str) -> Result<CleanTable, NormalizeError> {
    let rows = grid.rows();
    if rows.len() < 2 {
        return Err(NormalizeError::MalformedInput { rows: rows.len() });
    }

    let columns = derive_column_names(&rows[1], key_name);
    warn_on_collisions(&columns);

    let mut records = Vec::new();
    for row in &rows[2..] {
        let mut key = "";
        let mut fields: HashMap<String, Option<f64>> = HashMap::with_capacity(columns.len());

        // Rows shorter than the header are padded with blank cells; later
        // columns sharing a name overwrite earlier ones.
        for (idx, name) in columns.iter().enumerate() {
            let cell = row.get(idx).map(String::as_str).unwrap_or("");
            if name == key_name {
                key = cell.trim();
            } else {
                fields.insert(name.clone(), parse_cell_number(cell));
            }
        }

        if key.is_empty() {
            tracing::debug!("dropping row with blank {key_name} key");
            continue;
        }

        records.push(GroupRecord::new(key.to_string(), fields));
    }

    Ok(CleanTable::new(key_name.to_string(), columns, records))
}

/// Applies the header-name rules left to right over the header row:
/// blank cell -> key name; `Week-` prefix -> verbatim (remembered); the
/// run-rate label after a week -> `"<week> Required run-rate"`; anything
/// else verbatim.
fn derive_column_names(header: &[String], key_name: &str) -> Vec<String> {
    let mut names = Vec::with_capacity(header.len());
    let mut last_week: Option<&str> = None;

    for cell in header {
        let trimmed = cell.trim();
        let name = if trimmed.is_empty() {
            key_name.to_string()
        } else if trimmed.starts_with(WEEK_PREFIX) {
            last_week = Some(trimmed);
            trimmed.to_string()
        } else if trimmed.eq_ignore_ascii_case(RUN_RATE_LABEL) {
            match last_week {
                Some(week) => format!("{week} {RUN_RATE_SUFFIX}"),
                None => trimmed.to_string(),
            }
        } else {
            trimmed.to_string()
        };
        names.push(name);
    }

    names
}

fn warn_on_collisions(columns: &[String]) {
    let mut seen = HashSet::new();
    for name in columns {
        if !seen.insert(name.as_str()) {
            tracing::warn!(column = name.as_str(), "derived column name collides; last value wins");
        }
    }
}

/// Coerces one cell to a number: thousands separators stripped, blank or
/// unparsable cells become `None`. Non-finite parses ("NaN", "inf") are
/// treated as missing as well.
pub(crate) fn parse_cell_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    let cleaned = trimmed.replace(',', "");
    match cleaned.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Some(parsed),
        Ok(_) => None,
        Err(_) => {
            tracing::debug!(cell = trimmed, "cell is not numeric, treating as missing");
            None
        }
    }
}
