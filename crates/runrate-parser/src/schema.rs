//! Column-name conventions shared by both worksheet views.

/// Weekly observation columns carry this prefix in the header row.
pub const WEEK_PREFIX: &str = "Week-";

/// Header label (matched case-insensitively) for the run-rate column that
/// follows a weekly column.
pub const RUN_RATE_LABEL: &str = "required run-rate";

/// Suffix appended to the preceding week's name when deriving the run-rate
/// column name.
pub const RUN_RATE_SUFFIX: &str = "Required run-rate";

/// Derived weekly columns containing this marker are run-rate columns, not
/// observations.
pub const REQUIRED_MARKER: &str = "Required";

/// The per-group target column.
pub const TOTAL_TARGET_COLUMN: &str = "Total Target";
