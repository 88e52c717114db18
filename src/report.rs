//! Aggregate report rows
//!
//! Each type is one output row of a `GROUP BY` aggregate over a single
//! user's expenses. An empty report is a valid outcome, not an error; the
//! presentation layer renders it as "nothing recorded yet".

use serde::{Deserialize, Serialize};

/// Total spent on one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTotal {
    /// ISO-8601 date (`YYYY-MM-DD`)
    pub date: String,
    pub total: f64,
}

/// Total spent in one strftime-derived period (week or month).
///
/// Weekly labels are `YYYY-WW` with Sunday-start week numbering (week 00
/// covers days before the year's first Sunday); monthly labels are `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodTotal {
    pub period: String,
    pub total: f64,
}

/// Total spent in one category; input rows for the spending pie chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}
