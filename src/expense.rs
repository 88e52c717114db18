//! Expense records

use serde::{Deserialize, Serialize};

/// Categories offered by the form UI.
///
/// Advisory only: storage accepts any category string, so rows written by
/// older versions or other frontends still load.
pub const CATEGORIES: &[&str] = &["Food", "Transport", "Shopping", "Bills", "Other"];

/// A single spending event owned by one user.
///
/// Expenses are created and deleted but never edited in place. All reads and
/// deletes are scoped by `user_id`; that scoping is the only isolation
/// between users' data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// Store-assigned identifier
    pub id: i64,
    /// Calendar date as an ISO-8601 string (`YYYY-MM-DD`), no time component
    pub date: String,
    /// Free-form label; the UI constrains it to [`CATEGORIES`]
    pub category: String,
    /// Non-negative amount spent
    pub amount: f64,
    /// Free-form note, may be empty
    pub description: String,
    /// Identifier of the owning [`crate::User`]
    pub user_id: i64,
}
