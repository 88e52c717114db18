//! # Spendlog - personal expense tracking core
//!
//! SQLite-backed data layer for a personal expense tracker.
//!
//! Spendlog provides:
//! - Account registration and login against a local database file
//! - Per-user expense records (date, category, amount, description)
//! - Spending reports: daily, weekly and monthly totals plus a
//!   per-category breakdown suitable for a pie chart
//!
//! The presentation layer (forms, tables, charts, session state) lives
//! outside this crate and calls into [`ExpenseStore`] with plain values.

pub mod config;
pub mod expense;
pub mod report;
pub mod storage;
pub mod user;

// Re-exports for convenient access
pub use expense::{CATEGORIES, Expense};
pub use report::{CategoryTotal, DailyTotal, PeriodTotal};
pub use storage::{ExpenseStore, StoreStats};
pub use user::User;

/// Result type alias for Spendlog operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Spendlog operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
