//! Storage Layer - SQLite-backed persistence
//!
//! System of record is a single SQLite file with tables:
//! - users(id, username, password)
//! - expenses(id, date, category, amount, description, user_id)
//!
//! `expenses.user_id` references `users.id`; the relationship is declared
//! but not enforced with referential actions, so a removed user row would
//! leave its expenses orphaned.

pub mod schema;
pub mod sqlite;

pub use sqlite::{ExpenseStore, StoreStats};
