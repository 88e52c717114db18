//! User accounts

use serde::{Deserialize, Serialize};

/// A registered account.
///
/// Returned by [`crate::ExpenseStore::authenticate`]; the presentation layer
/// keeps the `id` in its session state and passes it to every expense
/// operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Store-assigned identifier, unique and immutable
    pub id: i64,
    /// Globally unique login name, matched case-sensitively
    pub username: String,
    /// Stored verbatim; the store performs no hashing
    pub password: String,
}
