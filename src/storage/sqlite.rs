//! SQLite storage implementation

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};

use super::schema;
use crate::expense::Expense;
use crate::report::{CategoryTotal, DailyTotal, PeriodTotal};
use crate::user::User;
use crate::{Error, Result};

/// SQLite-backed store for accounts and expense records.
///
/// Every public operation executes a single statement against the open
/// connection; there are no multi-statement transactions and no in-process
/// locking beyond what SQLite provides.
pub struct ExpenseStore {
    conn: Connection,
}

impl ExpenseStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema; idempotent, runs on every open
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    // ========== Account Operations ==========

    /// Create a new account.
    ///
    /// Returns the new user's id. A taken username yields
    /// [`Error::DuplicateUsername`]; any other storage failure passes
    /// through as [`Error::Storage`].
    pub fn create_user(&self, username: &str, password: &str) -> Result<i64> {
        let inserted = self.conn.execute(
            "INSERT INTO users (username, password) VALUES (?1, ?2)",
            params![username, password],
        );

        match inserted {
            Ok(_) => Ok(self.conn.last_insert_rowid()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(Error::DuplicateUsername(username.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Register an account, reporting only success or failure.
    ///
    /// Boundary wrapper over [`create_user`](Self::create_user) for callers
    /// that want the boolean contract: `false` covers a duplicate username
    /// and any other insertion failure alike.
    pub fn register(&self, username: &str, password: &str) -> bool {
        match self.create_user(username, password) {
            Ok(id) => {
                tracing::debug!("Registered user {} (id {})", username, id);
                true
            }
            Err(e) => {
                tracing::warn!("Registration failed for {}: {}", username, e);
                false
            }
        }
    }

    /// Look up an account by exact username/password match.
    ///
    /// Case-sensitive, no normalization. `None` means either the user does
    /// not exist or the password is wrong; the two are indistinguishable.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
        self.conn
            .query_row(
                "SELECT id, username, password FROM users WHERE username = ?1 AND password = ?2",
                params![username, password],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        password: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// Count all users
    pub fn count_users(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ========== Expense Operations ==========

    /// Insert one expense row for a user.
    ///
    /// No validation happens at this layer; callers pre-validate required
    /// fields and the category choice. Returns the new row's id.
    pub fn add_expense(
        &self,
        date: &str,
        category: &str,
        amount: f64,
        description: &str,
        user_id: i64,
    ) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO expenses (date, category, amount, description, user_id)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![date, category, amount, description, user_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Delete an expense owned by a user.
    ///
    /// Deletes at most one row matching both the expense id and the owning
    /// user id. A missing or not-owned id is a silent no-op, so a guessed
    /// identifier can never touch another user's rows.
    pub fn delete_expense(&self, expense_id: i64, user_id: i64) -> Result<()> {
        let affected = self.conn.execute(
            "DELETE FROM expenses WHERE id = ?1 AND user_id = ?2",
            params![expense_id, user_id],
        )?;
        if affected == 0 {
            tracing::debug!("Delete of expense {} for user {} matched no row", expense_id, user_id);
        }
        Ok(())
    }

    /// Get all expenses for a user, in identifier order
    pub fn list_expenses(&self, user_id: i64) -> Result<Vec<Expense>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, category, amount, description, user_id FROM expenses WHERE user_id = ?1 ORDER BY id",
        )?;

        let expenses = stmt
            .query_map([user_id], |row| self.row_to_expense(row))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(expenses)
    }

    /// Get a user's expenses matching an exact category string
    pub fn expenses_by_category(&self, category: &str, user_id: i64) -> Result<Vec<Expense>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, category, amount, description, user_id FROM expenses WHERE category = ?1 AND user_id = ?2 ORDER BY id",
        )?;

        let expenses = stmt
            .query_map(params![category, user_id], |row| self.row_to_expense(row))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(expenses)
    }

    /// Get a user's expenses matching an exact date string
    pub fn expenses_by_date(&self, date: &str, user_id: i64) -> Result<Vec<Expense>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, category, amount, description, user_id FROM expenses WHERE date = ?1 AND user_id = ?2 ORDER BY id",
        )?;

        let expenses = stmt
            .query_map(params![date, user_id], |row| self.row_to_expense(row))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(expenses)
    }

    /// Get a user's expenses within an inclusive date range.
    ///
    /// ISO-8601 date strings compare lexicographically in calendar order,
    /// so plain string comparison is correct here.
    pub fn expenses_between(&self, start: &str, end: &str, user_id: i64) -> Result<Vec<Expense>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, category, amount, description, user_id FROM expenses WHERE date >= ?1 AND date <= ?2 AND user_id = ?3 ORDER BY id",
        )?;

        let expenses = stmt
            .query_map(params![start, end, user_id], |row| self.row_to_expense(row))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(expenses)
    }

    /// Count a user's expenses
    pub fn count_expenses(&self, user_id: i64) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM expenses WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Helper to convert a row to an Expense
    fn row_to_expense(&self, row: &rusqlite::Row) -> rusqlite::Result<Expense> {
        Ok(Expense {
            id: row.get(0)?,
            date: row.get(1)?,
            category: row.get(2)?,
            amount: row.get(3)?,
            description: row.get(4)?,
            user_id: row.get(5)?,
        })
    }

    // ========== Aggregate Operations ==========

    /// Total spent per calendar date for a user
    pub fn daily_totals(&self, user_id: i64) -> Result<Vec<DailyTotal>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, SUM(amount) AS total FROM expenses WHERE user_id = ?1 GROUP BY date ORDER BY date",
        )?;

        let totals = stmt
            .query_map([user_id], |row| {
                Ok(DailyTotal {
                    date: row.get(0)?,
                    total: row.get(1)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(totals)
    }

    /// Total spent per week for a user.
    ///
    /// Labels are `YYYY-WW` from strftime's `%U`: weeks start on Sunday and
    /// days before the year's first Sunday fall in week 00. `%U` needs
    /// SQLite 3.46+, which the bundled build provides.
    pub fn weekly_totals(&self, user_id: i64) -> Result<Vec<PeriodTotal>> {
        let mut stmt = self.conn.prepare(
            "SELECT strftime('%Y-%U', date) AS week, SUM(amount) AS total FROM expenses WHERE user_id = ?1 GROUP BY week ORDER BY week",
        )?;

        let totals = stmt
            .query_map([user_id], |row| {
                Ok(PeriodTotal {
                    period: row.get(0)?,
                    total: row.get(1)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(totals)
    }

    /// Total spent per `YYYY-MM` month for a user
    pub fn monthly_totals(&self, user_id: i64) -> Result<Vec<PeriodTotal>> {
        let mut stmt = self.conn.prepare(
            "SELECT strftime('%Y-%m', date) AS month, SUM(amount) AS total FROM expenses WHERE user_id = ?1 GROUP BY month ORDER BY month",
        )?;

        let totals = stmt
            .query_map([user_id], |row| {
                Ok(PeriodTotal {
                    period: row.get(0)?,
                    total: row.get(1)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(totals)
    }

    /// Total spent per category for a user; feeds the spending pie chart
    pub fn category_report(&self, user_id: i64) -> Result<Vec<CategoryTotal>> {
        let mut stmt = self.conn.prepare(
            "SELECT category, SUM(amount) AS total FROM expenses WHERE user_id = ?1 GROUP BY category ORDER BY category",
        )?;

        let totals = stmt
            .query_map([user_id], |row| {
                Ok(CategoryTotal {
                    category: row.get(0)?,
                    total: row.get(1)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(totals)
    }

    /// Get row counts across the whole store
    pub fn stats(&self) -> Result<StoreStats> {
        let users = self.count_users()?;
        let expenses: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))?;
        Ok(StoreStats {
            users,
            expenses: expenses as usize,
        })
    }
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub users: usize,
    pub expenses: usize,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Store Statistics:")?;
        writeln!(f, "  Users: {}", self.users)?;
        writeln!(f, "  Expenses: {}", self.expenses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("spendlog=debug")
            .try_init();
    }

    fn store_with_user(username: &str) -> (ExpenseStore, i64) {
        let store = ExpenseStore::open_in_memory().unwrap();
        let user_id = store.create_user(username, "secret").unwrap();
        (store, user_id)
    }

    #[test]
    fn test_register_duplicate_username() {
        init_tracing();
        let store = ExpenseStore::open_in_memory().unwrap();

        assert!(store.register("alice", "pw1"));
        assert!(!store.register("alice", "pw2"));
        assert_eq!(store.count_users().unwrap(), 1);

        // the surviving row is the first one
        let user = store.authenticate("alice", "pw1").unwrap().unwrap();
        assert_eq!(user.username, "alice");
        assert!(store.authenticate("alice", "pw2").unwrap().is_none());
    }

    #[test]
    fn test_create_user_duplicate_is_typed() {
        let store = ExpenseStore::open_in_memory().unwrap();
        store.create_user("bob", "pw").unwrap();

        match store.create_user("bob", "other") {
            Err(Error::DuplicateUsername(name)) => assert_eq!(name, "bob"),
            other => panic!("expected DuplicateUsername, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_authenticate() {
        let store = ExpenseStore::open_in_memory().unwrap();
        let id = store.create_user("carol", "hunter2").unwrap();

        let user = store.authenticate("carol", "hunter2").unwrap().unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.password, "hunter2");

        // wrong password and unknown user look the same
        assert!(store.authenticate("carol", "HUNTER2").unwrap().is_none());
        assert!(store.authenticate("nobody", "hunter2").unwrap().is_none());
    }

    #[test]
    fn test_add_and_list_expense() {
        let (store, user_id) = store_with_user("dave");

        let id = store
            .add_expense("2024-03-15", "Food", 12.5, "lunch", user_id)
            .unwrap();

        let expenses = store.list_expenses(user_id).unwrap();
        assert_eq!(expenses.len(), 1);
        assert_eq!(
            expenses[0],
            Expense {
                id,
                date: "2024-03-15".to_string(),
                category: "Food".to_string(),
                amount: 12.5,
                description: "lunch".to_string(),
                user_id,
            }
        );
    }

    #[test]
    fn test_list_is_in_insertion_order() {
        let (store, user_id) = store_with_user("erin");

        store.add_expense("2024-03-02", "Bills", 40.0, "", user_id).unwrap();
        store.add_expense("2024-03-01", "Food", 8.0, "", user_id).unwrap();

        let expenses = store.list_expenses(user_id).unwrap();
        assert_eq!(expenses[0].category, "Bills");
        assert_eq!(expenses[1].category, "Food");
    }

    #[test]
    fn test_delete_scoped_to_owner() {
        let store = ExpenseStore::open_in_memory().unwrap();
        let alice = store.create_user("alice", "pw").unwrap();
        let bob = store.create_user("bob", "pw").unwrap();

        let alice_expense = store
            .add_expense("2024-01-01", "Food", 10.0, "", alice)
            .unwrap();
        store.add_expense("2024-01-01", "Food", 5.0, "", bob).unwrap();

        // bob cannot delete alice's row even with the right id
        store.delete_expense(alice_expense, bob).unwrap();
        assert_eq!(store.count_expenses(alice).unwrap(), 1);
        assert_eq!(store.count_expenses(bob).unwrap(), 1);

        // the owner can
        store.delete_expense(alice_expense, alice).unwrap();
        assert_eq!(store.count_expenses(alice).unwrap(), 0);

        // deleting again is a silent no-op
        store.delete_expense(alice_expense, alice).unwrap();
    }

    #[test]
    fn test_daily_and_monthly_totals() {
        let (store, user_id) = store_with_user("frank");

        store.add_expense("2024-01-05", "Food", 10.0, "", user_id).unwrap();
        store.add_expense("2024-01-05", "Transport", 5.0, "", user_id).unwrap();
        store.add_expense("2024-02-01", "Food", 7.0, "", user_id).unwrap();

        let daily = store.daily_totals(user_id).unwrap();
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].date, "2024-01-05");
        assert_eq!(daily[0].total, 15.0);
        assert_eq!(daily[1].date, "2024-02-01");
        assert_eq!(daily[1].total, 7.0);

        let monthly = store.monthly_totals(user_id).unwrap();
        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0].period, "2024-01");
        assert_eq!(monthly[0].total, 15.0);
        assert_eq!(monthly[1].period, "2024-02");
        assert_eq!(monthly[1].total, 7.0);
    }

    #[test]
    fn test_weekly_totals_sunday_start_labels() {
        let (store, user_id) = store_with_user("grace");

        // 2024-01-01 is a Monday, so the first Sunday is 2024-01-07:
        // Jan 5 falls in week 00, Jan 7 opens week 01, Feb 1 is week 04
        store.add_expense("2024-01-05", "Food", 10.0, "", user_id).unwrap();
        store.add_expense("2024-01-07", "Food", 5.0, "", user_id).unwrap();
        store.add_expense("2024-02-01", "Food", 7.0, "", user_id).unwrap();

        let weekly = store.weekly_totals(user_id).unwrap();
        assert_eq!(weekly.len(), 3);
        assert_eq!(weekly[0].period, "2024-00");
        assert_eq!(weekly[0].total, 10.0);
        assert_eq!(weekly[1].period, "2024-01");
        assert_eq!(weekly[1].total, 5.0);
        assert_eq!(weekly[2].period, "2024-04");
        assert_eq!(weekly[2].total, 7.0);
    }

    #[test]
    fn test_category_report() {
        let (store, user_id) = store_with_user("heidi");

        store.add_expense("2024-01-05", "Food", 10.0, "", user_id).unwrap();
        store.add_expense("2024-02-01", "Food", 7.0, "", user_id).unwrap();
        store.add_expense("2024-01-05", "Transport", 5.0, "", user_id).unwrap();

        let report = store.category_report(user_id).unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].category, "Food");
        assert_eq!(report[0].total, 17.0);
        assert_eq!(report[1].category, "Transport");
        assert_eq!(report[1].total, 5.0);
    }

    #[test]
    fn test_filters_scoped_to_owner() {
        let store = ExpenseStore::open_in_memory().unwrap();
        let alice = store.create_user("alice", "pw").unwrap();
        let bob = store.create_user("bob", "pw").unwrap();

        store.add_expense("2024-01-05", "Food", 10.0, "", alice).unwrap();
        store.add_expense("2024-01-05", "Food", 99.0, "", bob).unwrap();

        let by_category = store.expenses_by_category("Food", alice).unwrap();
        assert_eq!(by_category.len(), 1);
        assert_eq!(by_category[0].user_id, alice);

        let by_date = store.expenses_by_date("2024-01-05", alice).unwrap();
        assert_eq!(by_date.len(), 1);
        assert_eq!(by_date[0].user_id, alice);

        let daily = store.daily_totals(alice).unwrap();
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].total, 10.0);
    }

    #[test]
    fn test_expenses_between_is_inclusive() {
        let (store, user_id) = store_with_user("ivan");

        store.add_expense("2024-01-01", "Food", 1.0, "", user_id).unwrap();
        store.add_expense("2024-01-15", "Food", 2.0, "", user_id).unwrap();
        store.add_expense("2024-01-31", "Food", 3.0, "", user_id).unwrap();
        store.add_expense("2024-02-01", "Food", 4.0, "", user_id).unwrap();

        let ranged = store
            .expenses_between("2024-01-01", "2024-01-31", user_id)
            .unwrap();
        assert_eq!(ranged.len(), 3);
        assert_eq!(ranged[0].date, "2024-01-01");
        assert_eq!(ranged[2].date, "2024-01-31");
    }

    #[test]
    fn test_empty_user_has_empty_results() {
        let (store, user_id) = store_with_user("judy");

        assert!(store.list_expenses(user_id).unwrap().is_empty());
        assert!(store.daily_totals(user_id).unwrap().is_empty());
        assert!(store.weekly_totals(user_id).unwrap().is_empty());
        assert!(store.monthly_totals(user_id).unwrap().is_empty());
        assert!(store.category_report(user_id).unwrap().is_empty());
        assert!(store.expenses_by_category("Food", user_id).unwrap().is_empty());
        assert!(store.expenses_by_date("2024-01-01", user_id).unwrap().is_empty());
        assert_eq!(store.count_expenses(user_id).unwrap(), 0);
    }

    #[test]
    fn test_schema_idempotent_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("expenses.db");

        let user_id;
        {
            let store = ExpenseStore::open(&db_path).unwrap();
            user_id = store.create_user("kate", "pw").unwrap();
            store.add_expense("2024-01-05", "Food", 10.0, "", user_id).unwrap();
        }

        // second open re-runs schema creation against existing tables
        let store = ExpenseStore::open(&db_path).unwrap();
        let user = store.authenticate("kate", "pw").unwrap().unwrap();
        assert_eq!(user.id, user_id);
        assert_eq!(store.list_expenses(user_id).unwrap().len(), 1);

        let stats = store.stats().unwrap();
        assert_eq!(stats.users, 1);
        assert_eq!(stats.expenses, 1);
    }
}
