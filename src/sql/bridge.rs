//! Per-binding isolated SQL database, with a script-visible surface whose
//! operations never synchronously throw — see [`crate::engine::pending`].

use super::classify::{check_allowed, classify, split_statements, StatementKind};
use super::dbid::database_path;
use super::value::SqlValue;
use crate::engine::pending::Pending;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::path::Path;
use std::time::{Duration, Instant};

/// Rows and columns returned from a query-path statement.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// Column names, in positional order.
    pub columns: Vec<String>,
    /// Each row's values, in the same order as `columns`.
    pub rows: Vec<Vec<SqlValue>>,
    /// Number of rows read while producing this result.
    pub rows_read: u64,
}

/// The outcome of an exec-path statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecResult {
    /// Rows affected by the statement.
    pub changes: i64,
    /// `ROWID` of the last inserted row, if any.
    pub last_row_id: i64,
    /// Whether the statement changed anything (`changes > 0`).
    pub changed_db: bool,
    /// Same as `changes`, named per the script-facing field.
    pub rows_written: i64,
}

/// The outcome of `Database::exec`, which may run several statements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecSummary {
    /// Number of statements successfully executed.
    pub count: u64,
    /// Wall-clock time taken.
    pub duration: Duration,
}

/// The result of `first(column?)`.
#[derive(Debug, Clone, PartialEq)]
pub enum FirstResult {
    /// There were no rows.
    NoRows,
    /// No column was requested: the whole first row, as ordered pairs.
    Row(Vec<(String, SqlValue)>),
    /// A column was requested: its value in the first row, or `None` if no
    /// column with that name exists. When duplicate column names occur, the
    /// first match wins.
    Column(Option<SqlValue>),
}

/// A prepared statement bound to a particular SQL text and, optionally, a
/// set of bound parameters. `bind` returns a *new* statement; it never
/// mutates the one it was called on.
#[derive(Debug, Clone)]
pub struct PreparedStatement {
    sql: String,
    params: Vec<SqlValue>,
}

impl PreparedStatement {
    /// Returns a new statement with `params` bound, leaving `self`
    /// unchanged.
    #[must_use]
    pub fn bind(&self, params: Vec<SqlValue>) -> Self {
        Self {
            sql: self.sql.clone(),
            params,
        }
    }
}

/// An isolated, per-binding SQL database.
pub struct SqlBridge {
    conn: Mutex<rusqlite::Connection>,
}

impl SqlBridge {
    /// Opens (creating if needed) the database for `database_id` under
    /// `data_dir`, setting WAL journaling mode.
    ///
    /// # Errors
    /// Returns a validation error if `database_id` is invalid, or a runtime
    /// error if the database cannot be opened.
    pub fn open(data_dir: &Path, database_id: &str) -> Result<Self> {
        let path = database_path(data_dir, database_id)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = rusqlite::Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens an in-memory database, for tests and ephemeral bindings.
    ///
    /// # Errors
    /// Returns a runtime error if the in-memory database cannot be opened.
    pub fn open_in_memory() -> Result<Self> {
        let conn = rusqlite::Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Builds a (synchronous, no I/O yet) prepared statement.
    #[must_use]
    pub fn prepare(&self, sql: &str) -> PreparedStatement {
        PreparedStatement {
            sql: sql.to_string(),
            params: Vec::new(),
        }
    }

    /// Runs `statement` on the query path, returning all rows.
    pub fn all(&self, statement: &PreparedStatement) -> Pending<QueryResult> {
        Pending::from_result(self.run_query(statement))
    }

    /// Runs `statement` and returns the first row, or the value of one
    /// column from it.
    pub fn first(&self, statement: &PreparedStatement, column: Option<&str>) -> Pending<FirstResult> {
        Pending::from_result(self.run_first(statement, column))
    }

    /// Like [`all`], but the script surface renders rows as arrays rather
    /// than column-keyed records; `with_column_names` additionally reports
    /// the column list once.
    ///
    /// [`all`]: SqlBridge::all
    pub fn raw(&self, statement: &PreparedStatement, with_column_names: bool) -> Pending<QueryResult> {
        Pending::from_result(self.run_query(statement).map(|mut result| {
            if !with_column_names {
                result.columns.clear();
            }
            result
        }))
    }

    /// Runs `statement` on the exec path.
    pub fn run(&self, statement: &PreparedStatement) -> Pending<ExecResult> {
        Pending::from_result(self.run_exec(statement))
    }

    /// Runs every statement in `batch`, in order. Any failure rejects the
    /// whole call; statements are not rolled back (all-or-nothing by
    /// rejection, not by transaction — see DESIGN.md).
    pub fn batch(&self, batch: &[PreparedStatement]) -> Pending<Vec<ExecResult>> {
        let mut results = Vec::with_capacity(batch.len());
        for statement in batch {
            match self.run_exec(statement) {
                Ok(result) => results.push(result),
                Err(err) => return Pending::Rejected(err.script_message()),
            }
        }
        Pending::Fulfilled(results)
    }

    /// Splits `sql` on semicolons (honoring quoted literals) and executes
    /// each statement in turn, skipping empty ones. A failing statement
    /// rejects the whole call without rolling back prior statements.
    pub fn exec(&self, sql: &str) -> Pending<ExecSummary> {
        let start = Instant::now();
        let statements = split_statements(sql);
        for statement in &statements {
            if let Err(err) = check_allowed(statement) {
                return Pending::Rejected(err.script_message());
            }
            if let Err(err) = self.execute_raw(statement) {
                return Pending::Rejected(err.script_message());
            }
        }
        Pending::Fulfilled(ExecSummary {
            count: statements.len() as u64,
            duration: start.elapsed(),
        })
    }

    /// Always rejects: dumping the whole database is unsupported.
    #[must_use]
    pub fn dump(&self) -> Pending<Vec<u8>> {
        Pending::rejected("dump is not supported")
    }

    fn run_query(&self, statement: &PreparedStatement) -> Result<QueryResult> {
        check_allowed(&statement.sql)?;
        if classify(&statement.sql) != StatementKind::Query {
            return Err(Error::validation(
                "statement is not a query (expected SELECT/PRAGMA/WITH)",
            ));
        }
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&statement.sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|s| (*s).to_string()).collect();
        let params = statement
            .params
            .iter()
            .map(|p| p as &dyn rusqlite::ToSql)
            .collect::<Vec<_>>();
        let mut rows_read = 0u64;
        let mut rows = Vec::new();
        let mut sqlite_rows = stmt.query(params.as_slice())?;
        while let Some(row) = sqlite_rows.next()? {
            rows_read += 1;
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                values.push(SqlValue::from_ref(row.get_ref(i)?));
            }
            rows.push(values);
        }
        Ok(QueryResult {
            columns,
            rows,
            rows_read,
        })
    }

    fn run_first(&self, statement: &PreparedStatement, column: Option<&str>) -> Result<FirstResult> {
        let result = self.run_query(statement)?;
        let Some(first_row) = result.rows.into_iter().next() else {
            return Ok(FirstResult::NoRows);
        };
        match column {
            None => Ok(FirstResult::Row(
                result.columns.into_iter().zip(first_row).collect(),
            )),
            Some(name) => {
                let value = result
                    .columns
                    .iter()
                    .position(|c| c == name)
                    .map(|idx| first_row[idx].clone());
                Ok(FirstResult::Column(value))
            }
        }
    }

    fn run_exec(&self, statement: &PreparedStatement) -> Result<ExecResult> {
        check_allowed(&statement.sql)?;
        if classify(&statement.sql) == StatementKind::Query {
            return Err(Error::validation(
                "statement is a query; use all()/first()/raw() instead of run()",
            ));
        }
        let conn = self.conn.lock();
        let params = statement
            .params
            .iter()
            .map(|p| p as &dyn rusqlite::ToSql)
            .collect::<Vec<_>>();
        let changes = conn.execute(&statement.sql, params.as_slice())? as i64;
        let last_row_id = conn.last_insert_rowid();
        Ok(ExecResult {
            changes,
            last_row_id,
            changed_db: changes > 0,
            rows_written: changes,
        })
    }

    fn execute_raw(&self, sql: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch(sql)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> SqlBridge {
        let bridge = SqlBridge::open_in_memory().unwrap();
        bridge
            .exec("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")
            .unwrap_fulfilled();
        bridge
            .exec("INSERT INTO t (name) VALUES ('alice'); INSERT INTO t (name) VALUES ('bob')")
            .unwrap_fulfilled();
        bridge
    }

    #[test]
    fn all_returns_rows_with_column_names() {
        let bridge = setup();
        let stmt = bridge.prepare("SELECT id, name FROM t ORDER BY id");
        let result = bridge.all(&stmt).unwrap_fulfilled();
        assert_eq!(result.columns, vec!["id", "name"]);
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0][1], SqlValue::Text("alice".to_string()));
    }

    #[test]
    fn bind_does_not_mutate_receiver() {
        let bridge = setup();
        let base = bridge.prepare("SELECT name FROM t WHERE id = ?1");
        let bound_a = base.bind(vec![SqlValue::Integer(1)]);
        let bound_b = base.bind(vec![SqlValue::Integer(2)]);

        let result_a = bridge.all(&bound_a).unwrap_fulfilled();
        let result_b = bridge.all(&bound_b).unwrap_fulfilled();
        assert_eq!(result_a.rows[0][0], SqlValue::Text("alice".to_string()));
        assert_eq!(result_b.rows[0][0], SqlValue::Text("bob".to_string()));
        assert!(base.params.is_empty());
    }

    #[test]
    fn first_with_missing_column_returns_none() {
        let bridge = setup();
        let stmt = bridge.prepare("SELECT id, name FROM t ORDER BY id LIMIT 1");
        let result = bridge.first(&stmt, Some("nonexistent")).unwrap_fulfilled();
        assert_eq!(result, FirstResult::Column(None));
    }

    #[test]
    fn first_with_no_rows_is_no_rows() {
        let bridge = setup();
        let stmt = bridge.prepare("SELECT * FROM t WHERE id = 999");
        assert_eq!(bridge.first(&stmt, None).unwrap_fulfilled(), FirstResult::NoRows);
    }

    #[test]
    fn run_returns_change_metadata() {
        let bridge = setup();
        let stmt = bridge.prepare("UPDATE t SET name = 'carol' WHERE id = 1");
        let result = bridge.run(&stmt).unwrap_fulfilled();
        assert_eq!(result.changes, 1);
        assert!(result.changed_db);
    }

    #[test]
    fn attach_and_forbidden_pragma_are_policy_rejections_not_panics() {
        let bridge = setup();
        let attach = bridge.exec("ATTACH DATABASE 'x' AS y");
        assert!(attach.is_rejected());

        let stmt = bridge.prepare("PRAGMA synchronous = OFF");
        let rejected = bridge.run(&stmt);
        assert!(rejected.is_rejected());
    }

    #[test]
    fn query_against_missing_table_rejects_rather_than_panics() {
        let bridge = setup();
        let stmt = bridge.prepare("SELECT * FROM nonexistent_table_xyz");
        let result = bridge.all(&stmt);
        assert!(result.is_rejected());
    }

    #[test]
    fn exec_runs_multiple_statements_and_counts_them() {
        let bridge = setup();
        let summary = bridge
            .exec("INSERT INTO t (name) VALUES ('dora'); INSERT INTO t (name) VALUES ('eve');")
            .unwrap_fulfilled();
        assert_eq!(summary.count, 2);
    }

    #[test]
    fn dump_always_rejects() {
        let bridge = setup();
        assert!(bridge.dump().is_rejected());
    }

    #[test]
    fn open_creates_file_with_wal_mode() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = SqlBridge::open(dir.path(), "tenant-1").unwrap();
        bridge.exec("CREATE TABLE t (id INTEGER)").unwrap_fulfilled();
        assert!(dir.path().join("sql").join("tenant-1.db").exists());
    }

    #[test]
    fn open_rejects_invalid_database_id() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SqlBridge::open(dir.path(), "../escape").is_err());
    }
}
