use std::fmt;
use std::path::Path;

use rusqlite::{Batch, Connection, OpenFlags};

use crate::error::{Error, Result};
use crate::storage::table::{Row, Value};

use super::schema::{self, DatabaseSchema};

/// Whether statements that modify the database are allowed to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AccessMode {
    #[default]
    ReadOnly,
    ReadWrite,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessMode::ReadOnly => write!(f, "read-only"),
            AccessMode::ReadWrite => write!(f, "read-write"),
        }
    }
}

/// Column names plus fetched rows of a statement that produced a result set.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl QueryResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementOutcome {
    Rows(QueryResult),
    Executed { changes: usize },
}

/// The single connection a process holds open for its whole lifetime.
pub struct Database {
    conn: Connection,
    mode: AccessMode,
}

impl Database {
    /// Read-only files are opened with `SQLITE_OPEN_READ_ONLY`, which no
    /// statement sent over the connection can lift.
    pub fn open(path: &Path, mode: AccessMode) -> Result<Self> {
        let conn = match mode {
            AccessMode::ReadOnly => Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?,
            AccessMode::ReadWrite => Connection::open(path)?,
        };
        Self::with_connection(conn, mode)
    }

    pub fn open_in_memory(mode: AccessMode) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, mode)
    }

    fn with_connection(conn: Connection, mode: AccessMode) -> Result<Self> {
        // Foreign keys are declared for documentation only; the bundled
        // SQLite would otherwise refuse reloads and orphan rows.
        conn.pragma_update(None, "foreign_keys", false)?;
        conn.pragma_update(None, "query_only", mode == AccessMode::ReadOnly)?;
        tracing::debug!(%mode, "database connection opened");
        Ok(Self { conn, mode })
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub(crate) fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Runs exactly one statement. Input holding more than one is refused
    /// before anything executes. Writes are committed before returning, even
    /// when the statement itself opened a transaction.
    pub fn execute(&self, sql: &str) -> Result<StatementOutcome> {
        let mut batch = Batch::new(&self.conn, sql);
        let mut stmt = match batch.next()? {
            Some(stmt) => stmt,
            None => return Err(Error::EmptyStatement),
        };
        if batch.next()?.is_some() {
            return Err(Error::MultipleStatements);
        }

        if self.mode == AccessMode::ReadOnly && !stmt.readonly() {
            return Err(Error::ReadOnly);
        }

        if stmt.column_count() == 0 {
            let changes = stmt.execute([])?;
            drop(stmt);
            if !self.conn.is_autocommit() {
                self.conn.execute_batch("COMMIT")?;
                tracing::debug!("open transaction committed");
            }
            tracing::debug!(changes, "statement executed");
            return Ok(StatementOutcome::Executed { changes });
        }

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let column_count = columns.len();

        let mut rows = stmt.query([])?;
        let mut fetched = Vec::new();
        while let Some(row) = rows.next()? {
            let values = (0..column_count)
                .map(|i| row.get_ref(i).map(Value::from))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            fetched.push(Row::new(values));
        }

        tracing::debug!(rows = fetched.len(), "query returned");
        Ok(StatementOutcome::Rows(QueryResult {
            columns,
            rows: fetched,
        }))
    }

    /// Distinct values of `table.column`, in the order SQLite yields them.
    pub fn distinct_values(&self, table: &str, column: &str) -> Result<Vec<Value>> {
        let sql = format!(
            "SELECT DISTINCT {} FROM {}",
            quote_identifier(column),
            quote_identifier(table)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let values = stmt
            .query_map([], |row| row.get_ref(0).map(Value::from))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(values)
    }

    pub fn schema(&self) -> Result<DatabaseSchema> {
        schema::introspect(&self.conn)
    }
}

pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(mode: AccessMode) -> Database {
        let db = Database::open_in_memory(AccessMode::ReadWrite).unwrap();
        db.execute("CREATE TABLE products (product_id INTEGER PRIMARY KEY, product_name TEXT)")
            .unwrap();
        db.execute("INSERT INTO products VALUES (1, 'Lamp'), (2, 'Desk'), (3, 'Lamp')")
            .unwrap();
        Database::with_connection(db.conn, mode).unwrap()
    }

    fn scalar(db: &Database, sql: &str) -> Value {
        match db.execute(sql).unwrap() {
            StatementOutcome::Rows(result) => result.rows[0].values[0].clone(),
            other => panic!("expected rows, got {:?}", other),
        }
    }

    #[test]
    fn test_select_returns_rows() {
        let db = seeded(AccessMode::ReadOnly);
        let outcome = db.execute("SELECT product_id, product_name FROM products ORDER BY product_id").unwrap();

        match outcome {
            StatementOutcome::Rows(result) => {
                assert_eq!(result.columns, vec!["product_id", "product_name"]);
                assert_eq!(result.row_count(), 3);
                assert_eq!(result.rows[1].values[1], Value::String("Desk".to_string()));
            }
            other => panic!("expected rows, got {:?}", other),
        }
    }

    #[test]
    fn test_write_reports_changes() {
        let db = seeded(AccessMode::ReadWrite);
        let outcome = db.execute("UPDATE products SET product_name = 'Chair' WHERE product_id = 2").unwrap();
        assert_eq!(outcome, StatementOutcome::Executed { changes: 1 });
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let db = seeded(AccessMode::ReadOnly);
        assert_eq!(db.mode(), AccessMode::ReadOnly);
        assert!(db.execute("DELETE FROM products").is_err());
        assert!(db.execute("DROP TABLE products").is_err());

        let outcome = db.execute("SELECT COUNT(*) FROM products").unwrap();
        if let StatementOutcome::Rows(result) = outcome {
            assert_eq!(result.rows[0].values[0], Value::Integer(3));
        }
    }

    #[test]
    fn test_distinct_values() {
        let db = seeded(AccessMode::ReadOnly);
        let mut values: Vec<String> = db
            .distinct_values("products", "product_name")
            .unwrap()
            .iter()
            .map(|v| v.to_string())
            .collect();
        values.sort();
        assert_eq!(values, vec!["Desk", "Lamp"]);
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("orders"), "\"orders\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_foreign_keys_are_off() {
        let db = seeded(AccessMode::ReadWrite);
        assert_eq!(scalar(&db, "PRAGMA foreign_keys"), Value::Integer(0));

        db.execute("CREATE TABLE sales (sale_id INTEGER, product_id INTEGER REFERENCES products(product_id))")
            .unwrap();
        db.execute("INSERT INTO sales VALUES (1, 999)").unwrap();
        assert!(db.execute("DELETE FROM products").is_ok());
    }

    #[test]
    fn test_read_only_survives_pragma_toggle() {
        let db = seeded(AccessMode::ReadOnly);
        let _ = db.execute("PRAGMA query_only = OFF");

        assert!(matches!(db.execute("DELETE FROM products"), Err(Error::ReadOnly)));
        assert_eq!(scalar(&db, "SELECT COUNT(*) FROM products"), Value::Integer(3));
    }

    #[test]
    fn test_read_only_file_rejects_writes_after_pragma_toggle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        {
            let db = Database::open(&path, AccessMode::ReadWrite).unwrap();
            db.execute("CREATE TABLE sales (sale_id INTEGER)").unwrap();
            db.execute("INSERT INTO sales VALUES (1), (2)").unwrap();
        }

        let db = Database::open(&path, AccessMode::ReadOnly).unwrap();
        let _ = db.execute("PRAGMA query_only = OFF");
        assert!(db.execute("DELETE FROM sales").is_err());
        assert!(db.conn.execute_batch("DELETE FROM sales").is_err());
        assert_eq!(scalar(&db, "SELECT COUNT(*) FROM sales"), Value::Integer(2));
    }

    #[test]
    fn test_multiple_statements_run_nothing() {
        let db = seeded(AccessMode::ReadWrite);

        assert!(matches!(
            db.execute("SELECT 1 AS x; DROP TABLE products"),
            Err(Error::MultipleStatements)
        ));
        assert!(matches!(
            db.execute("UPDATE products SET product_name = 'A'; UPDATE products SET product_name = 'B'"),
            Err(Error::MultipleStatements)
        ));
        assert_eq!(scalar(&db, "SELECT COUNT(*) FROM products WHERE product_name = 'Lamp'"), Value::Integer(2));

        // a trailing separator is still one statement
        assert!(db.execute("SELECT 1;  ").is_ok());
    }

    #[test]
    fn test_empty_statement() {
        let db = seeded(AccessMode::ReadOnly);
        assert!(matches!(db.execute(""), Err(Error::EmptyStatement)));
        assert!(matches!(db.execute("  \n "), Err(Error::EmptyStatement)));
        assert!(matches!(db.execute("-- just a note"), Err(Error::EmptyStatement)));
    }

    #[test]
    fn test_writes_after_begin_are_committed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        {
            let db = Database::open(&path, AccessMode::ReadWrite).unwrap();
            db.execute("CREATE TABLE sales (sale_id INTEGER)").unwrap();
            db.execute("INSERT INTO sales VALUES (1), (2)").unwrap();

            db.execute("BEGIN").unwrap();
            assert!(db.conn.is_autocommit());
            db.execute("DELETE FROM sales WHERE sale_id = 1").unwrap();
            assert!(db.conn.is_autocommit());
        }

        let db = Database::open(&path, AccessMode::ReadOnly).unwrap();
        assert_eq!(scalar(&db, "SELECT COUNT(*) FROM sales"), Value::Integer(1));
    }
}
