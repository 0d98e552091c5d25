//! SQLite implementation of [`Backend`].

use std::path::Path;
use std::time::Duration;

use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, OpenFlags};
use tracing::debug;

use super::core::{Backend, Row, Value};
use crate::config::StoreConfig;

/// Busy timeout applied to every connection.
const BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Column holding ingredient names in the catalog table.
pub const CATALOG_COLUMN: &str = "FRUIT_NAME";

pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Opens the configured database.
    ///
    /// Without `create_schema` the file must already exist, so a wrong path
    /// fails at connect time.
    pub fn open(config: &StoreConfig) -> Result<Self, String> {
        let conn = if config.path == ":memory:" {
            Connection::open_in_memory()
        } else {
            let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX;
            if config.create_schema {
                flags |= OpenFlags::SQLITE_OPEN_CREATE;
            }
            Connection::open_with_flags(Path::new(&config.path), flags)
        }
        .map_err(|e| e.to_string())?;

        conn.busy_timeout(BUSY_TIMEOUT).map_err(|e| e.to_string())?;

        if config.account.is_some() || config.role.is_some() || config.warehouse.is_some() {
            debug!("account/role/warehouse have no meaning for SQLite and are ignored");
        }

        if config.create_schema {
            conn.execute_batch(&schema_sql(&config.catalog_table, &config.orders_table))
                .map_err(|e| e.to_string())?;
            debug!(catalog = %config.catalog_table, orders = %config.orders_table, "Schema ensured");
        }

        Ok(Self { conn })
    }
}

impl Backend for SqliteBackend {
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, String> {
        let mut stmt = self.conn.prepare(sql).map_err(|e| e.to_string())?;
        let width = stmt.column_count();
        let mut rows = stmt
            .query(params_from_iter(params.iter()))
            .map_err(|e| e.to_string())?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(|e| e.to_string())? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(from_value_ref(row.get_ref(i).map_err(|e| e.to_string())?));
            }
            out.push(values);
        }
        Ok(out)
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<usize, String> {
        self.conn
            .execute(sql, params_from_iter(params.iter()))
            .map_err(|e| e.to_string())
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Integer(i) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*i)),
            Value::Real(r) => ToSqlOutput::Owned(rusqlite::types::Value::Real(*r)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

fn from_value_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

fn schema_sql(catalog_table: &str, orders_table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {catalog_table} ({CATALOG_COLUMN} TEXT);\n\
         CREATE TABLE IF NOT EXISTS {orders_table} (\n\
             INGREDIENTS TEXT NOT NULL,\n\
             NAME_ON_ORDER TEXT NOT NULL\n\
         );"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_config() -> StoreConfig {
        StoreConfig {
            path: ":memory:".to_string(),
            create_schema: true,
            ..StoreConfig::default()
        }
    }

    #[test]
    fn test_schema_is_created_and_probe_answers() {
        let mut backend = SqliteBackend::open(&memory_config()).unwrap();
        let rows = backend.query("SELECT 1", &[]).unwrap();
        assert_eq!(rows, vec![vec![Value::Integer(1)]]);

        let rows = backend.query("SELECT COUNT(*) FROM ORDERS", &[]).unwrap();
        assert_eq!(rows, vec![vec![Value::Integer(0)]]);
    }

    #[test]
    fn test_bound_parameters_round_trip_quotes() {
        let mut backend = SqliteBackend::open(&memory_config()).unwrap();
        let affected = backend
            .execute(
                "INSERT INTO ORDERS (INGREDIENTS, NAME_ON_ORDER) VALUES (?1, ?2)",
                &["Kiwi Apple".into(), "O'Brien".into()],
            )
            .unwrap();
        assert_eq!(affected, 1);

        let rows = backend.query("SELECT NAME_ON_ORDER FROM ORDERS", &[]).unwrap();
        assert_eq!(rows, vec![vec![Value::Text("O'Brien".into())]]);
    }

    #[test]
    fn test_null_cells_are_preserved() {
        let mut backend = SqliteBackend::open(&memory_config()).unwrap();
        backend
            .execute("INSERT INTO FRUIT_OPTIONS (FRUIT_NAME) VALUES (NULL)", &[])
            .unwrap();
        let rows = backend.query("SELECT FRUIT_NAME FROM FRUIT_OPTIONS", &[]).unwrap();
        assert_eq!(rows, vec![vec![Value::Null]]);
    }

    #[test]
    fn test_missing_file_without_create_fails() {
        let config = StoreConfig {
            path: "/nonexistent/dir/smoothies.db".to_string(),
            ..StoreConfig::default()
        };
        assert!(SqliteBackend::open(&config).is_err());
    }

    #[test]
    fn test_bad_statement_reports_driver_message() {
        let mut backend = SqliteBackend::open(&memory_config()).unwrap();
        let err = backend.query("SELECT * FROM NO_SUCH_TABLE", &[]).unwrap_err();
        assert!(err.contains("NO_SUCH_TABLE"), "unexpected message: {err}");
    }
}
