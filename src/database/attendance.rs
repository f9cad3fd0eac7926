use std::path::Path;
use std::sync::Arc;

use log::info;
use serde_json::{json, Value};
use thiserror::Error;
use tokio_rusqlite::Connection;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] tokio_rusqlite::Error),
    #[error("SQLite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
    #[error("Database connection error: {0}")]
    Connection(String),
    #[error("Database file not found: {0}")]
    Missing(String),
    #[error("Table not found: {0}")]
    TableMissing(String),
}

/// Read-only handle over the attendance database. Every query here is a
/// fixed statement; user questions never reach the SQL layer.
#[derive(Clone, Debug)]
pub struct AttendanceDb {
    conn: Arc<Connection>,
}

const REQUIRED_TABLES: [&str; 3] = ["employees", "attendance", "departments"];

impl AttendanceDb {
    pub async fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DatabaseError::Missing(path.display().to_string()));
        }

        let conn = Connection::open(path.to_path_buf())
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        // Writes through this handle fail with SQLITE_READONLY.
        conn.call(|conn| conn.execute_batch("PRAGMA query_only = ON"))
            .await?;

        info!("Opened attendance database read-only: {}", path.display());
        Ok(Self {
            conn: Arc::new(conn),
        })
    }

    /// Verifies the expected schema is present, naming the first missing table.
    pub async fn check_schema(&self) -> Result<(), DatabaseError> {
        let tables = self.table_names().await?;
        for required in REQUIRED_TABLES {
            if !tables.iter().any(|t| t == required) {
                return Err(DatabaseError::TableMissing(required.to_string()));
            }
        }
        Ok(())
    }

    async fn table_names(&self) -> Result<Vec<String>, DatabaseError> {
        let names = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master
                     WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
                     ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

                let mut names = Vec::new();
                for row in rows {
                    names.push(row?);
                }
                Ok(names)
            })
            .await?;

        Ok(names)
    }

    /// Table names paired with row counts, for the connectivity check endpoint.
    pub async fn table_counts(&self) -> Result<Vec<(String, i64)>, DatabaseError> {
        let names = self.table_names().await?;
        let counts = self
            .conn
            .call(move |conn| {
                let mut counts = Vec::with_capacity(names.len());
                for name in names {
                    let count: i64 = conn.query_row(
                        &format!("SELECT COUNT(*) FROM \"{}\"", name),
                        [],
                        |row| row.get(0),
                    )?;
                    counts.push((name, count));
                }
                Ok(counts)
            })
            .await?;

        Ok(counts)
    }

    /// A few employee rows as key-value mappings, for the connectivity check.
    pub async fn employees_sample(&self, limit: i64) -> Result<Vec<Value>, DatabaseError> {
        self.check_schema().await?;
        let rows = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, department, position, hire_date
                     FROM employees ORDER BY id LIMIT ?",
                )?;
                let rows = stmt.query_map([limit], |row| {
                    Ok(json!({
                        "id": row.get::<_, i64>(0)?,
                        "name": row.get::<_, String>(1)?,
                        "department": row.get::<_, String>(2)?,
                        "position": row.get::<_, String>(3)?,
                        "hire_date": row.get::<_, String>(4)?,
                    }))
                })?;

                let mut sample = Vec::new();
                for row in rows {
                    sample.push(row?);
                }
                Ok(sample)
            })
            .await?;

        Ok(rows)
    }

    /// Plain-text snapshot of the whole database for prompting: employee
    /// roster, departments, and a per-employee attendance summary.
    pub async fn snapshot(&self) -> Result<String, DatabaseError> {
        self.check_schema().await?;
        let snapshot = self
            .conn
            .call(|conn| {
                let mut out = String::new();

                out.push_str("=== EMPLOYEES ===\nid | name | department | position | hire_date\n");
                let mut stmt = conn.prepare(
                    "SELECT id, name, department, position, hire_date
                     FROM employees ORDER BY id",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok(format!(
                        "{} | {} | {} | {} | {}",
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                })?;
                for row in rows {
                    out.push_str(&row?);
                    out.push('\n');
                }

                out.push_str("\n=== DEPARTMENTS ===\nname | manager | location\n");
                let mut stmt = conn.prepare(
                    "SELECT name, COALESCE(manager, ''), COALESCE(location, '')
                     FROM departments ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok(format!(
                        "{} | {} | {}",
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                })?;
                for row in rows {
                    out.push_str(&row?);
                    out.push('\n');
                }

                out.push_str(
                    "\n=== ATTENDANCE SUMMARY ===\n\
                     employee | days_present | days_absent | avg_hours_when_present\n",
                );
                let mut stmt = conn.prepare(
                    "SELECT e.name,
                            SUM(CASE WHEN a.status = 'Present' THEN 1 ELSE 0 END),
                            SUM(CASE WHEN a.status = 'Absent' THEN 1 ELSE 0 END),
                            ROUND(COALESCE(AVG(CASE WHEN a.status = 'Present'
                                                    THEN a.hours_worked END), 0), 2)
                     FROM employees e
                     LEFT JOIN attendance a ON a.employee_id = e.id
                     GROUP BY e.id
                     ORDER BY e.id",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok(format!(
                        "{} | {} | {} | {}",
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, f64>(3)?,
                    ))
                })?;
                for row in rows {
                    out.push_str(&row?);
                    out.push('\n');
                }

                Ok(out)
            })
            .await?;

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::seed_sample_database;

    fn temp_db_path(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!(
            "attendance-agent-test-{}-{}.db",
            tag,
            std::process::id()
        ))
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let err = AttendanceDb::open_read_only("no-such-attendance.db")
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Missing(_)));
    }

    #[tokio::test]
    async fn seeded_database_snapshot_and_counts() {
        let path = temp_db_path("snapshot");
        seed_sample_database(&path).unwrap();

        let db = AttendanceDb::open_read_only(&path).await.unwrap();
        db.check_schema().await.unwrap();

        let counts = db.table_counts().await.unwrap();
        let employees = counts.iter().find(|(name, _)| name == "employees").unwrap();
        assert_eq!(employees.1, 10);
        let departments = counts
            .iter()
            .find(|(name, _)| name == "departments")
            .unwrap();
        assert_eq!(departments.1, 5);

        let snapshot = db.snapshot().await.unwrap();
        assert!(snapshot.contains("=== EMPLOYEES ==="));
        assert!(snapshot.contains("=== ATTENDANCE SUMMARY ==="));
        assert!(snapshot.contains("Ahmed Ali Hassan"));

        let sample = db.employees_sample(3).await.unwrap();
        assert_eq!(sample.len(), 3);
        assert_eq!(sample[0]["id"], 1);

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn read_only_handle_rejects_writes() {
        let path = temp_db_path("readonly");
        seed_sample_database(&path).unwrap();

        let db = AttendanceDb::open_read_only(&path).await.unwrap();
        let result = db
            .conn
            .call(|conn| {
                conn.execute(
                    "INSERT INTO departments (name, manager, location) VALUES ('X', 'Y', 'Z')",
                    [],
                )
            })
            .await;
        assert!(result.is_err());

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn schema_check_names_missing_table() {
        let path = temp_db_path("schema");
        std::fs::remove_file(&path).ok();
        {
            let conn = rusqlite::Connection::open(&path).unwrap();
            conn.execute_batch("CREATE TABLE employees (id INTEGER PRIMARY KEY)")
                .unwrap();
        }

        let db = AttendanceDb::open_read_only(&path).await.unwrap();
        let err = db.check_schema().await.unwrap_err();
        assert!(matches!(err, DatabaseError::TableMissing(t) if t == "attendance"));

        std::fs::remove_file(&path).ok();
    }
}
