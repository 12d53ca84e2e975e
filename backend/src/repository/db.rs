//! Database Connection and Setup
//!
//! Manages the SQLite connection and migrations.

use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{DomainError, DomainResult};

/// Shared connection handle
pub type SharedConnection = Arc<Mutex<Option<Connection>>>;

/// Database state wrapper
#[derive(Clone)]
pub struct DbState {
    pub conn: SharedConnection,
}

impl DbState {
    /// Close the connection; repositories sharing it report "Database not initialized" afterwards
    pub async fn close(&self) {
        self.conn.lock().await.take();
    }
}

impl From<rusqlite::Error> for DomainError {
    fn from(e: rusqlite::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

/// Current time, ms since epoch
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Open (or create) the database at `db_path`; ":memory:" opens a private in-memory database
pub async fn init_db(db_path: &Path) -> DomainResult<DbState> {
    let conn = if db_path.as_os_str() == ":memory:" {
        Connection::open_in_memory()?
    } else {
        if let Some(dir) = db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| {
                DomainError::Internal(format!("Failed to create {}: {}", dir.display(), e))
            })?;
        }
        Connection::open(db_path)?
    };

    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    run_migrations(&conn)?;
    log::info!("Database ready at {}", db_path.display());

    Ok(DbState {
        conn: Arc::new(Mutex::new(Some(conn))),
    })
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> DomainResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> DomainResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            level TEXT NOT NULL CHECK (level IN ('L', 'M', 'S')),
            parent_id INTEGER REFERENCES categories(id) ON DELETE RESTRICT,
            sort_order INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_categories_parent ON categories(level, parent_id, sort_order);

        CREATE TABLE IF NOT EXISTS materials (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            material_type TEXT NOT NULL DEFAULT 'sentence',
            text TEXT NOT NULL,
            translation_ko TEXT NOT NULL DEFAULT '',
            difficulty TEXT NOT NULL DEFAULT 'B',
            source_text TEXT,
            large_category_id INTEGER,
            medium_category_id INTEGER,
            small_category_id INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_materials_type_text ON materials(material_type, text);
        CREATE INDEX IF NOT EXISTS idx_materials_created ON materials(created_at DESC, id DESC);

        CREATE TABLE IF NOT EXISTS material_paths (
            material_id INTEGER NOT NULL REFERENCES materials(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            large_id INTEGER,
            medium_id INTEGER,
            small_id INTEGER,
            PRIMARY KEY (material_id, position)
        );

        CREATE TABLE IF NOT EXISTS material_categories (
            material_id INTEGER NOT NULL REFERENCES materials(id) ON DELETE CASCADE,
            level TEXT NOT NULL,
            category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE RESTRICT,
            position INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (material_id, level, category_id)
        );
        CREATE INDEX IF NOT EXISTS idx_material_categories_lookup ON material_categories(level, category_id);

        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            identifier TEXT NOT NULL UNIQUE,
            salt TEXT NOT NULL,
            secret_hash TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );",
    )?;

    // Databases created before difficulty / source existed
    if !column_exists(conn, "materials", "difficulty")? {
        conn.execute("ALTER TABLE materials ADD COLUMN difficulty TEXT NOT NULL DEFAULT 'B'", [])?;
    }
    if !column_exists(conn, "materials", "source_text")? {
        conn.execute("ALTER TABLE materials ADD COLUMN source_text TEXT", [])?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_in_memory_runs_migrations() {
        let db = init_db(Path::new(":memory:")).await.unwrap();
        let guard = db.conn.lock().await;
        let conn = guard.as_ref().unwrap();
        assert!(column_exists(conn, "materials", "source_text").unwrap());
        assert!(column_exists(conn, "categories", "sort_order").unwrap());
        assert!(!column_exists(conn, "categories", "color").unwrap());
        // Idempotent
        run_migrations(conn).unwrap();
    }

    #[tokio::test]
    async fn test_init_file_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("phrasebank.db");
        let db = init_db(&path).await.unwrap();
        assert!(path.exists());
        db.close().await;
        assert!(db.conn.lock().await.is_none());
    }
}
