use crate::error::CatalogError;
use crate::search::filter::Filter;
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode};
use std::path::{Path, PathBuf};
use super::data::{Facets, Record};

/// Outcome of inserting one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insert {
    Added(i64),
    /// A record with the same brand, model and type already exists
    Duplicate,
}

/// The Library manages the SQLite catalog database.
/// It stores catalog records and answers filter queries against them.
pub struct Library {
    conn: Connection,
    db_path: PathBuf,
}

impl Library {
    /// Open (or create) the catalog at `db_path` and initialize the schema.
    pub fn open(db_path: &Path) -> Result<Self, CatalogError> {
        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        tracing::debug!("Catalog opened at {}", db_path.display());

        let mut library = Library {
            conn,
            db_path: db_path.to_path_buf(),
        };
        library.init_schema()?;

        Ok(library)
    }

    /// Private in-memory catalog (tests, scratch use)
    pub fn open_in_memory() -> Result<Self, CatalogError> {
        let mut library = Library {
            conn: Connection::open_in_memory()?,
            db_path: PathBuf::from(":memory:"),
        };
        library.init_schema()?;
        Ok(library)
    }

    /// Initialize the database schema.
    /// Creates all necessary tables and indexes if they don't exist.
    fn init_schema(&mut self) -> Result<(), CatalogError> {
        // Fixed columns are the ones filters touch; everything else is JSON
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS items (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                brand           TEXT NOT NULL,
                model           TEXT NOT NULL,
                type            TEXT,
                fields_json     TEXT NOT NULL DEFAULT '{}',
                imported_at     INTEGER NOT NULL
            )",
            [],
        )?;

        // Duplicate detection on import (NULL type counts as one value).
        // Case-insensitive, matching how filters compare values.
        self.conn.execute("DROP INDEX IF EXISTS idx_items_identity", [])?;
        self.conn.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_items_identity_nocase
             ON items(brand COLLATE NOCASE, model COLLATE NOCASE, IFNULL(type, '') COLLATE NOCASE)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_items_brand
             ON items(brand COLLATE NOCASE)",
            [],
        )?;

        tracing::debug!("Catalog schema initialized");

        Ok(())
    }

    /// Get a count of records in the catalog
    pub fn item_count(&self) -> Result<i64, CatalogError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Insert one record, reporting duplicates instead of failing on them.
    pub fn insert_record(&self, record: &Record) -> Result<Insert, CatalogError> {
        let fields_json = serde_json::to_string(&record.fields)
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        let result = self.conn.execute(
            "INSERT INTO items (brand, model, type, fields_json, imported_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                &record.brand,
                &record.model,
                record.kind.as_deref(),
                &fields_json,
                Utc::now().timestamp(),
            ],
        );

        match result {
            Ok(_) => Ok(Insert::Added(self.conn.last_insert_rowid())),
            // UNIQUE constraint violation means the record is already there
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Ok(Insert::Duplicate)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Insert a batch of records atomically, returning (imported, skipped duplicates).
    ///
    /// Any error rolls the whole batch back.
    pub fn insert_batch(&self, records: &[Record]) -> Result<(usize, usize), CatalogError> {
        let tx = self.conn.unchecked_transaction()?;
        let mut imported = 0;
        let mut skipped = 0;
        for record in records {
            match self.insert_record(record)? {
                Insert::Added(_) => imported += 1,
                Insert::Duplicate => skipped += 1,
            }
        }
        tx.commit()?;
        Ok((imported, skipped))
    }

    /// Answer a structured filter with the matching records, in insertion order.
    ///
    /// - brand / type: case-insensitive exact match
    /// - search: case-insensitive substring of model
    ///
    /// Case folding is ASCII-only (SQLite NOCASE / lower()).
    pub fn find(&self, filter: &Filter) -> Result<Vec<Record>, CatalogError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, brand, model, type, fields_json FROM items
             WHERE (?1 IS NULL OR brand = ?1 COLLATE NOCASE)
               AND (?2 IS NULL OR type = ?2 COLLATE NOCASE)
               AND (?3 IS NULL OR instr(lower(model), lower(?3)) > 0)
             ORDER BY id",
        )?;

        let rows = stmt.query_map(
            params![
                filter.brand.as_deref(),
                filter.kind.as_deref(),
                filter.search.as_deref(),
            ],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, String>(4)?,
                ))
            },
        )?;

        let mut records = Vec::new();
        for row in rows {
            let (id, brand, model, kind, fields_json) = row?;
            let fields = serde_json::from_str(&fields_json).map_err(|e| {
                CatalogError::Malformed {
                    id,
                    reason: e.to_string(),
                }
            })?;
            records.push(Record {
                brand,
                model,
                kind,
                fields,
            });
        }

        Ok(records)
    }

    /// Distinct brands in first-seen order, case-insensitively; the first
    /// spelling seen wins
    pub fn brands(&self) -> Result<Vec<String>, CatalogError> {
        self.distinct(
            "SELECT brand, MIN(id) AS first_id FROM items
             GROUP BY brand COLLATE NOCASE ORDER BY first_id",
        )
    }

    /// Distinct types in first-seen order (records without a type are skipped)
    pub fn types(&self) -> Result<Vec<String>, CatalogError> {
        self.distinct(
            "SELECT type, MIN(id) AS first_id FROM items WHERE type IS NOT NULL
             GROUP BY type COLLATE NOCASE ORDER BY first_id",
        )
    }

    pub fn facets(&self) -> Result<Facets, CatalogError> {
        Ok(Facets {
            brands: self.brands()?,
            types: self.types()?,
        })
    }

    fn distinct(&self, sql: &str) -> Result<Vec<String>, CatalogError> {
        let mut stmt = self.conn.prepare(sql)?;
        let values = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(values)
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("db_path", &self.db_path)
            .finish()
    }
}

/// Run a query on a background thread.
///
/// rusqlite::Connection is not Send, so every dispatch opens its own
/// connection instead of sharing the UI's.
pub async fn find_async(db_path: PathBuf, filter: Filter) -> Result<Vec<Record>, CatalogError> {
    tokio::task::spawn_blocking(move || Library::open(&db_path)?.find(&filter))
        .await
        .map_err(|e| CatalogError::Transport(format!("query task failed: {e}")))?
}

/// Load the dropdown facets on a background thread.
pub async fn load_facets_async(db_path: PathBuf) -> Result<Facets, CatalogError> {
    tokio::task::spawn_blocking(move || Library::open(&db_path)?.facets())
        .await
        .map_err(|e| CatalogError::Transport(format!("facet task failed: {e}")))?
}
