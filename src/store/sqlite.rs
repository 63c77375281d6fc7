use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};
use rusqlite_migration::{Migrations, M};

use crate::app::{Result, TidingsError};
use crate::domain::FeedMetadata;
use crate::store::Store;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;
        migrations.to_latest(&mut conn)?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            TidingsError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }
}

impl Store for SqliteStore {
    fn get_feed_metadata(&self, feed_id: &str) -> Result<Option<FeedMetadata>> {
        let conn = self.conn()?;

        let result = conn
            .query_row(
                "SELECT feed_id, etag, last_modified, max_age, last_checked
                 FROM feeds WHERE feed_id = ?1",
                params![feed_id],
                |row| {
                    Ok(FeedMetadata {
                        feed_id: row.get(0)?,
                        etag: row.get::<_, Option<String>>(1)?.filter(|s| !s.is_empty()),
                        last_modified: row
                            .get::<_, Option<String>>(2)?
                            .filter(|s| !s.is_empty()),
                        max_age: u64::try_from(row.get::<_, i64>(3)?).unwrap_or(0),
                        last_checked: row.get(4)?,
                    })
                },
            )
            .optional()?;

        Ok(result)
    }

    fn upsert_feed_metadata(&self, metadata: &FeedMetadata) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO feeds (feed_id, etag, last_modified, max_age, last_checked)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(feed_id) DO UPDATE SET
                 etag = excluded.etag,
                 last_modified = excluded.last_modified,
                 max_age = excluded.max_age,
                 last_checked = excluded.last_checked",
            params![
                metadata.feed_id,
                metadata.etag,
                metadata.last_modified,
                i64::try_from(metadata.max_age).unwrap_or(i64::MAX),
                metadata.last_checked
            ],
        )?;

        Ok(())
    }

    fn is_new(&self, feed_id: &str, article_id: &str) -> Result<bool> {
        let conn = self.conn()?;

        let seen: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM articles WHERE feed_id = ?1 AND article_id = ?2 LIMIT 1",
                params![feed_id, article_id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(seen.is_none())
    }

    fn record(&self, feed_id: &str, article_id: &str) -> Result<bool> {
        let conn = self.conn()?;

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO articles (feed_id, article_id) VALUES (?1, ?2)",
            params![feed_id, article_id],
        )?;

        Ok(inserted > 0)
    }
}
