use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};

use crate::app::{Result, TreadError};
use crate::domain::{Entry, Feed, FeedUpdate, Item};
use crate::store::{FeedCounts, MergeStats, Store};

const FEED_COLUMNS: &str = "id, url, name, main_url, description, last_refresh";
const ITEM_COLUMNS: &str = "id, feed_id, guid, title, url, date, content, read, starred";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
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
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        migrations.to_latest(&mut conn)?;

        Ok(())
    }

    /// Run raw SQL against the connection, for tests that need a broken or
    /// read-only database.
    #[cfg(test)]
    pub(crate) fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn()?.execute_batch(sql)?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            TreadError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    /// Dates are stored as UTC RFC 3339 with a `Z` suffix so that text
    /// ordering matches chronological ordering.
    fn format_datetime(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }

    fn feed_from_row(row: &Row<'_>) -> rusqlite::Result<Feed> {
        Ok(Feed {
            id: row.get(0)?,
            url: row.get(1)?,
            name: row.get(2)?,
            main_url: row.get(3)?,
            description: row.get(4)?,
            last_refresh: row
                .get::<_, Option<String>>(5)?
                .and_then(|s| Self::parse_datetime(&s)),
        })
    }

    fn item_from_row(row: &Row<'_>) -> rusqlite::Result<Item> {
        Ok(Item {
            id: row.get(0)?,
            feed_id: row.get(1)?,
            guid: row.get(2)?,
            title: row.get(3)?,
            url: row.get(4)?,
            date: row
                .get::<_, String>(5)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
            content: row.get(6)?,
            read: row.get::<_, i32>(7)? != 0,
            starred: row.get::<_, i32>(8)? != 0,
        })
    }
}

impl Store for SqliteStore {
    fn add_feed(&self, feed: &Feed) -> Result<i64> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO feeds (url, name, main_url, description, last_refresh)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                feed.url,
                feed.name,
                feed.main_url,
                feed.description,
                feed.last_refresh.as_ref().map(Self::format_datetime)
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    fn get_feed(&self, id: i64) -> Result<Option<Feed>> {
        let conn = self.conn()?;

        let result = conn
            .query_row(
                &format!("SELECT {FEED_COLUMNS} FROM feeds WHERE id = ?1"),
                params![id],
                Self::feed_from_row,
            )
            .optional()?;

        Ok(result)
    }

    fn get_feed_by_url(&self, url: &str) -> Result<Option<Feed>> {
        let conn = self.conn()?;

        let result = conn
            .query_row(
                &format!("SELECT {FEED_COLUMNS} FROM feeds WHERE url = ?1"),
                params![url],
                Self::feed_from_row,
            )
            .optional()?;

        Ok(result)
    }

    fn set_feed_name(&self, id: i64, name: &str) -> Result<()> {
        let conn = self.conn()?;

        let changed = conn.execute(
            "UPDATE feeds SET name = ?1 WHERE id = ?2",
            params![name, id],
        )?;
        if changed == 0 {
            return Err(TreadError::FeedNotFound(id.to_string()));
        }

        Ok(())
    }

    fn update_feed(&self, id: i64, update: &FeedUpdate) -> Result<()> {
        let conn = self.conn()?;

        if let Some(ref main_url) = update.main_url {
            conn.execute(
                "UPDATE feeds SET main_url = ?1 WHERE id = ?2",
                params![main_url, id],
            )?;
        }
        if let Some(ref description) = update.description {
            conn.execute(
                "UPDATE feeds SET description = ?1 WHERE id = ?2",
                params![description, id],
            )?;
        }
        if let Some(ref last_refresh) = update.last_refresh {
            conn.execute(
                "UPDATE feeds SET last_refresh = ?1 WHERE id = ?2",
                params![Self::format_datetime(last_refresh), id],
            )?;
        }

        Ok(())
    }

    fn feed_counts(&self, feed_id: i64) -> Result<FeedCounts> {
        let conn = self.conn()?;

        let counts = conn.query_row(
            "SELECT COALESCE(SUM(read = 0), 0), COALESCE(SUM(starred != 0), 0)
             FROM items WHERE feed_id = ?1",
            params![feed_id],
            |row| {
                Ok(FeedCounts {
                    unread: row.get(0)?,
                    starred: row.get(1)?,
                })
            },
        )?;

        Ok(counts)
    }

    fn get_item(&self, id: i64) -> Result<Option<Item>> {
        let conn = self.conn()?;

        let result = conn
            .query_row(
                &format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"),
                params![id],
                Self::item_from_row,
            )
            .optional()?;

        Ok(result)
    }

    fn find_item(&self, feed_id: i64, guid: &str) -> Result<Option<Item>> {
        let conn = self.conn()?;

        let result = conn
            .query_row(
                &format!("SELECT {ITEM_COLUMNS} FROM items WHERE feed_id = ?1 AND guid = ?2"),
                params![feed_id, guid],
                Self::item_from_row,
            )
            .optional()?;

        Ok(result)
    }

    fn get_items_by_feed(&self, feed_id: i64) -> Result<Vec<Item>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE feed_id = ?1 ORDER BY date DESC, id DESC"
        ))?;

        let items = stmt
            .query_map(params![feed_id], Self::item_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(items)
    }

    fn merge_entries(
        &self,
        feed_id: i64,
        entries: &[Entry],
        now: DateTime<Utc>,
    ) -> Result<MergeStats> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut stats = MergeStats::default();

        for entry in entries {
            let existing: Option<i64> = tx
                .query_row(
                    "SELECT id FROM items WHERE feed_id = ?1 AND guid = ?2",
                    params![feed_id, entry.guid],
                    |row| row.get(0),
                )
                .optional()?;

            let date = entry.date.as_ref().map(Self::format_datetime);

            match existing {
                Some(id) => {
                    // read/starred are left alone on purpose
                    tx.execute(
                        "UPDATE items SET title = ?1, url = ?2, date = COALESCE(?3, date), content = ?4
                         WHERE id = ?5",
                        params![entry.title, entry.url, date, entry.content, id],
                    )?;
                    stats.updated += 1;
                }
                None => {
                    tx.execute(
                        "INSERT INTO items (feed_id, guid, title, url, date, content)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                        params![
                            feed_id,
                            entry.guid,
                            entry.title,
                            entry.url,
                            date.unwrap_or_else(|| Self::format_datetime(&now)),
                            entry.content
                        ],
                    )?;
                    stats.inserted += 1;
                }
            }
        }

        tx.commit()?;
        Ok(stats)
    }

    fn set_read(&self, item_id: i64, read: bool) -> Result<()> {
        let conn = self.conn()?;

        let changed = conn.execute(
            "UPDATE items SET read = ?1 WHERE id = ?2",
            params![read as i32, item_id],
        )?;
        if changed == 0 {
            return Err(TreadError::ItemNotFound(item_id));
        }

        Ok(())
    }

    fn set_starred(&self, item_id: i64, starred: bool) -> Result<()> {
        let conn = self.conn()?;

        let changed = conn.execute(
            "UPDATE items SET starred = ?1 WHERE id = ?2",
            params![starred as i32, item_id],
        )?;
        if changed == 0 {
            return Err(TreadError::ItemNotFound(item_id));
        }

        Ok(())
    }
}
