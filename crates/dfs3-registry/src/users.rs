//! User registry: durable record of every `user_registered` event this
//! node has observed. Uses a single TTL-bounded cache (10 entries, 5
//! minute expiry) matching `core/users.py`'s `cachetools.TTLCache(
//! maxsize=10, ttl=300)` — deliberately smaller and shorter-lived than
//! the node registry's caches, since user lookups are far less frequent
//! than per-request node lookups.

use std::convert::TryFrom;
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};

use dfs3_types::{Alias, UserId, UserRecord};

use crate::cache::TtlLruCache;
use crate::errors::RegistryError;
use crate::schema;

const USER_CACHE_CAPACITY: usize = 10;
const USER_CACHE_TTL: Duration = Duration::from_secs(300);

pub struct UserRegistry {
    conn: Mutex<Connection>,
    cache: Mutex<TtlLruCache<UserId, UserRecord>>,
}

impl UserRegistry {
    pub fn open(conn: Connection) -> Result<Self, RegistryError> {
        schema::init_nodes_and_users(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            cache: Mutex::new(TtlLruCache::new(USER_CACHE_CAPACITY, Some(USER_CACHE_TTL))),
        })
    }

    /// Records a new user from a `user_registered` event. A duplicate
    /// registration for the same `user_id` (a replayed event) is silently
    /// ignored rather than treated as an error.
    pub fn register(&self, record: &UserRecord) -> Result<(), RegistryError> {
        self.cache.lock().unwrap().invalidate(&record.user_id);

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO users (user_id, alias, public_key, creation_date) VALUES (?1, ?2, ?3, ?4)",
            params![
                record.user_id.as_str(),
                record.alias.as_str(),
                record.public_key,
                record.creation_date,
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, user_id: &UserId) -> Result<Option<UserRecord>, RegistryError> {
        if let Some(hit) = self.cache.lock().unwrap().get(user_id) {
            return Ok(Some(hit));
        }

        let conn = self.conn.lock().unwrap();
        let record = conn
            .query_row(
                "SELECT user_id, alias, public_key, creation_date FROM users WHERE user_id = ?1",
                params![user_id.as_str()],
                row_to_record,
            )
            .optional()?;
        drop(conn);

        if let Some(ref record) = record {
            self.cache.lock().unwrap().put(user_id.clone(), record.clone());
        }
        Ok(record)
    }

    pub fn exists(&self, user_id: &UserId) -> Result<bool, RegistryError> {
        if self.cache.lock().unwrap().get(user_id).is_some() {
            return Ok(true);
        }
        let conn = self.conn.lock().unwrap();
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM users WHERE user_id = ?1",
                params![user_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn get_public_key(&self, user_id: &UserId) -> Result<Option<String>, RegistryError> {
        Ok(self.get(user_id)?.map(|record| record.public_key))
    }

    /// Full listing for the user directory endpoint. Bypasses the cache,
    /// same as `list_nodes()` does for the node registry.
    pub fn list_users(&self) -> Result<Vec<UserRecord>, RegistryError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT user_id, alias, public_key, creation_date FROM users ORDER BY user_id")?;
        let rows = stmt.query_map([], row_to_record)?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRecord> {
    let user_id: String = row.get(0)?;
    let alias: String = row.get(1)?;
    let public_key: String = row.get(2)?;
    let creation_date: i64 = row.get(3)?;

    Ok(UserRecord {
        user_id: UserId::try_from(user_id).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?,
        alias: Alias::try_from(alias).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?,
        public_key,
        creation_date,
    })
}
