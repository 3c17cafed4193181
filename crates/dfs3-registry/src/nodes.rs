//! Node registry: the durable record of every node this node has observed
//! via `node_registered`/`node_status` events, backed by SQLite with two
//! independent read-through caches mirroring the original's
//! `_node_cache`/`_public_key_cache` split in `core/nodes.py`.

use std::convert::TryFrom;
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};

use dfs3_types::{NodeEntry, NodeId, NodeRecord};

use crate::cache::TtlLruCache;
use crate::errors::RegistryError;
use crate::schema;

const NODE_CACHE_CAPACITY: usize = 256;
const PUBLIC_KEY_CACHE_CAPACITY: usize = 256;

pub struct NodeRegistry {
    conn: Mutex<Connection>,
    node_cache: Mutex<TtlLruCache<NodeId, NodeRecord>>,
    public_key_cache: Mutex<TtlLruCache<NodeId, String>>,
}

impl NodeRegistry {
    pub fn open(conn: Connection) -> Result<Self, RegistryError> {
        schema::init_nodes_and_users(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            node_cache: Mutex::new(TtlLruCache::new(NODE_CACHE_CAPACITY, None)),
            public_key_cache: Mutex::new(TtlLruCache::new(PUBLIC_KEY_CACHE_CAPACITY, None)),
        })
    }

    /// Upserts a node's full record, replacing every field. Matches
    /// `core/nodes.py: save()`'s `INSERT ... ON CONFLICT DO UPDATE` over
    /// the whole row rather than a partial update.
    pub fn save(&self, record: &NodeRecord) -> Result<(), RegistryError> {
        self.invalidate(&record.node_id);

        let tags = serde_json::to_string(&record.tags)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO nodes (
                node_id, alias, hostname, public_key, platform, software_version,
                uptime, total_space, ip, port, tags, creation_date, version, last_seen
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ON CONFLICT(node_id) DO UPDATE SET
                alias = excluded.alias,
                hostname = excluded.hostname,
                public_key = excluded.public_key,
                platform = excluded.platform,
                software_version = excluded.software_version,
                uptime = excluded.uptime,
                total_space = excluded.total_space,
                ip = excluded.ip,
                port = excluded.port,
                tags = excluded.tags,
                creation_date = excluded.creation_date,
                version = excluded.version,
                last_seen = excluded.last_seen
            "#,
            params![
                record.node_id.as_str(),
                record.alias.as_str(),
                record.hostname.as_str(),
                record.public_key,
                record.platform,
                record.software_version,
                record.uptime as i64,
                record.total_space as i64,
                record.ip.to_string(),
                record.port as i64,
                tags,
                record.creation_date,
                record.version as i64,
                record.last_seen,
            ],
        )?;
        Ok(())
    }

    /// Applies a `node_status` heartbeat: uptime, total space and
    /// last-seen only. A status update for a node this registry has never
    /// seen is logged and dropped, not treated as an error — the node's
    /// own `node_registered` event may simply not have arrived yet.
    pub fn update_status(
        &self,
        node_id: &NodeId,
        uptime: u64,
        total_space: u64,
        last_seen: i64,
    ) -> Result<(), RegistryError> {
        self.invalidate(node_id);

        let rows = {
            let conn = self.conn.lock().unwrap();
            conn.execute(
                "UPDATE nodes SET uptime = ?1, total_space = ?2, last_seen = ?3 WHERE node_id = ?4",
                params![uptime as i64, total_space as i64, last_seen, node_id.as_str()],
            )?
        };

        if rows == 0 {
            tracing::warn!(node_id = %node_id, "node_status for unknown node, ignoring");
        }
        Ok(())
    }

    pub fn get(&self, node_id: &NodeId) -> Result<Option<NodeRecord>, RegistryError> {
        if let Some(hit) = self.node_cache.lock().unwrap().get(node_id) {
            return Ok(Some(hit));
        }

        let conn = self.conn.lock().unwrap();
        let record = conn
            .query_row(
                r#"SELECT node_id, alias, hostname, public_key, platform, software_version,
                          uptime, total_space, ip, port, tags, creation_date, version, last_seen
                   FROM nodes WHERE node_id = ?1"#,
                params![node_id.as_str()],
                row_to_record,
            )
            .optional()?;
        drop(conn);

        if let Some(ref record) = record {
            self.node_cache
                .lock()
                .unwrap()
                .put(node_id.clone(), record.clone());
        }
        Ok(record)
    }

    pub fn get_public_key(&self, node_id: &NodeId) -> Result<Option<String>, RegistryError> {
        if let Some(hit) = self.public_key_cache.lock().unwrap().get(node_id) {
            return Ok(Some(hit));
        }

        let conn = self.conn.lock().unwrap();
        let key: Option<String> = conn
            .query_row(
                "SELECT public_key FROM nodes WHERE node_id = ?1",
                params![node_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        drop(conn);

        if let Some(ref key) = key {
            self.public_key_cache
                .lock()
                .unwrap()
                .put(node_id.clone(), key.clone());
        }
        Ok(key)
    }

    /// The minimal alias/public-key listing the node directory endpoint
    /// serves, per `core/nodes.py: list_nodes()`.
    pub fn list_nodes(&self) -> Result<Vec<NodeEntry>, RegistryError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT node_id, alias, public_key FROM nodes ORDER BY node_id")?;
        let rows = stmt.query_map([], |row| {
            let node_id: String = row.get(0)?;
            let alias: String = row.get(1)?;
            let public_key: String = row.get(2)?;
            Ok((node_id, alias, public_key))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (node_id, alias, public_key) = row?;
            entries.push(NodeEntry {
                node_id: NodeId::try_from(node_id).map_err(|e| RegistryError::InvalidId(e.to_string()))?,
                alias: dfs3_types::Alias::try_from(alias)
                    .map_err(|e| RegistryError::InvalidId(e.to_string()))?,
                public_key,
            });
        }
        Ok(entries)
    }

    fn invalidate(&self, node_id: &NodeId) {
        self.node_cache.lock().unwrap().invalidate(node_id);
        self.public_key_cache.lock().unwrap().invalidate(node_id);
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<NodeRecord> {
    let node_id: String = row.get(0)?;
    let alias: String = row.get(1)?;
    let hostname: String = row.get(2)?;
    let public_key: String = row.get(3)?;
    let platform: String = row.get(4)?;
    let software_version: String = row.get(5)?;
    let uptime: i64 = row.get(6)?;
    let total_space: i64 = row.get(7)?;
    let ip: String = row.get(8)?;
    let port: i64 = row.get(9)?;
    let tags: String = row.get(10)?;
    let creation_date: i64 = row.get(11)?;
    let version: i64 = row.get(12)?;
    let last_seen: i64 = row.get(13)?;

    Ok(NodeRecord {
        node_id: NodeId::try_from(node_id).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?,
        alias: dfs3_types::Alias::try_from(alias).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?,
        hostname: dfs3_types::Hostname::try_from(hostname).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?,
        public_key,
        platform,
        software_version,
        uptime: uptime as u64,
        total_space: total_space as u64,
        ip: ip.parse().map_err(|_| {
            rusqlite::Error::InvalidColumnType(8, "ip".into(), rusqlite::types::Type::Text)
        })?,
        port: port as u16,
        tags: serde_json::from_str(&tags).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(10, rusqlite::types::Type::Text, Box::new(e))
        })?,
        creation_date,
        version: version as u32,
        last_seen,
    })
}
