//! Local event index: the minimal per-event reference (`block_id`,
//! `event_type`, `timestamp`, `node_id`) every node keeps of what it has
//! already ingested, grounded in `core/events.py: save_event`/`list_events`
//! and the `events` table in `core/db_init.py`. `block_id` is the primary
//! key, so re-ingesting the same ledger block is a no-op constraint
//! violation rather than a double-apply — the mechanism behind dfs3's
//! exactly-once ingestion guarantee.

use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use dfs3_types::{BlockId, EventType, NodeId};

use crate::errors::EventError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventIndexEntry {
    pub block_id: BlockId,
    pub event_type: EventType,
    pub timestamp: i64,
    pub node_id: NodeId,
}

pub struct EventIndex {
    conn: Mutex<Connection>,
}

impl EventIndex {
    pub fn open(conn: Connection) -> Result<Self, EventError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                block_id   TEXT PRIMARY KEY,
                event_type TEXT NOT NULL CHECK (event_type IN (
                    'user_registered', 'user_joined_node', 'node_registered',
                    'node_status', 'file_created', 'file_deleted', 'file_shared',
                    'file_copied', 'file_replicated', 'file_renamed', 'file_accessed'
                )),
                timestamp  INTEGER NOT NULL,
                node_id    TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_events_event_type ON events(event_type);
            CREATE INDEX IF NOT EXISTS idx_events_node_id ON events(node_id);
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Records a newly-ingested event. Returns `Ok(false)` without error if
    /// `block_id` was already present, so callers can treat a duplicate
    /// delivery as a no-op rather than a failure.
    pub fn record(&self, entry: &EventIndexEntry) -> Result<bool, EventError> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "INSERT OR IGNORE INTO events (block_id, event_type, timestamp, node_id) VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.block_id.as_str(),
                entry.event_type.as_str(),
                entry.timestamp,
                entry.node_id.as_str(),
            ],
        )?;
        Ok(rows == 1)
    }

    pub fn contains(&self, block_id: &BlockId) -> Result<bool, EventError> {
        let conn = self.conn.lock().unwrap();
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM events WHERE block_id = ?1",
                params![block_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn get(&self, block_id: &BlockId) -> Result<Option<EventIndexEntry>, EventError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT block_id, event_type, timestamp, node_id FROM events WHERE block_id = ?1",
            params![block_id.as_str()],
            row_to_entry,
        )
        .optional()
        .map_err(EventError::from)
    }

    /// Every non-`node_status` event, plus only the latest `node_status`
    /// row per node, matching `core/events.py: list_events`'s `UNION` of a
    /// full scan with a per-node `MAX(rowid)` scan.
    pub fn list_events(&self) -> Result<Vec<EventIndexEntry>, EventError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT block_id, event_type, timestamp, node_id FROM events WHERE event_type <> 'node_status'
            UNION
            SELECT block_id, event_type, timestamp, node_id FROM events e1 JOIN (
                SELECT MAX(rowid) AS max_rowid FROM events WHERE event_type = 'node_status' GROUP BY node_id
            ) e2 ON e1.rowid = e2.max_rowid
            ORDER BY timestamp
            "#,
        )?;
        let rows = stmt.query_map([], row_to_entry)?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventIndexEntry> {
    use std::convert::TryFrom;

    let block_id: String = row.get(0)?;
    let event_type: String = row.get(1)?;
    let timestamp: i64 = row.get(2)?;
    let node_id: String = row.get(3)?;

    Ok(EventIndexEntry {
        block_id: BlockId::try_from(block_id).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?,
        event_type: parse_event_type(&event_type).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?,
        timestamp,
        node_id: NodeId::try_from(node_id).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?,
    })
}

fn parse_event_type(s: &str) -> Result<EventType, std::io::Error> {
    let value = serde_json::Value::String(s.to_string());
    serde_json::from_value(value).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryFrom;

    fn entry(block_id: &str, event_type: EventType, timestamp: i64, node_id: &str) -> EventIndexEntry {
        EventIndexEntry {
            block_id: BlockId::try_from(format!("0x{}", block_id.repeat(64))).unwrap(),
            event_type,
            timestamp,
            node_id: NodeId::try_from(node_id.repeat(64)).unwrap(),
        }
    }

    fn index() -> EventIndex {
        EventIndex::open(Connection::open_in_memory().unwrap()).unwrap()
    }

    #[test]
    fn record_then_contains_round_trips() {
        let index = index();
        let entry = entry("a", EventType::FileCreated, 100, "b");
        assert!(index.record(&entry).unwrap());
        assert!(index.contains(&entry.block_id).unwrap());
    }

    #[test]
    fn duplicate_record_is_reported_but_not_an_error() {
        let index = index();
        let entry = entry("a", EventType::FileCreated, 100, "b");
        assert!(index.record(&entry).unwrap());
        assert!(!index.record(&entry).unwrap());
    }

    #[test]
    fn list_events_keeps_only_latest_node_status_per_node() {
        let index = index();
        index.record(&entry("1", EventType::NodeStatus, 10, "n")).unwrap();
        index.record(&entry("2", EventType::NodeStatus, 20, "n")).unwrap();
        index.record(&entry("3", EventType::FileCreated, 30, "n")).unwrap();

        let events = index.list_events().unwrap();
        let status_events: Vec<_> = events.iter().filter(|e| e.event_type == EventType::NodeStatus).collect();
        assert_eq!(status_events.len(), 1);
        assert_eq!(status_events[0].timestamp, 20);
        assert_eq!(events.len(), 2);
    }
}
