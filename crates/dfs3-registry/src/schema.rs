//! Idempotent schema setup. A single `CREATE TABLE IF NOT EXISTS` block run
//! at startup stands in for the original's hand-run `db_init.py` script;
//! there is no separate migration framework.

use rusqlite::Connection;

pub fn init_nodes_and_users(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS nodes (
            node_id          TEXT PRIMARY KEY,
            alias            TEXT NOT NULL,
            hostname         TEXT NOT NULL,
            public_key       TEXT NOT NULL,
            platform         TEXT NOT NULL,
            software_version TEXT NOT NULL,
            uptime           INTEGER NOT NULL DEFAULT 0,
            total_space      INTEGER NOT NULL DEFAULT 0,
            ip               TEXT NOT NULL,
            port             INTEGER NOT NULL,
            tags             TEXT NOT NULL DEFAULT '[]',
            creation_date    INTEGER NOT NULL,
            version          INTEGER NOT NULL DEFAULT 1,
            last_seen        INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS users (
            user_id       TEXT PRIMARY KEY,
            alias         TEXT NOT NULL,
            public_key    TEXT NOT NULL,
            creation_date INTEGER NOT NULL
        );
        "#,
    )
}
