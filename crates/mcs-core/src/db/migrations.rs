//! Database migrations
//!
//! Schema changes are destructive: when the stored version differs from
//! [`CURRENT_VERSION`] every table is dropped and recreated. Local data is a
//! cache of the backend plus pending edits, and losing it on upgrade is
//! accepted.

use libsql::Connection;

use crate::error::Result;

/// Current schema version
pub const CURRENT_VERSION: i32 = 1;

/// Tables owned by the schema, dropped on a version change
const TABLES: [&str; 5] = [
    "chat_messages",
    "maintenance_history",
    "maintenance_tasks",
    "vehicles",
    "schema_version",
];

const SCHEMA: [&str; 11] = [
    "CREATE TABLE schema_version (
        version INTEGER PRIMARY KEY
    )",
    "CREATE TABLE vehicles (
        id TEXT PRIMARY KEY,
        remote_id TEXT UNIQUE,
        brand TEXT NOT NULL,
        model TEXT NOT NULL,
        year INTEGER NOT NULL,
        plate TEXT,
        fuel_type TEXT NOT NULL,
        usage_type TEXT NOT NULL,
        is_current INTEGER NOT NULL DEFAULT 0,
        pending_sync INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )",
    // At most one row may carry the current flag
    "CREATE UNIQUE INDEX idx_vehicles_single_current ON vehicles(is_current) WHERE is_current = 1",
    "CREATE TABLE maintenance_tasks (
        id TEXT PRIMARY KEY,
        remote_id TEXT,
        vehicle_id TEXT NOT NULL,
        task_type TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT,
        due_at INTEGER,
        due_mileage INTEGER,
        severity TEXT NOT NULL DEFAULT 'MEDIUM',
        status TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        sync_state TEXT NOT NULL DEFAULT 'CLEAN'
    )",
    "CREATE INDEX idx_tasks_vehicle ON maintenance_tasks(vehicle_id, due_at)",
    "CREATE INDEX idx_tasks_sync_state ON maintenance_tasks(sync_state)",
    "CREATE TABLE maintenance_history (
        id TEXT PRIMARY KEY,
        remote_id TEXT,
        vehicle_id TEXT NOT NULL,
        task_type TEXT NOT NULL,
        serviced_at INTEGER NOT NULL,
        mileage INTEGER,
        cost REAL,
        workshop TEXT,
        notes TEXT
    )",
    "CREATE INDEX idx_history_vehicle ON maintenance_history(vehicle_id, serviced_at DESC)",
    "CREATE TABLE chat_messages (
        id TEXT PRIMARY KEY,
        conversation_id TEXT NOT NULL,
        role TEXT NOT NULL,
        content TEXT NOT NULL,
        sent_at INTEGER NOT NULL,
        pending_create INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE INDEX idx_chat_conversation ON chat_messages(conversation_id, sent_at)",
    "CREATE INDEX idx_chat_pending ON chat_messages(pending_create)",
];

/// Bring the schema to [`CURRENT_VERSION`]
pub async fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn).await?;
    if version == CURRENT_VERSION {
        return Ok(());
    }

    if version != 0 {
        tracing::warn!(
            "Schema version {version} does not match {CURRENT_VERSION}; recreating local tables"
        );
    }

    conn.execute("BEGIN TRANSACTION", ()).await?;

    let drops = TABLES.map(|table| format!("DROP TABLE IF EXISTS {table}"));
    let version_insert = format!("INSERT INTO schema_version (version) VALUES ({CURRENT_VERSION})");
    let statements = drops
        .iter()
        .map(String::as_str)
        .chain(SCHEMA)
        .chain(std::iter::once(version_insert.as_str()));

    for stmt in statements {
        if let Err(e) = conn.execute(stmt, ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    tracing::info!("Migrated database to version {CURRENT_VERSION}");
    Ok(())
}

/// Get the current schema version, 0 when no schema exists
async fn get_version(conn: &Connection) -> Result<i32> {
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists: bool = if let Some(row) = rows.next().await? {
        row.get::<i32>(0)? != 0
    } else {
        false
    };

    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    let version: i32 = if let Some(row) = rows.next().await? {
        row.get(0)?
    } else {
        0
    };

    Ok(version)
}
