//! Live snapshot queries over the local store

use libsql::Connection;
use tokio::sync::watch;

use super::LocalStore;
use crate::db::{
    ChatRepository, HistoryRepository, LibSqlChatRepository, LibSqlHistoryRepository,
    LibSqlTaskRepository, LibSqlVehicleRepository, TaskRepository, VehicleRepository,
};
use crate::error::{Error, Result};
use crate::models::{ChatMessage, ConversationId, MaintenanceRecord, MaintenanceTask, Vehicle, VehicleId};

/// Tables whose commits wake subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Vehicles,
    Tasks,
    History,
    Chat,
}

/// Per-table commit counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableVersions {
    vehicles: u64,
    tasks: u64,
    history: u64,
    chat: u64,
}

impl TableVersions {
    pub(crate) const fn get(self, table: Table) -> u64 {
        match table {
            Table::Vehicles => self.vehicles,
            Table::Tasks => self.tasks,
            Table::History => self.history,
            Table::Chat => self.chat,
        }
    }

    pub(crate) fn bump(&mut self, table: Table) {
        let slot = match table {
            Table::Vehicles => &mut self.vehicles,
            Table::Tasks => &mut self.tasks,
            Table::History => &mut self.history,
            Table::Chat => &mut self.chat,
        };
        *slot = slot.wrapping_add(1);
    }
}

/// A query whose full result set is re-emitted after each change
#[allow(async_fn_in_trait)]
pub trait SnapshotQuery {
    type Item;

    /// Table this query reads from
    fn table(&self) -> Table;

    /// Read the current result set
    async fn fetch(&self, conn: &Connection) -> Result<Vec<Self::Item>>;
}

/// Every vehicle, oldest first
#[derive(Debug, Clone, Copy)]
pub struct AllVehicles;

/// Visible tasks of one vehicle
#[derive(Debug, Clone, Copy)]
pub struct VehicleTasks(pub VehicleId);

/// History records of one vehicle
#[derive(Debug, Clone, Copy)]
pub struct VehicleHistory(pub VehicleId);

/// Messages of one conversation
#[derive(Debug, Clone, Copy)]
pub struct Conversation(pub ConversationId);

impl SnapshotQuery for AllVehicles {
    type Item = Vehicle;

    fn table(&self) -> Table {
        Table::Vehicles
    }

    async fn fetch(&self, conn: &Connection) -> Result<Vec<Vehicle>> {
        LibSqlVehicleRepository::new(conn).list().await
    }
}

impl SnapshotQuery for VehicleTasks {
    type Item = MaintenanceTask;

    fn table(&self) -> Table {
        Table::Tasks
    }

    async fn fetch(&self, conn: &Connection) -> Result<Vec<MaintenanceTask>> {
        LibSqlTaskRepository::new(conn).list_for_vehicle(&self.0).await
    }
}

impl SnapshotQuery for VehicleHistory {
    type Item = MaintenanceRecord;

    fn table(&self) -> Table {
        Table::History
    }

    async fn fetch(&self, conn: &Connection) -> Result<Vec<MaintenanceRecord>> {
        LibSqlHistoryRepository::new(conn).list_for_vehicle(&self.0).await
    }
}

impl SnapshotQuery for Conversation {
    type Item = ChatMessage;

    fn table(&self) -> Table {
        Table::Chat
    }

    async fn fetch(&self, conn: &Connection) -> Result<Vec<ChatMessage>> {
        LibSqlChatRepository::new(conn).list_conversation(&self.0).await
    }
}

/// Stream of snapshots for one query.
///
/// The first `next()` resolves immediately. Later calls wait for a commit to
/// the query's table; several commits between two calls collapse into one
/// snapshot of the latest state.
pub struct Subscription<Q: SnapshotQuery> {
    store: LocalStore,
    query: Q,
    changes: watch::Receiver<TableVersions>,
    seen: Option<u64>,
}

impl<Q: SnapshotQuery> Subscription<Q> {
    pub(crate) fn new(store: LocalStore, query: Q) -> Self {
        let changes = store.changes.subscribe();
        Self {
            store,
            query,
            changes,
            seen: None,
        }
    }

    /// Wait for the next snapshot
    pub async fn next(&mut self) -> Result<Vec<Q::Item>> {
        let table = self.query.table();
        if let Some(seen) = self.seen {
            loop {
                if self.changes.borrow_and_update().get(table) != seen {
                    break;
                }
                self.changes
                    .changed()
                    .await
                    .map_err(|_| Error::Database("local store closed".into()))?;
            }
        }

        // Writers bump under the same lock, so the version matches the rows read
        let db = self.store.db.lock().await;
        let version = self.changes.borrow_and_update().get(table);
        let snapshot = self.query.fetch(db.connection()).await?;
        self.seen = Some(version);
        Ok(snapshot)
    }
}
