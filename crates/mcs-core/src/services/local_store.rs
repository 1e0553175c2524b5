//! Shared local store handle used by every client surface.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use super::subscription::{SnapshotQuery, Subscription, Table, TableVersions};
use crate::db::{
    ChatRepository, Database, HistoryRepository, LibSqlChatRepository, LibSqlHistoryRepository,
    LibSqlTaskRepository, LibSqlVehicleRepository, TaskRepository, VehicleRepository,
};
use crate::error::{Error, Result};
use crate::models::{
    ChatMessage, ConversationId, HistoryId, MaintenanceRecord, MaintenanceTask, MessageId,
    NewRecord, NewTask, NewVehicle, SyncState, TaskEdit, TaskId, Vehicle, VehicleId,
};
use crate::util::{next_edit_time, now_millis};

/// Thread-safe handle over the local database.
#[derive(Clone)]
pub struct LocalStore {
    pub(super) db: Arc<Mutex<Database>>,
    pub(super) changes: Arc<watch::Sender<TableVersions>>,
    db_path: Option<PathBuf>,
}

impl LocalStore {
    /// Open the store at the given filesystem path.
    ///
    /// A file that is not a database is moved aside and a fresh one created.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = match Database::open(&db_path).await {
            Ok(db) => db,
            Err(error) if is_corrupted_db_error(&error) => {
                tracing::warn!(
                    "Local database at {} is unreadable ({}). Moving it aside and starting fresh.",
                    db_path.display(),
                    error
                );
                quarantine_corrupted_db_files(&db_path)?;
                Database::open(&db_path).await?
            }
            Err(error) => return Err(error),
        };

        Ok(Self::from_database(db, Some(db_path)))
    }

    /// Open an in-memory store (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self::from_database(db, None))
    }

    fn from_database(db: Database, db_path: Option<PathBuf>) -> Self {
        let (changes, _) = watch::channel(TableVersions::default());
        Self {
            db: Arc::new(Mutex::new(db)),
            changes: Arc::new(changes),
            db_path,
        }
    }

    /// Path of the backing file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Subscribe to full snapshots of `query`.
    pub fn subscribe<Q: SnapshotQuery>(&self, query: Q) -> Subscription<Q> {
        Subscription::new(self.clone(), query)
    }

    fn committed(&self, table: Table) {
        self.changes.send_modify(|versions| versions.bump(table));
    }

    // Vehicles

    /// List every vehicle.
    pub async fn list_vehicles(&self) -> Result<Vec<Vehicle>> {
        let db = self.db.lock().await;
        LibSqlVehicleRepository::new(db.connection()).list().await
    }

    /// Fetch a vehicle by id.
    pub async fn get_vehicle(&self, id: &VehicleId) -> Result<Option<Vehicle>> {
        let db = self.db.lock().await;
        LibSqlVehicleRepository::new(db.connection()).get(id).await
    }

    /// The vehicle marked current, if any.
    pub async fn current_vehicle(&self) -> Result<Option<Vehicle>> {
        let db = self.db.lock().await;
        LibSqlVehicleRepository::new(db.connection()).current().await
    }

    /// Validate and store a new vehicle. The first vehicle becomes current.
    pub async fn add_vehicle(&self, input: NewVehicle) -> Result<Vehicle> {
        let mut vehicle = input.validate()?.into_vehicle(now_millis());

        let db = self.db.lock().await;
        let repo = LibSqlVehicleRepository::new(db.connection());
        vehicle.is_current = repo.current().await?.is_none();
        repo.insert(&vehicle).await?;
        self.committed(Table::Vehicles);
        tracing::debug!("Added vehicle {} ({})", vehicle.id, vehicle.display_name());
        Ok(vehicle)
    }

    /// Replace the editable fields of a vehicle.
    pub async fn update_vehicle(&self, id: &VehicleId, input: NewVehicle) -> Result<Vehicle> {
        let input = input.validate()?;

        let db = self.db.lock().await;
        let repo = LibSqlVehicleRepository::new(db.connection());
        let existing = repo
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Vehicle {id}")))?;
        let vehicle = Vehicle {
            brand: input.brand,
            model: input.model,
            year: input.year,
            plate: input.plate,
            fuel_type: input.fuel_type,
            usage_type: input.usage_type,
            pending_sync: true,
            updated_at: next_edit_time(existing.updated_at),
            ..existing
        };
        repo.update(&vehicle).await?;
        self.committed(Table::Vehicles);
        Ok(vehicle)
    }

    /// Make `id` the only current vehicle.
    pub async fn set_current_vehicle(&self, id: &VehicleId) -> Result<Vehicle> {
        let db = self.db.lock().await;
        let repo = LibSqlVehicleRepository::new(db.connection());
        repo.set_current(id).await?;

        let mut vehicle = repo
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Vehicle {id}")))?;
        // Push the selection with the next sync
        vehicle.pending_sync = true;
        vehicle.updated_at = next_edit_time(vehicle.updated_at);
        repo.update(&vehicle).await?;
        self.committed(Table::Vehicles);
        Ok(vehicle)
    }

    /// Remove a vehicle with its tasks and history.
    pub async fn delete_vehicle(&self, id: &VehicleId) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlVehicleRepository::new(db.connection())
            .delete(id)
            .await?;
        self.committed(Table::Vehicles);
        self.committed(Table::Tasks);
        self.committed(Table::History);
        Ok(())
    }

    // Maintenance tasks

    /// Tasks of a vehicle, hiding rows awaiting remote deletion.
    pub async fn list_tasks(&self, vehicle_id: &VehicleId) -> Result<Vec<MaintenanceTask>> {
        let db = self.db.lock().await;
        LibSqlTaskRepository::new(db.connection())
            .list_for_vehicle(vehicle_id)
            .await
    }

    /// Every task row regardless of state.
    pub async fn list_all_tasks(&self) -> Result<Vec<MaintenanceTask>> {
        let db = self.db.lock().await;
        LibSqlTaskRepository::new(db.connection()).list_all().await
    }

    /// Fetch a task by id.
    pub async fn get_task(&self, id: &TaskId) -> Result<Option<MaintenanceTask>> {
        let db = self.db.lock().await;
        LibSqlTaskRepository::new(db.connection()).get(id).await
    }

    /// Validate and store a new task as pending creation.
    pub async fn add_task(&self, input: NewTask) -> Result<MaintenanceTask> {
        let input = input.validate()?;

        let db = self.db.lock().await;
        if LibSqlVehicleRepository::new(db.connection())
            .get(&input.vehicle_id)
            .await?
            .is_none()
        {
            return Err(Error::NotFound(format!("Vehicle {}", input.vehicle_id)));
        }

        let task = input.into_task(now_millis());
        LibSqlTaskRepository::new(db.connection())
            .insert(&task)
            .await?;
        self.committed(Table::Tasks);
        Ok(task)
    }

    /// Apply an edit to a task.
    pub async fn edit_task(&self, id: &TaskId, edit: TaskEdit) -> Result<MaintenanceTask> {
        let edit = edit.validate()?;
        self.modify_task(id, |task, now| task.apply_edit(edit, now))
            .await
    }

    /// Mark a task completed.
    pub async fn complete_task(&self, id: &TaskId) -> Result<MaintenanceTask> {
        self.modify_task(id, MaintenanceTask::complete).await
    }

    async fn modify_task(
        &self,
        id: &TaskId,
        change: impl FnOnce(&mut MaintenanceTask, i64),
    ) -> Result<MaintenanceTask> {
        let db = self.db.lock().await;
        let repo = LibSqlTaskRepository::new(db.connection());
        let mut task = repo
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Task {id}")))?;
        if task.sync_state.is_pending_delete() {
            return Err(Error::Conflict("This task is being deleted".into()));
        }

        let now = next_edit_time(task.updated_at);
        change(&mut task, now);
        repo.update(&task).await?;
        self.committed(Table::Tasks);
        Ok(task)
    }

    /// Delete a task.
    ///
    /// Tasks the backend knows about are kept as `PendingDelete` until the
    /// next sync. Tasks that never left the device are removed at once.
    pub async fn delete_task(&self, id: &TaskId) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlTaskRepository::new(db.connection());
        let mut task = repo
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Task {id}")))?;

        match (&task.remote_id, task.sync_state) {
            (_, SyncState::PendingDelete) => return Ok(()),
            (Some(_), _) => {
                task.sync_state = SyncState::PendingDelete;
                task.updated_at = next_edit_time(task.updated_at);
                repo.update(&task).await?;
            }
            (None, _) => repo.delete_row(id).await?,
        }
        self.committed(Table::Tasks);
        Ok(())
    }

    // History

    /// History records of a vehicle, newest first.
    pub async fn list_history(&self, vehicle_id: &VehicleId) -> Result<Vec<MaintenanceRecord>> {
        let db = self.db.lock().await;
        LibSqlHistoryRepository::new(db.connection())
            .list_for_vehicle(vehicle_id)
            .await
    }

    /// Fetch a history record by id.
    pub async fn get_record(&self, id: &HistoryId) -> Result<Option<MaintenanceRecord>> {
        let db = self.db.lock().await;
        LibSqlHistoryRepository::new(db.connection()).get(id).await
    }

    /// Validate and store a service record.
    pub async fn add_record(&self, input: NewRecord) -> Result<MaintenanceRecord> {
        let record = input.validate()?.into_record();

        let db = self.db.lock().await;
        if LibSqlVehicleRepository::new(db.connection())
            .get(&record.vehicle_id)
            .await?
            .is_none()
        {
            return Err(Error::NotFound(format!("Vehicle {}", record.vehicle_id)));
        }
        LibSqlHistoryRepository::new(db.connection())
            .insert(&record)
            .await?;
        self.committed(Table::History);
        Ok(record)
    }

    /// Remove a service record from the device.
    pub async fn delete_record(&self, id: &HistoryId) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlHistoryRepository::new(db.connection())
            .delete(id)
            .await?;
        self.committed(Table::History);
        Ok(())
    }

    // Chat

    /// Messages of a conversation in send order.
    pub async fn conversation(&self, id: &ConversationId) -> Result<Vec<ChatMessage>> {
        let db = self.db.lock().await;
        LibSqlChatRepository::new(db.connection())
            .list_conversation(id)
            .await
    }

    /// Store a chat message.
    pub async fn append_message(&self, message: &ChatMessage) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlChatRepository::new(db.connection())
            .insert(message)
            .await?;
        self.committed(Table::Chat);
        Ok(())
    }

    /// Clear the pending flag of a user message.
    pub async fn mark_message_sent(&self, id: &MessageId) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlChatRepository::new(db.connection())
            .mark_sent(id)
            .await?;
        self.committed(Table::Chat);
        Ok(())
    }

    /// User messages of a conversation still waiting for an answer.
    pub async fn pending_messages(&self, conversation: &ConversationId) -> Result<Vec<ChatMessage>> {
        let db = self.db.lock().await;
        LibSqlChatRepository::new(db.connection())
            .list_pending(conversation)
            .await
    }

    /// Drop a whole conversation.
    pub async fn clear_conversation(&self, id: &ConversationId) -> Result<u64> {
        let db = self.db.lock().await;
        let removed = LibSqlChatRepository::new(db.connection())
            .delete_conversation(id)
            .await?;
        self.committed(Table::Chat);
        Ok(removed)
    }

    // Sync bookkeeping

    /// Vehicles with local changes not yet pushed.
    pub async fn pending_vehicles(&self) -> Result<Vec<Vehicle>> {
        let db = self.db.lock().await;
        LibSqlVehicleRepository::new(db.connection())
            .list_pending()
            .await
    }

    /// Record a successful vehicle push.
    ///
    /// Edits made after `pushed` was read stay pending. Returns false when
    /// the vehicle was deleted in the meantime.
    pub async fn mark_vehicle_synced(&self, pushed: &Vehicle, remote_id: &str) -> Result<bool> {
        let db = self.db.lock().await;
        let found = LibSqlVehicleRepository::new(db.connection())
            .mark_synced(pushed, remote_id)
            .await?;
        self.committed(Table::Vehicles);
        Ok(found)
    }

    /// Replace the local vehicle list with the pulled one.
    pub async fn replace_vehicles(&self, vehicles: &[Vehicle]) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlVehicleRepository::new(db.connection())
            .replace_all(vehicles)
            .await?;
        self.committed(Table::Vehicles);
        self.committed(Table::Tasks);
        self.committed(Table::History);
        Ok(())
    }

    /// Look up a vehicle by its backend identity.
    pub async fn vehicle_by_remote_id(&self, remote_id: &str) -> Result<Option<Vehicle>> {
        let db = self.db.lock().await;
        LibSqlVehicleRepository::new(db.connection())
            .find_by_remote_id(remote_id)
            .await
    }

    /// Tasks in any pending state, oldest change first.
    pub async fn pending_tasks(&self) -> Result<Vec<MaintenanceTask>> {
        let db = self.db.lock().await;
        LibSqlTaskRepository::new(db.connection())
            .list_pending()
            .await
    }

    /// Record a successful task push.
    ///
    /// Returns the state the row ended in; `None` when it was removed while
    /// the push was in flight.
    pub async fn mark_task_synced(
        &self,
        pushed: &MaintenanceTask,
        remote_id: &str,
    ) -> Result<Option<SyncState>> {
        let db = self.db.lock().await;
        let state = LibSqlTaskRepository::new(db.connection())
            .mark_synced(pushed, remote_id)
            .await?;
        self.committed(Table::Tasks);
        Ok(state)
    }

    /// Drop a task row after the backend confirmed its deletion.
    pub async fn purge_task(&self, id: &TaskId) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlTaskRepository::new(db.connection())
            .delete_row(id)
            .await?;
        self.committed(Table::Tasks);
        Ok(())
    }

    /// Swap the synced tasks of a vehicle for the pulled ones.
    pub async fn replace_clean_tasks(
        &self,
        vehicle_id: &VehicleId,
        tasks: &[MaintenanceTask],
    ) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlTaskRepository::new(db.connection())
            .replace_clean_for_vehicle(vehicle_id, tasks)
            .await?;
        self.committed(Table::Tasks);
        Ok(())
    }

    /// Service records never sent to the backend.
    pub async fn unsynced_records(&self) -> Result<Vec<MaintenanceRecord>> {
        let db = self.db.lock().await;
        LibSqlHistoryRepository::new(db.connection())
            .list_unsynced()
            .await
    }

    /// Record a successful history push.
    pub async fn mark_record_synced(&self, id: &HistoryId, remote_id: &str) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlHistoryRepository::new(db.connection())
            .mark_synced(id, remote_id)
            .await?;
        self.committed(Table::History);
        Ok(())
    }

    /// Swap the synced history of a vehicle for the pulled records.
    pub async fn replace_history(
        &self,
        vehicle_id: &VehicleId,
        records: &[MaintenanceRecord],
    ) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlHistoryRepository::new(db.connection())
            .replace_for_vehicle(vehicle_id, records)
            .await?;
        self.committed(Table::History);
        Ok(())
    }
}

fn is_corrupted_db_error(error: &Error) -> bool {
    error
        .to_string()
        .to_ascii_lowercase()
        .contains("file is not a database")
}

fn quarantine_corrupted_db_files(db_path: &Path) -> Result<()> {
    let Some(base_name) = db_path.file_name().and_then(|name| name.to_str()) else {
        return Ok(());
    };

    if db_path.exists() {
        let timestamp = now_millis();
        let backup_path = db_path.with_file_name(format!("{base_name}.corrupt-{timestamp}"));
        std::fs::rename(db_path, &backup_path)?;
        tracing::warn!(
            "Moved unreadable local database from {} to {}",
            db_path.display(),
            backup_path.display()
        );
    }

    let Some(parent) = db_path.parent() else {
        return Ok(());
    };
    // -wal, -shm and -journal files belong to the old database
    let sidecar_prefix = format!("{base_name}-");
    for entry in std::fs::read_dir(parent)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name();
        if file_name.to_string_lossy().starts_with(&sidecar_prefix) {
            let path = entry.path();
            std::fs::remove_file(&path)?;
            tracing::warn!("Removed stale database sidecar {}", path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FuelType, MaintenanceType, Severity, TaskStatus, UsageType};
    use crate::services::{AllVehicles, VehicleTasks};
    use crate::util::DAY_MS;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn new_vehicle(brand: &str) -> NewVehicle {
        NewVehicle {
            brand: brand.to_string(),
            model: "Model".to_string(),
            year: 2020,
            plate: None,
            fuel_type: FuelType::Diesel,
            usage_type: UsageType::Highway,
        }
    }

    fn new_task(vehicle_id: VehicleId) -> NewTask {
        NewTask {
            vehicle_id,
            fields: TaskEdit {
                task_type: MaintenanceType::BrakeInspection,
                title: "Check brakes".to_string(),
                description: None,
                due_at: Some(now_millis() + DAY_MS),
                due_mileage: None,
                severity: Severity::High,
            },
        }
    }

    async fn store_with_vehicle() -> (LocalStore, Vehicle) {
        let store = LocalStore::open_in_memory().await.unwrap();
        let vehicle = store.add_vehicle(new_vehicle("Honda")).await.unwrap();
        (store, vehicle)
    }

    /// Pretend the backend acknowledged the task.
    async fn synced(store: &LocalStore, task: &MaintenanceTask) -> MaintenanceTask {
        store.mark_task_synced(task, "remote-1").await.unwrap();
        store.get_task(&task.id).await.unwrap().unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn first_vehicle_becomes_current() {
        let (store, first) = store_with_vehicle().await;
        let second = store.add_vehicle(new_vehicle("Mazda")).await.unwrap();

        assert!(first.is_current);
        assert!(!second.is_current);
        assert_eq!(store.current_vehicle().await.unwrap().unwrap().id, first.id);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_readers_never_see_two_current_vehicles() {
        let (store, first) = store_with_vehicle().await;
        let second = store.add_vehicle(new_vehicle("Mazda")).await.unwrap();

        let writer = async {
            for round in 0..20 {
                let target = if round % 2 == 0 { &second.id } else { &first.id };
                store.set_current_vehicle(target).await.unwrap();
            }
        };
        let reader = async {
            for _ in 0..40 {
                let current = store
                    .list_vehicles()
                    .await
                    .unwrap()
                    .iter()
                    .filter(|vehicle| vehicle.is_current)
                    .count();
                assert_eq!(current, 1);
                tokio::task::yield_now().await;
            }
        };
        tokio::join!(writer, reader);

        assert_eq!(store.current_vehicle().await.unwrap().unwrap().id, first.id);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn set_current_unknown_vehicle_keeps_previous() {
        let (store, vehicle) = store_with_vehicle().await;

        let result = store.set_current_vehicle(&VehicleId::new()).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(store.current_vehicle().await.unwrap().unwrap().id, vehicle.id);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn complete_task_marks_update_and_keeps_identity() {
        let (store, vehicle) = store_with_vehicle().await;
        let task = store.add_task(new_task(vehicle.id)).await.unwrap();
        let task = synced(&store, &task).await;

        let completed = store.complete_task(&task.id).await.unwrap();

        assert_eq!(completed.status, TaskStatus::Completed);
        assert_eq!(completed.sync_state, SyncState::PendingUpdate);
        assert_eq!(completed.id, task.id);
        assert_eq!(completed.vehicle_id, vehicle.id);
        assert_eq!(store.get_task(&task.id).await.unwrap().unwrap(), completed);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn edit_of_never_synced_task_stays_pending_create() {
        let (store, vehicle) = store_with_vehicle().await;
        let task = store.add_task(new_task(vehicle.id)).await.unwrap();

        let edited = store
            .edit_task(
                &task.id,
                TaskEdit {
                    title: "Replace pads".to_string(),
                    ..new_task(vehicle.id).fields
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.title, "Replace pads");
        assert_eq!(edited.sync_state, SyncState::PendingCreate);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn delete_synced_task_hides_it_until_sync() {
        let (store, vehicle) = store_with_vehicle().await;
        let task = store.add_task(new_task(vehicle.id)).await.unwrap();
        let task = synced(&store, &task).await;

        store.delete_task(&task.id).await.unwrap();

        let row = store.get_task(&task.id).await.unwrap().unwrap();
        assert_eq!(row.sync_state, SyncState::PendingDelete);
        assert!(store.list_tasks(&vehicle.id).await.unwrap().is_empty());
        assert!(matches!(
            store.complete_task(&task.id).await,
            Err(Error::Conflict(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn delete_local_only_task_removes_row() {
        let (store, vehicle) = store_with_vehicle().await;
        let task = store.add_task(new_task(vehicle.id)).await.unwrap();

        store.delete_task(&task.id).await.unwrap();
        assert!(store.get_task(&task.id).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn add_task_requires_existing_vehicle() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let result = store.add_task(new_task(VehicleId::new())).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn subscription_emits_snapshot_then_updates() {
        let (store, vehicle) = store_with_vehicle().await;
        let mut tasks = store.subscribe(VehicleTasks(vehicle.id));

        assert!(tasks.next().await.unwrap().is_empty());

        let task = store.add_task(new_task(vehicle.id)).await.unwrap();
        let snapshot = tasks.next().await.unwrap();
        assert_eq!(snapshot, vec![task.clone()]);

        store.complete_task(&task.id).await.unwrap();
        let snapshot = tasks.next().await.unwrap();
        assert_eq!(snapshot[0].status, TaskStatus::Completed);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn subscribers_are_independent() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let mut first = store.subscribe(AllVehicles);
        let mut second = store.subscribe(AllVehicles);
        assert!(first.next().await.unwrap().is_empty());

        store.add_vehicle(new_vehicle("Kia")).await.unwrap();

        assert_eq!(first.next().await.unwrap().len(), 1);
        assert_eq!(second.next().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn open_path_recovers_from_corrupted_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("garage.db");
        std::fs::write(&path, vec![b'x'; 8192]).unwrap();

        let store = LocalStore::open_path(&path).await.unwrap();
        store.add_vehicle(new_vehicle("Ford")).await.unwrap();
        assert_eq!(store.list_vehicles().await.unwrap().len(), 1);

        let names = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect::<Vec<_>>();
        assert!(names.iter().any(|name| name.starts_with("garage.db.corrupt-")));
    }

    #[test]
    fn detects_corrupted_db_errors() {
        assert!(is_corrupted_db_error(&Error::Database(
            "SQLite failure: file is not a database".to_string()
        )));
        assert!(!is_corrupted_db_error(&Error::InvalidInput(
            "Brand is required".to_string()
        )));
    }
}
