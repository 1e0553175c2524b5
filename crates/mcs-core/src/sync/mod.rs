//! Push-then-pull synchronisation between the local store and the backend.
//!
//! A pass runs in a fixed order and stops at the first error:
//!
//! 1. push vehicles with local changes
//! 2. pull every vehicle and replace the local list
//! 3. stop when no vehicle is current
//! 4. push pending tasks and unsynced history records
//! 5. pull tasks and history of the current vehicle
//!
//! Pushes replay local state as-is; there is no conflict resolution. A local
//! write that lands while its row is being pushed stays pending for the next
//! pass, and a delete that lands then is forwarded to the backend at once.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::error::{Error, Result};
use crate::models::{HistoryId, MaintenanceTask, SyncState, TaskId, Vehicle, VehicleId};
use crate::remote::{MaintenanceRecordDto, MaintenanceTaskDto, RemoteGateway, VehicleDto};
use crate::services::LocalStore;

/// Counts of what a pass moved in each direction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub vehicles_pushed: usize,
    pub vehicles_pulled: usize,
    pub tasks_pushed: usize,
    pub tasks_deleted: usize,
    pub tasks_skipped: usize,
    pub tasks_pulled: usize,
    pub records_pushed: usize,
    pub records_pulled: usize,
    /// No vehicle was current, so task and history steps did not run
    pub stopped_early: bool,
}

/// Drives sync passes between a [`LocalStore`] and a [`RemoteGateway`].
pub struct SyncOrchestrator<G> {
    store: LocalStore,
    gateway: G,
}

fn backend_id(id: Option<String>, kind: &str) -> Result<String> {
    id.ok_or_else(|| Error::InvalidInput(format!("Server returned a {kind} without an id")))
}

impl<G: RemoteGateway> SyncOrchestrator<G> {
    pub const fn new(store: LocalStore, gateway: G) -> Self {
        Self { store, gateway }
    }

    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    pub const fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Run one full pass.
    pub async fn sync(&self) -> Result<SyncReport> {
        let vehicles_pushed = self.push_vehicles().await?;
        tracing::debug!("Pushed {vehicles_pushed} vehicle(s)");

        let vehicles_pulled = self.pull_vehicles().await?;
        tracing::debug!("Pulled {vehicles_pulled} vehicle(s)");

        let mut report = SyncReport {
            vehicles_pushed,
            vehicles_pulled,
            ..SyncReport::default()
        };

        let Some(current) = self.store.current_vehicle().await? else {
            tracing::info!("No current vehicle; skipping task and history sync");
            report.stopped_early = true;
            return Ok(report);
        };

        self.push_tasks(&mut report).await?;
        report.records_pushed = self.push_records().await?;
        tracing::debug!(
            "Pushed {} task(s), deleted {}, pushed {} record(s)",
            report.tasks_pushed,
            report.tasks_deleted,
            report.records_pushed
        );

        let remote_id = backend_id(current.remote_id.clone(), "vehicle")?;
        report.tasks_pulled = self.pull_tasks(&current, &remote_id).await?;
        report.records_pulled = self.pull_history(&current, &remote_id).await?;

        tracing::info!(
            "Sync finished: {} vehicle(s), {} task(s), {} record(s) pulled",
            report.vehicles_pulled,
            report.tasks_pulled,
            report.records_pulled
        );
        Ok(report)
    }

    async fn push_vehicles(&self) -> Result<usize> {
        let pending = self.store.pending_vehicles().await?;
        for vehicle in &pending {
            let dto = VehicleDto::from_vehicle(vehicle);
            let saved = match &vehicle.remote_id {
                Some(remote_id) => self.gateway.update_vehicle(remote_id, &dto).await?,
                None => self.gateway.create_vehicle(&dto).await?,
            };
            let remote_id = backend_id(saved.id, "vehicle")?;
            if vehicle.is_current {
                self.gateway.set_current_vehicle(&remote_id).await?;
            }
            let kept = self.store.mark_vehicle_synced(vehicle, &remote_id).await?;
            if !kept && vehicle.remote_id.is_none() {
                tracing::info!(
                    "Vehicle {} was deleted while being created; removing it remotely",
                    vehicle.id
                );
                self.gateway.delete_vehicle(&remote_id).await?;
            }
        }
        Ok(pending.len())
    }

    async fn pull_vehicles(&self) -> Result<usize> {
        let mut vehicles: Vec<Vehicle> = Vec::new();
        for dto in self.gateway.list_vehicles().await? {
            let known = match (&dto.client_id, &dto.id) {
                (None, Some(remote_id)) => self
                    .store
                    .vehicle_by_remote_id(remote_id)
                    .await?
                    .map(|vehicle| vehicle.id),
                _ => None,
            };
            vehicles.push(dto.into_vehicle(known)?);
        }
        self.store.replace_vehicles(&vehicles).await?;
        Ok(vehicles.len())
    }

    /// Backend ids of local vehicles, for addressing child rows
    async fn vehicle_remote_ids(&self) -> Result<HashMap<VehicleId, String>> {
        Ok(self
            .store
            .list_vehicles()
            .await?
            .into_iter()
            .filter_map(|vehicle| vehicle.remote_id.map(|remote_id| (vehicle.id, remote_id)))
            .collect())
    }

    async fn push_tasks(&self, report: &mut SyncReport) -> Result<()> {
        let owners = self.vehicle_remote_ids().await?;

        for task in self.store.pending_tasks().await? {
            let Some(vehicle_remote_id) = owners.get(&task.vehicle_id) else {
                tracing::warn!(
                    "Skipping push of task {}: vehicle {} is not on the server",
                    task.id,
                    task.vehicle_id
                );
                report.tasks_skipped += 1;
                continue;
            };

            match (task.sync_state, task.remote_id.as_deref()) {
                (SyncState::Clean, _) => {}
                (SyncState::PendingDelete, Some(remote_id)) => {
                    self.gateway.delete_task(remote_id).await?;
                    self.store.purge_task(&task.id).await?;
                    report.tasks_deleted += 1;
                }
                (SyncState::PendingDelete, None) => {
                    self.store.purge_task(&task.id).await?;
                    report.tasks_deleted += 1;
                }
                (SyncState::PendingUpdate, Some(remote_id)) => {
                    let dto = MaintenanceTaskDto::from_task(&task, vehicle_remote_id);
                    let saved = self.gateway.update_task(remote_id, &dto).await?;
                    self.mark_task_pushed(&task, saved, report).await?;
                }
                (SyncState::PendingCreate | SyncState::PendingUpdate, _) => {
                    let dto = MaintenanceTaskDto::from_task(&task, vehicle_remote_id);
                    let saved = self.gateway.create_task(&dto).await?;
                    self.mark_task_pushed(&task, saved, report).await?;
                }
            }
        }
        Ok(())
    }

    /// Settle a pushed task against whatever happened locally meanwhile.
    ///
    /// A delete that landed during the push is forwarded right away.
    async fn mark_task_pushed(
        &self,
        task: &MaintenanceTask,
        saved: MaintenanceTaskDto,
        report: &mut SyncReport,
    ) -> Result<()> {
        let remote_id = backend_id(saved.id, "task")?;
        report.tasks_pushed += 1;

        match self.store.mark_task_synced(task, &remote_id).await? {
            Some(SyncState::Clean) => Ok(()),
            Some(SyncState::PendingDelete) => {
                tracing::debug!("Task {} was deleted during its push", task.id);
                self.gateway.delete_task(&remote_id).await?;
                self.store.purge_task(&task.id).await?;
                report.tasks_deleted += 1;
                Ok(())
            }
            None => {
                tracing::debug!("Task {} was removed during its push", task.id);
                self.gateway.delete_task(&remote_id).await?;
                report.tasks_deleted += 1;
                Ok(())
            }
            Some(state) => {
                tracing::debug!(
                    "Task {} changed during its push; leaving it {}",
                    task.id,
                    state.as_str()
                );
                Ok(())
            }
        }
    }

    async fn push_records(&self) -> Result<usize> {
        let owners = self.vehicle_remote_ids().await?;
        let mut pushed = 0;

        for record in self.store.unsynced_records().await? {
            let Some(vehicle_remote_id) = owners.get(&record.vehicle_id) else {
                tracing::warn!(
                    "Skipping push of history record {}: vehicle {} is not on the server",
                    record.id,
                    record.vehicle_id
                );
                continue;
            };
            let dto = MaintenanceRecordDto::from_record(&record, vehicle_remote_id);
            let saved = self.gateway.create_record(&dto).await?;
            let remote_id = backend_id(saved.id, "history record")?;
            self.store.mark_record_synced(&record.id, &remote_id).await?;
            pushed += 1;
        }
        Ok(pushed)
    }

    async fn pull_tasks(&self, vehicle: &Vehicle, remote_id: &str) -> Result<usize> {
        let known: HashMap<String, TaskId> = self
            .store
            .list_all_tasks()
            .await?
            .into_iter()
            .filter_map(|task| task.remote_id.map(|remote_id| (remote_id, task.id)))
            .collect();

        let tasks = self
            .gateway
            .list_tasks(remote_id)
            .await?
            .into_iter()
            .map(|dto| {
                let local = dto.id.as_ref().and_then(|id| known.get(id)).copied();
                dto.into_task(vehicle.id, local)
            })
            .collect::<Result<Vec<_>>>()?;

        self.store.replace_clean_tasks(&vehicle.id, &tasks).await?;
        Ok(tasks.len())
    }

    async fn pull_history(&self, vehicle: &Vehicle, remote_id: &str) -> Result<usize> {
        let known: HashMap<String, HistoryId> = self
            .store
            .list_history(&vehicle.id)
            .await?
            .into_iter()
            .filter_map(|record| record.remote_id.map(|remote_id| (remote_id, record.id)))
            .collect();

        let records = self
            .gateway
            .list_history(remote_id)
            .await?
            .into_iter()
            .map(|dto| {
                let local = dto.id.as_ref().and_then(|id| known.get(id)).copied();
                dto.into_record(vehicle.id, local)
            })
            .collect::<Result<Vec<_>>>()?;

        self.store.replace_history(&vehicle.id, &records).await?;
        Ok(records.len())
    }

    /// Delete a vehicle on the backend first, then locally.
    ///
    /// A vehicle the backend never saw is only removed locally.
    pub async fn delete_vehicle(&self, id: &VehicleId) -> Result<()> {
        let vehicle = self
            .store
            .get_vehicle(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Vehicle {id}")))?;
        if let Some(remote_id) = &vehicle.remote_id {
            self.gateway.delete_vehicle(remote_id).await?;
        }
        self.store.delete_vehicle(id).await
    }

    /// Delete a history record on the backend first, then locally.
    pub async fn delete_record(&self, id: &HistoryId) -> Result<()> {
        let record = self
            .store
            .get_record(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("History record {id}")))?;
        if let Some(remote_id) = &record.remote_id {
            self.gateway.delete_record(remote_id).await?;
        }
        self.store.delete_record(id).await
    }

    /// Run passes every `interval` until `shutdown` turns true.
    ///
    /// A failed pass is logged and the next tick tries again. Returns the
    /// number of passes that ran.
    pub async fn run_periodically(
        &self,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> usize {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut passes = 0;

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    passes += 1;
                    match self.sync().await {
                        Ok(report) => tracing::debug!("Periodic sync pass {passes}: {report:?}"),
                        Err(error) => tracing::warn!("Periodic sync pass {passes} failed: {error}"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Periodic sync stopped after {passes} pass(es)");
        passes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        FuelType, MaintenanceType, NewRecord, NewTask, NewVehicle, Severity, TaskEdit, TaskStatus,
        UsageType,
    };
    use crate::models::ConversationId;
    use crate::remote::fake::FakeGateway;
    use crate::remote::{ChatMessageDto, GuideArticleDto, UserProfileDto, WarningLightDto};
    use crate::util::{now_millis, DAY_MS};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Local write performed while a push is awaiting the backend
    enum LocalWrite {
        DeleteTask(TaskId),
        CompleteTask(TaskId),
        DeleteVehicle(VehicleId),
        SelectVehicle(VehicleId),
    }

    /// Backend that lets the user touch the store in the middle of the
    /// first push call it receives
    struct ConcurrentEditGateway {
        inner: FakeGateway,
        store: LocalStore,
        write: Mutex<Option<LocalWrite>>,
    }

    impl ConcurrentEditGateway {
        fn new(inner: FakeGateway, store: LocalStore, write: LocalWrite) -> Self {
            Self {
                inner,
                store,
                write: Mutex::new(Some(write)),
            }
        }

        async fn user_writes(&self) {
            let write = self.write.lock().unwrap().take();
            match write {
                Some(LocalWrite::DeleteTask(id)) => self.store.delete_task(&id).await.unwrap(),
                Some(LocalWrite::CompleteTask(id)) => {
                    self.store.complete_task(&id).await.unwrap();
                }
                Some(LocalWrite::DeleteVehicle(id)) => {
                    self.store.delete_vehicle(&id).await.unwrap();
                }
                Some(LocalWrite::SelectVehicle(id)) => {
                    self.store.set_current_vehicle(&id).await.unwrap();
                }
                None => {}
            }
        }
    }

    impl RemoteGateway for ConcurrentEditGateway {
        async fn list_vehicles(&self) -> Result<Vec<VehicleDto>> {
            self.inner.list_vehicles().await
        }

        async fn create_vehicle(&self, vehicle: &VehicleDto) -> Result<VehicleDto> {
            self.user_writes().await;
            self.inner.create_vehicle(vehicle).await
        }

        async fn update_vehicle(&self, remote_id: &str, vehicle: &VehicleDto) -> Result<VehicleDto> {
            self.user_writes().await;
            self.inner.update_vehicle(remote_id, vehicle).await
        }

        async fn delete_vehicle(&self, remote_id: &str) -> Result<()> {
            self.inner.delete_vehicle(remote_id).await
        }

        async fn set_current_vehicle(&self, remote_id: &str) -> Result<()> {
            self.inner.set_current_vehicle(remote_id).await
        }

        async fn list_tasks(&self, vehicle_remote_id: &str) -> Result<Vec<MaintenanceTaskDto>> {
            self.inner.list_tasks(vehicle_remote_id).await
        }

        async fn create_task(&self, task: &MaintenanceTaskDto) -> Result<MaintenanceTaskDto> {
            self.user_writes().await;
            self.inner.create_task(task).await
        }

        async fn update_task(
            &self,
            remote_id: &str,
            task: &MaintenanceTaskDto,
        ) -> Result<MaintenanceTaskDto> {
            self.user_writes().await;
            self.inner.update_task(remote_id, task).await
        }

        async fn delete_task(&self, remote_id: &str) -> Result<()> {
            self.inner.delete_task(remote_id).await
        }

        async fn list_history(&self, vehicle_remote_id: &str) -> Result<Vec<MaintenanceRecordDto>> {
            self.inner.list_history(vehicle_remote_id).await
        }

        async fn create_record(&self, record: &MaintenanceRecordDto) -> Result<MaintenanceRecordDto> {
            self.inner.create_record(record).await
        }

        async fn delete_record(&self, remote_id: &str) -> Result<()> {
            self.inner.delete_record(remote_id).await
        }

        async fn list_warning_lights(&self) -> Result<Vec<WarningLightDto>> {
            self.inner.list_warning_lights().await
        }

        async fn list_guides(&self) -> Result<Vec<GuideArticleDto>> {
            self.inner.list_guides().await
        }

        async fn chat_reply(
            &self,
            conversation: &ConversationId,
            messages: &[ChatMessageDto],
        ) -> Result<String> {
            self.inner.chat_reply(conversation, messages).await
        }

        async fn profile(&self) -> Result<UserProfileDto> {
            self.inner.profile().await
        }
    }

    fn with_local_write(
        store: &LocalStore,
        gateway: &FakeGateway,
        write: LocalWrite,
    ) -> SyncOrchestrator<ConcurrentEditGateway> {
        SyncOrchestrator::new(
            store.clone(),
            ConcurrentEditGateway::new(gateway.clone(), store.clone(), write),
        )
    }

    fn new_vehicle() -> NewVehicle {
        NewVehicle {
            brand: "Peugeot".to_string(),
            model: "208".to_string(),
            year: 2022,
            plate: None,
            fuel_type: FuelType::Gasoline,
            usage_type: UsageType::Urban,
        }
    }

    fn new_task(vehicle_id: VehicleId, title: &str) -> NewTask {
        NewTask {
            vehicle_id,
            fields: TaskEdit {
                task_type: MaintenanceType::OilChange,
                title: title.to_string(),
                description: None,
                due_at: Some(now_millis() + DAY_MS),
                due_mileage: None,
                severity: Severity::Medium,
            },
        }
    }

    async fn setup() -> (LocalStore, FakeGateway, SyncOrchestrator<FakeGateway>) {
        let store = LocalStore::open_in_memory().await.unwrap();
        let gateway = FakeGateway::new();
        let sync = SyncOrchestrator::new(store.clone(), gateway.clone());
        (store, gateway, sync)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn pushes_new_vehicle_and_keeps_local_identity() {
        let (store, gateway, sync) = setup().await;
        let vehicle = store.add_vehicle(new_vehicle()).await.unwrap();

        let report = sync.sync().await.unwrap();
        assert_eq!(report.vehicles_pushed, 1);
        assert_eq!(report.vehicles_pulled, 1);

        let local = store.get_vehicle(&vehicle.id).await.unwrap().unwrap();
        assert!(!local.pending_sync);
        assert!(local.is_current);
        assert_eq!(local.remote_id, gateway.state().vehicles[0].id);
        assert!(gateway.calls().contains(&"set_current_vehicle".to_string()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stops_after_vehicles_when_nothing_is_current() {
        let (store, gateway, sync) = setup().await;
        gateway.state().add_vehicle(VehicleDto {
            id: None,
            client_id: None,
            brand: "Fiat".to_string(),
            model: "Panda".to_string(),
            year: 2015,
            plate: None,
            fuel_type: "LPG".to_string(),
            usage_type: "MIXED".to_string(),
            is_current: false,
            created_at: 1,
            updated_at: 1,
        });

        let report = sync.sync().await.unwrap();

        assert!(report.stopped_early);
        assert_eq!(store.list_vehicles().await.unwrap().len(), 1);
        assert!(!gateway.calls().contains(&"list_tasks".to_string()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn replays_pending_task_changes() {
        let (store, gateway, sync) = setup().await;
        let vehicle = store.add_vehicle(new_vehicle()).await.unwrap();
        let doomed = store.add_task(new_task(vehicle.id, "Doomed")).await.unwrap();
        let edited = store.add_task(new_task(vehicle.id, "Edited")).await.unwrap();
        sync.sync().await.unwrap();
        assert_eq!(gateway.state().tasks.len(), 2);

        store.delete_task(&doomed.id).await.unwrap();
        store.complete_task(&edited.id).await.unwrap();
        let fresh = store.add_task(new_task(vehicle.id, "Fresh")).await.unwrap();

        let report = sync.sync().await.unwrap();
        assert_eq!(report.tasks_deleted, 1);
        assert_eq!(report.tasks_pushed, 2);

        assert!(store.get_task(&doomed.id).await.unwrap().is_none());
        let remote_titles = gateway
            .state()
            .tasks
            .iter()
            .map(|task| (task.title.clone(), task.status.clone()))
            .collect::<Vec<_>>();
        assert_eq!(
            remote_titles,
            vec![
                ("Edited".to_string(), "COMPLETED".to_string()),
                ("Fresh".to_string(), "UPCOMING".to_string()),
            ]
        );

        let local = store.list_tasks(&vehicle.id).await.unwrap();
        assert!(local.iter().all(|task| task.sync_state == SyncState::Clean));
        assert!(local.iter().any(|task| task.id == fresh.id));
        assert_eq!(
            local.iter().find(|task| task.id == edited.id).unwrap().status,
            TaskStatus::Completed
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn pulls_server_tasks_for_current_vehicle() {
        let (store, gateway, sync) = setup().await;
        let vehicle = store.add_vehicle(new_vehicle()).await.unwrap();
        sync.sync().await.unwrap();

        let vehicle_remote_id = store
            .get_vehicle(&vehicle.id)
            .await
            .unwrap()
            .unwrap()
            .remote_id
            .unwrap();
        gateway.state().add_task(MaintenanceTaskDto {
            id: None,
            client_id: None,
            vehicle_id: vehicle_remote_id,
            task_type: "TIRE_ROTATION".to_string(),
            title: "Rotate tyres".to_string(),
            description: None,
            due_at: Some(5),
            due_mileage: None,
            severity: "LOW".to_string(),
            status: "UPCOMING".to_string(),
            created_at: 1,
            updated_at: 1,
        });

        let report = sync.sync().await.unwrap();
        assert_eq!(report.tasks_pulled, 1);
        let local = store.list_tasks(&vehicle.id).await.unwrap();
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].title, "Rotate tyres");

        // A second pass maps the same server row onto the same local row
        sync.sync().await.unwrap();
        let again = store.list_tasks(&vehicle.id).await.unwrap();
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].id, local[0].id);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn pushes_unsynced_history_records() {
        let (store, gateway, sync) = setup().await;
        let vehicle = store.add_vehicle(new_vehicle()).await.unwrap();
        let record = store
            .add_record(NewRecord {
                vehicle_id: vehicle.id,
                task_type: MaintenanceType::AirFilter,
                serviced_at: 100,
                mileage: Some(20_000),
                cost: Some(35.0),
                workshop: None,
                notes: None,
            })
            .await
            .unwrap();

        let report = sync.sync().await.unwrap();
        assert_eq!(report.records_pushed, 1);
        assert_eq!(report.records_pulled, 1);

        let history = store.list_history(&vehicle.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, record.id);
        assert_eq!(history[0].remote_id, gateway.state().history[0].id);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failure_aborts_and_keeps_pending_state() {
        let (store, gateway, sync) = setup().await;
        let vehicle = store.add_vehicle(new_vehicle()).await.unwrap();
        sync.sync().await.unwrap();
        let task = store.add_task(new_task(vehicle.id, "Later")).await.unwrap();

        gateway.state().fail_on = Some("create_task");
        assert!(sync.sync().await.is_err());

        let local = store.get_task(&task.id).await.unwrap().unwrap();
        assert_eq!(local.sync_state, SyncState::PendingCreate);
        assert_eq!(gateway.calls().last().map(String::as_str), Some("create_task"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn delete_during_update_push_reaches_backend() {
        let (store, gateway, sync) = setup().await;
        let vehicle = store.add_vehicle(new_vehicle()).await.unwrap();
        let task = store.add_task(new_task(vehicle.id, "Brakes")).await.unwrap();
        sync.sync().await.unwrap();
        store.complete_task(&task.id).await.unwrap();

        let racing = with_local_write(&store, &gateway, LocalWrite::DeleteTask(task.id));
        let report = racing.sync().await.unwrap();

        assert_eq!(report.tasks_pushed, 1);
        assert_eq!(report.tasks_deleted, 1);
        assert_eq!(store.get_task(&task.id).await.unwrap(), None);
        assert!(store.list_tasks(&vehicle.id).await.unwrap().is_empty());
        assert!(gateway.state().tasks.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn delete_during_create_push_reaches_backend() {
        let (store, gateway, sync) = setup().await;
        let vehicle = store.add_vehicle(new_vehicle()).await.unwrap();
        sync.sync().await.unwrap();
        let task = store.add_task(new_task(vehicle.id, "Wipers")).await.unwrap();

        let racing = with_local_write(&store, &gateway, LocalWrite::DeleteTask(task.id));
        let report = racing.sync().await.unwrap();

        assert_eq!(report.tasks_deleted, 1);
        assert_eq!(store.get_task(&task.id).await.unwrap(), None);
        assert!(gateway.state().tasks.is_empty());
        assert_eq!(
            gateway.calls().iter().filter(|call| *call == "delete_task").count(),
            1
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn edit_during_create_push_is_sent_next_pass() {
        let (store, gateway, sync) = setup().await;
        let vehicle = store.add_vehicle(new_vehicle()).await.unwrap();
        sync.sync().await.unwrap();
        let task = store.add_task(new_task(vehicle.id, "Coolant")).await.unwrap();

        let racing = with_local_write(&store, &gateway, LocalWrite::CompleteTask(task.id));
        racing.sync().await.unwrap();

        let local = store.get_task(&task.id).await.unwrap().unwrap();
        assert_eq!(local.sync_state, SyncState::PendingUpdate);
        assert_eq!(local.status, TaskStatus::Completed);
        assert_eq!(local.remote_id, gateway.state().tasks[0].id);
        assert_eq!(gateway.state().tasks[0].status, "UPCOMING");

        sync.sync().await.unwrap();
        let local = store.get_task(&task.id).await.unwrap().unwrap();
        assert_eq!(local.sync_state, SyncState::Clean);
        assert_eq!(local.status, TaskStatus::Completed);
        assert_eq!(gateway.state().tasks.len(), 1);
        assert_eq!(gateway.state().tasks[0].status, "COMPLETED");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn vehicle_selected_during_push_stays_current() {
        let (store, gateway, sync) = setup().await;
        let first = store.add_vehicle(new_vehicle()).await.unwrap();
        let second = store.add_vehicle(new_vehicle()).await.unwrap();
        assert!(first.is_current);

        let racing = with_local_write(&store, &gateway, LocalWrite::SelectVehicle(second.id));
        racing.sync().await.unwrap();

        let local = store.get_vehicle(&second.id).await.unwrap().unwrap();
        assert!(local.pending_sync);
        assert!(local.remote_id.is_some());
        assert_eq!(store.current_vehicle().await.unwrap().unwrap().id, second.id);

        sync.sync().await.unwrap();
        let local = store.get_vehicle(&second.id).await.unwrap().unwrap();
        assert!(!local.pending_sync);
        assert_eq!(store.current_vehicle().await.unwrap().unwrap().id, second.id);
        let remote_current = gateway
            .state()
            .vehicles
            .iter()
            .filter(|vehicle| vehicle.is_current)
            .map(|vehicle| vehicle.id.clone())
            .collect::<Vec<_>>();
        assert_eq!(remote_current, vec![local.remote_id]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn vehicle_deleted_during_create_is_removed_remotely() {
        let (store, gateway, _sync) = setup().await;
        let vehicle = store.add_vehicle(new_vehicle()).await.unwrap();

        let racing = with_local_write(&store, &gateway, LocalWrite::DeleteVehicle(vehicle.id));
        let report = racing.sync().await.unwrap();

        assert!(report.stopped_early);
        assert!(store.list_vehicles().await.unwrap().is_empty());
        assert!(gateway.state().vehicles.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn delete_vehicle_goes_to_backend_first() {
        let (store, gateway, sync) = setup().await;
        let vehicle = store.add_vehicle(new_vehicle()).await.unwrap();
        sync.sync().await.unwrap();

        gateway.set_offline(true);
        assert!(sync.delete_vehicle(&vehicle.id).await.is_err());
        assert!(store.get_vehicle(&vehicle.id).await.unwrap().is_some());

        gateway.set_offline(false);
        sync.delete_vehicle(&vehicle.id).await.unwrap();
        assert!(store.get_vehicle(&vehicle.id).await.unwrap().is_none());
        assert!(gateway.state().vehicles.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn periodic_sync_survives_failures_and_stops_on_shutdown() {
        let (_store, gateway, sync) = setup().await;
        gateway.set_offline(true);
        let (stop, shutdown) = watch::channel(false);

        let stopper = async {
            tokio::time::sleep(Duration::from_millis(120)).await;
            stop.send(true).unwrap();
        };
        let (passes, ()) = tokio::join!(
            sync.run_periodically(Duration::from_millis(20), shutdown),
            stopper
        );

        assert!(passes >= 2, "expected several passes, got {passes}");
    }
}
