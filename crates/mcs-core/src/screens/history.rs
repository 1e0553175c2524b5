//! Maintenance history screen

use super::{Reducer, Resource, StateHolder};
use crate::error::Result;
use crate::models::{total_cost, HistoryId, MaintenanceRecord, NewRecord, Vehicle};
use crate::remote::RemoteGateway;
use crate::sync::SyncOrchestrator;

/// Totals shown above the history list
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HistorySummary {
    pub count: usize,
    pub total_cost: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryState {
    pub loading: bool,
    pub vehicle: Option<Vehicle>,
    pub records: Option<Resource<Vec<MaintenanceRecord>>>,
    pub notice: Option<String>,
}

impl HistoryState {
    #[must_use]
    pub fn summary(&self) -> HistorySummary {
        self.records
            .as_ref()
            .and_then(Resource::value)
            .map_or_else(HistorySummary::default, |records| HistorySummary {
                count: records.len(),
                total_cost: total_cost(records),
            })
    }
}

#[derive(Debug)]
pub enum HistoryEvent {
    LoadStarted,
    Loaded {
        vehicle: Option<Vehicle>,
        records: Vec<MaintenanceRecord>,
    },
    LoadFailed(String),
    ActionFailed(String),
    NoticeDismissed,
}

pub struct HistoryReducer;

impl Reducer for HistoryReducer {
    type State = HistoryState;
    type Event = HistoryEvent;

    fn reduce(state: &HistoryState, event: HistoryEvent) -> HistoryState {
        match event {
            HistoryEvent::LoadStarted => HistoryState {
                loading: true,
                ..state.clone()
            },
            HistoryEvent::Loaded { vehicle, records } => HistoryState {
                loading: false,
                vehicle,
                records: Some(Resource::Success(records)),
                notice: state.notice.clone(),
            },
            HistoryEvent::LoadFailed(message) => HistoryState {
                loading: false,
                records: Some(Resource::failed(message, state.records.as_ref())),
                ..state.clone()
            },
            HistoryEvent::ActionFailed(message) => HistoryState {
                notice: Some(message),
                ..state.clone()
            },
            HistoryEvent::NoticeDismissed => HistoryState {
                notice: None,
                ..state.clone()
            },
        }
    }
}

/// Service log of the current vehicle
pub struct HistoryScreen<G> {
    sync: SyncOrchestrator<G>,
    holder: StateHolder<HistoryReducer>,
}

impl<G: RemoteGateway> HistoryScreen<G> {
    #[must_use]
    pub fn new(sync: SyncOrchestrator<G>) -> Self {
        Self {
            sync,
            holder: StateHolder::default(),
        }
    }

    pub fn holder(&self) -> &StateHolder<HistoryReducer> {
        &self.holder
    }

    #[must_use]
    pub fn state(&self) -> HistoryState {
        self.holder.state()
    }

    pub async fn load(&self) {
        self.holder.dispatch(HistoryEvent::LoadStarted);
        match self.fetch().await {
            Ok((vehicle, records)) => self
                .holder
                .dispatch(HistoryEvent::Loaded { vehicle, records }),
            Err(error) => self
                .holder
                .dispatch(HistoryEvent::LoadFailed(error.user_message())),
        }
    }

    async fn fetch(&self) -> Result<(Option<Vehicle>, Vec<MaintenanceRecord>)> {
        let store = self.sync.store();
        let Some(vehicle) = store.current_vehicle().await? else {
            return Ok((None, Vec::new()));
        };
        let records = store.list_history(&vehicle.id).await?;
        Ok((Some(vehicle), records))
    }

    /// Log a service and reload. Returns the stored record on success.
    pub async fn add(&self, input: NewRecord) -> Option<MaintenanceRecord> {
        let result = self.sync.store().add_record(input).await;
        let record = match result {
            Ok(record) => Some(record),
            Err(error) => {
                self.holder
                    .dispatch(HistoryEvent::ActionFailed(error.user_message()));
                None
            }
        };
        self.load().await;
        record
    }

    /// Delete on the backend and locally, then reload
    pub async fn delete(&self, id: &HistoryId) {
        if let Err(error) = self.sync.delete_record(id).await {
            self.holder
                .dispatch(HistoryEvent::ActionFailed(error.user_message()));
        }
        self.load().await;
    }

    pub fn dismiss_notice(&self) {
        self.holder.dispatch(HistoryEvent::NoticeDismissed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FuelType, MaintenanceType, NewVehicle, UsageType, VehicleId};
    use crate::remote::fake::FakeGateway;
    use crate::services::LocalStore;
    use pretty_assertions::assert_eq;

    fn service(vehicle_id: VehicleId, cost: Option<f64>) -> NewRecord {
        NewRecord {
            vehicle_id,
            task_type: MaintenanceType::OilChange,
            serviced_at: 1_700_000_000_000,
            mileage: Some(42_000),
            cost,
            workshop: Some("Corner Garage".to_string()),
            notes: None,
        }
    }

    async fn screen() -> (HistoryScreen<FakeGateway>, Vehicle, FakeGateway) {
        let store = LocalStore::open_in_memory().await.unwrap();
        let vehicle = store
            .add_vehicle(NewVehicle {
                brand: "Skoda".to_string(),
                model: "Octavia".to_string(),
                year: 2017,
                plate: None,
                fuel_type: FuelType::Diesel,
                usage_type: UsageType::Highway,
            })
            .await
            .unwrap();
        let gateway = FakeGateway::new();
        let screen = HistoryScreen::new(SyncOrchestrator::new(store, gateway.clone()));
        (screen, vehicle, gateway)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn summary_counts_records_and_known_costs() {
        let (screen, vehicle, _) = screen().await;
        screen.add(service(vehicle.id, Some(89.5))).await.unwrap();
        screen.add(service(vehicle.id, None)).await.unwrap();
        screen.add(service(vehicle.id, Some(10.5))).await.unwrap();

        let summary = screen.state().summary();
        assert_eq!(
            summary,
            HistorySummary {
                count: 3,
                total_cost: 100.0,
            }
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn invalid_record_is_reported() {
        let (screen, vehicle, _) = screen().await;
        let added = screen.add(service(vehicle.id, Some(-1.0))).await;

        assert_eq!(added, None);
        let state = screen.state();
        assert_eq!(state.notice.as_deref(), Some("Cost must be a positive amount"));
        assert_eq!(state.summary().count, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn local_only_record_is_deleted_without_backend() {
        let (screen, vehicle, gateway) = screen().await;
        gateway.set_offline(true);
        let record = screen.add(service(vehicle.id, Some(50.0))).await.unwrap();

        screen.delete(&record.id).await;

        assert_eq!(screen.state().summary().count, 0);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn synced_record_stays_when_backend_is_down() {
        let (screen, vehicle, gateway) = screen().await;
        let record = screen.add(service(vehicle.id, Some(50.0))).await.unwrap();
        screen
            .sync
            .store()
            .mark_record_synced(&record.id, "hist-4")
            .await
            .unwrap();
        gateway.set_offline(true);

        screen.delete(&record.id).await;

        let state = screen.state();
        assert!(state.notice.is_some());
        assert_eq!(state.summary().count, 1);
        assert_eq!(gateway.calls(), vec!["delete_record".to_string()]);
    }
}
