//! In-memory backend used by tests

use std::sync::{Arc, Mutex, MutexGuard};

use super::{
    ChatMessageDto, GuideArticleDto, MaintenanceRecordDto, MaintenanceTaskDto, RemoteGateway,
    UserProfileDto, VehicleDto, WarningLightDto,
};
use crate::error::{Error, Result};
use crate::models::ConversationId;

#[derive(Debug, Default)]
pub struct FakeState {
    pub vehicles: Vec<VehicleDto>,
    pub tasks: Vec<MaintenanceTaskDto>,
    pub history: Vec<MaintenanceRecordDto>,
    pub lights: Vec<WarningLightDto>,
    pub guides: Vec<GuideArticleDto>,
    pub reply: Option<String>,
    pub offline: bool,
    /// Fail every call whose name starts with this prefix
    pub fail_on: Option<&'static str>,
    pub calls: Vec<String>,
    next_id: u64,
}

#[derive(Debug, Clone, Default)]
pub struct FakeGateway {
    state: Arc<Mutex<FakeState>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn set_offline(&self, offline: bool) {
        self.state().offline = offline;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Record the call and fail when the backend is unreachable
    fn enter(&self, call: &str) -> Result<MutexGuard<'_, FakeState>> {
        let mut state = self.state();
        state.calls.push(call.to_string());
        if state.offline || state.fail_on.is_some_and(|prefix| call.starts_with(prefix)) {
            return Err(Error::Api {
                status: 503,
                message: "backend unavailable".to_string(),
            });
        }
        Ok(state)
    }
}

impl FakeState {
    fn assign_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn mark_current(&mut self, remote_id: &str) {
        for vehicle in &mut self.vehicles {
            vehicle.is_current = vehicle.id.as_deref() == Some(remote_id);
        }
    }

    /// Seed a backend-side vehicle and return its id
    pub fn add_vehicle(&mut self, mut vehicle: VehicleDto) -> String {
        let id = self.assign_id("veh");
        vehicle.id = Some(id.clone());
        self.vehicles.push(vehicle);
        id
    }

    pub fn add_task(&mut self, mut task: MaintenanceTaskDto) -> String {
        let id = self.assign_id("task");
        task.id = Some(id.clone());
        self.tasks.push(task);
        id
    }
}

fn not_found(what: &str, id: &str) -> Error {
    Error::Api {
        status: 404,
        message: format!("{what} {id} not found"),
    }
}

impl RemoteGateway for FakeGateway {
    async fn list_vehicles(&self) -> Result<Vec<VehicleDto>> {
        Ok(self.enter("list_vehicles")?.vehicles.clone())
    }

    async fn create_vehicle(&self, vehicle: &VehicleDto) -> Result<VehicleDto> {
        let mut state = self.enter("create_vehicle")?;
        let id = state.add_vehicle(vehicle.clone());
        if vehicle.is_current {
            state.mark_current(&id);
        }
        Ok(VehicleDto {
            id: Some(id),
            ..vehicle.clone()
        })
    }

    async fn update_vehicle(&self, remote_id: &str, vehicle: &VehicleDto) -> Result<VehicleDto> {
        let mut state = self.enter("update_vehicle")?;
        let slot = state
            .vehicles
            .iter_mut()
            .find(|existing| existing.id.as_deref() == Some(remote_id))
            .ok_or_else(|| not_found("vehicle", remote_id))?;
        *slot = VehicleDto {
            id: Some(remote_id.to_string()),
            ..vehicle.clone()
        };
        let updated = slot.clone();
        if updated.is_current {
            state.mark_current(remote_id);
        }
        Ok(updated)
    }

    async fn delete_vehicle(&self, remote_id: &str) -> Result<()> {
        let mut state = self.enter("delete_vehicle")?;
        state
            .vehicles
            .retain(|vehicle| vehicle.id.as_deref() != Some(remote_id));
        state.tasks.retain(|task| task.vehicle_id != remote_id);
        state.history.retain(|record| record.vehicle_id != remote_id);
        Ok(())
    }

    async fn set_current_vehicle(&self, remote_id: &str) -> Result<()> {
        let mut state = self.enter("set_current_vehicle")?;
        if !state
            .vehicles
            .iter()
            .any(|vehicle| vehicle.id.as_deref() == Some(remote_id))
        {
            return Err(not_found("vehicle", remote_id));
        }
        state.mark_current(remote_id);
        Ok(())
    }

    async fn list_tasks(&self, vehicle_remote_id: &str) -> Result<Vec<MaintenanceTaskDto>> {
        let state = self.enter("list_tasks")?;
        Ok(state
            .tasks
            .iter()
            .filter(|task| task.vehicle_id == vehicle_remote_id)
            .cloned()
            .collect())
    }

    async fn create_task(&self, task: &MaintenanceTaskDto) -> Result<MaintenanceTaskDto> {
        let mut state = self.enter("create_task")?;
        let id = state.add_task(task.clone());
        Ok(MaintenanceTaskDto {
            id: Some(id),
            ..task.clone()
        })
    }

    async fn update_task(
        &self,
        remote_id: &str,
        task: &MaintenanceTaskDto,
    ) -> Result<MaintenanceTaskDto> {
        let mut state = self.enter("update_task")?;
        let slot = state
            .tasks
            .iter_mut()
            .find(|existing| existing.id.as_deref() == Some(remote_id))
            .ok_or_else(|| not_found("task", remote_id))?;
        *slot = MaintenanceTaskDto {
            id: Some(remote_id.to_string()),
            ..task.clone()
        };
        Ok(slot.clone())
    }

    async fn delete_task(&self, remote_id: &str) -> Result<()> {
        let mut state = self.enter("delete_task")?;
        state
            .tasks
            .retain(|task| task.id.as_deref() != Some(remote_id));
        Ok(())
    }

    async fn list_history(&self, vehicle_remote_id: &str) -> Result<Vec<MaintenanceRecordDto>> {
        let state = self.enter("list_history")?;
        Ok(state
            .history
            .iter()
            .filter(|record| record.vehicle_id == vehicle_remote_id)
            .cloned()
            .collect())
    }

    async fn create_record(&self, record: &MaintenanceRecordDto) -> Result<MaintenanceRecordDto> {
        let mut state = self.enter("create_record")?;
        let id = state.assign_id("hist");
        let created = MaintenanceRecordDto {
            id: Some(id),
            ..record.clone()
        };
        state.history.push(created.clone());
        Ok(created)
    }

    async fn delete_record(&self, remote_id: &str) -> Result<()> {
        let mut state = self.enter("delete_record")?;
        state
            .history
            .retain(|record| record.id.as_deref() != Some(remote_id));
        Ok(())
    }

    async fn list_warning_lights(&self) -> Result<Vec<WarningLightDto>> {
        Ok(self.enter("list_warning_lights")?.lights.clone())
    }

    async fn list_guides(&self) -> Result<Vec<GuideArticleDto>> {
        Ok(self.enter("list_guides")?.guides.clone())
    }

    async fn chat_reply(
        &self,
        conversation: &ConversationId,
        messages: &[ChatMessageDto],
    ) -> Result<String> {
        let state = self.enter("chat_reply")?;
        state
            .reply
            .clone()
            .ok_or_else(|| Error::EmptyResponse(format!("/chat/{conversation}/reply")))
            .map(|reply| format!("{reply} ({} messages)", messages.len()))
    }

    async fn profile(&self) -> Result<UserProfileDto> {
        self.enter("profile")?;
        Ok(UserProfileDto {
            id: "user-1".to_string(),
            email: Some("driver@example.com".to_string()),
            display_name: Some("Driver".to_string()),
        })
    }
}
