//! Backend gateway: transfer objects, the gateway contract and its HTTP client

mod client;
mod dto;
#[cfg(test)]
pub(crate) mod fake;

pub use client::HttpGateway;
pub use dto::{
    ChatMessageDto, ChatReplyDto, GuideArticleDto, MaintenanceRecordDto, MaintenanceTaskDto,
    UserProfileDto, VehicleDto, WarningLightDto,
};

use crate::error::Result;
use crate::models::ConversationId;

/// Operations the backend exposes to the app.
///
/// Ids passed in are backend ids, never local ones.
#[allow(async_fn_in_trait)]
pub trait RemoteGateway {
    async fn list_vehicles(&self) -> Result<Vec<VehicleDto>>;

    async fn create_vehicle(&self, vehicle: &VehicleDto) -> Result<VehicleDto>;

    async fn update_vehicle(&self, remote_id: &str, vehicle: &VehicleDto) -> Result<VehicleDto>;

    async fn delete_vehicle(&self, remote_id: &str) -> Result<()>;

    /// Mark a vehicle current on the backend, clearing any other
    async fn set_current_vehicle(&self, remote_id: &str) -> Result<()>;

    async fn list_tasks(&self, vehicle_remote_id: &str) -> Result<Vec<MaintenanceTaskDto>>;

    async fn create_task(&self, task: &MaintenanceTaskDto) -> Result<MaintenanceTaskDto>;

    async fn update_task(
        &self,
        remote_id: &str,
        task: &MaintenanceTaskDto,
    ) -> Result<MaintenanceTaskDto>;

    async fn delete_task(&self, remote_id: &str) -> Result<()>;

    async fn list_history(&self, vehicle_remote_id: &str) -> Result<Vec<MaintenanceRecordDto>>;

    async fn create_record(&self, record: &MaintenanceRecordDto) -> Result<MaintenanceRecordDto>;

    async fn delete_record(&self, remote_id: &str) -> Result<()>;

    async fn list_warning_lights(&self) -> Result<Vec<WarningLightDto>>;

    async fn list_guides(&self) -> Result<Vec<GuideArticleDto>>;

    /// Ask the assistant for the next reply in a conversation
    async fn chat_reply(
        &self,
        conversation: &ConversationId,
        messages: &[ChatMessageDto],
    ) -> Result<String>;

    async fn profile(&self) -> Result<UserProfileDto>;
}
