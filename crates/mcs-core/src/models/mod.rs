//! Data models for MyCarSetting

mod chat;
mod enums;
mod history;
mod id;
mod maintenance;
mod manual;
mod sync_state;
mod vehicle;

pub use chat::ChatMessage;
pub use enums::{
    ChatRole, FuelType, MaintenanceType, Severity, TaskStatus, UnknownVariant, UsageType,
};
pub use history::{total_cost, MaintenanceRecord, NewRecord};
pub use id::{ConversationId, HistoryId, MessageId, TaskId, VehicleId};
pub use maintenance::{MaintenanceTask, NewTask, TaskEdit};
pub use manual::{GuideArticle, UserProfile, WarningLight};
pub use sync_state::SyncState;
pub use vehicle::{NewVehicle, Vehicle, MIN_MODEL_YEAR};
