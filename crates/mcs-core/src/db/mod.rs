//! Database layer for MyCarSetting

mod chat_repository;
mod connection;
mod history_repository;
mod migrations;
pub(crate) mod rows;
mod task_repository;
mod vehicle_repository;

pub use chat_repository::{ChatRepository, LibSqlChatRepository};
pub use connection::{in_transaction, Database};
pub use history_repository::{HistoryRepository, LibSqlHistoryRepository};
pub use task_repository::{LibSqlTaskRepository, TaskRepository};
pub use vehicle_repository::{LibSqlVehicleRepository, VehicleRepository};
