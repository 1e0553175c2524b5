//! mcs-core - Core library for MyCarSetting
//!
//! This crate contains the shared models, local store, backend gateway,
//! sync, reminders and screen state used by every MyCarSetting client.

pub mod chat;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod reminders;
pub mod remote;
pub mod screens;
pub mod services;
pub mod sync;
pub mod util;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use models::{MaintenanceRecord, MaintenanceTask, Vehicle, VehicleId};
pub use remote::{HttpGateway, RemoteGateway};
pub use services::LocalStore;
pub use sync::{SyncOrchestrator, SyncReport};
