//! JSON transfer objects exchanged with the backend and their entity mappers.
//!
//! Enumerated fields travel as plain strings and are parsed on the way in, so
//! an unexpected value surfaces as [`UnknownVariant`](crate::models::UnknownVariant)
//! instead of silently turning into a default.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{
    ChatMessage, GuideArticle, HistoryId, MaintenanceRecord, MaintenanceTask, SyncState, TaskId,
    UserProfile, Vehicle, VehicleId, WarningLight,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub brand: String,
    pub model: String,
    pub year: i32,
    #[serde(default)]
    pub plate: Option<String>,
    pub fuel_type: String,
    pub usage_type: String,
    #[serde(default)]
    pub is_current: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceTaskDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Backend id of the owning vehicle
    pub vehicle_id: String,
    pub task_type: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_at: Option<i64>,
    #[serde(default)]
    pub due_mileage: Option<i64>,
    pub severity: String,
    pub status: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceRecordDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Backend id of the owning vehicle
    pub vehicle_id: String,
    pub task_type: String,
    pub serviced_at: i64,
    #[serde(default)]
    pub mileage: Option<i64>,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub workshop: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageDto {
    pub role: String,
    pub content: String,
    pub sent_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReplyDto {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarningLightDto {
    pub id: String,
    pub name: String,
    pub description: String,
    pub severity: String,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideArticleDto {
    pub id: String,
    pub title: String,
    pub category: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileDto {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

fn remote_id(id: Option<String>, kind: &str) -> Result<String> {
    id.filter(|id| !id.trim().is_empty())
        .ok_or_else(|| Error::InvalidInput(format!("Server {kind} is missing an id")))
}

/// Local identity for a pulled row: the echoed client id, else `known`.
fn local_id<T: FromStr>(client_id: Option<&str>, known: Option<T>) -> Option<T> {
    client_id.and_then(|raw| raw.parse().ok()).or(known)
}

impl VehicleDto {
    pub fn from_vehicle(vehicle: &Vehicle) -> Self {
        Self {
            id: vehicle.remote_id.clone(),
            client_id: Some(vehicle.id.to_string()),
            brand: vehicle.brand.clone(),
            model: vehicle.model.clone(),
            year: vehicle.year,
            plate: vehicle.plate.clone(),
            fuel_type: vehicle.fuel_type.as_str().to_string(),
            usage_type: vehicle.usage_type.as_str().to_string(),
            is_current: vehicle.is_current,
            created_at: vehicle.created_at,
            updated_at: vehicle.updated_at,
        }
    }

    /// Map a pulled vehicle to a synced local entity.
    pub fn into_vehicle(self, known: Option<VehicleId>) -> Result<Vehicle> {
        let id = local_id(self.client_id.as_deref(), known).unwrap_or_default();
        Ok(Vehicle {
            id,
            remote_id: Some(remote_id(self.id, "vehicle")?),
            brand: self.brand,
            model: self.model,
            year: self.year,
            plate: self.plate,
            fuel_type: self.fuel_type.parse()?,
            usage_type: self.usage_type.parse()?,
            is_current: self.is_current,
            pending_sync: false,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl MaintenanceTaskDto {
    pub fn from_task(task: &MaintenanceTask, vehicle_remote_id: &str) -> Self {
        Self {
            id: task.remote_id.clone(),
            client_id: Some(task.id.to_string()),
            vehicle_id: vehicle_remote_id.to_string(),
            task_type: task.task_type.as_str().to_string(),
            title: task.title.clone(),
            description: task.description.clone(),
            due_at: task.due_at,
            due_mileage: task.due_mileage,
            severity: task.severity.as_str().to_string(),
            status: task.status.as_str().to_string(),
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }

    /// Map a pulled task of `vehicle_id` to a `Clean` local entity.
    pub fn into_task(self, vehicle_id: VehicleId, known: Option<TaskId>) -> Result<MaintenanceTask> {
        let id = local_id(self.client_id.as_deref(), known).unwrap_or_default();
        Ok(MaintenanceTask {
            id,
            remote_id: Some(remote_id(self.id, "task")?),
            vehicle_id,
            task_type: self.task_type.parse()?,
            title: self.title,
            description: self.description,
            due_at: self.due_at,
            due_mileage: self.due_mileage,
            severity: self.severity.parse()?,
            status: self.status.parse()?,
            created_at: self.created_at,
            updated_at: self.updated_at,
            sync_state: SyncState::Clean,
        })
    }
}

impl MaintenanceRecordDto {
    pub fn from_record(record: &MaintenanceRecord, vehicle_remote_id: &str) -> Self {
        Self {
            id: record.remote_id.clone(),
            client_id: Some(record.id.to_string()),
            vehicle_id: vehicle_remote_id.to_string(),
            task_type: record.task_type.as_str().to_string(),
            serviced_at: record.serviced_at,
            mileage: record.mileage,
            cost: record.cost,
            workshop: record.workshop.clone(),
            notes: record.notes.clone(),
        }
    }

    pub fn into_record(
        self,
        vehicle_id: VehicleId,
        known: Option<HistoryId>,
    ) -> Result<MaintenanceRecord> {
        let id = local_id(self.client_id.as_deref(), known).unwrap_or_default();
        Ok(MaintenanceRecord {
            id,
            remote_id: Some(remote_id(self.id, "history record")?),
            vehicle_id,
            task_type: self.task_type.parse()?,
            serviced_at: self.serviced_at,
            mileage: self.mileage,
            cost: self.cost,
            workshop: self.workshop,
            notes: self.notes,
        })
    }
}

impl From<&ChatMessage> for ChatMessageDto {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
            sent_at: message.sent_at,
        }
    }
}

impl TryFrom<WarningLightDto> for WarningLight {
    type Error = Error;

    fn try_from(dto: WarningLightDto) -> Result<Self> {
        Ok(Self {
            id: dto.id,
            name: dto.name,
            description: dto.description,
            severity: dto.severity.parse()?,
            action: dto.action,
        })
    }
}

impl From<GuideArticleDto> for GuideArticle {
    fn from(dto: GuideArticleDto) -> Self {
        Self {
            id: dto.id,
            title: dto.title,
            category: dto.category,
            body: dto.body,
        }
    }
}

impl From<UserProfileDto> for UserProfile {
    fn from(dto: UserProfileDto) -> Self {
        Self {
            id: dto.id,
            email: dto.email,
            display_name: dto.display_name,
        }
    }
}
