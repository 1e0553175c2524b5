//! Maintenance task model

use serde::{Deserialize, Serialize};

use super::{MaintenanceType, Severity, SyncState, TaskId, TaskStatus, VehicleId};
use crate::error::{Error, Result};
use crate::util::normalize_text_option;

/// A scheduled maintenance task for a vehicle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceTask {
    /// Local identifier
    pub id: TaskId,
    /// Identifier assigned by the backend, once known
    pub remote_id: Option<String>,
    /// Owning vehicle
    pub vehicle_id: VehicleId,
    pub task_type: MaintenanceType,
    pub title: String,
    pub description: Option<String>,
    /// Due date (Unix ms)
    pub due_at: Option<i64>,
    /// Due odometer reading (km)
    pub due_mileage: Option<i64>,
    pub severity: Severity,
    pub status: TaskStatus,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
    /// Pending mutation not yet pushed
    pub sync_state: SyncState,
}

impl MaintenanceTask {
    /// Mark the task done.
    ///
    /// Identity and owning vehicle are untouched.
    pub fn complete(&mut self, now: i64) {
        self.status = TaskStatus::Completed;
        self.sync_state = SyncState::after_local_edit(self.remote_id.is_some());
        self.updated_at = now;
    }

    /// Apply an edit from the task form
    pub fn apply_edit(&mut self, edit: TaskEdit, now: i64) {
        self.task_type = edit.task_type;
        self.title = edit.title;
        self.description = edit.description;
        self.due_at = edit.due_at;
        self.due_mileage = edit.due_mileage;
        self.severity = edit.severity;
        self.sync_state = SyncState::after_local_edit(self.remote_id.is_some());
        self.updated_at = now;
    }

    /// Status as of `now`: a due date in the past makes an open task overdue.
    #[must_use]
    pub fn effective_status(&self, now: i64) -> TaskStatus {
        match (self.status, self.due_at) {
            (TaskStatus::Completed, _) => TaskStatus::Completed,
            (_, Some(due_at)) if due_at < now => TaskStatus::Overdue,
            (status, _) => status,
        }
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        !matches!(self.status, TaskStatus::Completed)
    }
}

/// Input for creating a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub vehicle_id: VehicleId,
    #[serde(flatten)]
    pub fields: TaskEdit,
}

impl NewTask {
    pub fn validate(self) -> Result<Self> {
        Ok(Self {
            vehicle_id: self.vehicle_id,
            fields: self.fields.validate()?,
        })
    }

    /// Build a local task from validated input
    #[must_use]
    pub fn into_task(self, now: i64) -> MaintenanceTask {
        let status = match self.fields.due_at {
            Some(due_at) if due_at < now => TaskStatus::Overdue,
            _ => TaskStatus::Upcoming,
        };
        MaintenanceTask {
            id: TaskId::new(),
            remote_id: None,
            vehicle_id: self.vehicle_id,
            task_type: self.fields.task_type,
            title: self.fields.title,
            description: self.fields.description,
            due_at: self.fields.due_at,
            due_mileage: self.fields.due_mileage,
            severity: self.fields.severity,
            status,
            created_at: now,
            updated_at: now,
            sync_state: SyncState::PendingCreate,
        }
    }
}

/// Editable task fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEdit {
    pub task_type: MaintenanceType,
    pub title: String,
    pub description: Option<String>,
    pub due_at: Option<i64>,
    pub due_mileage: Option<i64>,
    #[serde(default)]
    pub severity: Severity,
}

impl TaskEdit {
    pub fn validate(self) -> Result<Self> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(Error::InvalidInput("Title is required".into()));
        }
        if self.due_at.is_none() && self.due_mileage.is_none() {
            return Err(Error::InvalidInput(
                "Set a due date or a due mileage".into(),
            ));
        }
        if self.due_mileage.is_some_and(|mileage| mileage < 0) {
            return Err(Error::InvalidInput("Mileage cannot be negative".into()));
        }

        Ok(Self {
            title,
            description: normalize_text_option(self.description),
            ..self
        })
    }
}
