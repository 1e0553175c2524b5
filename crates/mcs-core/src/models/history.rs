//! Maintenance history model

use serde::{Deserialize, Serialize};

use super::{HistoryId, MaintenanceType, VehicleId};
use crate::error::{Error, Result};
use crate::util::normalize_text_option;

/// A maintenance job that was carried out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceRecord {
    pub id: HistoryId,
    pub remote_id: Option<String>,
    pub vehicle_id: VehicleId,
    pub task_type: MaintenanceType,
    /// When the service happened (Unix ms)
    pub serviced_at: i64,
    /// Odometer reading at service time (km)
    pub mileage: Option<i64>,
    pub cost: Option<f64>,
    pub workshop: Option<String>,
    pub notes: Option<String>,
}

/// Input for logging a service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    pub vehicle_id: VehicleId,
    pub task_type: MaintenanceType,
    pub serviced_at: i64,
    pub mileage: Option<i64>,
    pub cost: Option<f64>,
    pub workshop: Option<String>,
    pub notes: Option<String>,
}

impl NewRecord {
    pub fn validate(self) -> Result<Self> {
        if self.mileage.is_some_and(|mileage| mileage < 0) {
            return Err(Error::InvalidInput("Mileage cannot be negative".into()));
        }
        if self.cost.is_some_and(|cost| !cost.is_finite() || cost < 0.0) {
            return Err(Error::InvalidInput("Cost must be a positive amount".into()));
        }
        Ok(Self {
            workshop: normalize_text_option(self.workshop),
            notes: normalize_text_option(self.notes),
            ..self
        })
    }

    #[must_use]
    pub fn into_record(self) -> MaintenanceRecord {
        MaintenanceRecord {
            id: HistoryId::new(),
            remote_id: None,
            vehicle_id: self.vehicle_id,
            task_type: self.task_type,
            serviced_at: self.serviced_at,
            mileage: self.mileage,
            cost: self.cost,
            workshop: self.workshop,
            notes: self.notes,
        }
    }
}

/// Sum of known costs across records
#[must_use]
pub fn total_cost(records: &[MaintenanceRecord]) -> f64 {
    records.iter().filter_map(|record| record.cost).sum()
}
