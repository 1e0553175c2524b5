//! Vehicle model

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use super::{FuelType, UsageType, VehicleId};
use crate::error::{Error, Result};
use crate::util::normalize_text_option;

/// Oldest model year accepted by the vehicle form
pub const MIN_MODEL_YEAR: i32 = 1950;

/// A vehicle registered by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Local identifier
    pub id: VehicleId,
    /// Identifier assigned by the backend, once known
    pub remote_id: Option<String>,
    pub brand: String,
    pub model: String,
    pub year: i32,
    /// License plate
    pub plate: Option<String>,
    pub fuel_type: FuelType,
    pub usage_type: UsageType,
    /// Active context for maintenance screens; at most one vehicle has it
    pub is_current: bool,
    /// Local changes not yet pushed
    pub pending_sync: bool,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

impl Vehicle {
    /// Display name such as "2019 Toyota Corolla"
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {} {}", self.year, self.brand, self.model)
    }
}

/// Input for registering a vehicle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVehicle {
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub plate: Option<String>,
    pub fuel_type: FuelType,
    pub usage_type: UsageType,
}

impl NewVehicle {
    /// Trim fields and check them, returning the cleaned input.
    pub fn validate(self) -> Result<Self> {
        let brand = self.brand.trim().to_string();
        if brand.is_empty() {
            return Err(Error::InvalidInput("Brand is required".into()));
        }
        let model = self.model.trim().to_string();
        if model.is_empty() {
            return Err(Error::InvalidInput("Model is required".into()));
        }

        let max_year = chrono::Utc::now().year() + 1;
        if !(MIN_MODEL_YEAR..=max_year).contains(&self.year) {
            return Err(Error::InvalidInput(format!(
                "Year must be between {MIN_MODEL_YEAR} and {max_year}"
            )));
        }

        Ok(Self {
            brand,
            model,
            year: self.year,
            plate: normalize_text_option(self.plate).map(|plate| plate.to_uppercase()),
            fuel_type: self.fuel_type,
            usage_type: self.usage_type,
        })
    }

    /// Build a local vehicle from validated input
    #[must_use]
    pub fn into_vehicle(self, now: i64) -> Vehicle {
        Vehicle {
            id: VehicleId::new(),
            remote_id: None,
            brand: self.brand,
            model: self.model,
            year: self.year,
            plate: self.plate,
            fuel_type: self.fuel_type,
            usage_type: self.usage_type,
            is_current: false,
            pending_sync: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> NewVehicle {
        NewVehicle {
            brand: " Toyota ".to_string(),
            model: "Corolla".to_string(),
            year: 2019,
            plate: Some(" abc-123 ".to_string()),
            fuel_type: FuelType::Gasoline,
            usage_type: UsageType::Mixed,
        }
    }

    #[test]
    fn test_validate_trims_and_normalizes_plate() {
        let valid = input().validate().unwrap();
        assert_eq!(valid.brand, "Toyota");
        assert_eq!(valid.plate.as_deref(), Some("ABC-123"));
    }

    #[test]
    fn test_validate_rejects_blank_brand() {
        let error = NewVehicle {
            brand: "   ".to_string(),
            ..input()
        }
        .validate()
        .unwrap_err();
        assert_eq!(error.user_message(), "Brand is required");
    }

    #[test]
    fn test_validate_rejects_out_of_range_year() {
        assert!(NewVehicle { year: 1890, ..input() }.validate().is_err());
        assert!(NewVehicle { year: 3000, ..input() }.validate().is_err());
    }

    #[test]
    fn test_blank_plate_becomes_none() {
        let valid = NewVehicle {
            plate: Some("  ".to_string()),
            ..input()
        }
        .validate()
        .unwrap();
        assert_eq!(valid.plate, None);
    }

    #[test]
    fn test_into_vehicle_is_pending_and_not_current() {
        let vehicle = input().validate().unwrap().into_vehicle(42);
        assert!(vehicle.pending_sync);
        assert!(!vehicle.is_current);
        assert_eq!(vehicle.created_at, 42);
        assert_eq!(vehicle.display_name(), "2019 Toyota Corolla");
    }
}
