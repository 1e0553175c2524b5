//! Enumerated fields shared by entities, rows and transfer objects
//!
//! Every enum has one stable upper-snake name used both on the wire and in
//! the local store. Parsing never falls back to a default: unrecognised text
//! comes back as [`UnknownVariant`] so it cannot pass for a valid value.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An enumerated field held text that matches none of its variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {field} value: {raw:?}")]
pub struct UnknownVariant {
    /// Field being parsed (e.g. `fuel_type`)
    pub field: &'static str,
    /// The text that failed to parse
    pub raw: String,
}

impl UnknownVariant {
    pub fn new(field: &'static str, raw: impl Into<String>) -> Self {
        Self {
            field,
            raw: raw.into(),
        }
    }
}

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
        }

        impl $name {
            /// All variants in declaration order
            pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

            /// Stable wire/storage name
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(UnknownVariant::new($field, other)),
                }
            }
        }
    };
}

wire_enum!(
    /// Fuel a vehicle runs on
    FuelType, "fuel_type" {
        Gasoline => "GASOLINE",
        Diesel => "DIESEL",
        Hybrid => "HYBRID",
        Electric => "ELECTRIC",
        Lpg => "LPG",
    }
);

wire_enum!(
    /// How a vehicle is mostly driven
    UsageType, "usage_type" {
        Urban => "URBAN",
        Highway => "HIGHWAY",
        Mixed => "MIXED",
        /// Towing, dusty roads, very short trips
        Severe => "SEVERE",
    }
);

wire_enum!(
    /// Kind of maintenance work
    MaintenanceType, "task_type" {
        OilChange => "OIL_CHANGE",
        TireRotation => "TIRE_ROTATION",
        BrakeInspection => "BRAKE_INSPECTION",
        BatteryCheck => "BATTERY_CHECK",
        AirFilter => "AIR_FILTER",
        Coolant => "COOLANT",
        Transmission => "TRANSMISSION",
        Inspection => "INSPECTION",
        Other => "OTHER",
    }
);

wire_enum!(
    /// How urgent a maintenance task is
    Severity, "severity" {
        Low => "LOW",
        Medium => "MEDIUM",
        High => "HIGH",
        Critical => "CRITICAL",
    }
);

wire_enum!(
    /// Lifecycle status of a maintenance task
    TaskStatus, "status" {
        Upcoming => "UPCOMING",
        Overdue => "OVERDUE",
        Completed => "COMPLETED",
    }
);

wire_enum!(
    /// Author of a chat message
    ChatRole, "role" {
        User => "USER",
        Assistant => "ASSISTANT",
    }
);

impl Default for Severity {
    fn default() -> Self {
        Self::Medium
    }
}

impl MaintenanceType {
    /// Human-readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::OilChange => "Oil change",
            Self::TireRotation => "Tire rotation",
            Self::BrakeInspection => "Brake inspection",
            Self::BatteryCheck => "Battery check",
            Self::AirFilter => "Air filter",
            Self::Coolant => "Coolant",
            Self::Transmission => "Transmission service",
            Self::Inspection => "General inspection",
            Self::Other => "Other",
        }
    }
}
