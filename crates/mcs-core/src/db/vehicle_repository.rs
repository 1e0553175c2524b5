//! Vehicle repository implementation

use libsql::{params, Connection, Row};

use super::connection::in_transaction;
use super::rows::{flag, id, nullable, opt_text, variant};
use crate::error::{Error, Result};
use crate::models::{Vehicle, VehicleId};

const VEHICLE_COLUMNS: &str = "id, remote_id, brand, model, year, plate, fuel_type, usage_type,
    is_current, pending_sync, created_at, updated_at";

/// Trait for vehicle storage operations (async)
#[allow(async_fn_in_trait)]
pub trait VehicleRepository {
    /// List all vehicles, oldest first
    async fn list(&self) -> Result<Vec<Vehicle>>;

    /// Get a vehicle by ID
    async fn get(&self, id: &VehicleId) -> Result<Option<Vehicle>>;

    /// The vehicle flagged current, if any
    async fn current(&self) -> Result<Option<Vehicle>>;

    /// Find a vehicle by its backend identifier
    async fn find_by_remote_id(&self, remote_id: &str) -> Result<Option<Vehicle>>;

    /// Insert a new vehicle
    async fn insert(&self, vehicle: &Vehicle) -> Result<()>;

    /// Overwrite an existing vehicle row
    async fn update(&self, vehicle: &Vehicle) -> Result<()>;

    /// Delete a vehicle together with its tasks and history
    async fn delete(&self, id: &VehicleId) -> Result<()>;

    /// Make `id` the only current vehicle
    async fn set_current(&self, id: &VehicleId) -> Result<()>;

    /// Replace the synced rows with `vehicles`; rows with unpushed changes win
    async fn replace_all(&self, vehicles: &[Vehicle]) -> Result<()>;

    /// Vehicles with local changes not yet pushed
    async fn list_pending(&self) -> Result<Vec<Vehicle>>;

    /// Record the backend identity of a pushed vehicle.
    ///
    /// The pending flag is cleared only while the row still carries the
    /// `updated_at` of the `pushed` snapshot. Returns false when the row is gone.
    async fn mark_synced(&self, pushed: &Vehicle, remote_id: &str) -> Result<bool>;
}

/// libSQL implementation of `VehicleRepository`
pub struct LibSqlVehicleRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlVehicleRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a vehicle from a database row
    fn parse_vehicle(row: &Row) -> Result<Vehicle> {
        Ok(Vehicle {
            id: id(row, 0)?,
            remote_id: opt_text(row, 1)?,
            brand: row.get(2)?,
            model: row.get(3)?,
            year: row.get(4)?,
            plate: opt_text(row, 5)?,
            fuel_type: variant(row, 6)?,
            usage_type: variant(row, 7)?,
            is_current: flag(row, 8)?,
            pending_sync: flag(row, 9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }

    async fn query_vehicles(&self, sql: &str, args: impl libsql::params::IntoParams) -> Result<Vec<Vehicle>> {
        let mut rows = self.conn.query(sql, args).await?;
        let mut vehicles = Vec::new();
        while let Some(row) = rows.next().await? {
            vehicles.push(Self::parse_vehicle(&row)?);
        }
        Ok(vehicles)
    }

    async fn write_row(&self, verb: &str, vehicle: &Vehicle) -> Result<u64> {
        let rows = self
            .conn
            .execute(
                &format!(
                    "{verb} INTO vehicles ({VEHICLE_COLUMNS})
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
                ),
                params![
                    vehicle.id.as_str(),
                    nullable(vehicle.remote_id.clone()),
                    vehicle.brand.clone(),
                    vehicle.model.clone(),
                    vehicle.year,
                    nullable(vehicle.plate.clone()),
                    vehicle.fuel_type.as_str(),
                    vehicle.usage_type.as_str(),
                    i64::from(vehicle.is_current),
                    i64::from(vehicle.pending_sync),
                    vehicle.created_at,
                    vehicle.updated_at
                ],
            )
            .await?;
        Ok(rows)
    }
}

impl VehicleRepository for LibSqlVehicleRepository<'_> {
    async fn list(&self) -> Result<Vec<Vehicle>> {
        self.query_vehicles(
            &format!("SELECT {VEHICLE_COLUMNS} FROM vehicles ORDER BY created_at ASC, id ASC"),
            (),
        )
        .await
    }

    async fn get(&self, id: &VehicleId) -> Result<Option<Vehicle>> {
        let vehicles = self
            .query_vehicles(
                &format!("SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE id = ?"),
                [id.as_str()],
            )
            .await?;
        Ok(vehicles.into_iter().next())
    }

    async fn current(&self) -> Result<Option<Vehicle>> {
        let vehicles = self
            .query_vehicles(
                &format!("SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE is_current = 1 LIMIT 1"),
                (),
            )
            .await?;
        Ok(vehicles.into_iter().next())
    }

    async fn find_by_remote_id(&self, remote_id: &str) -> Result<Option<Vehicle>> {
        let vehicles = self
            .query_vehicles(
                &format!("SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE remote_id = ?"),
                [remote_id],
            )
            .await?;
        Ok(vehicles.into_iter().next())
    }

    async fn insert(&self, vehicle: &Vehicle) -> Result<()> {
        self.write_row("INSERT", vehicle).await?;
        Ok(())
    }

    async fn update(&self, vehicle: &Vehicle) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE vehicles SET remote_id = ?, brand = ?, model = ?, year = ?, plate = ?,
                    fuel_type = ?, usage_type = ?, pending_sync = ?, updated_at = ?
                 WHERE id = ?",
                params![
                    nullable(vehicle.remote_id.clone()),
                    vehicle.brand.clone(),
                    vehicle.model.clone(),
                    vehicle.year,
                    nullable(vehicle.plate.clone()),
                    vehicle.fuel_type.as_str(),
                    vehicle.usage_type.as_str(),
                    i64::from(vehicle.pending_sync),
                    vehicle.updated_at,
                    vehicle.id.as_str()
                ],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(format!("Vehicle {}", vehicle.id)));
        }
        Ok(())
    }

    async fn delete(&self, id: &VehicleId) -> Result<()> {
        let conn = self.conn;
        let key = id.as_str();
        in_transaction(conn, || async move {
            let rows = conn
                .execute("DELETE FROM vehicles WHERE id = ?", [key.as_str()])
                .await?;
            if rows == 0 {
                return Err(Error::NotFound(format!("Vehicle {key}")));
            }
            conn.execute(
                "DELETE FROM maintenance_tasks WHERE vehicle_id = ?",
                [key.as_str()],
            )
            .await?;
            conn.execute(
                "DELETE FROM maintenance_history WHERE vehicle_id = ?",
                [key.as_str()],
            )
            .await?;
            Ok(())
        })
        .await
    }

    async fn set_current(&self, id: &VehicleId) -> Result<()> {
        let conn = self.conn;
        let key = id.as_str();
        in_transaction(conn, || async move {
            conn.execute(
                "UPDATE vehicles SET is_current = 0 WHERE is_current = 1",
                (),
            )
            .await?;
            let rows = conn
                .execute(
                    "UPDATE vehicles SET is_current = 1 WHERE id = ?",
                    [key.as_str()],
                )
                .await?;
            if rows == 0 {
                return Err(Error::NotFound(format!("Vehicle {key}")));
            }
            Ok(())
        })
        .await
    }

    async fn replace_all(&self, vehicles: &[Vehicle]) -> Result<()> {
        let conn = self.conn;
        in_transaction(conn, || async move {
            conn.execute("DELETE FROM vehicles WHERE pending_sync = 0", ())
                .await?;

            let mut current_taken = self.current().await?.is_some();
            for vehicle in vehicles {
                let mut vehicle = Vehicle {
                    pending_sync: false,
                    ..vehicle.clone()
                };
                if vehicle.is_current && current_taken {
                    tracing::warn!(
                        "Ignoring extra current flag on vehicle {} during replace",
                        vehicle.id
                    );
                    vehicle.is_current = false;
                }
                if self.write_row("INSERT OR IGNORE", &vehicle).await? == 0 {
                    tracing::debug!("Kept unpushed local vehicle {} over pulled copy", vehicle.id);
                    continue;
                }
                current_taken |= vehicle.is_current;
            }

            // Synced rows whose vehicle disappeared are orphans now
            conn.execute(
                "DELETE FROM maintenance_tasks
                 WHERE sync_state = 'CLEAN' AND vehicle_id NOT IN (SELECT id FROM vehicles)",
                (),
            )
            .await?;
            conn.execute(
                "DELETE FROM maintenance_history
                 WHERE remote_id IS NOT NULL AND vehicle_id NOT IN (SELECT id FROM vehicles)",
                (),
            )
            .await?;
            Ok(())
        })
        .await
    }

    async fn list_pending(&self) -> Result<Vec<Vehicle>> {
        self.query_vehicles(
            &format!(
                "SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE pending_sync = 1 ORDER BY created_at ASC"
            ),
            (),
        )
        .await
    }

    async fn mark_synced(&self, pushed: &Vehicle, remote_id: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute(
                "UPDATE vehicles SET remote_id = ?,
                    pending_sync = CASE WHEN updated_at = ? THEN 0 ELSE pending_sync END
                 WHERE id = ?",
                params![remote_id, pushed.updated_at, pushed.id.as_str()],
            )
            .await?;
        Ok(rows > 0)
    }
}
