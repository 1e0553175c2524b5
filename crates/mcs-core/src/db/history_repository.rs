//! Maintenance history repository implementation

use libsql::{params, Connection, Row};

use super::connection::in_transaction;
use super::rows::{id, nullable, opt_int, opt_real, opt_text, variant};
use crate::error::{Error, Result};
use crate::models::{HistoryId, MaintenanceRecord, VehicleId};

const HISTORY_COLUMNS: &str =
    "id, remote_id, vehicle_id, task_type, serviced_at, mileage, cost, workshop, notes";

/// Trait for maintenance history storage operations (async)
#[allow(async_fn_in_trait)]
pub trait HistoryRepository {
    /// Records of a vehicle, most recent service first
    async fn list_for_vehicle(&self, vehicle_id: &VehicleId) -> Result<Vec<MaintenanceRecord>>;

    /// Get a record by ID
    async fn get(&self, id: &HistoryId) -> Result<Option<MaintenanceRecord>>;

    /// Insert a new record
    async fn insert(&self, record: &MaintenanceRecord) -> Result<()>;

    /// Delete a record
    async fn delete(&self, id: &HistoryId) -> Result<()>;

    /// Records never sent to the backend
    async fn list_unsynced(&self) -> Result<Vec<MaintenanceRecord>>;

    /// Record the backend identity of a record
    async fn mark_synced(&self, id: &HistoryId, remote_id: &str) -> Result<()>;

    /// Swap the synced records of a vehicle for `records`
    async fn replace_for_vehicle(
        &self,
        vehicle_id: &VehicleId,
        records: &[MaintenanceRecord],
    ) -> Result<()>;
}

/// libSQL implementation of `HistoryRepository`
pub struct LibSqlHistoryRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlHistoryRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_record(row: &Row) -> Result<MaintenanceRecord> {
        Ok(MaintenanceRecord {
            id: id(row, 0)?,
            remote_id: opt_text(row, 1)?,
            vehicle_id: id(row, 2)?,
            task_type: variant(row, 3)?,
            serviced_at: row.get(4)?,
            mileage: opt_int(row, 5)?,
            cost: opt_real(row, 6)?,
            workshop: opt_text(row, 7)?,
            notes: opt_text(row, 8)?,
        })
    }

    async fn query_records(
        &self,
        sql: &str,
        args: impl libsql::params::IntoParams,
    ) -> Result<Vec<MaintenanceRecord>> {
        let mut rows = self.conn.query(sql, args).await?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(Self::parse_record(&row)?);
        }
        Ok(records)
    }

    async fn insert_row(&self, verb: &str, record: &MaintenanceRecord) -> Result<()> {
        self.conn
            .execute(
                &format!(
                    "{verb} INTO maintenance_history ({HISTORY_COLUMNS})
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
                ),
                params![
                    record.id.as_str(),
                    nullable(record.remote_id.clone()),
                    record.vehicle_id.as_str(),
                    record.task_type.as_str(),
                    record.serviced_at,
                    nullable(record.mileage),
                    nullable(record.cost),
                    nullable(record.workshop.clone()),
                    nullable(record.notes.clone())
                ],
            )
            .await?;
        Ok(())
    }
}

impl HistoryRepository for LibSqlHistoryRepository<'_> {
    async fn list_for_vehicle(&self, vehicle_id: &VehicleId) -> Result<Vec<MaintenanceRecord>> {
        self.query_records(
            &format!(
                "SELECT {HISTORY_COLUMNS} FROM maintenance_history
                 WHERE vehicle_id = ?
                 ORDER BY serviced_at DESC, id DESC"
            ),
            [vehicle_id.as_str()],
        )
        .await
    }

    async fn get(&self, id: &HistoryId) -> Result<Option<MaintenanceRecord>> {
        let records = self
            .query_records(
                &format!("SELECT {HISTORY_COLUMNS} FROM maintenance_history WHERE id = ?"),
                [id.as_str()],
            )
            .await?;
        Ok(records.into_iter().next())
    }

    async fn insert(&self, record: &MaintenanceRecord) -> Result<()> {
        self.insert_row("INSERT", record).await
    }

    async fn delete(&self, id: &HistoryId) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM maintenance_history WHERE id = ?", [id.as_str()])
            .await?;
        if rows == 0 {
            return Err(Error::NotFound(format!("History record {id}")));
        }
        Ok(())
    }

    async fn list_unsynced(&self) -> Result<Vec<MaintenanceRecord>> {
        self.query_records(
            &format!(
                "SELECT {HISTORY_COLUMNS} FROM maintenance_history
                 WHERE remote_id IS NULL
                 ORDER BY serviced_at ASC"
            ),
            (),
        )
        .await
    }

    async fn mark_synced(&self, id: &HistoryId, remote_id: &str) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE maintenance_history SET remote_id = ? WHERE id = ?",
                [remote_id.to_string(), id.as_str()],
            )
            .await?;
        if rows == 0 {
            return Err(Error::NotFound(format!("History record {id}")));
        }
        Ok(())
    }

    async fn replace_for_vehicle(
        &self,
        vehicle_id: &VehicleId,
        records: &[MaintenanceRecord],
    ) -> Result<()> {
        let conn = self.conn;
        let key = vehicle_id.as_str();
        in_transaction(conn, || async move {
            conn.execute(
                "DELETE FROM maintenance_history WHERE vehicle_id = ? AND remote_id IS NOT NULL",
                [key.as_str()],
            )
            .await?;
            for record in records {
                self.insert_row("INSERT OR REPLACE", record).await?;
            }
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::MaintenanceType;
    use pretty_assertions::assert_eq;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn record(vehicle_id: VehicleId, serviced_at: i64) -> MaintenanceRecord {
        MaintenanceRecord {
            id: HistoryId::new(),
            remote_id: None,
            vehicle_id,
            task_type: MaintenanceType::OilChange,
            serviced_at,
            mileage: Some(12_345),
            cost: Some(49.99),
            workshop: Some("Corner Garage".to_string()),
            notes: None,
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_insert_get_roundtrip() {
        let db = setup().await;
        let repo = LibSqlHistoryRepository::new(db.connection());
        let original = record(VehicleId::new(), 10);

        repo.insert(&original).await.unwrap();
        assert_eq!(repo.get(&original.id).await.unwrap().unwrap(), original);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_newest_first() {
        let db = setup().await;
        let repo = LibSqlHistoryRepository::new(db.connection());
        let vehicle_id = VehicleId::new();
        repo.insert(&record(vehicle_id, 10)).await.unwrap();
        repo.insert(&record(vehicle_id, 30)).await.unwrap();
        repo.insert(&record(vehicle_id, 20)).await.unwrap();

        let order = repo
            .list_for_vehicle(&vehicle_id)
            .await
            .unwrap()
            .iter()
            .map(|r| r.serviced_at)
            .collect::<Vec<_>>();
        assert_eq!(order, vec![30, 20, 10]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_replace_keeps_unsynced_records() {
        let db = setup().await;
        let repo = LibSqlHistoryRepository::new(db.connection());
        let vehicle_id = VehicleId::new();

        let local_only = record(vehicle_id, 1);
        let synced = MaintenanceRecord {
            remote_id: Some("r1".to_string()),
            ..record(vehicle_id, 2)
        };
        repo.insert(&local_only).await.unwrap();
        repo.insert(&synced).await.unwrap();

        let pulled = MaintenanceRecord {
            remote_id: Some("r2".to_string()),
            ..record(vehicle_id, 3)
        };
        repo.replace_for_vehicle(&vehicle_id, std::slice::from_ref(&pulled))
            .await
            .unwrap();

        let ids = repo
            .list_for_vehicle(&vehicle_id)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![pulled.id, local_only.id]);
        assert_eq!(repo.list_unsynced().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_delete() {
        let db = setup().await;
        let repo = LibSqlHistoryRepository::new(db.connection());
        let r = record(VehicleId::new(), 1);
        repo.insert(&r).await.unwrap();

        repo.delete(&r.id).await.unwrap();
        assert!(repo.get(&r.id).await.unwrap().is_none());
        assert!(matches!(repo.delete(&r.id).await, Err(Error::NotFound(_))));
    }
}
