//! Maintenance task repository implementation

use libsql::{params, Connection, Row};

use super::connection::in_transaction;
use super::rows::{id, nullable, opt_int, opt_text, variant};
use crate::error::{Error, Result};
use crate::models::{MaintenanceTask, SyncState, TaskId, VehicleId};

const TASK_COLUMNS: &str = "id, remote_id, vehicle_id, task_type, title, description, due_at,
    due_mileage, severity, status, created_at, updated_at, sync_state";

/// Trait for maintenance task storage operations (async)
#[allow(async_fn_in_trait)]
pub trait TaskRepository {
    /// Tasks of a vehicle that are not pending deletion, soonest due first
    async fn list_for_vehicle(&self, vehicle_id: &VehicleId) -> Result<Vec<MaintenanceTask>>;

    /// Every stored task, including rows pending deletion
    async fn list_all(&self) -> Result<Vec<MaintenanceTask>>;

    /// Get a task by ID
    async fn get(&self, id: &TaskId) -> Result<Option<MaintenanceTask>>;

    /// Insert a new task
    async fn insert(&self, task: &MaintenanceTask) -> Result<()>;

    /// Overwrite an existing task row
    async fn update(&self, task: &MaintenanceTask) -> Result<()>;

    /// Remove the row outright
    async fn delete_row(&self, id: &TaskId) -> Result<()>;

    /// Tasks with a pending mutation, oldest change first
    async fn list_pending(&self) -> Result<Vec<MaintenanceTask>>;

    /// Record the backend identity of a pushed task.
    ///
    /// The row only turns clean while it still matches the `pushed` snapshot.
    /// A newer local change stays pending, with `PendingCreate` promoted to
    /// `PendingUpdate`. Returns the resulting state, or `None` when the row
    /// was removed in the meantime.
    async fn mark_synced(
        &self,
        pushed: &MaintenanceTask,
        remote_id: &str,
    ) -> Result<Option<SyncState>>;

    /// Swap the clean rows of a vehicle for `tasks`, leaving pending rows alone
    async fn replace_clean_for_vehicle(
        &self,
        vehicle_id: &VehicleId,
        tasks: &[MaintenanceTask],
    ) -> Result<()>;
}

/// libSQL implementation of `TaskRepository`
pub struct LibSqlTaskRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlTaskRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a task from a database row
    fn parse_task(row: &Row) -> Result<MaintenanceTask> {
        Ok(MaintenanceTask {
            id: id(row, 0)?,
            remote_id: opt_text(row, 1)?,
            vehicle_id: id(row, 2)?,
            task_type: variant(row, 3)?,
            title: row.get(4)?,
            description: opt_text(row, 5)?,
            due_at: opt_int(row, 6)?,
            due_mileage: opt_int(row, 7)?,
            severity: variant(row, 8)?,
            status: variant(row, 9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
            sync_state: variant(row, 12)?,
        })
    }

    async fn query_tasks(
        &self,
        sql: &str,
        args: impl libsql::params::IntoParams,
    ) -> Result<Vec<MaintenanceTask>> {
        let mut rows = self.conn.query(sql, args).await?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next().await? {
            tasks.push(Self::parse_task(&row)?);
        }
        Ok(tasks)
    }

    async fn write_row(&self, verb: &str, task: &MaintenanceTask) -> Result<u64> {
        let rows = self
            .conn
            .execute(
                &format!(
                    "{verb} INTO maintenance_tasks ({TASK_COLUMNS})
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
                ),
                params![
                    task.id.as_str(),
                    nullable(task.remote_id.clone()),
                    task.vehicle_id.as_str(),
                    task.task_type.as_str(),
                    task.title.clone(),
                    nullable(task.description.clone()),
                    nullable(task.due_at),
                    nullable(task.due_mileage),
                    task.severity.as_str(),
                    task.status.as_str(),
                    task.created_at,
                    task.updated_at,
                    task.sync_state.as_str()
                ],
            )
            .await?;
        Ok(rows)
    }
}

impl TaskRepository for LibSqlTaskRepository<'_> {
    async fn list_for_vehicle(&self, vehicle_id: &VehicleId) -> Result<Vec<MaintenanceTask>> {
        self.query_tasks(
            &format!(
                "SELECT {TASK_COLUMNS} FROM maintenance_tasks
                 WHERE vehicle_id = ? AND sync_state != 'PENDING_DELETE'
                 ORDER BY due_at IS NULL, due_at ASC, created_at ASC"
            ),
            [vehicle_id.as_str()],
        )
        .await
    }

    async fn list_all(&self) -> Result<Vec<MaintenanceTask>> {
        self.query_tasks(
            &format!("SELECT {TASK_COLUMNS} FROM maintenance_tasks ORDER BY created_at ASC"),
            (),
        )
        .await
    }

    async fn get(&self, id: &TaskId) -> Result<Option<MaintenanceTask>> {
        let tasks = self
            .query_tasks(
                &format!("SELECT {TASK_COLUMNS} FROM maintenance_tasks WHERE id = ?"),
                [id.as_str()],
            )
            .await?;
        Ok(tasks.into_iter().next())
    }

    async fn insert(&self, task: &MaintenanceTask) -> Result<()> {
        self.write_row("INSERT", task).await?;
        Ok(())
    }

    async fn update(&self, task: &MaintenanceTask) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE maintenance_tasks SET remote_id = ?, task_type = ?, title = ?,
                    description = ?, due_at = ?, due_mileage = ?, severity = ?, status = ?,
                    updated_at = ?, sync_state = ?
                 WHERE id = ?",
                params![
                    nullable(task.remote_id.clone()),
                    task.task_type.as_str(),
                    task.title.clone(),
                    nullable(task.description.clone()),
                    nullable(task.due_at),
                    nullable(task.due_mileage),
                    task.severity.as_str(),
                    task.status.as_str(),
                    task.updated_at,
                    task.sync_state.as_str(),
                    task.id.as_str()
                ],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(format!("Task {}", task.id)));
        }
        Ok(())
    }

    async fn delete_row(&self, id: &TaskId) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM maintenance_tasks WHERE id = ?", [id.as_str()])
            .await?;
        if rows == 0 {
            return Err(Error::NotFound(format!("Task {id}")));
        }
        Ok(())
    }

    async fn list_pending(&self) -> Result<Vec<MaintenanceTask>> {
        self.query_tasks(
            &format!(
                "SELECT {TASK_COLUMNS} FROM maintenance_tasks
                 WHERE sync_state != 'CLEAN'
                 ORDER BY updated_at ASC"
            ),
            (),
        )
        .await
    }

    async fn mark_synced(
        &self,
        pushed: &MaintenanceTask,
        remote_id: &str,
    ) -> Result<Option<SyncState>> {
        let rows = self
            .conn
            .execute(
                "UPDATE maintenance_tasks SET remote_id = ?,
                    sync_state = CASE
                        WHEN updated_at = ? AND sync_state = ? THEN 'CLEAN'
                        WHEN sync_state = 'PENDING_CREATE' THEN 'PENDING_UPDATE'
                        ELSE sync_state
                    END
                 WHERE id = ?",
                params![
                    remote_id,
                    pushed.updated_at,
                    pushed.sync_state.as_str(),
                    pushed.id.as_str()
                ],
            )
            .await?;
        if rows == 0 {
            return Ok(None);
        }
        Ok(self.get(&pushed.id).await?.map(|task| task.sync_state))
    }

    async fn replace_clean_for_vehicle(
        &self,
        vehicle_id: &VehicleId,
        tasks: &[MaintenanceTask],
    ) -> Result<()> {
        let conn = self.conn;
        let key = vehicle_id.as_str();
        in_transaction(conn, || async move {
            conn.execute(
                "DELETE FROM maintenance_tasks WHERE vehicle_id = ? AND sync_state = 'CLEAN'",
                [key.as_str()],
            )
            .await?;

            for task in tasks {
                let task = MaintenanceTask {
                    sync_state: SyncState::Clean,
                    ..task.clone()
                };
                // A pending row with the same id wins over the pulled copy
                if self.write_row("INSERT OR IGNORE", &task).await? == 0 {
                    tracing::debug!("Kept pending local task {} over pulled copy", task.id);
                }
            }
            Ok(())
        })
        .await
    }
}
