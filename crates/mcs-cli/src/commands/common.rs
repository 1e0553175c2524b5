use std::path::PathBuf;

use mcs_core::models::{MaintenanceTask, Vehicle};
use mcs_core::util::{format_date, DAY_MS};
use mcs_core::{AppConfig, HttpGateway, LocalStore, SyncOrchestrator};

use crate::error::CliError;

const SHORT_ID_LEN: usize = 13;

/// Loaded configuration plus the opened local store
pub struct Context {
    pub config: AppConfig,
    pub store: LocalStore,
}

impl Context {
    pub async fn open(db_path: Option<PathBuf>) -> Result<Self, CliError> {
        Self::with_config(AppConfig::load()?, db_path).await
    }

    pub async fn with_config(
        config: AppConfig,
        db_path: Option<PathBuf>,
    ) -> Result<Self, CliError> {
        let path = match db_path {
            Some(path) => path,
            None => config.resolved_db_path()?,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        tracing::debug!("Opening local store at {}", path.display());
        let store = LocalStore::open_path(path).await?;
        Ok(Self { config, store })
    }

    pub fn gateway(&self) -> Result<HttpGateway, CliError> {
        self.config
            .gateway()?
            .ok_or(CliError::BackendNotConfigured)
    }

    pub fn sync(&self) -> Result<SyncOrchestrator<HttpGateway>, CliError> {
        Ok(SyncOrchestrator::new(self.store.clone(), self.gateway()?))
    }

    pub async fn current_vehicle(&self) -> Result<Vehicle, CliError> {
        self.store
            .current_vehicle()
            .await?
            .ok_or(CliError::NoCurrentVehicle)
    }
}

pub fn normalize_identifier(raw: &str) -> Result<&str, CliError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyId)
    } else {
        Ok(trimmed)
    }
}

/// Find the single item whose id equals or starts with `query`.
pub fn resolve_by_prefix<'a, T>(
    items: &'a [T],
    query: &str,
    id_of: impl Fn(&T) -> String,
    kind: &'static str,
) -> Result<&'a T, CliError> {
    let query = normalize_identifier(query)?.to_lowercase();

    if let Some(exact) = items.iter().find(|item| id_of(item) == query) {
        return Ok(exact);
    }

    let matches = items
        .iter()
        .filter(|item| id_of(item).starts_with(&query))
        .collect::<Vec<_>>();
    match matches.as_slice() {
        [] => Err(CliError::NotFound {
            kind,
            query: query.clone(),
        }),
        [single] => Ok(*single),
        several => {
            let options = several
                .iter()
                .take(3)
                .map(|item| short_id(&id_of(item)))
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn short_id(id: &str) -> String {
    id.chars().take(SHORT_ID_LEN).collect()
}

pub fn format_vehicle_line(vehicle: &Vehicle) -> String {
    let marker = if vehicle.is_current { "*" } else { " " };
    let mut line = format!(
        "{marker} {:<13}  {}",
        short_id(&vehicle.id.to_string()),
        vehicle.display_name()
    );
    if let Some(plate) = &vehicle.plate {
        line.push_str(&format!("  [{plate}]"));
    }
    if vehicle.pending_sync {
        line.push_str("  (not synced)");
    }
    line
}

/// "in 3d", "today" or "2d ago" relative to `now`
pub fn format_relative_days(timestamp_ms: i64, now_ms: i64) -> String {
    let days = (timestamp_ms - now_ms).div_euclid(DAY_MS);
    match days {
        0 => "today".to_string(),
        days if days > 0 => format!("in {days}d"),
        days => format!("{}d ago", -days),
    }
}

pub fn format_due(task: &MaintenanceTask, now_ms: i64) -> String {
    let date = task.due_at.map(|due_at| {
        format!(
            "{} ({})",
            format_date(due_at),
            format_relative_days(due_at, now_ms)
        )
    });
    let mileage = task.due_mileage.map(|mileage| format!("{mileage} km"));
    match (date, mileage) {
        (Some(date), Some(mileage)) => format!("{date} or {mileage}"),
        (Some(date), None) => date,
        (None, Some(mileage)) => mileage,
        (None, None) => String::new(),
    }
}

pub fn format_task_line(task: &MaintenanceTask, now_ms: i64) -> String {
    format!(
        "{:<13}  {:<9}  {:<8}  {:<32}  {}",
        short_id(&task.id.to_string()),
        task.effective_status(now_ms).as_str(),
        task.severity.as_str(),
        task.title,
        format_due(task, now_ms)
    )
}
