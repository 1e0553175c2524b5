//! Maintenance history export shared by every client.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::models::{total_cost, MaintenanceRecord, Vehicle};
use crate::util::format_date;

/// Export output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }
}

/// One service entry as written to an export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
    pub id: String,
    pub date: String,
    pub task_type: String,
    pub mileage: Option<i64>,
    pub cost: Option<f64>,
    pub workshop: Option<String>,
    pub notes: Option<String>,
}

/// Full history document for one vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryExport {
    pub vehicle: String,
    pub plate: Option<String>,
    pub total_cost: f64,
    pub records: Vec<ExportRecord>,
}

#[must_use]
pub fn record_to_export_item(record: &MaintenanceRecord) -> ExportRecord {
    ExportRecord {
        id: record.id.to_string(),
        date: format_date(record.serviced_at),
        task_type: record.task_type.label().to_string(),
        mileage: record.mileage,
        cost: record.cost,
        workshop: record.workshop.clone(),
        notes: record.notes.clone(),
    }
}

/// Records oldest first so exports read as a logbook
fn chronological(records: &[MaintenanceRecord]) -> Vec<&MaintenanceRecord> {
    let mut sorted = records.iter().collect::<Vec<_>>();
    sorted.sort_by_key(|record| (record.serviced_at, record.id));
    sorted
}

#[must_use]
pub fn history_export(vehicle: &Vehicle, records: &[MaintenanceRecord]) -> HistoryExport {
    HistoryExport {
        vehicle: vehicle.display_name(),
        plate: vehicle.plate.clone(),
        total_cost: total_cost(records),
        records: chronological(records)
            .into_iter()
            .map(record_to_export_item)
            .collect(),
    }
}

/// Render history as pretty-printed JSON.
pub fn render_json_export(
    vehicle: &Vehicle,
    records: &[MaintenanceRecord],
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&history_export(vehicle, records))
}

/// Render history as a Markdown table.
#[must_use]
pub fn render_markdown_export(vehicle: &Vehicle, records: &[MaintenanceRecord]) -> String {
    let export = history_export(vehicle, records);
    let mut output = String::new();

    let _ = writeln!(output, "# Maintenance history: {}", export.vehicle);
    if let Some(plate) = &export.plate {
        let _ = writeln!(output, "\nPlate: {plate}");
    }
    let _ = writeln!(output);

    if export.records.is_empty() {
        let _ = writeln!(output, "No services recorded.");
        return output;
    }

    let _ = writeln!(output, "| Date | Service | Mileage | Cost | Workshop | Notes |");
    let _ = writeln!(output, "| --- | --- | --- | --- | --- | --- |");
    for record in &export.records {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} | {} |",
            record.date,
            record.task_type,
            record
                .mileage
                .map(|mileage| format!("{mileage} km"))
                .unwrap_or_default(),
            record
                .cost
                .map(|cost| format!("{cost:.2}"))
                .unwrap_or_default(),
            table_cell(record.workshop.as_deref()),
            table_cell(record.notes.as_deref()),
        );
    }
    let _ = writeln!(output, "\nTotal cost: {:.2}", export.total_cost);

    output
}

fn table_cell(value: Option<&str>) -> String {
    value
        .unwrap_or_default()
        .replace('|', "\\|")
        .replace('\n', " ")
}

/// Render history based on selected export format.
pub fn render_history_export(
    vehicle: &Vehicle,
    records: &[MaintenanceRecord],
    format: ExportFormat,
) -> serde_json::Result<String> {
    match format {
        ExportFormat::Json => render_json_export(vehicle, records),
        ExportFormat::Markdown => Ok(render_markdown_export(vehicle, records)),
    }
}

/// Build a deterministic default file name for export flows.
#[must_use]
pub fn suggested_export_file_name(
    vehicle: &Vehicle,
    format: ExportFormat,
    timestamp_ms: i64,
) -> String {
    let slug = vehicle
        .display_name()
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    format!(
        "mycarsetting-{slug}-history-{timestamp_ms}.{}",
        format.extension()
    )
}
