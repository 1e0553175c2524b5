use std::path::{Path, PathBuf};

use mcs_core::export::{render_history_export, suggested_export_file_name};
use mcs_core::models::{total_cost, MaintenanceRecord, MaintenanceType, NewRecord};
use mcs_core::util::{format_date, now_millis, parse_date};

use crate::cli::ExportFormat;
use crate::commands::common::{short_id, Context};
use crate::error::CliError;

pub struct RecordArgs {
    pub task_type: MaintenanceType,
    pub date: Option<String>,
    pub mileage: Option<i64>,
    pub cost: Option<f64>,
    pub workshop: Option<String>,
    pub notes: Option<String>,
}

pub async fn run_add(ctx: &Context, args: RecordArgs) -> Result<(), CliError> {
    let vehicle = ctx.current_vehicle().await?;
    let serviced_at = match args.date.as_deref().map(str::trim) {
        Some(date) if !date.is_empty() => parse_date(date)?,
        _ => now_millis(),
    };

    let record = ctx
        .store
        .add_record(NewRecord {
            vehicle_id: vehicle.id,
            task_type: args.task_type,
            serviced_at,
            mileage: args.mileage,
            cost: args.cost,
            workshop: args.workshop,
            notes: args.notes,
        })
        .await?;
    println!("{}", record.id);
    Ok(())
}

pub fn format_record_line(record: &MaintenanceRecord) -> String {
    let mut line = format!(
        "{:<13}  {}  {}",
        short_id(&record.id.to_string()),
        format_date(record.serviced_at),
        record.task_type.label()
    );
    if let Some(mileage) = record.mileage {
        line.push_str(&format!("  {mileage} km"));
    }
    if let Some(cost) = record.cost {
        line.push_str(&format!("  {cost:.2}"));
    }
    if let Some(workshop) = &record.workshop {
        line.push_str(&format!("  @ {workshop}"));
    }
    line
}

pub async fn run_list(ctx: &Context, as_json: bool) -> Result<(), CliError> {
    let vehicle = ctx.current_vehicle().await?;
    let records = ctx.store.list_history(&vehicle.id).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("No services recorded.");
        return Ok(());
    }
    for record in &records {
        println!("{}", format_record_line(record));
    }
    println!(
        "{} service(s), total cost {:.2}",
        records.len(),
        total_cost(&records)
    );
    Ok(())
}

/// Directories get a generated file name inside them.
pub fn export_target(output: &Path, file_name: impl FnOnce() -> String) -> PathBuf {
    if output.is_dir() {
        output.join(file_name())
    } else {
        output.to_path_buf()
    }
}

pub async fn run_export(
    ctx: &Context,
    format: ExportFormat,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let vehicle = ctx.current_vehicle().await?;
    let records = ctx.store.list_history(&vehicle.id).await?;
    let format: mcs_core::export::ExportFormat = format.into();
    let rendered = render_history_export(&vehicle, &records, format)?;

    if let Some(output) = output {
        let path = export_target(output, || {
            suggested_export_file_name(&vehicle, format, now_millis())
        });
        std::fs::write(&path, rendered)?;
        println!("{}", path.display());
    } else {
        println!("{rendered}");
    }
    Ok(())
}
