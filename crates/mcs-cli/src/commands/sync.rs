use mcs_core::SyncReport;

use crate::commands::common::Context;
use crate::error::CliError;

pub fn format_sync_report_lines(report: &SyncReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Vehicles: {} pushed, {} pulled",
        report.vehicles_pushed, report.vehicles_pulled
    )];
    if report.stopped_early {
        lines.push("No current vehicle; tasks and history were not synced".to_string());
        return lines;
    }

    let mut tasks = format!(
        "Tasks: {} pushed, {} deleted, {} pulled",
        report.tasks_pushed, report.tasks_deleted, report.tasks_pulled
    );
    if report.tasks_skipped > 0 {
        tasks.push_str(&format!(" ({} skipped)", report.tasks_skipped));
    }
    lines.push(tasks);
    lines.push(format!(
        "History: {} pushed, {} pulled",
        report.records_pushed, report.records_pulled
    ));
    lines
}

pub async fn run_sync(ctx: &Context) -> Result<(), CliError> {
    let report = ctx.sync()?.sync().await?;
    for line in format_sync_report_lines(&report) {
        println!("{line}");
    }
    println!("Sync completed");
    Ok(())
}
