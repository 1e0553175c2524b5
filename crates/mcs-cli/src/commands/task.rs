use mcs_core::models::{MaintenanceTask, MaintenanceType, Severity};
use mcs_core::screens::{
    MaintenanceScreen, MaintenanceState, StatusFilter, TaskFormEvent, TaskFormScreen,
};
use mcs_core::util::now_millis;

use crate::commands::common::{format_task_line, resolve_by_prefix, Context};
use crate::error::CliError;

pub struct NewTaskArgs {
    pub title: String,
    pub task_type: MaintenanceType,
    pub due: Option<String>,
    pub mileage: Option<String>,
    pub severity: Severity,
    pub description: Option<String>,
}

pub async fn run_add(ctx: &Context, args: NewTaskArgs) -> Result<(), CliError> {
    let vehicle = ctx.current_vehicle().await?;

    let form = TaskFormScreen::new(ctx.store.clone());
    form.dispatch(TaskFormEvent::Opened(vehicle.id));
    form.dispatch(TaskFormEvent::TypeChanged(args.task_type));
    form.dispatch(TaskFormEvent::TitleChanged(args.title));
    form.dispatch(TaskFormEvent::DescriptionChanged(
        args.description.unwrap_or_default(),
    ));
    form.dispatch(TaskFormEvent::DueDateChanged(args.due.unwrap_or_default()));
    form.dispatch(TaskFormEvent::DueMileageChanged(
        args.mileage.unwrap_or_default(),
    ));
    form.dispatch(TaskFormEvent::SeverityChanged(args.severity));

    let Some(task) = form.submit().await else {
        return Err(CliError::Rejected(form.state().error.unwrap_or_default()));
    };
    println!("{}", task.id);
    Ok(())
}

/// Load the current vehicle's tasks, failing when nothing is selected.
async fn load_screen(ctx: &Context) -> Result<(MaintenanceScreen, MaintenanceState), CliError> {
    let screen = MaintenanceScreen::new(ctx.store.clone());
    screen.load().await;
    let state = screen.state();
    if let Some(message) = state.tasks.as_ref().and_then(|tasks| tasks.error()) {
        return Err(CliError::Rejected(message.to_string()));
    }
    if state.vehicle.is_none() {
        return Err(CliError::NoCurrentVehicle);
    }
    Ok((screen, state))
}

pub async fn run_list(ctx: &Context, filter: StatusFilter, as_json: bool) -> Result<(), CliError> {
    let (screen, _) = load_screen(ctx).await?;
    screen.set_filter(filter);
    let state = screen.state();
    let now = now_millis();
    let tasks = state.visible_tasks(now);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }
    if tasks.is_empty() {
        println!("No tasks.");
        return Ok(());
    }
    for task in tasks {
        println!("{}", format_task_line(task, now));
    }
    Ok(())
}

fn resolve_task(state: &MaintenanceState, query: &str) -> Result<MaintenanceTask, CliError> {
    let tasks = state
        .tasks
        .as_ref()
        .and_then(|tasks| tasks.value())
        .map(Vec::as_slice)
        .unwrap_or_default();
    resolve_by_prefix(tasks, query, |task| task.id.to_string(), "task").cloned()
}

fn take_notice(screen: &MaintenanceScreen) -> Result<(), CliError> {
    match screen.state().notice {
        Some(notice) => {
            screen.dismiss_notice();
            Err(CliError::Rejected(notice))
        }
        None => Ok(()),
    }
}

pub async fn run_complete(ctx: &Context, id: &str) -> Result<(), CliError> {
    let (screen, state) = load_screen(ctx).await?;
    let task = resolve_task(&state, id)?;
    screen.complete(&task.id).await;
    take_notice(&screen)?;
    println!("Completed {}", task.title);
    Ok(())
}

pub async fn run_delete(ctx: &Context, id: &str) -> Result<(), CliError> {
    let (screen, state) = load_screen(ctx).await?;
    let task = resolve_task(&state, id)?;
    screen.delete(&task.id).await;
    take_notice(&screen)?;
    println!("Deleted {}", task.title);
    Ok(())
}
