use mcs_core::models::Vehicle;
use mcs_core::screens::{VehicleFormEvent, VehicleFormScreen};

use crate::cli::VehicleArgs;
use crate::commands::common::{format_vehicle_line, resolve_by_prefix, Context};
use crate::error::CliError;

pub async fn run_add(ctx: &Context, args: VehicleArgs) -> Result<(), CliError> {
    let form = VehicleFormScreen::new(ctx.store.clone());
    form.dispatch(VehicleFormEvent::BrandChanged(args.brand));
    form.dispatch(VehicleFormEvent::ModelChanged(args.model));
    form.dispatch(VehicleFormEvent::YearChanged(args.year));
    form.dispatch(VehicleFormEvent::PlateChanged(args.plate.unwrap_or_default()));
    form.dispatch(VehicleFormEvent::FuelTypeChanged(args.fuel.into()));
    form.dispatch(VehicleFormEvent::UsageTypeChanged(args.usage.into()));

    let Some(vehicle) = form.submit().await else {
        return Err(CliError::Rejected(form.state().error.unwrap_or_default()));
    };
    println!("{}", vehicle.id);
    Ok(())
}

pub async fn run_list(ctx: &Context, as_json: bool) -> Result<(), CliError> {
    let vehicles = ctx.store.list_vehicles().await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&vehicles)?);
        return Ok(());
    }
    if vehicles.is_empty() {
        println!("No vehicles yet.");
        return Ok(());
    }
    for vehicle in &vehicles {
        println!("{}", format_vehicle_line(vehicle));
    }
    Ok(())
}

pub async fn resolve_vehicle(ctx: &Context, query: &str) -> Result<Vehicle, CliError> {
    let vehicles = ctx.store.list_vehicles().await?;
    resolve_by_prefix(&vehicles, query, |vehicle| vehicle.id.to_string(), "vehicle").cloned()
}

pub async fn run_use(ctx: &Context, id: &str) -> Result<(), CliError> {
    let vehicle = resolve_vehicle(ctx, id).await?;
    let vehicle = ctx.store.set_current_vehicle(&vehicle.id).await?;
    println!("Now using {}", vehicle.display_name());
    Ok(())
}

/// Synced vehicles are deleted on the backend first, so this needs a
/// configured backend for them. Local-only vehicles are removed directly.
pub async fn run_delete(ctx: &Context, id: &str) -> Result<(), CliError> {
    let vehicle = resolve_vehicle(ctx, id).await?;
    if vehicle.remote_id.is_some() {
        ctx.sync()?.delete_vehicle(&vehicle.id).await?;
    } else {
        ctx.store.delete_vehicle(&vehicle.id).await?;
    }
    println!("Deleted {}", vehicle.display_name());
    Ok(())
}
