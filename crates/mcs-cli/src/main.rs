//! MyCarSetting CLI - vehicle maintenance from the terminal
//!
//! Works offline against the local store; sync, the remote assistant and
//! the manual need a configured backend.

mod cli;
mod commands;
mod error;


use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, HistoryCommands, ManualCommands, TaskCommands, VehicleCommands};
use crate::commands::chat::ChatAction;
use crate::commands::common::Context;
use crate::commands::history::RecordArgs;
use crate::commands::task::NewTaskArgs;
use crate::commands::{
    chat, completions, history, manual, remind, sync, task, vehicle, watch,
};
use crate::error::CliError;

const DEFAULT_LOG_FILTER: &str = "mcs=info";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Commands::Completions { shell, output } = &cli.command {
        return completions::run_completions(*shell, output.as_deref());
    }

    let ctx = Context::open(cli.db_path).await?;
    dispatch(&ctx, cli.command).await
}

async fn dispatch(ctx: &Context, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Vehicle { command } => match command {
            VehicleCommands::Add(args) => vehicle::run_add(ctx, args).await,
            VehicleCommands::List { json } => vehicle::run_list(ctx, json).await,
            VehicleCommands::Use { id } => vehicle::run_use(ctx, &id).await,
            VehicleCommands::Delete { id } => vehicle::run_delete(ctx, &id).await,
        },
        Commands::Task { command } => match command {
            TaskCommands::Add {
                title,
                task_type,
                due,
                mileage,
                severity,
                description,
            } => {
                let args = NewTaskArgs {
                    title: title.join(" "),
                    task_type: task_type.into(),
                    due,
                    mileage,
                    severity: severity.into(),
                    description,
                };
                task::run_add(ctx, args).await
            }
            TaskCommands::List { status, json } => task::run_list(ctx, status.into(), json).await,
            TaskCommands::Complete { id } => task::run_complete(ctx, &id).await,
            TaskCommands::Delete { id } => task::run_delete(ctx, &id).await,
        },
        Commands::History { command } => match command {
            HistoryCommands::Add {
                task_type,
                date,
                mileage,
                cost,
                workshop,
                notes,
            } => {
                let args = RecordArgs {
                    task_type: task_type.into(),
                    date,
                    mileage,
                    cost,
                    workshop,
                    notes,
                };
                history::run_add(ctx, args).await
            }
            HistoryCommands::List { json } => history::run_list(ctx, json).await,
            HistoryCommands::Export { format, output } => {
                history::run_export(ctx, format, output.as_deref()).await
            }
        },
        Commands::Sync => sync::run_sync(ctx).await,
        Commands::Remind { hours } => remind::run_remind(ctx, hours).await,
        Commands::Watch { reminder_minutes } => watch::run_watch(ctx, reminder_minutes).await,
        Commands::Chat {
            message,
            conversation,
            clear,
            retry,
        } => {
            let action = ChatAction::from_flags(&message, clear, retry);
            chat::run_chat(ctx, conversation.as_deref(), action).await
        }
        Commands::Manual { command } => match command {
            ManualCommands::Lights { query } => manual::run_lights(ctx, query).await,
            ManualCommands::Guides { query } => manual::run_guides(ctx, query).await,
        },
        Commands::Completions { shell, output } => {
            completions::run_completions(shell, output.as_deref())
        }
    }
}
