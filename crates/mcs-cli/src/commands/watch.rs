use std::time::Duration;

use mcs_core::reminders::{Notifier, ReminderWorker};
use mcs_core::util::now_millis;
use mcs_core::SyncOrchestrator;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::commands::common::Context;
use crate::commands::remind::reminder_worker;
use crate::error::CliError;

/// Check reminders every `interval` until `shutdown` turns true.
pub async fn run_reminder_loop<N: Notifier>(
    worker: &ReminderWorker<N>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> usize {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut checks = 0;

    loop {
        if *shutdown.borrow_and_update() {
            break;
        }
        tokio::select! {
            _ = ticker.tick() => {
                checks += 1;
                worker.run(now_millis()).await;
            }
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    checks
}

pub async fn run_watch(ctx: &Context, reminder_minutes: u64) -> Result<(), CliError> {
    if reminder_minutes == 0 {
        return Err(CliError::Rejected(
            "Reminder interval must be at least one minute".to_string(),
        ));
    }
    let sync = ctx
        .config
        .gateway()?
        .map(|gateway| SyncOrchestrator::new(ctx.store.clone(), gateway));
    if sync.is_none() {
        tracing::info!("No backend configured; watching reminders only");
    }
    let worker = reminder_worker(ctx, None);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let stop = async move {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {error}");
        }
        shutdown_tx.send(true).ok();
    };
    let reminders = run_reminder_loop(
        &worker,
        Duration::from_secs(reminder_minutes.saturating_mul(60)),
        shutdown_rx.clone(),
    );
    let syncing = async {
        match &sync {
            Some(sync) => {
                sync.run_periodically(ctx.config.sync_interval(), shutdown_rx.clone())
                    .await
            }
            None => 0,
        }
    };

    println!("Watching; press Ctrl-C to stop");
    let ((), checks, passes) = tokio::join!(stop, reminders, syncing);
    println!("Stopped after {checks} reminder check(s) and {passes} sync pass(es)");
    Ok(())
}
