use mcs_core::config;
use mcs_core::reminders::{Notifier, Reminder, ReminderEvaluator, ReminderKind, ReminderWorker};
use mcs_core::util::now_millis;

use crate::commands::common::Context;
use crate::error::CliError;

/// Prints each reminder on its own line
#[derive(Debug, Clone, Copy, Default)]
pub struct PrintNotifier;

impl Notifier for PrintNotifier {
    async fn notify(&self, reminder: &Reminder) -> mcs_core::Result<()> {
        println!("{}", format_reminder(reminder));
        Ok(())
    }
}

pub fn format_reminder(reminder: &Reminder) -> String {
    let tag = match reminder.kind {
        ReminderKind::Critical => "CRITICAL",
        ReminderKind::High => "HIGH",
        ReminderKind::General => "OVERDUE",
        ReminderKind::Upcoming => "SOON",
    };
    format!("[{tag}] {}: {}", reminder.title, reminder.message)
}

pub fn reminder_worker(ctx: &Context, hours: Option<u64>) -> ReminderWorker<PrintNotifier> {
    let lookahead = hours.map_or_else(|| ctx.config.reminder_lookahead(), config::hours);
    ReminderWorker::new(
        ctx.store.clone(),
        ReminderEvaluator::new(lookahead),
        PrintNotifier,
    )
}

pub async fn run_remind(ctx: &Context, hours: Option<u64>) -> Result<(), CliError> {
    let delivered = reminder_worker(ctx, hours).run(now_millis()).await;
    if delivered == 0 {
        println!("No reminders.");
    }
    Ok(())
}
