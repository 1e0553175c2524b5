//! Maintenance reminders: which tasks deserve a notification right now.

use std::time::Duration;

use crate::error::Result;
use crate::models::{MaintenanceTask, Severity, TaskStatus};
use crate::services::LocalStore;

/// Default window for "due soon" reminders
pub const DEFAULT_LOOKAHEAD: Duration = Duration::from_secs(3 * 24 * 60 * 60);

/// Reminder bucket, in notification priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReminderKind {
    /// Overdue tasks of critical severity
    Critical,
    /// Overdue tasks of high severity
    High,
    /// Overdue tasks of low or medium severity
    General,
    /// Tasks falling due inside the lookahead window
    Upcoming,
}

impl ReminderKind {
    const fn for_overdue(severity: Severity) -> Self {
        match severity {
            Severity::Critical => Self::Critical,
            Severity::High => Self::High,
            Severity::Low | Severity::Medium => Self::General,
        }
    }
}

/// One notification summarising a bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub kind: ReminderKind,
    /// Tasks in the bucket
    pub count: usize,
    /// Most overdue, or soonest due, task of the bucket
    pub task: MaintenanceTask,
    pub title: String,
    pub message: String,
}

impl Reminder {
    fn new(kind: ReminderKind, count: usize, task: MaintenanceTask) -> Self {
        let others = count - 1;
        let name = &task.title;
        let (title, message) = match kind {
            ReminderKind::Critical => (
                "Critical maintenance overdue",
                if others == 0 {
                    format!("{name} is overdue. Stop driving and have it checked as soon as possible.")
                } else {
                    format!("{name} and {others} more critical task(s) are overdue.")
                },
            ),
            ReminderKind::High => (
                "Important maintenance overdue",
                if others == 0 {
                    format!("{name} is overdue. Book a service soon.")
                } else {
                    format!("{name} and {others} more important task(s) are overdue.")
                },
            ),
            ReminderKind::General => (
                "Maintenance overdue",
                if others == 0 {
                    format!("{name} is overdue.")
                } else {
                    format!("{name} and {others} more task(s) are overdue.")
                },
            ),
            ReminderKind::Upcoming => (
                "Maintenance due soon",
                if others == 0 {
                    format!("{name} is due soon.")
                } else {
                    format!("{name} and {others} more task(s) are due soon.")
                },
            ),
        };
        Self {
            kind,
            count,
            task,
            title: title.to_string(),
            message,
        }
    }
}

/// Pure reminder rules over a task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderEvaluator {
    lookahead_ms: i64,
}

impl Default for ReminderEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKAHEAD)
    }
}

impl ReminderEvaluator {
    pub fn new(lookahead: Duration) -> Self {
        Self {
            lookahead_ms: i64::try_from(lookahead.as_millis()).unwrap_or(i64::MAX),
        }
    }

    /// At most one reminder per bucket, most urgent bucket first.
    ///
    /// Completed tasks, undated tasks and tasks awaiting deletion never remind.
    pub fn evaluate(&self, tasks: &[MaintenanceTask], now: i64) -> Vec<Reminder> {
        let horizon = now.saturating_add(self.lookahead_ms);
        let mut buckets: Vec<(ReminderKind, usize, &MaintenanceTask)> = Vec::new();

        for task in tasks {
            if task.sync_state.is_pending_delete() || task.status == TaskStatus::Completed {
                continue;
            }
            let Some(due_at) = task.due_at else {
                continue;
            };

            let kind = if due_at < now {
                ReminderKind::for_overdue(task.severity)
            } else if due_at <= horizon {
                ReminderKind::Upcoming
            } else {
                continue;
            };

            match buckets.iter_mut().find(|(bucket, _, _)| *bucket == kind) {
                Some((_, count, representative)) => {
                    *count += 1;
                    // Earliest due date is both the most overdue and the soonest due
                    if task.due_at < representative.due_at {
                        *representative = task;
                    }
                }
                None => buckets.push((kind, 1, task)),
            }
        }

        buckets.sort_by_key(|(kind, _, _)| *kind);
        buckets
            .into_iter()
            .map(|(kind, count, task)| Reminder::new(kind, count, task.clone()))
            .collect()
    }
}

/// Delivery channel for reminders
#[allow(async_fn_in_trait)]
pub trait Notifier {
    async fn notify(&self, reminder: &Reminder) -> Result<()>;
}

/// Notifier that writes reminders to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify(&self, reminder: &Reminder) -> Result<()> {
        tracing::info!(
            kind = ?reminder.kind,
            count = reminder.count,
            task = %reminder.task.id,
            "{}: {}",
            reminder.title,
            reminder.message
        );
        Ok(())
    }
}

/// Background job: read tasks, evaluate, notify.
pub struct ReminderWorker<N> {
    store: LocalStore,
    evaluator: ReminderEvaluator,
    notifier: N,
}

impl<N: Notifier> ReminderWorker<N> {
    pub const fn new(store: LocalStore, evaluator: ReminderEvaluator, notifier: N) -> Self {
        Self {
            store,
            evaluator,
            notifier,
        }
    }

    /// Run once and return how many reminders were delivered.
    ///
    /// Never fails: a store read error or a delivery error is logged and the
    /// job still counts as done.
    pub async fn run(&self, now: i64) -> usize {
        let tasks = match self.store.list_all_tasks().await {
            Ok(tasks) => tasks,
            Err(error) => {
                tracing::warn!("Reminder check could not read tasks: {error}");
                return 0;
            }
        };

        let mut delivered = 0;
        for reminder in self.evaluator.evaluate(&tasks, now) {
            match self.notifier.notify(&reminder).await {
                Ok(()) => delivered += 1,
                Err(error) => tracing::warn!("Failed to deliver {:?} reminder: {error}", reminder.kind),
            }
        }
        tracing::debug!("Reminder check delivered {delivered} notification(s)");
        delivered
    }
}
