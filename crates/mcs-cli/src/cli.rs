use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use mcs_core::config::MAX_REMINDER_LOOKAHEAD_HOURS;
use mcs_core::models::{FuelType, MaintenanceType, Severity, UsageType};
use mcs_core::screens::StatusFilter;

/// Longest pause `watch` accepts between reminder checks
pub const MAX_REMINDER_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

#[derive(Parser)]
#[command(name = "mcs")]
#[command(about = "Track vehicle maintenance from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage registered vehicles
    Vehicle {
        #[command(subcommand)]
        command: VehicleCommands,
    },
    /// Manage maintenance tasks of the current vehicle
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Service history of the current vehicle
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
    /// Push local changes and pull the backend state
    Sync,
    /// Show reminders for overdue and upcoming tasks
    Remind {
        /// Look this many hours ahead instead of the configured window
        #[arg(
            long,
            value_name = "HOURS",
            value_parser = clap::value_parser!(u64).range(1..=MAX_REMINDER_LOOKAHEAD_HOURS)
        )]
        hours: Option<u64>,
    },
    /// Keep syncing and checking reminders until interrupted
    Watch {
        /// Minutes between reminder checks
        #[arg(
            long,
            default_value = "60",
            value_name = "MINUTES",
            value_parser = clap::value_parser!(u64).range(1..=MAX_REMINDER_INTERVAL_MINUTES)
        )]
        reminder_minutes: u64,
    },
    /// Ask the maintenance assistant
    Chat {
        /// Message to send; prints the conversation when omitted
        message: Vec<String>,
        /// Conversation ID (defaults to the main conversation)
        #[arg(long, value_name = "ID")]
        conversation: Option<String>,
        /// Delete the conversation instead of sending
        #[arg(long, conflicts_with = "message")]
        clear: bool,
        /// Ask again for questions that never got an answer
        #[arg(long, conflicts_with_all = ["message", "clear"])]
        retry: bool,
    },
    /// Browse the owner's manual
    Manual {
        #[command(subcommand)]
        command: ManualCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum VehicleCommands {
    /// Register a vehicle; the first one becomes current
    Add(VehicleArgs),
    /// List registered vehicles
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Select the current vehicle
    Use {
        /// Vehicle ID or unique ID prefix
        id: String,
    },
    /// Delete a vehicle with its tasks and history
    Delete {
        /// Vehicle ID or unique ID prefix
        id: String,
    },
}

#[derive(Args)]
pub struct VehicleArgs {
    #[arg(long)]
    pub brand: String,
    #[arg(long)]
    pub model: String,
    #[arg(long)]
    pub year: String,
    #[arg(long)]
    pub plate: Option<String>,
    #[arg(long, value_enum, default_value_t = FuelArg::Gasoline)]
    pub fuel: FuelArg,
    #[arg(long, value_enum, default_value_t = UsageArg::Mixed)]
    pub usage: UsageArg,
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Schedule a maintenance task
    Add {
        /// Task title
        title: Vec<String>,
        #[arg(long = "type", value_enum, default_value_t = TaskTypeArg::Other)]
        task_type: TaskTypeArg,
        /// Due date (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        due: Option<String>,
        /// Due odometer reading in km
        #[arg(long, value_name = "KM")]
        mileage: Option<String>,
        #[arg(long, value_enum, default_value_t = SeverityArg::Medium)]
        severity: SeverityArg,
        #[arg(long)]
        description: Option<String>,
    },
    /// List tasks of the current vehicle
    List {
        #[arg(long, value_enum, default_value_t = StatusArg::All)]
        status: StatusArg,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a task done
    Complete {
        /// Task ID or unique ID prefix
        id: String,
    },
    /// Delete a task
    Delete {
        /// Task ID or unique ID prefix
        id: String,
    },
}

#[derive(Subcommand)]
pub enum HistoryCommands {
    /// Log a completed service
    Add {
        #[arg(long = "type", value_enum, default_value_t = TaskTypeArg::Other)]
        task_type: TaskTypeArg,
        /// Service date (YYYY-MM-DD, defaults to today)
        #[arg(long, value_name = "DATE")]
        date: Option<String>,
        /// Odometer reading in km
        #[arg(long, value_name = "KM")]
        mileage: Option<i64>,
        #[arg(long)]
        cost: Option<f64>,
        #[arg(long)]
        workshop: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List services of the current vehicle
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export the service history
    Export {
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Markdown)]
        format: ExportFormat,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ManualCommands {
    /// Dashboard warning lights
    Lights {
        /// Filter by text
        query: Option<String>,
    },
    /// How-to guides
    Guides {
        /// Filter by text
        query: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl From<ExportFormat> for mcs_core::export::ExportFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Json => Self::Json,
            ExportFormat::Markdown => Self::Markdown,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum FuelArg {
    Gasoline,
    Diesel,
    Hybrid,
    Electric,
    Lpg,
}

impl From<FuelArg> for FuelType {
    fn from(fuel: FuelArg) -> Self {
        match fuel {
            FuelArg::Gasoline => Self::Gasoline,
            FuelArg::Diesel => Self::Diesel,
            FuelArg::Hybrid => Self::Hybrid,
            FuelArg::Electric => Self::Electric,
            FuelArg::Lpg => Self::Lpg,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum UsageArg {
    Urban,
    Highway,
    Mixed,
    Severe,
}

impl From<UsageArg> for UsageType {
    fn from(usage: UsageArg) -> Self {
        match usage {
            UsageArg::Urban => Self::Urban,
            UsageArg::Highway => Self::Highway,
            UsageArg::Mixed => Self::Mixed,
            UsageArg::Severe => Self::Severe,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum TaskTypeArg {
    OilChange,
    TireRotation,
    BrakeInspection,
    BatteryCheck,
    AirFilter,
    Coolant,
    Transmission,
    Inspection,
    Other,
}

impl From<TaskTypeArg> for MaintenanceType {
    fn from(kind: TaskTypeArg) -> Self {
        match kind {
            TaskTypeArg::OilChange => Self::OilChange,
            TaskTypeArg::TireRotation => Self::TireRotation,
            TaskTypeArg::BrakeInspection => Self::BrakeInspection,
            TaskTypeArg::BatteryCheck => Self::BatteryCheck,
            TaskTypeArg::AirFilter => Self::AirFilter,
            TaskTypeArg::Coolant => Self::Coolant,
            TaskTypeArg::Transmission => Self::Transmission,
            TaskTypeArg::Inspection => Self::Inspection,
            TaskTypeArg::Other => Self::Other,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SeverityArg {
    Low,
    Medium,
    High,
    Critical,
}

impl From<SeverityArg> for Severity {
    fn from(severity: SeverityArg) -> Self {
        match severity {
            SeverityArg::Low => Self::Low,
            SeverityArg::Medium => Self::Medium,
            SeverityArg::High => Self::High,
            SeverityArg::Critical => Self::Critical,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum StatusArg {
    All,
    Open,
    Overdue,
    Completed,
}

impl From<StatusArg> for StatusFilter {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::All => Self::All,
            StatusArg::Open => Self::Open,
            StatusArg::Overdue => Self::Overdue,
            StatusArg::Completed => Self::Completed,
        }
    }
}
