use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] mcs_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    /// A screen refused the input or the action; carries its user message
    #[error("{0}")]
    Rejected(String),
    #[error("ID cannot be empty")]
    EmptyId,
    #[error("No {kind} found for id/prefix: {query}")]
    NotFound { kind: &'static str, query: String },
    #[error("{0}")]
    AmbiguousId(String),
    #[error("No current vehicle. Add one with `mcs vehicle add` or pick one with `mcs vehicle use`.")]
    NoCurrentVehicle,
    #[error("No message provided")]
    EmptyMessage,
    #[error("The backend is not configured. Set MCS_API_URL or api_base_url in the config file.")]
    BackendNotConfigured,
}
