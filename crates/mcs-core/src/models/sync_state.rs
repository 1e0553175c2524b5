//! Pending-mutation state of a locally stored row

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::UnknownVariant;

/// Whether a local row carries a mutation the remote backend has not seen.
///
/// At most one pending mutation exists per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncState {
    /// Row matches the last pulled remote state
    #[default]
    Clean,
    /// Created locally, never sent
    PendingCreate,
    /// Exists remotely, edited locally
    PendingUpdate,
    /// Exists remotely, deleted locally; kept until the delete is pushed
    PendingDelete,
}

impl SyncState {
    /// State after a local edit of a row with the given remote identity.
    ///
    /// A row with nothing remote yet still needs to be created, so an edit
    /// keeps it `PendingCreate`.
    #[must_use]
    pub const fn after_local_edit(has_remote_id: bool) -> Self {
        if has_remote_id {
            Self::PendingUpdate
        } else {
            Self::PendingCreate
        }
    }

    #[must_use]
    pub const fn is_pending(self) -> bool {
        !matches!(self, Self::Clean)
    }

    #[must_use]
    pub const fn is_pending_delete(self) -> bool {
        matches!(self, Self::PendingDelete)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clean => "CLEAN",
            Self::PendingCreate => "PENDING_CREATE",
            Self::PendingUpdate => "PENDING_UPDATE",
            Self::PendingDelete => "PENDING_DELETE",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncState {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CLEAN" => Ok(Self::Clean),
            "PENDING_CREATE" => Ok(Self::PendingCreate),
            "PENDING_UPDATE" => Ok(Self::PendingUpdate),
            "PENDING_DELETE" => Ok(Self::PendingDelete),
            other => Err(UnknownVariant::new("sync_state", other)),
        }
    }
}
