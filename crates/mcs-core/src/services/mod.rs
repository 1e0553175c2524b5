//! Store-level services shared by every client surface

mod local_store;
mod subscription;

pub use local_store::LocalStore;
pub use subscription::{
    AllVehicles, Conversation, SnapshotQuery, Subscription, Table, TableVersions, VehicleHistory,
    VehicleTasks,
};
