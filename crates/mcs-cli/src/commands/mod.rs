pub mod chat;
pub mod common;
pub mod completions;
pub mod history;
pub mod manual;
pub mod remind;
pub mod sync;
pub mod task;
pub mod vehicle;
pub mod watch;
