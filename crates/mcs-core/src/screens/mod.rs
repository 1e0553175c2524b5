//! Screen state holders.
//!
//! Every screen keeps one observable state value. Events go through a pure
//! [`Reducer`]; async effects on the screen types talk to the store or the
//! backend and dispatch the outcome. Failures are turned into
//! [`Error::user_message`](crate::Error::user_message) text and only retried
//! when the user asks.

mod chat;
mod history;
mod maintenance;
mod manual;
mod vehicles;

pub use chat::{ChatEvent, ChatReducer, ChatScreen, ChatState};
pub use history::{HistoryEvent, HistoryReducer, HistoryScreen, HistoryState, HistorySummary};
pub use maintenance::{
    MaintenanceEvent, MaintenanceReducer, MaintenanceScreen, MaintenanceState, StatusFilter,
    TaskFormEvent, TaskFormReducer, TaskFormScreen, TaskFormState,
};
pub use manual::{ManualEvent, ManualReducer, ManualScreen, ManualState};
pub use vehicles::{
    VehicleFormEvent, VehicleFormReducer, VehicleFormScreen, VehicleFormState, VehicleListEvent,
    VehicleListReducer, VehicleListScreen, VehicleListState,
};

use tokio::sync::watch;

/// Pure event-to-state transition of one screen
pub trait Reducer {
    type State: Clone;
    type Event;

    fn reduce(state: &Self::State, event: Self::Event) -> Self::State;
}

/// Owns a screen's state and publishes every transition.
pub struct StateHolder<R: Reducer> {
    sender: watch::Sender<R::State>,
}

impl<R: Reducer> StateHolder<R> {
    #[must_use]
    pub fn new(initial: R::State) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// Snapshot of the current state
    #[must_use]
    pub fn state(&self) -> R::State {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<R::State> {
        self.sender.subscribe()
    }

    /// Apply `event` and notify subscribers
    pub fn dispatch(&self, event: R::Event) {
        self.sender.send_modify(|state| *state = R::reduce(state, event));
    }

    /// Apply `event` only if `accept` holds for the current state.
    ///
    /// The check and the transition happen under one lock. Returns the new
    /// state when the event was applied.
    pub fn dispatch_if(
        &self,
        accept: impl FnOnce(&R::State) -> bool,
        event: R::Event,
    ) -> Option<R::State> {
        let mut applied = None;
        self.sender.send_if_modified(|state| {
            if !accept(state) {
                return false;
            }
            *state = R::reduce(state, event);
            applied = Some(state.clone());
            true
        });
        applied
    }
}

impl<R: Reducer> Default for StateHolder<R>
where
    R::State: Default,
{
    fn default() -> Self {
        Self::new(R::State::default())
    }
}

/// Outcome of a load, as rendered by a screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource<T> {
    Success(T),
    Error {
        message: String,
        /// Data from the last successful load, if any
        last_known: Option<T>,
    },
}

impl<T: Clone> Resource<T> {
    /// A failure that keeps whatever `previous` last showed
    #[must_use]
    pub fn failed(message: impl Into<String>, previous: Option<&Self>) -> Self {
        Self::Error {
            message: message.into(),
            last_known: previous.and_then(Self::value).cloned(),
        }
    }

    /// Data to render, fresh or last known
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Error { last_known, .. } => last_known.as_ref(),
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Error { message, .. } => Some(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Counter;

    impl Reducer for Counter {
        type State = i32;
        type Event = i32;

        fn reduce(state: &i32, event: i32) -> i32 {
            state + event
        }
    }

    #[test]
    fn failed_resource_keeps_last_known_value() {
        let loaded = Resource::Success(vec![1, 2]);
        let failed = Resource::failed("offline", Some(&loaded));
        assert_eq!(failed.value(), Some(&vec![1, 2]));
        assert_eq!(failed.error(), Some("offline"));

        let failed_again = Resource::failed("still offline", Some(&failed));
        assert_eq!(failed_again.value(), Some(&vec![1, 2]));
    }

    #[test]
    fn failed_resource_without_history_has_no_value() {
        let failed: Resource<Vec<i32>> = Resource::failed("offline", None);
        assert_eq!(failed.value(), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn dispatch_notifies_subscribers() {
        let holder = StateHolder::<Counter>::new(1);
        let mut receiver = holder.subscribe();

        holder.dispatch(2);
        receiver.changed().await.unwrap();
        assert_eq!(*receiver.borrow_and_update(), 3);
        assert_eq!(holder.state(), 3);
    }

    #[test]
    fn guarded_dispatch_lets_one_racer_through() {
        let holder = StateHolder::<Counter>::new(0);
        let shared = &holder;

        let passed = std::thread::scope(|scope| {
            let racers = (0..8)
                .map(|_| scope.spawn(move || shared.dispatch_if(|count| *count == 0, 1)))
                .collect::<Vec<_>>();
            racers
                .into_iter()
                .filter_map(|racer| racer.join().unwrap())
                .collect::<Vec<_>>()
        });

        assert_eq!(passed, vec![1]);
        assert_eq!(holder.state(), 1);
    }

    #[test]
    fn rejected_dispatch_does_not_notify() {
        let holder = StateHolder::<Counter>::new(5);
        let receiver = holder.subscribe();

        assert_eq!(holder.dispatch_if(|count| *count == 0, 1), None);
        assert!(!receiver.has_changed().unwrap());
        assert_eq!(holder.state(), 5);
    }
}
