//! Maintenance task list and task form screens

use super::{Reducer, Resource, StateHolder};
use crate::error::{Error, Result};
use crate::models::{
    MaintenanceTask, MaintenanceType, NewTask, Severity, TaskEdit, TaskId, TaskStatus, Vehicle,
    VehicleId,
};
use crate::services::LocalStore;
use crate::util::{format_date, parse_date};

/// Which tasks the list shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    /// Open tasks, overdue ones included
    Open,
    Overdue,
    Completed,
}

impl StatusFilter {
    #[must_use]
    pub fn matches(self, task: &MaintenanceTask, now: i64) -> bool {
        let status = task.effective_status(now);
        match self {
            Self::All => true,
            Self::Open => status != TaskStatus::Completed,
            Self::Overdue => status == TaskStatus::Overdue,
            Self::Completed => status == TaskStatus::Completed,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaintenanceState {
    pub loading: bool,
    /// Current vehicle; `None` once loaded means nothing is selected
    pub vehicle: Option<Vehicle>,
    pub tasks: Option<Resource<Vec<MaintenanceTask>>>,
    pub filter: StatusFilter,
    pub notice: Option<String>,
}

impl MaintenanceState {
    /// Tasks passing the filter, soonest due first, undated last
    #[must_use]
    pub fn visible_tasks(&self, now: i64) -> Vec<&MaintenanceTask> {
        let mut tasks = self
            .tasks
            .as_ref()
            .and_then(Resource::value)
            .map(|tasks| {
                tasks
                    .iter()
                    .filter(|task| self.filter.matches(task, now))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        tasks.sort_by_key(|task| (task.due_at.is_none(), task.due_at));
        tasks
    }
}

#[derive(Debug)]
pub enum MaintenanceEvent {
    LoadStarted,
    Loaded {
        vehicle: Option<Vehicle>,
        tasks: Vec<MaintenanceTask>,
    },
    LoadFailed(String),
    FilterChanged(StatusFilter),
    ActionFailed(String),
    NoticeDismissed,
}

pub struct MaintenanceReducer;

impl Reducer for MaintenanceReducer {
    type State = MaintenanceState;
    type Event = MaintenanceEvent;

    fn reduce(state: &MaintenanceState, event: MaintenanceEvent) -> MaintenanceState {
        match event {
            MaintenanceEvent::LoadStarted => MaintenanceState {
                loading: true,
                ..state.clone()
            },
            MaintenanceEvent::Loaded { vehicle, tasks } => MaintenanceState {
                loading: false,
                vehicle,
                tasks: Some(Resource::Success(tasks)),
                ..state.clone()
            },
            MaintenanceEvent::LoadFailed(message) => MaintenanceState {
                loading: false,
                tasks: Some(Resource::failed(message, state.tasks.as_ref())),
                ..state.clone()
            },
            MaintenanceEvent::FilterChanged(filter) => MaintenanceState {
                filter,
                ..state.clone()
            },
            MaintenanceEvent::ActionFailed(message) => MaintenanceState {
                notice: Some(message),
                ..state.clone()
            },
            MaintenanceEvent::NoticeDismissed => MaintenanceState {
                notice: None,
                ..state.clone()
            },
        }
    }
}

/// Tasks of the current vehicle
pub struct MaintenanceScreen {
    store: LocalStore,
    holder: StateHolder<MaintenanceReducer>,
}

impl MaintenanceScreen {
    #[must_use]
    pub fn new(store: LocalStore) -> Self {
        Self {
            store,
            holder: StateHolder::default(),
        }
    }

    pub fn holder(&self) -> &StateHolder<MaintenanceReducer> {
        &self.holder
    }

    #[must_use]
    pub fn state(&self) -> MaintenanceState {
        self.holder.state()
    }

    pub async fn load(&self) {
        self.holder.dispatch(MaintenanceEvent::LoadStarted);
        match self.fetch().await {
            Ok((vehicle, tasks)) => self
                .holder
                .dispatch(MaintenanceEvent::Loaded { vehicle, tasks }),
            Err(error) => self
                .holder
                .dispatch(MaintenanceEvent::LoadFailed(error.user_message())),
        }
    }

    async fn fetch(&self) -> Result<(Option<Vehicle>, Vec<MaintenanceTask>)> {
        let Some(vehicle) = self.store.current_vehicle().await? else {
            return Ok((None, Vec::new()));
        };
        let tasks = self.store.list_tasks(&vehicle.id).await?;
        Ok((Some(vehicle), tasks))
    }

    pub fn set_filter(&self, filter: StatusFilter) {
        self.holder.dispatch(MaintenanceEvent::FilterChanged(filter));
    }

    pub async fn complete(&self, id: &TaskId) {
        if let Err(error) = self.store.complete_task(id).await {
            self.holder
                .dispatch(MaintenanceEvent::ActionFailed(error.user_message()));
        }
        self.load().await;
    }

    pub async fn delete(&self, id: &TaskId) {
        if let Err(error) = self.store.delete_task(id).await {
            self.holder
                .dispatch(MaintenanceEvent::ActionFailed(error.user_message()));
        }
        self.load().await;
    }

    pub fn dismiss_notice(&self) {
        self.holder.dispatch(MaintenanceEvent::NoticeDismissed);
    }
}

/// Editable fields of the task form, kept as typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFormState {
    pub vehicle_id: Option<VehicleId>,
    /// Task being edited; `None` creates a new one
    pub editing: Option<TaskId>,
    pub task_type: MaintenanceType,
    pub title: String,
    pub description: String,
    /// `YYYY-MM-DD` or empty
    pub due_date: String,
    pub due_mileage: String,
    pub severity: Severity,
    pub submitting: bool,
    pub error: Option<String>,
    pub saved: Option<MaintenanceTask>,
}

impl Default for TaskFormState {
    fn default() -> Self {
        Self {
            vehicle_id: None,
            editing: None,
            task_type: MaintenanceType::OilChange,
            title: String::new(),
            description: String::new(),
            due_date: String::new(),
            due_mileage: String::new(),
            severity: Severity::default(),
            submitting: false,
            error: None,
            saved: None,
        }
    }
}

impl TaskFormState {
    /// Parse and validate the form into an edit
    pub fn to_edit(&self) -> Result<TaskEdit> {
        let due_at = match self.due_date.trim() {
            "" => None,
            date => Some(parse_date(date)?),
        };
        let due_mileage = match self.due_mileage.trim() {
            "" => None,
            mileage => Some(
                mileage
                    .parse::<i64>()
                    .map_err(|_| Error::InvalidInput("Due mileage must be a number".into()))?,
            ),
        };
        TaskEdit {
            task_type: self.task_type,
            title: self.title.clone(),
            description: Some(self.description.clone()),
            due_at,
            due_mileage,
            severity: self.severity,
        }
        .validate()
    }
}

#[derive(Debug)]
pub enum TaskFormEvent {
    Opened(VehicleId),
    EditStarted(MaintenanceTask),
    TypeChanged(MaintenanceType),
    TitleChanged(String),
    DescriptionChanged(String),
    DueDateChanged(String),
    DueMileageChanged(String),
    SeverityChanged(Severity),
    SubmitStarted,
    Saved(MaintenanceTask),
    Failed(String),
}

pub struct TaskFormReducer;

impl Reducer for TaskFormReducer {
    type State = TaskFormState;
    type Event = TaskFormEvent;

    fn reduce(state: &TaskFormState, event: TaskFormEvent) -> TaskFormState {
        let edited = |state: TaskFormState| TaskFormState {
            error: None,
            saved: None,
            ..state
        };
        match event {
            TaskFormEvent::Opened(vehicle_id) => TaskFormState {
                vehicle_id: Some(vehicle_id),
                ..TaskFormState::default()
            },
            TaskFormEvent::EditStarted(task) => TaskFormState {
                vehicle_id: Some(task.vehicle_id),
                editing: Some(task.id),
                task_type: task.task_type,
                title: task.title,
                description: task.description.unwrap_or_default(),
                due_date: task.due_at.map(format_date).unwrap_or_default(),
                due_mileage: task
                    .due_mileage
                    .map(|mileage| mileage.to_string())
                    .unwrap_or_default(),
                severity: task.severity,
                ..TaskFormState::default()
            },
            TaskFormEvent::TypeChanged(task_type) => edited(TaskFormState {
                task_type,
                ..state.clone()
            }),
            TaskFormEvent::TitleChanged(title) => edited(TaskFormState {
                title,
                ..state.clone()
            }),
            TaskFormEvent::DescriptionChanged(description) => edited(TaskFormState {
                description,
                ..state.clone()
            }),
            TaskFormEvent::DueDateChanged(due_date) => edited(TaskFormState {
                due_date,
                ..state.clone()
            }),
            TaskFormEvent::DueMileageChanged(due_mileage) => edited(TaskFormState {
                due_mileage,
                ..state.clone()
            }),
            TaskFormEvent::SeverityChanged(severity) => edited(TaskFormState {
                severity,
                ..state.clone()
            }),
            TaskFormEvent::SubmitStarted => TaskFormState {
                submitting: true,
                error: None,
                ..state.clone()
            },
            TaskFormEvent::Saved(task) => TaskFormState {
                editing: Some(task.id),
                submitting: false,
                saved: Some(task),
                ..state.clone()
            },
            TaskFormEvent::Failed(message) => TaskFormState {
                submitting: false,
                error: Some(message),
                ..state.clone()
            },
        }
    }
}

/// Create or edit a maintenance task
pub struct TaskFormScreen {
    store: LocalStore,
    holder: StateHolder<TaskFormReducer>,
}

impl TaskFormScreen {
    #[must_use]
    pub fn new(store: LocalStore) -> Self {
        Self {
            store,
            holder: StateHolder::default(),
        }
    }

    pub fn holder(&self) -> &StateHolder<TaskFormReducer> {
        &self.holder
    }

    #[must_use]
    pub fn state(&self) -> TaskFormState {
        self.holder.state()
    }

    pub fn dispatch(&self, event: TaskFormEvent) {
        self.holder.dispatch(event);
    }

    /// Validate and save. Returns the stored task on success.
    pub async fn submit(&self) -> Option<MaintenanceTask> {
        let state = self.holder.state();
        if state.submitting {
            return None;
        }
        self.holder.dispatch(TaskFormEvent::SubmitStarted);

        match self.save(&state).await {
            Ok(task) => {
                self.holder.dispatch(TaskFormEvent::Saved(task.clone()));
                Some(task)
            }
            Err(error) => {
                self.holder
                    .dispatch(TaskFormEvent::Failed(error.user_message()));
                None
            }
        }
    }

    async fn save(&self, state: &TaskFormState) -> Result<MaintenanceTask> {
        let fields = state.to_edit()?;
        match (&state.editing, state.vehicle_id) {
            (Some(id), _) => self.store.edit_task(id, fields).await,
            (None, Some(vehicle_id)) => {
                self.store
                    .add_task(NewTask { vehicle_id, fields })
                    .await
            }
            (None, None) => Err(Error::InvalidInput("Select a vehicle first".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FuelType, NewVehicle, SyncState, UsageType};
    use crate::util::{now_millis, DAY_MS};
    use pretty_assertions::assert_eq;

    async fn store_with_vehicle() -> (LocalStore, Vehicle) {
        let store = LocalStore::open_in_memory().await.unwrap();
        let vehicle = store
            .add_vehicle(NewVehicle {
                brand: "Mazda".to_string(),
                model: "3".to_string(),
                year: 2018,
                plate: None,
                fuel_type: FuelType::Gasoline,
                usage_type: UsageType::Mixed,
            })
            .await
            .unwrap();
        (store, vehicle)
    }

    fn edit(title: &str, due_at: i64) -> TaskEdit {
        TaskEdit {
            task_type: MaintenanceType::OilChange,
            title: title.to_string(),
            description: None,
            due_at: Some(due_at),
            due_mileage: None,
            severity: Severity::Medium,
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn screen_without_current_vehicle_shows_nothing() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let screen = MaintenanceScreen::new(store);
        screen.load().await;

        let state = screen.state();
        assert_eq!(state.vehicle, None);
        assert_eq!(state.tasks, Some(Resource::Success(Vec::new())));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn filter_and_complete_tasks() {
        let (store, vehicle) = store_with_vehicle().await;
        let now = now_millis();
        let late = store
            .add_task(NewTask {
                vehicle_id: vehicle.id,
                fields: edit("Brake fluid", now - DAY_MS),
            })
            .await
            .unwrap();
        store
            .add_task(NewTask {
                vehicle_id: vehicle.id,
                fields: edit("Oil change", now + 10 * DAY_MS),
            })
            .await
            .unwrap();
        let screen = MaintenanceScreen::new(store.clone());
        screen.load().await;

        screen.set_filter(StatusFilter::Overdue);
        let titles = screen
            .state()
            .visible_tasks(now)
            .iter()
            .map(|task| task.title.clone())
            .collect::<Vec<_>>();
        assert_eq!(titles, vec!["Brake fluid".to_string()]);

        screen.complete(&late.id).await;
        let state = screen.state();
        assert!(state.visible_tasks(now).is_empty());
        assert_eq!(state.vehicle.map(|vehicle| vehicle.id), Some(vehicle.id));

        screen.set_filter(StatusFilter::Completed);
        assert_eq!(screen.state().visible_tasks(now).len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn completing_deleted_task_surfaces_conflict() {
        let (store, vehicle) = store_with_vehicle().await;
        let task = store
            .add_task(NewTask {
                vehicle_id: vehicle.id,
                fields: edit("Tyres", now_millis() + DAY_MS),
            })
            .await
            .unwrap();
        store.mark_task_synced(&task, "task-9").await.unwrap();
        let screen = MaintenanceScreen::new(store.clone());

        screen.delete(&task.id).await;
        let hidden = store.get_task(&task.id).await.unwrap().unwrap();
        assert_eq!(hidden.sync_state, SyncState::PendingDelete);
        assert!(screen.state().visible_tasks(now_millis()).is_empty());

        screen.complete(&task.id).await;
        assert!(screen.state().notice.is_some());
    }

    #[test]
    fn visible_tasks_put_undated_last() {
        let vehicle_id = VehicleId::new();
        let dated = NewTask {
            vehicle_id,
            fields: edit("Dated", 10 * DAY_MS),
        }
        .into_task(0);
        let undated = NewTask {
            vehicle_id,
            fields: TaskEdit {
                due_at: None,
                due_mileage: Some(90_000),
                ..edit("Undated", 0)
            },
        }
        .into_task(0);
        let state = MaintenanceState {
            tasks: Some(Resource::Success(vec![undated, dated])),
            ..MaintenanceState::default()
        };

        let titles = state
            .visible_tasks(0)
            .iter()
            .map(|task| task.title.as_str())
            .collect::<Vec<_>>();
        assert_eq!(titles, vec!["Dated", "Undated"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn task_form_requires_due_date_or_mileage() {
        let (store, vehicle) = store_with_vehicle().await;
        let screen = TaskFormScreen::new(store);
        screen.dispatch(TaskFormEvent::Opened(vehicle.id));
        screen.dispatch(TaskFormEvent::TitleChanged("Air filter".to_string()));

        assert_eq!(screen.submit().await, None);
        assert_eq!(
            screen.state().error.as_deref(),
            Some("Set a due date or a due mileage")
        );

        screen.dispatch(TaskFormEvent::DueMileageChanged("45000".to_string()));
        assert_eq!(screen.state().error, None);
        let task = screen.submit().await.unwrap();
        assert_eq!(task.due_mileage, Some(45_000));
        assert_eq!(task.sync_state, SyncState::PendingCreate);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn task_form_edits_existing_task() {
        let (store, vehicle) = store_with_vehicle().await;
        let task = store
            .add_task(NewTask {
                vehicle_id: vehicle.id,
                fields: edit("Oil", parse_date("2030-05-01").unwrap()),
            })
            .await
            .unwrap();
        let screen = TaskFormScreen::new(store.clone());
        screen.dispatch(TaskFormEvent::EditStarted(task.clone()));
        assert_eq!(screen.state().due_date, "2030-05-01");

        screen.dispatch(TaskFormEvent::TitleChanged("Oil and filter".to_string()));
        screen.dispatch(TaskFormEvent::SeverityChanged(Severity::High));
        let saved = screen.submit().await.unwrap();

        assert_eq!(saved.id, task.id);
        let stored = store.get_task(&task.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Oil and filter");
        assert_eq!(stored.severity, Severity::High);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn task_form_without_vehicle_fails() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let screen = TaskFormScreen::new(store);
        screen.dispatch(TaskFormEvent::TitleChanged("Oil".to_string()));
        screen.dispatch(TaskFormEvent::DueDateChanged("2030-01-01".to_string()));

        assert_eq!(screen.submit().await, None);
        assert_eq!(screen.state().error.as_deref(), Some("Select a vehicle first"));
    }
}
