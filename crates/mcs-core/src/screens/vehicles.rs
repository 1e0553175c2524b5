//! Vehicle list and vehicle form screens

use super::{Reducer, Resource, StateHolder};
use crate::error::{Error, Result};
use crate::models::{FuelType, NewVehicle, UsageType, Vehicle, VehicleId};
use crate::remote::RemoteGateway;
use crate::services::LocalStore;
use crate::sync::SyncOrchestrator;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleListState {
    pub loading: bool,
    pub vehicles: Option<Resource<Vec<Vehicle>>>,
    /// Failure of the last select or delete
    pub notice: Option<String>,
}

impl VehicleListState {
    #[must_use]
    pub fn current(&self) -> Option<&Vehicle> {
        self.vehicles
            .as_ref()
            .and_then(Resource::value)
            .and_then(|vehicles| vehicles.iter().find(|vehicle| vehicle.is_current))
    }
}

#[derive(Debug)]
pub enum VehicleListEvent {
    LoadStarted,
    Loaded(Vec<Vehicle>),
    LoadFailed(String),
    ActionFailed(String),
    NoticeDismissed,
}

pub struct VehicleListReducer;

impl Reducer for VehicleListReducer {
    type State = VehicleListState;
    type Event = VehicleListEvent;

    fn reduce(state: &VehicleListState, event: VehicleListEvent) -> VehicleListState {
        match event {
            VehicleListEvent::LoadStarted => VehicleListState {
                loading: true,
                ..state.clone()
            },
            VehicleListEvent::Loaded(vehicles) => VehicleListState {
                loading: false,
                vehicles: Some(Resource::Success(vehicles)),
                notice: state.notice.clone(),
            },
            VehicleListEvent::LoadFailed(message) => VehicleListState {
                loading: false,
                vehicles: Some(Resource::failed(message, state.vehicles.as_ref())),
                notice: state.notice.clone(),
            },
            VehicleListEvent::ActionFailed(message) => VehicleListState {
                notice: Some(message),
                ..state.clone()
            },
            VehicleListEvent::NoticeDismissed => VehicleListState {
                notice: None,
                ..state.clone()
            },
        }
    }
}

/// Registered vehicles with selection and deletion
pub struct VehicleListScreen<G> {
    sync: SyncOrchestrator<G>,
    holder: StateHolder<VehicleListReducer>,
}

impl<G: RemoteGateway> VehicleListScreen<G> {
    #[must_use]
    pub fn new(sync: SyncOrchestrator<G>) -> Self {
        Self {
            sync,
            holder: StateHolder::default(),
        }
    }

    pub fn holder(&self) -> &StateHolder<VehicleListReducer> {
        &self.holder
    }

    #[must_use]
    pub fn state(&self) -> VehicleListState {
        self.holder.state()
    }

    pub async fn load(&self) {
        self.holder.dispatch(VehicleListEvent::LoadStarted);
        match self.sync.store().list_vehicles().await {
            Ok(vehicles) => self.holder.dispatch(VehicleListEvent::Loaded(vehicles)),
            Err(error) => self
                .holder
                .dispatch(VehicleListEvent::LoadFailed(error.user_message())),
        }
    }

    /// Make `id` the current vehicle and reload
    pub async fn select(&self, id: &VehicleId) {
        if let Err(error) = self.sync.store().set_current_vehicle(id).await {
            self.holder
                .dispatch(VehicleListEvent::ActionFailed(error.user_message()));
        }
        self.load().await;
    }

    /// Delete on the backend and locally, then reload
    pub async fn delete(&self, id: &VehicleId) {
        if let Err(error) = self.sync.delete_vehicle(id).await {
            self.holder
                .dispatch(VehicleListEvent::ActionFailed(error.user_message()));
        }
        self.load().await;
    }

    pub fn dismiss_notice(&self) {
        self.holder.dispatch(VehicleListEvent::NoticeDismissed);
    }
}

/// Editable fields of the vehicle form, kept as typed by the user
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleFormState {
    /// Vehicle being edited; `None` registers a new one
    pub editing: Option<VehicleId>,
    pub brand: String,
    pub model: String,
    pub year: String,
    pub plate: String,
    pub fuel_type: FuelType,
    pub usage_type: UsageType,
    pub submitting: bool,
    pub error: Option<String>,
    pub saved: Option<Vehicle>,
}

impl Default for VehicleFormState {
    fn default() -> Self {
        Self {
            editing: None,
            brand: String::new(),
            model: String::new(),
            year: String::new(),
            plate: String::new(),
            fuel_type: FuelType::Gasoline,
            usage_type: UsageType::Mixed,
            submitting: false,
            error: None,
            saved: None,
        }
    }
}

impl VehicleFormState {
    /// Parse and validate the form into store input
    pub fn to_input(&self) -> Result<NewVehicle> {
        let year = self
            .year
            .trim()
            .parse::<i32>()
            .map_err(|_| Error::InvalidInput("Year must be a number".into()))?;
        NewVehicle {
            brand: self.brand.clone(),
            model: self.model.clone(),
            year,
            plate: Some(self.plate.clone()),
            fuel_type: self.fuel_type,
            usage_type: self.usage_type,
        }
        .validate()
    }
}

#[derive(Debug)]
pub enum VehicleFormEvent {
    EditStarted(Vehicle),
    BrandChanged(String),
    ModelChanged(String),
    YearChanged(String),
    PlateChanged(String),
    FuelTypeChanged(FuelType),
    UsageTypeChanged(UsageType),
    SubmitStarted,
    Saved(Vehicle),
    Failed(String),
}

pub struct VehicleFormReducer;

impl Reducer for VehicleFormReducer {
    type State = VehicleFormState;
    type Event = VehicleFormEvent;

    fn reduce(state: &VehicleFormState, event: VehicleFormEvent) -> VehicleFormState {
        let edited = |state: VehicleFormState| VehicleFormState {
            error: None,
            saved: None,
            ..state
        };
        match event {
            VehicleFormEvent::EditStarted(vehicle) => VehicleFormState {
                editing: Some(vehicle.id),
                brand: vehicle.brand,
                model: vehicle.model,
                year: vehicle.year.to_string(),
                plate: vehicle.plate.unwrap_or_default(),
                fuel_type: vehicle.fuel_type,
                usage_type: vehicle.usage_type,
                ..VehicleFormState::default()
            },
            VehicleFormEvent::BrandChanged(brand) => edited(VehicleFormState {
                brand,
                ..state.clone()
            }),
            VehicleFormEvent::ModelChanged(model) => edited(VehicleFormState {
                model,
                ..state.clone()
            }),
            VehicleFormEvent::YearChanged(year) => edited(VehicleFormState {
                year,
                ..state.clone()
            }),
            VehicleFormEvent::PlateChanged(plate) => edited(VehicleFormState {
                plate,
                ..state.clone()
            }),
            VehicleFormEvent::FuelTypeChanged(fuel_type) => edited(VehicleFormState {
                fuel_type,
                ..state.clone()
            }),
            VehicleFormEvent::UsageTypeChanged(usage_type) => edited(VehicleFormState {
                usage_type,
                ..state.clone()
            }),
            VehicleFormEvent::SubmitStarted => VehicleFormState {
                submitting: true,
                error: None,
                ..state.clone()
            },
            VehicleFormEvent::Saved(vehicle) => VehicleFormState {
                editing: Some(vehicle.id),
                submitting: false,
                saved: Some(vehicle),
                ..state.clone()
            },
            VehicleFormEvent::Failed(message) => VehicleFormState {
                submitting: false,
                error: Some(message),
                ..state.clone()
            },
        }
    }
}

/// Register or edit a vehicle
pub struct VehicleFormScreen {
    store: LocalStore,
    holder: StateHolder<VehicleFormReducer>,
}

impl VehicleFormScreen {
    #[must_use]
    pub fn new(store: LocalStore) -> Self {
        Self {
            store,
            holder: StateHolder::default(),
        }
    }

    pub fn holder(&self) -> &StateHolder<VehicleFormReducer> {
        &self.holder
    }

    #[must_use]
    pub fn state(&self) -> VehicleFormState {
        self.holder.state()
    }

    pub fn dispatch(&self, event: VehicleFormEvent) {
        self.holder.dispatch(event);
    }

    /// Validate and save. Returns the stored vehicle on success.
    pub async fn submit(&self) -> Option<Vehicle> {
        let state = self.holder.state();
        if state.submitting {
            return None;
        }
        self.holder.dispatch(VehicleFormEvent::SubmitStarted);

        let result = match state.to_input() {
            Ok(input) => match &state.editing {
                Some(id) => self.store.update_vehicle(id, input).await,
                None => self.store.add_vehicle(input).await,
            },
            Err(error) => Err(error),
        };

        match result {
            Ok(vehicle) => {
                self.holder.dispatch(VehicleFormEvent::Saved(vehicle.clone()));
                Some(vehicle)
            }
            Err(error) => {
                self.holder
                    .dispatch(VehicleFormEvent::Failed(error.user_message()));
                None
            }
        }
    }
}
