//! Owner's manual screen: warning lights and how-to guides

use super::{Reducer, Resource, StateHolder};
use crate::error::Result;
use crate::models::{GuideArticle, WarningLight};
use crate::remote::RemoteGateway;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualState {
    pub loading: bool,
    pub lights: Option<Resource<Vec<WarningLight>>>,
    pub guides: Option<Resource<Vec<GuideArticle>>>,
    pub query: String,
}

impl ManualState {
    /// Lights matching the query, most severe first
    #[must_use]
    pub fn visible_lights(&self) -> Vec<&WarningLight> {
        let mut lights = self
            .lights
            .as_ref()
            .and_then(Resource::value)
            .map(|lights| {
                lights
                    .iter()
                    .filter(|light| light.matches(&self.query))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        lights.sort_by_key(|light| std::cmp::Reverse(light.severity));
        lights
    }

    #[must_use]
    pub fn visible_guides(&self) -> Vec<&GuideArticle> {
        self.guides
            .as_ref()
            .and_then(Resource::value)
            .map(|guides| {
                guides
                    .iter()
                    .filter(|guide| guide.matches(&self.query))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug)]
pub enum ManualEvent {
    LoadStarted,
    /// Each side carries its own outcome
    Loaded {
        lights: std::result::Result<Vec<WarningLight>, String>,
        guides: std::result::Result<Vec<GuideArticle>, String>,
    },
    QueryChanged(String),
}

fn resource<T: Clone>(
    result: std::result::Result<T, String>,
    previous: Option<&Resource<T>>,
) -> Resource<T> {
    match result {
        Ok(value) => Resource::Success(value),
        Err(message) => Resource::failed(message, previous),
    }
}

pub struct ManualReducer;

impl Reducer for ManualReducer {
    type State = ManualState;
    type Event = ManualEvent;

    fn reduce(state: &ManualState, event: ManualEvent) -> ManualState {
        match event {
            ManualEvent::LoadStarted => ManualState {
                loading: true,
                ..state.clone()
            },
            ManualEvent::Loaded { lights, guides } => ManualState {
                loading: false,
                lights: Some(resource(lights, state.lights.as_ref())),
                guides: Some(resource(guides, state.guides.as_ref())),
                ..state.clone()
            },
            ManualEvent::QueryChanged(query) => ManualState {
                query,
                ..state.clone()
            },
        }
    }
}

/// Manual content served by the backend
pub struct ManualScreen<G> {
    gateway: G,
    holder: StateHolder<ManualReducer>,
}

impl<G: RemoteGateway> ManualScreen<G> {
    #[must_use]
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            holder: StateHolder::default(),
        }
    }

    pub fn holder(&self) -> &StateHolder<ManualReducer> {
        &self.holder
    }

    #[must_use]
    pub fn state(&self) -> ManualState {
        self.holder.state()
    }

    pub fn set_query(&self, query: impl Into<String>) {
        self.holder.dispatch(ManualEvent::QueryChanged(query.into()));
    }

    /// Fetch lights and guides together; each side fails on its own
    pub async fn load(&self) {
        self.holder.dispatch(ManualEvent::LoadStarted);
        let (lights, guides) = tokio::join!(self.fetch_lights(), self.fetch_guides());
        self.holder.dispatch(ManualEvent::Loaded {
            lights: lights.map_err(|error| error.user_message()),
            guides: guides.map_err(|error| error.user_message()),
        });
    }

    async fn fetch_lights(&self) -> Result<Vec<WarningLight>> {
        self.gateway
            .list_warning_lights()
            .await?
            .into_iter()
            .map(WarningLight::try_from)
            .collect()
    }

    async fn fetch_guides(&self) -> Result<Vec<GuideArticle>> {
        Ok(self
            .gateway
            .list_guides()
            .await?
            .into_iter()
            .map(GuideArticle::from)
            .collect())
    }
}
