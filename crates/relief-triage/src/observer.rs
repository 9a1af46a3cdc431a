//! Client-side interpretation of disaster events.

use relief_types::{Coordinates, DisasterEvent};
use serde::Serialize;

use crate::proximity::classify_proximity;

/// How loudly an alert should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Error,
    Warning,
    Info,
    Success,
}

/// What an observer should show after receiving a disaster event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Alert {
    /// A new disaster within the nearby radius of the observer.
    NearbyDisaster { title: String, distance_km: f64 },
    NewDisaster { title: String },
    Updated { title: String },
    Deleted { id: String },
    AllDeleted { count: usize },
}

impl Alert {
    pub fn severity(&self) -> AlertSeverity {
        match self {
            Self::NearbyDisaster { .. } | Self::AllDeleted { .. } => AlertSeverity::Error,
            Self::Deleted { .. } => AlertSeverity::Warning,
            Self::NewDisaster { .. } => AlertSeverity::Info,
            Self::Updated { .. } => AlertSeverity::Success,
        }
    }

    /// Human-readable notification text.
    pub fn message(&self) -> String {
        match self {
            Self::NearbyDisaster { title, .. } => {
                format!("ALERT: New disaster \"{title}\" within 10km!")
            }
            Self::NewDisaster { title } => format!("New disaster: {title}"),
            Self::Updated { title } => format!("Disaster updated: {title}"),
            Self::Deleted { .. } => "A disaster was deleted.".to_string(),
            Self::AllDeleted { .. } => "All disasters deleted.".to_string(),
        }
    }
}

/// An observer's local state: its last known position, if any.
///
/// Each observer evaluates proximity with its own position; the server never
/// learns where observers are.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ObserverView {
    position: Option<Coordinates>,
}

impl ObserverView {
    pub fn new(position: Option<Coordinates>) -> Self {
        Self { position }
    }

    pub fn position(&self) -> Option<Coordinates> {
        self.position
    }

    /// Records a new position, or forgets it when location access is lost.
    pub fn set_position(&mut self, position: Option<Coordinates>) {
        self.position = position;
    }

    /// Turns a received disaster event into the alert to display.
    ///
    /// A created disaster is only "nearby" when both the observer position
    /// and the disaster coordinates are known.
    pub fn alert_for(&self, event: &DisasterEvent) -> Alert {
        match event {
            DisasterEvent::Create { disaster } => {
                let proximity = self
                    .position
                    .zip(disaster.coordinates)
                    .map(|(here, there)| classify_proximity(here, there));
                match proximity {
                    Some(p) if p.nearby => Alert::NearbyDisaster {
                        title: disaster.title.clone(),
                        distance_km: p.distance_km,
                    },
                    _ => Alert::NewDisaster {
                        title: disaster.title.clone(),
                    },
                }
            }
            DisasterEvent::Update { disaster } => Alert::Updated {
                title: disaster.title.clone(),
            },
            DisasterEvent::Delete { id, .. } => Alert::Deleted { id: id.clone() },
            DisasterEvent::DeleteAll { count } => Alert::AllDeleted { count: *count },
        }
    }
}
