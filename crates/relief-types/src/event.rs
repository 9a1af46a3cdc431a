//! Change events pushed to observers after each committed mutation.

use serde::{Deserialize, Serialize};

use crate::entity::{Disaster, Report, Resource};

/// Fan-out topics. Observers subscribe per topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    DisasterUpdated,
    ReportUpdated,
    ResourceUpdated,
}

impl Topic {
    /// Every topic, in a stable order.
    pub const ALL: [Topic; 3] = [
        Topic::DisasterUpdated,
        Topic::ReportUpdated,
        Topic::ResourceUpdated,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DisasterUpdated => "disaster_updated",
            Self::ReportUpdated => "report_updated",
            Self::ResourceUpdated => "resource_updated",
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Topic {
    type Err = ParseTopicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disaster_updated" => Ok(Self::DisasterUpdated),
            "report_updated" => Ok(Self::ReportUpdated),
            "resource_updated" => Ok(Self::ResourceUpdated),
            _ => Err(ParseTopicError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown topic string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown topic: {0}")]
pub struct ParseTopicError(pub String);

/// The mutation kind carried in every event's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
    DeleteAll,
}

impl ChangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::DeleteAll => "delete_all",
        }
    }
}

/// Events on the `disaster_updated` topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisasterEvent {
    Create {
        disaster: Disaster,
    },
    Update {
        disaster: Disaster,
    },
    /// Carries the tombstone: the record as it was, delete entry included.
    Delete {
        id: String,
        disaster: Disaster,
    },
    DeleteAll {
        count: usize,
    },
}

/// Events on the `resource_updated` topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResourceEvent {
    Create {
        resource: Resource,
        disaster_id: String,
    },
    Update {
        resource: Resource,
        disaster_id: String,
    },
    Delete {
        id: String,
        disaster_id: String,
        resource: Resource,
    },
}

/// Events on the `report_updated` topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportEvent {
    Create {
        report: Report,
        disaster_id: String,
    },
    Update {
        report: Report,
        disaster_id: String,
    },
    Delete {
        id: String,
        disaster_id: String,
        report: Report,
    },
}

/// Any change event, regardless of topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChangeEvent {
    Disaster(DisasterEvent),
    Resource(ResourceEvent),
    Report(ReportEvent),
}

impl ChangeEvent {
    /// The topic this event is published on.
    pub fn topic(&self) -> Topic {
        match self {
            Self::Disaster(_) => Topic::DisasterUpdated,
            Self::Resource(_) => Topic::ResourceUpdated,
            Self::Report(_) => Topic::ReportUpdated,
        }
    }

    /// The mutation kind, as carried in the payload's `type` field.
    pub fn kind(&self) -> ChangeKind {
        match self {
            Self::Disaster(DisasterEvent::Create { .. })
            | Self::Resource(ResourceEvent::Create { .. })
            | Self::Report(ReportEvent::Create { .. }) => ChangeKind::Create,
            Self::Disaster(DisasterEvent::Update { .. })
            | Self::Resource(ResourceEvent::Update { .. })
            | Self::Report(ReportEvent::Update { .. }) => ChangeKind::Update,
            Self::Disaster(DisasterEvent::Delete { .. })
            | Self::Resource(ResourceEvent::Delete { .. })
            | Self::Report(ReportEvent::Delete { .. }) => ChangeKind::Delete,
            Self::Disaster(DisasterEvent::DeleteAll { .. }) => ChangeKind::DeleteAll,
        }
    }

    /// Identifier of the affected entity, if the event concerns a single one.
    pub fn entity_id(&self) -> Option<&str> {
        match self {
            Self::Disaster(DisasterEvent::Create { disaster })
            | Self::Disaster(DisasterEvent::Update { disaster }) => Some(&disaster.id),
            Self::Disaster(DisasterEvent::Delete { id, .. }) => Some(id),
            Self::Disaster(DisasterEvent::DeleteAll { .. }) => None,
            Self::Resource(ResourceEvent::Create { resource, .. })
            | Self::Resource(ResourceEvent::Update { resource, .. }) => Some(&resource.id),
            Self::Resource(ResourceEvent::Delete { id, .. }) => Some(id),
            Self::Report(ReportEvent::Create { report, .. })
            | Self::Report(ReportEvent::Update { report, .. }) => Some(&report.id),
            Self::Report(ReportEvent::Delete { id, .. }) => Some(id),
        }
    }
}

impl From<DisasterEvent> for ChangeEvent {
    fn from(e: DisasterEvent) -> Self {
        Self::Disaster(e)
    }
}

impl From<ResourceEvent> for ChangeEvent {
    fn from(e: ResourceEvent) -> Self {
        Self::Resource(e)
    }
}

impl From<ReportEvent> for ChangeEvent {
    fn from(e: ReportEvent) -> Self {
        Self::Report(e)
    }
}

/// What observers actually receive: the event plus its topic and position in
/// the hub's publish order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub topic: Topic,
    /// Monotonically increasing publish sequence number, starting at 1.
    pub seq: u64,
    pub payload: ChangeEvent,
}
