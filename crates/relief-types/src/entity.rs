//! Entity, audit, and patch types for the shared record set.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// The kind of mutation recorded in an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// One immutable line of an entity's audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// What was done.
    pub action: AuditAction,
    /// Handle of the actor who did it.
    pub actor: String,
    /// RFC 3339 timestamp of the mutation.
    pub timestamp: String,
}

/// A disaster record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disaster {
    /// Public identifier (UUID).
    pub id: String,
    pub title: String,
    pub description: String,
    /// Place name from geocoding the description, or from the latest update.
    pub location_name: String,
    /// Present only when geocoding resolved the location.
    pub coordinates: Option<Coordinates>,
    pub tags: BTreeSet<String>,
    /// Handle of the creator. Never changes.
    pub owner: String,
    /// Append-only mutation history, oldest first.
    pub audit_trail: Vec<AuditEntry>,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

impl Disaster {
    /// Whether this disaster carries the given tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// An aid resource attached to a disaster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    /// The disaster this resource serves. Must exist at creation time.
    pub disaster_id: String,
    pub name: String,
    pub location_name: Option<String>,
    /// Free-form resource category (e.g. `shelter`, `food`).
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    pub coordinates: Coordinates,
    /// Handle of the creator.
    pub owner: String,
    pub audit_trail: Vec<AuditEntry>,
    pub created_at: String,
}

/// Triage outcome stored on a report at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Priority,
}

impl VerificationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Priority => "priority",
        }
    }

    /// Parses the stored label; returns `None` for unknown values.
    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "priority" => Some(Self::Priority),
            _ => None,
        }
    }
}

/// A field report about a disaster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub disaster_id: String,
    /// Handle of the reporter; acts as the owner for authorization.
    pub author: String,
    pub content: String,
    pub image_url: Option<String>,
    /// Computed once from `content` at creation.
    pub verification_status: VerificationStatus,
    pub audit_trail: Vec<AuditEntry>,
    pub created_at: String,
}

/// Payload for creating a disaster, after geocoding.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDisaster {
    pub title: String,
    pub description: String,
    pub location_name: String,
    pub coordinates: Option<Coordinates>,
    pub tags: BTreeSet<String>,
}

/// Payload for creating a resource.
#[derive(Debug, Clone, PartialEq)]
pub struct NewResource {
    pub disaster_id: String,
    pub name: String,
    pub location_name: Option<String>,
    pub resource_type: Option<String>,
    pub coordinates: Coordinates,
}

/// Payload for creating a report.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub disaster_id: String,
    pub content: String,
    pub image_url: Option<String>,
}

/// Partial update for a disaster. Absent fields are left untouched.
///
/// Coordinates are not patchable; they only ever come from geocoding a new
/// `location_name` or `description`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisasterPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<BTreeSet<String>>,
    pub location_name: Option<String>,
}

/// Where a disaster moved to after its update was re-geocoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Relocation {
    pub location_name: String,
    /// `None` when the place name could not be resolved.
    pub coordinates: Option<Coordinates>,
}

/// Partial update for a resource. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourcePatch {
    pub name: Option<String>,
    pub location_name: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    pub coordinates: Option<Coordinates>,
}

/// Partial update for a report. The verification status is not patchable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportPatch {
    pub content: Option<String>,
    pub image_url: Option<String>,
}
