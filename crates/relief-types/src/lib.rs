//! Shared types for the Relief coordination engine.
//!
//! This crate holds the vocabulary every other crate speaks: actor roles and
//! identities, the Disaster / Resource / Report entities with their audit
//! trails, the explicit patch types accepted by updates, and the change
//! events pushed to observers.
//!
//! No crate in the workspace depends on anything *except* `relief-types` for
//! cross-cutting type definitions. This keeps the dependency graph clean and
//! prevents circular dependencies.

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod entity;
mod event;

pub use entity::{
    AuditAction, AuditEntry, Coordinates, Disaster, DisasterPatch, NewDisaster, NewReport,
    NewResource, Relocation, Report, ReportPatch, Resource, ResourcePatch, VerificationStatus,
};
pub use event::{
    ChangeEvent, ChangeKind, DisasterEvent, Envelope, ParseTopicError, ReportEvent, ResourceEvent,
    Topic,
};

/// Trust level of an actor.
///
/// Roles are assigned by the static identity table and never change while
/// the process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May perform any action on any entity.
    Admin,
    /// May create entities and modify the ones it owns.
    Contributor,
    /// Same mutation rights as a contributor; intended for field observers.
    Viewer,
}

impl Role {
    /// Returns the canonical lowercase label for this role.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Contributor => "contributor",
            Self::Viewer => "viewer",
        }
    }

    /// Whether this role bypasses ownership checks.
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "contributor" => Ok(Self::Contributor),
            "viewer" => Ok(Self::Viewer),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown role label.
#[derive(Debug, Clone, Error)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

/// A resolved actor: the handle presented as a bearer credential plus the
/// role the identity table assigns to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// The actor's handle (e.g. `netrunnerX`).
    pub handle: String,
    /// The actor's role.
    pub role: Role,
}

impl Identity {
    pub fn new(handle: impl Into<String>, role: Role) -> Self {
        Self {
            handle: handle.into(),
            role,
        }
    }
}
