//! Role and ownership checks in front of every mutation.

use relief_types::Identity;
use thiserror::Error;

/// A mutation an actor wants to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Update,
    Delete,
    /// Removal of the entire disaster collection.
    DeleteAll,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::DeleteAll => "delete_all",
        }
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(String),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Converts the decision into a `Result` for `?` propagation.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::Forbidden`] carrying the deny reason.
    pub fn into_result(self) -> Result<(), AuthzError> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(reason) => Err(AuthzError::Forbidden(reason)),
        }
    }
}

/// Authorization failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: {0}")]
    Forbidden(String),
}

/// Decides whether `actor` may perform `action`.
///
/// `owner` is the handle that owns the target entity; it is `None` for
/// creations and collection-wide actions. Admins may do anything. Every
/// other role may create, and may update or delete only what it owns.
/// `DeleteAll` is admin-only.
pub fn authorize(actor: &Identity, action: Action, owner: Option<&str>) -> Decision {
    if actor.role.is_admin() {
        return Decision::Allow;
    }

    let decision = match action {
        Action::Create => Decision::Allow,
        Action::DeleteAll => Decision::Deny("admin only".to_string()),
        Action::Update | Action::Delete => match owner {
            Some(owner) if owner == actor.handle => Decision::Allow,
            Some(_) => Decision::Deny(format!(
                "{} may only {} own records",
                actor.handle,
                action.as_str()
            )),
            None => Decision::Deny("target has no owner".to_string()),
        },
    };

    if let Decision::Deny(reason) = &decision {
        tracing::debug!(
            actor = %actor.handle,
            role = %actor.role,
            action = action.as_str(),
            reason = %reason,
            "authorization denied"
        );
    }

    decision
}
