//! Bearer credential to identity mapping.

use relief_types::{Identity, Role};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

const BEARER_PREFIX: &str = "Bearer ";

/// Errors produced while resolving a credential.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// No credential was supplied, or it is not a `Bearer` credential.
    #[error("missing or invalid Authorization header")]
    MissingCredential,
    /// The credential does not name a known handle.
    #[error("unknown identity")]
    UnknownIdentity,
}

/// Static mapping from handle to role.
///
/// Loaded once from configuration (the `[identities]` table) and never
/// mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleTable {
    roles: HashMap<String, Role>,
}

impl RoleTable {
    /// Builds a table from `(handle, role)` pairs. Later duplicates win.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Role)>,
        S: Into<String>,
    {
        Self {
            roles: entries
                .into_iter()
                .map(|(handle, role)| (handle.into(), role))
                .collect(),
        }
    }

    /// The three demo actors shipped with the example configuration.
    pub fn demo() -> Self {
        Self::from_entries([
            ("netrunnerX", Role::Admin),
            ("reliefAdmin", Role::Contributor),
            ("citizen1", Role::Viewer),
        ])
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Looks up the role assigned to `handle`.
    pub fn role_of(&self, handle: &str) -> Option<Role> {
        self.roles.get(handle).copied()
    }

    /// Resolves the raw value of an `Authorization` header.
    ///
    /// The header must read `Bearer <handle>`; surrounding whitespace around
    /// the handle is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredential`] if the header is absent or
    /// does not use the `Bearer` scheme, and [`AuthError::UnknownIdentity`]
    /// if the handle is not in the table.
    pub fn resolve(&self, header: Option<&str>) -> Result<Identity, AuthError> {
        let handle = header
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
            .ok_or(AuthError::MissingCredential)?
            .trim();

        match self.role_of(handle) {
            Some(role) => Ok(Identity::new(handle, role)),
            None => {
                tracing::debug!(handle, "credential names an unknown identity");
                Err(AuthError::UnknownIdentity)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_handles() {
        let table = RoleTable::demo();
        let identity = table.resolve(Some("Bearer netrunnerX")).unwrap();
        assert_eq!(identity, Identity::new("netrunnerX", Role::Admin));

        let identity = table.resolve(Some("Bearer   citizen1  ")).unwrap();
        assert_eq!(identity.handle, "citizen1");
        assert_eq!(identity.role, Role::Viewer);
    }

    #[test]
    fn missing_or_malformed_header_is_missing_credential() {
        let table = RoleTable::demo();
        assert_eq!(table.resolve(None), Err(AuthError::MissingCredential));
        assert_eq!(
            table.resolve(Some("netrunnerX")),
            Err(AuthError::MissingCredential)
        );
        assert_eq!(
            table.resolve(Some("Basic bmV0cnVubmVyWA==")),
            Err(AuthError::MissingCredential)
        );
        // Scheme is case-sensitive.
        assert_eq!(
            table.resolve(Some("bearer netrunnerX")),
            Err(AuthError::MissingCredential)
        );
    }

    #[test]
    fn unknown_handle_is_unknown_identity() {
        let table = RoleTable::demo();
        assert_eq!(
            table.resolve(Some("Bearer mallory")),
            Err(AuthError::UnknownIdentity)
        );
        assert_eq!(table.resolve(Some("Bearer ")), Err(AuthError::UnknownIdentity));
    }

    #[test]
    fn deserializes_from_identities_table() {
        let table: RoleTable = toml::from_str(
            r#"
            alice = "admin"
            bob = "viewer"
            "#,
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.role_of("alice"), Some(Role::Admin));
        assert_eq!(table.role_of("bob"), Some(Role::Viewer));
        assert_eq!(table.role_of("carol"), None);
    }

    #[test]
    fn rejects_unknown_role_labels() {
        let result: Result<RoleTable, _> = serde_json::from_str(r#"{"alice":"root"}"#);
        assert!(result.is_err());
    }
}
