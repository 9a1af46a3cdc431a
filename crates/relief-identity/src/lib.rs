//! Identity resolution and authorization for the Relief coordination engine.
//!
//! Actors present a bearer credential that names a handle. The [`RoleTable`]
//! maps known handles to roles; [`RoleTable::resolve`] turns a raw
//! `Authorization` header into an [`Identity`]. Before any mutation reaches
//! storage, [`authorize`] decides whether that identity may perform the
//! requested [`Action`] on the target.
//!
//! Both steps are pure: no I/O, no shared mutable state.

mod gate;
mod resolver;

pub use gate::{authorize, Action, AuthzError, Decision};
pub use resolver::{AuthError, RoleTable};
