//! Domain entities and invariants for the campus portal authorization core.

#![forbid(unsafe_code)]

mod permission;
mod registry;
mod role;
mod session;

pub use permission::Permission;
pub use registry::{RoleDefinition, RoleRegistry, permits};
pub use role::Role;
pub use session::{Locale, Session};
