//! Application services and ports for the campus portal authorization core.

#![forbid(unsafe_code)]

mod authorization;
mod route_guard;
mod session_ports;
mod session_service;

pub use authorization::{is_permitted, is_role_allowed};
pub use route_guard::{RouteDecision, RouteGuard, RouteRequirements};
pub use session_ports::{
    SESSION_RECORD_VERSION, SESSION_STORAGE_KEY, SessionRecord, SessionRecordStore,
};
pub use session_service::{SessionService, SessionSnapshot};
