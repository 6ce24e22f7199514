//! Storage adapters for the campus portal authorization core.

#![forbid(unsafe_code)]

mod in_memory_session_store;
mod json_file_session_store;

pub use in_memory_session_store::InMemorySessionStore;
pub use json_file_session_store::JsonFileSessionStore;
