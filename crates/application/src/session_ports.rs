use async_trait::async_trait;
use campus_core::AppResult;
use campus_domain::Session;
use serde::{Deserialize, Serialize};

/// Fixed namespace key the session record is stored under.
pub const SESSION_STORAGE_KEY: &str = "digital-campus/session";

/// Schema version written into every persisted record.
///
/// Loaders must refuse records carrying a version they do not recognize
/// instead of silently misinterpreting fields.
pub const SESSION_RECORD_VERSION: u32 = 1;

/// Durable envelope for the session, written through on every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Session state, or `None` when signed out.
    pub state: Option<Session>,
    /// Whether the stored state represents an authenticated user.
    pub is_authenticated: bool,
    /// Schema tag for forward migration.
    pub version: u32,
}

impl SessionRecord {
    /// Creates the record written after sign-out.
    #[must_use]
    pub fn signed_out() -> Self {
        Self {
            state: None,
            is_authenticated: false,
            version: SESSION_RECORD_VERSION,
        }
    }

    /// Creates the record written for an authenticated session.
    #[must_use]
    pub fn signed_in(session: Session) -> Self {
        Self {
            state: Some(session),
            is_authenticated: true,
            version: SESSION_RECORD_VERSION,
        }
    }
}

/// Storage port for the persisted session record.
#[async_trait]
pub trait SessionRecordStore: Send + Sync {
    /// Loads the stored record, or `None` when nothing was persisted yet.
    async fn load(&self) -> AppResult<Option<SessionRecord>>;

    /// Overwrites the stored record.
    async fn save(&self, record: &SessionRecord) -> AppResult<()>;
}
