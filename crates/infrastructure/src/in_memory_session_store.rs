use async_trait::async_trait;
use campus_application::{SessionRecord, SessionRecordStore};
use campus_core::AppResult;
use tokio::sync::RwLock;

/// In-memory session record store for tests and ephemeral embedding.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    record: RwLock<Option<SessionRecord>>,
}

impl InMemorySessionStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            record: RwLock::new(None),
        }
    }

    /// Returns a copy of the stored record, for assertions in tests.
    pub async fn stored(&self) -> Option<SessionRecord> {
        self.record.read().await.clone()
    }
}

#[async_trait]
impl SessionRecordStore for InMemorySessionStore {
    async fn load(&self) -> AppResult<Option<SessionRecord>> {
        Ok(self.record.read().await.clone())
    }

    async fn save(&self, record: &SessionRecord) -> AppResult<()> {
        *self.record.write().await = Some(record.clone());
        Ok(())
    }
}
