use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use campus_application::{SESSION_STORAGE_KEY, SessionRecord, SessionRecordStore};
use campus_core::{AppError, AppResult};
use tracing::debug;

/// Durable session record store backed by one JSON file.
///
/// Stands in for the browser local storage of the original portal: one
/// record under a fixed namespace key, overwritten on every mutation. A
/// missing file is a signed-out start, not an error.
#[derive(Debug, Clone)]
pub struct JsonFileSessionStore {
    path: PathBuf,
}

impl JsonFileSessionStore {
    /// Creates a store writing to an explicit file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store under a data directory, using the fixed namespace
    /// key as the relative file path.
    #[must_use]
    pub fn in_directory(directory: impl AsRef<Path>) -> Self {
        Self::new(
            directory
                .as_ref()
                .join(format!("{SESSION_STORAGE_KEY}.json")),
        )
    }

    /// Returns the file path the record is stored at.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }
}

#[async_trait]
impl SessionRecordStore for JsonFileSessionStore {
    async fn load(&self) -> AppResult<Option<SessionRecord>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => {
                return Err(AppError::Persistence(format!(
                    "failed to read session record from '{}': {error}",
                    self.path.display()
                )));
            }
        };

        let record = serde_json::from_slice(&bytes).map_err(|error| {
            AppError::Validation(format!(
                "malformed session record at '{}': {error}",
                self.path.display()
            ))
        })?;

        Ok(Some(record))
    }

    async fn save(&self, record: &SessionRecord) -> AppResult<()> {
        let bytes = serde_json::to_vec_pretty(record)
            .map_err(|error| AppError::Internal(format!("failed to encode session record: {error}")))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|error| {
                AppError::Persistence(format!(
                    "failed to create session directory '{}': {error}",
                    parent.display()
                ))
            })?;
        }

        tokio::fs::write(&self.path, bytes).await.map_err(|error| {
            AppError::Persistence(format!(
                "failed to write session record to '{}': {error}",
                self.path.display()
            ))
        })?;

        debug!(path = %self.path.display(), "session record written");
        Ok(())
    }
}
