//! Memory backend trait and in-memory backend implementation.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use kcommon::{BoxFuture, SessionId};
use kdialog::Transcript;

use crate::backends::sqlite::default_sqlite_path;
use crate::error::MemoryError;

pub use crate::backends::filesystem::FilesystemMemoryBackend;
pub use crate::backends::sqlite::SqliteMemoryBackend;

pub trait MemoryBackend: Send + Sync {
    fn load_transcript<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Option<Transcript>, MemoryError>>;

    /// Replaces the whole stored transcript for the session.
    fn save_transcript<'a>(
        &'a self,
        session_id: &'a SessionId,
        transcript: &'a Transcript,
    ) -> BoxFuture<'a, Result<(), MemoryError>>;

    /// Returns whether a transcript existed.
    fn delete_transcript<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<bool, MemoryError>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryBackendConfig {
    Sqlite { path: PathBuf },
    Filesystem { root: PathBuf },
    InMemory,
}

impl Default for MemoryBackendConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: default_sqlite_path(),
        }
    }
}

pub fn create_memory_backend(
    config: MemoryBackendConfig,
) -> Result<Arc<dyn MemoryBackend>, MemoryError> {
    match config {
        MemoryBackendConfig::Sqlite { path } => Ok(Arc::new(SqliteMemoryBackend::new(path)?)),
        MemoryBackendConfig::Filesystem { root } => {
            Ok(Arc::new(FilesystemMemoryBackend::new(root)?))
        }
        MemoryBackendConfig::InMemory => Ok(Arc::new(InMemoryMemoryBackend::new())),
    }
}

pub fn create_default_memory_backend() -> Result<Arc<dyn MemoryBackend>, MemoryError> {
    create_memory_backend(MemoryBackendConfig::default())
}

#[derive(Debug, Default)]
pub struct InMemoryMemoryBackend {
    sessions: Mutex<HashMap<SessionId, Transcript>>,
}

impl InMemoryMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn sessions(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<SessionId, Transcript>>, MemoryError> {
        self.sessions
            .lock()
            .map_err(|_| MemoryError::storage("memory backend lock poisoned"))
    }
}

impl MemoryBackend for InMemoryMemoryBackend {
    fn load_transcript<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Option<Transcript>, MemoryError>> {
        Box::pin(async move { Ok(self.sessions()?.get(session_id).cloned()) })
    }

    fn save_transcript<'a>(
        &'a self,
        session_id: &'a SessionId,
        transcript: &'a Transcript,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            self.sessions()?
                .insert(session_id.clone(), transcript.clone());
            Ok(())
        })
    }

    fn delete_transcript<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<bool, MemoryError>> {
        Box::pin(async move { Ok(self.sessions()?.remove(session_id).is_some()) })
    }
}
