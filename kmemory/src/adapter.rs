//! Adapter that exposes kmemory as a kdialog SessionStore.

use std::sync::Arc;

use kcommon::{BoxFuture, SessionId};
use kdialog::{DialogError, SessionStore, Transcript};

use crate::backend::MemoryBackend;

#[derive(Clone)]
pub struct MemorySessionStore {
    backend: Arc<dyn MemoryBackend>,
}

impl MemorySessionStore {
    pub fn new(backend: Arc<dyn MemoryBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> Arc<dyn MemoryBackend> {
        Arc::clone(&self.backend)
    }
}

impl SessionStore for MemorySessionStore {
    fn load_transcript<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Option<Transcript>, DialogError>> {
        Box::pin(async move { Ok(self.backend.load_transcript(session_id).await?) })
    }

    fn save_transcript<'a>(
        &'a self,
        session_id: &'a SessionId,
        transcript: &'a Transcript,
    ) -> BoxFuture<'a, Result<(), DialogError>> {
        Box::pin(async move { Ok(self.backend.save_transcript(session_id, transcript).await?) })
    }

    fn reset<'a>(&'a self, session_id: &'a SessionId) -> BoxFuture<'a, Result<(), DialogError>> {
        Box::pin(async move {
            self.backend.delete_transcript(session_id).await?;
            Ok(())
        })
    }
}
