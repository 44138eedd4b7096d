//! Session storage contracts and a basic in-memory implementation.

use std::collections::HashMap;
use std::sync::Mutex;

use kcommon::{BoxFuture, SessionId};

use crate::{DialogError, Transcript};

pub trait SessionStore: Send + Sync {
    /// Returns `None` when nothing has been saved for the session.
    fn load_transcript<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Option<Transcript>, DialogError>>;

    fn save_transcript<'a>(
        &'a self,
        session_id: &'a SessionId,
        transcript: &'a Transcript,
    ) -> BoxFuture<'a, Result<(), DialogError>>;

    /// Deletes the stored transcript. Resetting an unknown session is not an error.
    fn reset<'a>(&'a self, session_id: &'a SessionId) -> BoxFuture<'a, Result<(), DialogError>>;

    /// Loads the transcript, seeding a fresh one with the persona when none exists.
    fn load<'a>(
        &'a self,
        session_id: &'a SessionId,
        persona: &'a str,
    ) -> BoxFuture<'a, Result<Transcript, DialogError>> {
        Box::pin(async move {
            let transcript = self.load_transcript(session_id).await?;
            Ok(transcript
                .filter(|transcript| !transcript.is_empty())
                .unwrap_or_else(|| Transcript::seeded(persona)))
        })
    }
}

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<SessionId, Transcript>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sessions(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<SessionId, Transcript>>, DialogError> {
        self.sessions
            .lock()
            .map_err(|_| DialogError::store("session store lock poisoned"))
    }
}

impl SessionStore for InMemorySessionStore {
    fn load_transcript<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Option<Transcript>, DialogError>> {
        Box::pin(async move { Ok(self.sessions()?.get(session_id).cloned()) })
    }

    fn save_transcript<'a>(
        &'a self,
        session_id: &'a SessionId,
        transcript: &'a Transcript,
    ) -> BoxFuture<'a, Result<(), DialogError>> {
        Box::pin(async move {
            self.sessions()?
                .insert(session_id.clone(), transcript.clone());
            Ok(())
        })
    }

    fn reset<'a>(&'a self, session_id: &'a SessionId) -> BoxFuture<'a, Result<(), DialogError>> {
        Box::pin(async move {
            self.sessions()?.remove(session_id);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Turn, TurnRole};

    #[tokio::test]
    async fn load_seeds_missing_sessions_with_persona() {
        let store = InMemorySessionStore::new();
        let session = SessionId::from("kid-1");

        let transcript = store.load(&session, "be kind").await.expect("load");
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.turns()[0].role, TurnRole::System);
        assert_eq!(transcript.turns()[0].content, "be kind");

        assert!(
            store
                .load_transcript(&session)
                .await
                .expect("load transcript")
                .is_none()
        );
    }

    #[tokio::test]
    async fn saved_transcripts_are_visible_until_reset() {
        let store = InMemorySessionStore::new();
        let session = SessionId::from("kid-2");
        let mut transcript = Transcript::seeded("persona");
        transcript.push(Turn::user("hello"));

        store
            .save_transcript(&session, &transcript)
            .await
            .expect("save");
        assert_eq!(store.load(&session, "persona").await.expect("load"), transcript);

        store.reset(&session).await.expect("reset");
        store.reset(&session).await.expect("second reset is a no-op");
        assert_eq!(
            store.load(&session, "persona").await.expect("load").len(),
            1
        );
    }
}
