//! Per-session async locks serializing load, mutate and save.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use kcommon::SessionId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct SessionLocks {
    entries: Mutex<HashMap<SessionId, Arc<AsyncMutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `session_id`.
    ///
    /// The returned guard exists before the wait starts, so a caller that
    /// gives up while queued still prunes its entry.
    pub async fn acquire(&self, session_id: &SessionId) -> SessionGuard<'_> {
        let mut session = SessionGuard {
            locks: self,
            session_id: session_id.clone(),
            guard: None,
        };
        let lock = self
            .entries()
            .entry(session_id.clone())
            .or_default()
            .clone();

        session.guard = Some(lock.lock_owned().await);
        session
    }

    /// Number of sessions currently holding or waiting on a lock.
    pub fn active(&self) -> usize {
        self.entries().len()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<SessionId, Arc<AsyncMutex<()>>>> {
        // The map holds no invariants a panicking holder could break.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, session_id: &SessionId) {
        let mut entries = self.entries();
        if entries
            .get(session_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            entries.remove(session_id);
        }
    }
}

pub struct SessionGuard<'a> {
    locks: &'a SessionLocks,
    session_id: SessionId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.release(&self.session_id);
    }
}
