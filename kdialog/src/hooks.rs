//! Orchestrator lifecycle hooks.

use kcommon::SessionId;
use kprovider::ProviderError;

use crate::{DialogError, Intent};

/// Orchestrator states, in the order a chat request passes through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogState {
    Received,
    Classified,
    Responded,
    Persisted,
}

impl DialogState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Classified => "classified",
            Self::Responded => "responded",
            Self::Persisted => "persisted",
        }
    }
}

pub trait DialogHooks: Send + Sync {
    fn on_state(&self, _session_id: &SessionId, _state: DialogState) {}

    fn on_intent(&self, _session_id: &SessionId, _intent: Intent) {}

    fn on_compression(
        &self,
        _session_id: &SessionId,
        _before: usize,
        _after: usize,
        _summarized: bool,
    ) {
    }

    /// A provider call failed and a canned reply or summary was used.
    fn on_fallback(&self, _session_id: &SessionId, _operation: &str, _error: &ProviderError) {}

    fn on_persistence_failure(
        &self,
        _session_id: &SessionId,
        _operation: &str,
        _error: &DialogError,
    ) {
    }

    fn on_reset(&self, _session_id: &SessionId) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDialogHooks;

impl DialogHooks for NoopDialogHooks {}
