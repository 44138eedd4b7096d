//! Tracing-based hooks for provider attempts and dialog states.
//!
//! ```rust
//! use kdialog::DialogHooks;
//! use kobserve::TracingObservabilityHooks;
//!
//! fn accepts_dialog_hooks(_hooks: &dyn DialogHooks) {}
//!
//! let hooks = TracingObservabilityHooks;
//! accepts_dialog_hooks(&hooks);
//! ```

use std::time::Duration;

use kcommon::SessionId;
use kdialog::{DialogError, DialogHooks, DialogState, Intent};
use kprovider::{ProviderError, ProviderId, ProviderOperationHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl ProviderOperationHooks for TracingObservabilityHooks {
    fn on_attempt_start(&self, provider: ProviderId, operation: &str, attempt: u32) {
        tracing::info!(
            phase = "provider",
            event = "attempt_start",
            provider = %provider,
            operation,
            attempt
        );
    }

    fn on_retry_scheduled(
        &self,
        provider: ProviderId,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        tracing::warn!(
            phase = "provider",
            event = "retry_scheduled",
            provider = %provider,
            operation,
            attempt,
            delay_ms = delay.as_millis() as u64,
            status = error.status,
            error = %error
        );
    }

    fn on_success(&self, provider: ProviderId, operation: &str, attempts: u32) {
        tracing::info!(
            phase = "provider",
            event = "success",
            provider = %provider,
            operation,
            attempts
        );
    }

    fn on_failure(
        &self,
        provider: ProviderId,
        operation: &str,
        attempts: u32,
        error: &ProviderError,
    ) {
        tracing::error!(
            phase = "provider",
            event = "failure",
            provider = %provider,
            operation,
            attempts,
            error_kind = ?error.kind,
            status = error.status,
            retryable = error.retryable,
            error = %error
        );
    }
}

impl DialogHooks for TracingObservabilityHooks {
    fn on_state(&self, session_id: &SessionId, state: DialogState) {
        tracing::debug!(
            phase = "dialog",
            event = "state",
            session_id = %session_id,
            state = state.as_str()
        );
    }

    fn on_intent(&self, session_id: &SessionId, intent: Intent) {
        tracing::info!(
            phase = "dialog",
            event = "intent",
            session_id = %session_id,
            intent = intent.as_str()
        );
    }

    fn on_compression(&self, session_id: &SessionId, before: usize, after: usize, summarized: bool) {
        tracing::info!(
            phase = "dialog",
            event = "compression",
            session_id = %session_id,
            before,
            after,
            summarized
        );
    }

    fn on_fallback(&self, session_id: &SessionId, operation: &str, error: &ProviderError) {
        tracing::warn!(
            phase = "dialog",
            event = "fallback",
            session_id = %session_id,
            operation,
            error_kind = ?error.kind,
            error = %error
        );
    }

    fn on_persistence_failure(&self, session_id: &SessionId, operation: &str, error: &DialogError) {
        tracing::error!(
            phase = "dialog",
            event = "persistence_failure",
            session_id = %session_id,
            operation,
            error_kind = ?error.kind,
            error = %error
        );
    }

    fn on_reset(&self, session_id: &SessionId) {
        tracing::info!(phase = "dialog", event = "reset", session_id = %session_id);
    }
}
