//! Wrappers that keep a panicking hook from taking down a request.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use kcommon::SessionId;
use kdialog::{DialogError, DialogHooks, DialogState, Intent};
use kprovider::{ProviderError, ProviderId, ProviderOperationHooks};

pub struct SafeProviderHooks<H> {
    inner: H,
}

impl<H> SafeProviderHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ProviderOperationHooks for SafeProviderHooks<H>
where
    H: ProviderOperationHooks,
{
    fn on_attempt_start(&self, provider: ProviderId, operation: &str, attempt: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_attempt_start(provider, operation, attempt)
        }));
    }

    fn on_retry_scheduled(
        &self,
        provider: ProviderId,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_retry_scheduled(provider, operation, attempt, delay, error)
        }));
    }

    fn on_success(&self, provider: ProviderId, operation: &str, attempts: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_success(provider, operation, attempts)
        }));
    }

    fn on_failure(
        &self,
        provider: ProviderId,
        operation: &str,
        attempts: u32,
        error: &ProviderError,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_failure(provider, operation, attempts, error)
        }));
    }
}

pub struct SafeDialogHooks<H> {
    inner: H,
}

impl<H> SafeDialogHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> DialogHooks for SafeDialogHooks<H>
where
    H: DialogHooks,
{
    fn on_state(&self, session_id: &SessionId, state: DialogState) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_state(session_id, state)));
    }

    fn on_intent(&self, session_id: &SessionId, intent: Intent) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_intent(session_id, intent)
        }));
    }

    fn on_compression(&self, session_id: &SessionId, before: usize, after: usize, summarized: bool) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_compression(session_id, before, after, summarized)
        }));
    }

    fn on_fallback(&self, session_id: &SessionId, operation: &str, error: &ProviderError) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_fallback(session_id, operation, error)
        }));
    }

    fn on_persistence_failure(&self, session_id: &SessionId, operation: &str, error: &DialogError) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_persistence_failure(session_id, operation, error)
        }));
    }

    fn on_reset(&self, session_id: &SessionId) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_reset(session_id)));
    }
}
