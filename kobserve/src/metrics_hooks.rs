//! Metrics-based hooks for provider attempts and dialog states.
//!
//! ```rust
//! use kobserve::MetricsObservabilityHooks;
//! use kprovider::ProviderOperationHooks;
//!
//! fn accepts_provider_hooks(_hooks: &dyn ProviderOperationHooks) {}
//!
//! let hooks = MetricsObservabilityHooks;
//! accepts_provider_hooks(&hooks);
//! ```

use std::time::Duration;

use kcommon::SessionId;
use kdialog::{DialogError, DialogHooks, DialogState, Intent};
use kprovider::{ProviderError, ProviderId, ProviderOperationHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl ProviderOperationHooks for MetricsObservabilityHooks {
    fn on_attempt_start(&self, provider: ProviderId, operation: &str, _attempt: u32) {
        metrics::counter!(
            "kidopedia_provider_attempt_start_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
    }

    fn on_retry_scheduled(
        &self,
        provider: ProviderId,
        operation: &str,
        _attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        metrics::counter!(
            "kidopedia_provider_retry_scheduled_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "kidopedia_provider_retry_delay_seconds",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .record(delay.as_secs_f64());
    }

    fn on_success(&self, provider: ProviderId, operation: &str, attempts: u32) {
        metrics::counter!(
            "kidopedia_provider_success_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "kidopedia_provider_attempts_per_success",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .record(attempts as f64);
    }

    fn on_failure(
        &self,
        provider: ProviderId,
        operation: &str,
        _attempts: u32,
        error: &ProviderError,
    ) {
        metrics::counter!(
            "kidopedia_provider_failure_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
    }
}

impl DialogHooks for MetricsObservabilityHooks {
    fn on_state(&self, _session_id: &SessionId, state: DialogState) {
        metrics::counter!("kidopedia_dialog_state_total", "state" => state.as_str()).increment(1);
    }

    fn on_intent(&self, _session_id: &SessionId, intent: Intent) {
        metrics::counter!("kidopedia_dialog_intent_total", "intent" => intent.as_str())
            .increment(1);
    }

    fn on_compression(
        &self,
        _session_id: &SessionId,
        before: usize,
        after: usize,
        summarized: bool,
    ) {
        metrics::counter!(
            "kidopedia_dialog_compression_total",
            "summarized" => if summarized { "true" } else { "false" }
        )
        .increment(1);
        metrics::histogram!("kidopedia_dialog_compressed_turns")
            .record(before.saturating_sub(after) as f64);
    }

    fn on_fallback(&self, _session_id: &SessionId, operation: &str, error: &ProviderError) {
        metrics::counter!(
            "kidopedia_dialog_fallback_total",
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
    }

    fn on_persistence_failure(
        &self,
        _session_id: &SessionId,
        operation: &str,
        error: &DialogError,
    ) {
        metrics::counter!(
            "kidopedia_dialog_persistence_failure_total",
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
    }

    fn on_reset(&self, _session_id: &SessionId) {
        metrics::counter!("kidopedia_dialog_reset_total").increment(1);
    }
}
