//! Observability hooks for provider calls and dialog orchestration.
//!
//! ```rust
//! use kobserve::{MetricsObservabilityHooks, SafeDialogHooks, SafeProviderHooks, TracingObservabilityHooks};
//!
//! let _provider_hooks = SafeProviderHooks::new(TracingObservabilityHooks);
//! let _dialog_hooks = SafeDialogHooks::new(MetricsObservabilityHooks);
//! ```

mod metrics_hooks;
mod safe_hooks;
mod tracing_hooks;

pub use metrics_hooks::MetricsObservabilityHooks;
pub use safe_hooks::{SafeDialogHooks, SafeProviderHooks};
pub use tracing_hooks::TracingObservabilityHooks;

pub mod prelude {
    pub use crate::{
        MetricsObservabilityHooks, SafeDialogHooks, SafeProviderHooks, TracingObservabilityHooks,
    };
}
