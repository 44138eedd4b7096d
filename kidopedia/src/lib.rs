//! Kidopedia: a kid-friendly dialog engine that answers questions, draws
//! pictures, and edits the last picture it drew.
//!
//! This crate is the single dependency for most applications. It re-exports
//! the workspace crates and wires providers, storage, and observability
//! together from a [`RuntimeConfig`].
//!
//! ```rust
//! use kidopedia::{RuntimeConfig, StoreKind, TextProviderKind};
//!
//! let config = RuntimeConfig::from_lookup(|key| match key {
//!     "AI_TEXT_PROVIDER" => Some("openrouter".to_string()),
//!     "KIDOPEDIA_STORE" => Some("memory".to_string()),
//!     _ => None,
//! })
//! .expect("config should parse");
//!
//! assert_eq!(config.text_provider, TextProviderKind::OpenRouter);
//! assert_eq!(config.store, StoreKind::Memory);
//! ```

pub mod prelude;
pub mod providers;
pub mod runtime;

pub use kcommon;
pub use kdialog;
pub use kmemory;
pub use kobserve;
pub use kprovider;

pub use kcommon::{BoxFuture, GenerationOptions, MetadataMap, SessionId};
pub use kdialog::{
    ChatRequest, ChatResponse, CompressionPolicy, DialogError, DialogErrorKind, DialogHooks,
    DialogPolicy, DialogService, DialogServiceBuilder, DialogState, InMemorySessionStore, Intent,
    KIDOPEDIA_PERSONA, NoopDialogHooks, ResetRequest, ResetResponse, SessionStore, Transcript,
    Turn, TurnRole, classify_intent, compose_prompt,
};
pub use kmemory::{
    FilesystemMemoryBackend, InMemoryMemoryBackend, MemoryBackend, MemoryBackendConfig,
    MemoryError, MemoryErrorKind, MemorySessionStore, SqliteMemoryBackend, create_memory_backend,
};
pub use kobserve::{
    MetricsObservabilityHooks, SafeDialogHooks, SafeProviderHooks, TracingObservabilityHooks,
};
pub use kprovider::{
    ImageProvider, ImageRequest, ImageResponse, Message, NoopOperationHooks, ProviderError,
    ProviderErrorKind, ProviderFuture, ProviderId, ProviderOperationHooks, RetryPolicy, Role,
    SecretString, SecureCredentialManager, StopReason, TextProvider, TextRequest, TextResponse,
    TokenUsage,
};

pub use providers::{
    ImageProviderConfig, TextProviderConfig, build_image_provider, build_text_provider,
};
pub use runtime::{
    ImageProviderKind, RuntimeConfig, RuntimeError, RuntimeErrorKind, StoreKind,
    TextProviderKind, build_dialog_service, dialog_service, dialog_service_with_memory,
    in_memory_backend,
};
