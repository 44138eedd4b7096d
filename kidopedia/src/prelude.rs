//! Common imports for most Kidopedia applications.

pub use crate::{
    ChatRequest, ChatResponse, DialogPolicy, DialogService, ImageProvider, Intent, MemoryBackend,
    ProviderError, ProviderId, ResetRequest, ResetResponse, RuntimeConfig, RuntimeError,
    SessionId, SessionStore, TextProvider, Transcript, Turn, TurnRole,
};
pub use crate::{build_dialog_service, dialog_service, dialog_service_with_memory};
