//! Dialog and intent orchestration for Kidopedia.
//!
//! A [`DialogService`] loads a session transcript, compresses it once it grows
//! long, classifies the new message as a plain answer, a new picture, or an
//! edit of the last picture, calls the matching provider, and saves the result.
//!
//! ```rust
//! use kdialog::{Intent, Transcript, Turn, compose_prompt};
//!
//! let mut transcript = Transcript::seeded("persona");
//! transcript.push(Turn::assistant_image("Here you go", "https://img/1", "a cat"));
//!
//! let prompt = compose_prompt(Intent::EditImage, "Make It Purple", &transcript);
//! assert_eq!(prompt.as_deref(), Some("a cat, but now make it purple"));
//! ```

pub mod context;

mod error;
mod hooks;
mod intent;
mod locks;
mod prompt;
mod service;
mod store;
mod types;

pub mod prelude {
    pub use crate::{
        ChatRequest, ChatResponse, DialogError, DialogErrorKind, DialogHooks, DialogPolicy,
        DialogService, DialogServiceBuilder, DialogState, InMemorySessionStore, Intent,
        NoopDialogHooks, ResetRequest, ResetResponse, SessionStore, Transcript, Turn, TurnRole,
    };
    pub use kcommon::SessionId;
}

pub use context::{CompressionOutcome, CompressionPolicy, ContextManager};
pub use error::{DialogError, DialogErrorKind};
pub use hooks::{DialogHooks, DialogState, NoopDialogHooks};
pub use intent::{EDIT_KEYWORDS, IMAGE_KEYWORDS, KeywordMatch, classify_intent};
pub use locks::{SessionGuard, SessionLocks};
pub use prompt::{EDIT_FALLBACK_BASE, compose_edit_prompt, compose_prompt};
pub use service::{
    DialogPolicy, DialogService, DialogServiceBuilder, EDIT_FAILURE_REPLY, EDIT_REPLY,
    IMAGE_FAILURE_REPLY, IMAGE_REPLY, KIDOPEDIA_PERSONA, NOTHING_TO_EDIT_NOTE,
    TEXT_FAILURE_REPLY,
};
pub use store::{InMemorySessionStore, SessionStore};
pub use types::{
    ChatRequest, ChatResponse, Intent, ResetRequest, ResetResponse, Transcript, Turn, TurnImage,
    TurnRole,
};
pub use kcommon::SessionId;
