//! Provider-agnostic text and image generation contracts for Kidopedia.
//!
//! The crate defines the request/response model, the [`TextProvider`] and
//! [`ImageProvider`] traits, a bounded retry helper, and feature-gated
//! adapters for OpenAI, OpenRouter and Pollinations.
//!
//! ```rust
//! use kprovider::{Message, TextRequest};
//!
//! let request = TextRequest::builder("gpt-4o-mini")
//!     .message(Message::system("Be friendly."))
//!     .message(Message::user("Why is the sky blue?"))
//!     .temperature(0.4)
//!     .build()
//!     .expect("request should be valid");
//!
//! assert_eq!(request.messages.len(), 2);
//! ```

pub mod adapters;
pub mod prelude;

mod credentials;
mod error;
mod model;
mod provider;
mod resilience;

pub use credentials::{SecretString, SecureCredentialManager};
pub use error::{ProviderError, ProviderErrorKind};
pub use model::{
    ImageRequest, ImageResponse, Message, ProviderId, Role, StopReason, TextRequest,
    TextRequestBuilder, TextResponse, TokenUsage,
};
pub use provider::{ImageProvider, ProviderFuture, TextProvider};
pub use resilience::{
    NoopOperationHooks, ProviderOperationHooks, RetryPolicy, RetryScope, execute_with_retry,
};
