mod auth;
mod provider;
mod serde_api;
mod tests;
mod transport;
mod types;

pub(crate) use provider::build_chat_request;
pub use provider::{
    OPENAI_DEFAULT_IMAGE_MODEL, OPENAI_DEFAULT_TEXT_MODEL, OpenAiImageProvider,
    OpenAiTextProvider,
};
pub use transport::{OPENAI_BASE_URL, OpenAiHttpTransport, OpenAiTransport};
pub use types::{
    OpenAiAuth, OpenAiChatRequest, OpenAiChatResponse, OpenAiFinishReason, OpenAiImageRequest,
    OpenAiImageResponse, OpenAiMessage, OpenAiRole, OpenAiUsage,
};
