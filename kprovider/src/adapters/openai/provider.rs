//! OpenAI text and image providers implemented over the transport trait.

use std::sync::Arc;

use kcommon::GenerationOptions;

use crate::{
    ImageProvider, ImageRequest, ImageResponse, ProviderError, ProviderFuture, ProviderId,
    SecureCredentialManager, TextProvider, TextRequest, TextResponse,
};

use super::auth::resolve_api_key_auth;
use super::transport::OpenAiTransport;
use super::types::{OpenAiChatRequest, OpenAiImageRequest, OpenAiMessage};

pub const OPENAI_DEFAULT_TEXT_MODEL: &str = "gpt-4o-mini";
pub const OPENAI_DEFAULT_IMAGE_MODEL: &str = "dall-e-3";

#[derive(Clone)]
pub struct OpenAiTextProvider {
    credentials: Arc<SecureCredentialManager>,
    transport: Arc<dyn OpenAiTransport>,
    fallback_model: String,
    defaults: GenerationOptions,
}

impl OpenAiTextProvider {
    pub fn new(
        credentials: Arc<SecureCredentialManager>,
        transport: Arc<dyn OpenAiTransport>,
    ) -> Self {
        Self {
            credentials,
            transport,
            fallback_model: OPENAI_DEFAULT_TEXT_MODEL.to_string(),
            defaults: GenerationOptions::default(),
        }
    }

    pub fn with_fallback_model(mut self, model: impl Into<String>) -> Self {
        self.fallback_model = model.into();
        self
    }

    /// Options applied when a request leaves them unset.
    pub fn with_default_options(mut self, defaults: GenerationOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub(crate) fn build_chat_request(&self, request: TextRequest) -> OpenAiChatRequest {
        build_chat_request(request, &self.fallback_model, self.defaults)
    }
}

pub(crate) fn build_chat_request(
    request: TextRequest,
    fallback_model: &str,
    defaults: GenerationOptions,
) -> OpenAiChatRequest {
    let model = if request.model.trim().is_empty() {
        fallback_model.to_string()
    } else {
        request.model
    };
    let options = request.options.or(defaults);

    OpenAiChatRequest {
        model,
        messages: request
            .messages
            .into_iter()
            .map(OpenAiMessage::from)
            .collect(),
        temperature: options.temperature,
        top_p: options.top_p,
        max_tokens: options.max_tokens,
    }
}

impl TextProvider for OpenAiTextProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    fn complete<'a>(
        &'a self,
        request: TextRequest,
    ) -> ProviderFuture<'a, Result<TextResponse, ProviderError>> {
        Box::pin(async move {
            request.validate()?;
            let auth = resolve_api_key_auth(&self.credentials, ProviderId::OpenAi)?;
            let chat_request = self.build_chat_request(request);
            let response = self.transport.complete_chat(chat_request, auth).await?;
            Ok(response.into_text_response(ProviderId::OpenAi))
        })
    }
}

#[derive(Clone)]
pub struct OpenAiImageProvider {
    credentials: Arc<SecureCredentialManager>,
    transport: Arc<dyn OpenAiTransport>,
    fallback_model: String,
}

impl OpenAiImageProvider {
    pub fn new(
        credentials: Arc<SecureCredentialManager>,
        transport: Arc<dyn OpenAiTransport>,
    ) -> Self {
        Self {
            credentials,
            transport,
            fallback_model: OPENAI_DEFAULT_IMAGE_MODEL.to_string(),
        }
    }

    pub fn with_fallback_model(mut self, model: impl Into<String>) -> Self {
        self.fallback_model = model.into();
        self
    }

    pub(crate) fn build_image_request(&self, request: ImageRequest) -> OpenAiImageRequest {
        let model = if request.model.trim().is_empty() {
            self.fallback_model.clone()
        } else {
            request.model
        };

        OpenAiImageRequest {
            model,
            prompt: request.prompt,
            size: request.size,
            n: 1,
        }
    }
}

impl ImageProvider for OpenAiImageProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    fn generate<'a>(
        &'a self,
        request: ImageRequest,
    ) -> ProviderFuture<'a, Result<ImageResponse, ProviderError>> {
        Box::pin(async move {
            request.validate()?;
            let auth = resolve_api_key_auth(&self.credentials, ProviderId::OpenAi)?;
            let image_request = self.build_image_request(request);
            let response = self.transport.generate_image(image_request, auth).await?;
            Ok(response.into_image_response(ProviderId::OpenAi))
        })
    }
}
