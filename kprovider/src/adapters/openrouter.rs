//! OpenRouter text provider implemented over the OpenAI-compatible transport.

use std::sync::Arc;

use kcommon::GenerationOptions;
use reqwest::Client;

use crate::adapters::openai::{
    OpenAiAuth, OpenAiChatRequest, OpenAiHttpTransport, OpenAiTransport, build_chat_request,
};
use crate::{
    ProviderError, ProviderFuture, ProviderId, SecureCredentialManager, TextProvider, TextRequest,
    TextResponse,
};

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const OPENROUTER_DEFAULT_MODEL: &str = "openai/gpt-oss-20b:free";
pub const OPENROUTER_DEFAULT_MAX_TOKENS: u32 = 150;

#[derive(Clone)]
pub struct OpenRouterTextProvider {
    credentials: Arc<SecureCredentialManager>,
    transport: Arc<dyn OpenAiTransport>,
    fallback_model: String,
    defaults: GenerationOptions,
}

impl OpenRouterTextProvider {
    pub fn new(
        credentials: Arc<SecureCredentialManager>,
        transport: Arc<dyn OpenAiTransport>,
    ) -> Self {
        Self {
            credentials,
            transport,
            fallback_model: OPENROUTER_DEFAULT_MODEL.to_string(),
            defaults: GenerationOptions::default().with_max_tokens(OPENROUTER_DEFAULT_MAX_TOKENS),
        }
    }

    pub fn with_fallback_model(mut self, model: impl Into<String>) -> Self {
        self.fallback_model = model.into();
        self
    }

    pub fn with_default_options(mut self, defaults: GenerationOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn default_http_transport(client: Client) -> OpenAiHttpTransport {
        OpenAiHttpTransport::new(client).with_base_url(OPENROUTER_BASE_URL)
    }

    fn build_request(&self, request: TextRequest) -> OpenAiChatRequest {
        build_chat_request(request, &self.fallback_model, self.defaults)
    }

    fn auth(&self) -> Result<OpenAiAuth, ProviderError> {
        self.credentials
            .require_api_key(ProviderId::OpenRouter)
            .map(OpenAiAuth::ApiKey)
    }
}

impl TextProvider for OpenRouterTextProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenRouter
    }

    fn complete<'a>(
        &'a self,
        request: TextRequest,
    ) -> ProviderFuture<'a, Result<TextResponse, ProviderError>> {
        Box::pin(async move {
            request.validate()?;
            let auth = self.auth()?;
            let chat_request = self.build_request(request);
            let response = self.transport.complete_chat(chat_request, auth).await?;
            Ok(response.into_text_response(ProviderId::OpenRouter))
        })
    }
}
