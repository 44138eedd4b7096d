#![cfg(feature = "provider-openrouter")]

use std::sync::{Arc, Mutex};

use kprovider::adapters::openai::{
    OpenAiAuth, OpenAiChatRequest, OpenAiChatResponse, OpenAiFinishReason, OpenAiImageRequest,
    OpenAiImageResponse, OpenAiTransport, OpenAiUsage,
};
use kprovider::adapters::openrouter::{OPENROUTER_BASE_URL, OpenRouterTextProvider};
use kprovider::{
    Message, ProviderError, ProviderErrorKind, ProviderFuture, ProviderId,
    SecureCredentialManager, StopReason, TextProvider, TextRequest,
};

#[derive(Debug, Default)]
struct FakeTransport {
    captured_auth: Mutex<Option<String>>,
    captured_chat: Mutex<Option<OpenAiChatRequest>>,
}

impl OpenAiTransport for FakeTransport {
    fn complete_chat<'a>(
        &'a self,
        request: OpenAiChatRequest,
        auth: OpenAiAuth,
    ) -> ProviderFuture<'a, Result<OpenAiChatResponse, ProviderError>> {
        Box::pin(async move {
            let model = request.model.clone();
            *self.captured_chat.lock().expect("chat lock") = Some(request);
            *self.captured_auth.lock().expect("auth lock") = Some(match auth {
                OpenAiAuth::ApiKey(value) => value.expose().to_string(),
            });

            Ok(OpenAiChatResponse {
                model,
                content: "Bees make honey from nectar.".to_string(),
                finish_reason: OpenAiFinishReason::Length,
                usage: OpenAiUsage::default(),
            })
        })
    }

    fn generate_image<'a>(
        &'a self,
        _request: OpenAiImageRequest,
        _auth: OpenAiAuth,
    ) -> ProviderFuture<'a, Result<OpenAiImageResponse, ProviderError>> {
        Box::pin(async { Err(ProviderError::invalid_request("images are not supported")) })
    }
}

#[tokio::test]
async fn complete_uses_free_model_and_token_cap_by_default() {
    let credentials = Arc::new(SecureCredentialManager::new());
    credentials
        .set_api_key(ProviderId::OpenRouter, "or-key")
        .expect("key should be accepted");
    let transport = Arc::new(FakeTransport::default());
    let provider = OpenRouterTextProvider::new(credentials, transport.clone());

    let response = provider
        .complete(TextRequest::new("", vec![Message::user("How do bees fly?")]))
        .await
        .expect("complete should succeed");

    assert_eq!(response.provider, ProviderId::OpenRouter);
    assert_eq!(response.model, "openai/gpt-oss-20b:free");
    assert_eq!(response.stop_reason, StopReason::MaxTokens);

    let chat = transport
        .captured_chat
        .lock()
        .expect("chat lock")
        .clone()
        .expect("request should be captured");
    assert_eq!(chat.max_tokens, Some(150));

    let auth = transport.captured_auth.lock().expect("auth lock").clone();
    assert_eq!(auth.as_deref(), Some("or-key"));
}

#[tokio::test]
async fn complete_requires_openrouter_key() {
    let credentials = Arc::new(SecureCredentialManager::new());
    credentials
        .set_openai_api_key("sk-openai-only")
        .expect("key should be accepted");
    let provider = OpenRouterTextProvider::new(credentials, Arc::new(FakeTransport::default()));

    let err = provider
        .complete(TextRequest::new("", vec![Message::user("hi")]))
        .await
        .expect_err("openrouter key is required");
    assert_eq!(err.kind, ProviderErrorKind::Authentication);
}

#[test]
fn default_http_transport_targets_openrouter() {
    let transport = OpenRouterTextProvider::default_http_transport(reqwest::Client::new());
    assert_eq!(transport.base_url(), OPENROUTER_BASE_URL);
}
