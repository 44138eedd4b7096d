//! Focused unit tests for OpenAI adapter internals.

#![cfg(test)]

use std::sync::Arc;

use kcommon::GenerationOptions;

use crate::{
    ImageRequest, Message, ProviderError, ProviderErrorKind, ProviderFuture,
    SecureCredentialManager, TextRequest,
};

use super::provider::{OpenAiImageProvider, OpenAiTextProvider};
use super::serde_api::{
    OpenAiApiChatResponse, OpenAiApiImageResponse, build_chat_api_request,
    image_response_from_api, parse_finish_reason,
};
use super::transport::OpenAiTransport;
use super::types::{
    OpenAiAuth, OpenAiChatRequest, OpenAiChatResponse, OpenAiFinishReason, OpenAiImageRequest,
    OpenAiImageResponse, OpenAiMessage, OpenAiRole,
};

#[derive(Debug)]
struct NoopTransport;

impl OpenAiTransport for NoopTransport {
    fn complete_chat<'a>(
        &'a self,
        _request: OpenAiChatRequest,
        _auth: OpenAiAuth,
    ) -> ProviderFuture<'a, Result<OpenAiChatResponse, ProviderError>> {
        Box::pin(async { Err(ProviderError::other("not used")) })
    }

    fn generate_image<'a>(
        &'a self,
        _request: OpenAiImageRequest,
        _auth: OpenAiAuth,
    ) -> ProviderFuture<'a, Result<OpenAiImageResponse, ProviderError>> {
        Box::pin(async { Err(ProviderError::other("not used")) })
    }
}

#[test]
fn build_chat_request_fills_model_and_default_options() {
    let provider = OpenAiTextProvider::new(
        Arc::new(SecureCredentialManager::new()),
        Arc::new(NoopTransport),
    )
    .with_default_options(GenerationOptions::default().with_temperature(0.4).with_top_p(0.9));

    let request = TextRequest::new(" ", vec![Message::system("persona"), Message::user("hi")])
        .with_temperature(0.5);

    let built = provider.build_chat_request(request);
    assert_eq!(built.model, "gpt-4o-mini");
    assert_eq!(built.temperature, Some(0.5));
    assert_eq!(built.top_p, Some(0.9));
    assert_eq!(built.messages.len(), 2);
    assert_eq!(built.messages[0].role, OpenAiRole::System);
}

#[test]
fn build_image_request_defaults_to_dall_e_3() {
    let provider = OpenAiImageProvider::new(
        Arc::new(SecureCredentialManager::new()),
        Arc::new(NoopTransport),
    );

    let built = provider.build_image_request(ImageRequest::new("a friendly robot"));
    assert_eq!(built.model, "dall-e-3");
    assert_eq!(built.size, "1024x1024");
    assert_eq!(built.n, 1);
}

#[test]
fn parse_finish_reason_maps_expected_values() {
    assert_eq!(parse_finish_reason(Some("stop")), OpenAiFinishReason::Stop);
    assert_eq!(
        parse_finish_reason(Some("length")),
        OpenAiFinishReason::Length
    );
    assert_eq!(
        parse_finish_reason(Some("content_filter")),
        OpenAiFinishReason::ContentFilter
    );
    assert_eq!(
        parse_finish_reason(Some("unknown")),
        OpenAiFinishReason::Other
    );
    assert_eq!(parse_finish_reason(None), OpenAiFinishReason::Other);
}

#[test]
fn build_chat_api_request_rejects_blank_messages() {
    let request = OpenAiChatRequest {
        model: "gpt-4o-mini".to_string(),
        messages: vec![OpenAiMessage {
            role: OpenAiRole::User,
            content: "   ".to_string(),
        }],
        temperature: None,
        top_p: None,
        max_tokens: None,
    };

    let err = build_chat_api_request(request).expect_err("blank content must fail");
    assert_eq!(err.kind, ProviderErrorKind::InvalidRequest);
}

#[test]
fn chat_api_request_omits_unset_options() {
    let request = OpenAiChatRequest {
        model: "gpt-4o-mini".to_string(),
        messages: vec![OpenAiMessage {
            role: OpenAiRole::User,
            content: "hi".to_string(),
        }],
        temperature: Some(0.4),
        top_p: None,
        max_tokens: None,
    };

    let api = build_chat_api_request(request).expect("request should build");
    let json = serde_json::to_value(&api).expect("request should serialize");
    assert_eq!(json["messages"][0]["role"], "user");
    assert!(json.get("top_p").is_none());
    assert!(json.get("max_tokens").is_none());
}

#[test]
fn chat_response_parses_first_choice() {
    let body = r#"{
        "model": "gpt-4o-mini-2024",
        "choices": [{"message": {"content": "Dinosaurs lived long ago!"}, "finish_reason": "stop"}],
        "usage": {"prompt_tokens": 12, "completion_tokens": 6, "total_tokens": 18}
    }"#;
    let parsed: OpenAiApiChatResponse = serde_json::from_str(body).expect("body should parse");
    let response = OpenAiChatResponse::try_from(parsed).expect("response should convert");

    assert_eq!(response.content, "Dinosaurs lived long ago!");
    assert_eq!(response.finish_reason, OpenAiFinishReason::Stop);
    assert_eq!(response.usage.total_tokens, 18);
}

#[test]
fn chat_response_without_content_is_an_empty_response_error() {
    let body = r#"{"model": "m", "choices": [{"message": {"content": null}, "finish_reason": "stop"}]}"#;
    let parsed: OpenAiApiChatResponse = serde_json::from_str(body).expect("body should parse");
    let err = OpenAiChatResponse::try_from(parsed).expect_err("empty content must fail");
    assert_eq!(err.kind, ProviderErrorKind::EmptyResponse);
}

#[test]
fn image_response_takes_first_url() {
    let body = r#"{"data": [{"url": "https://img.example/1.png", "revised_prompt": "a cat in a hat"}]}"#;
    let parsed: OpenAiApiImageResponse = serde_json::from_str(body).expect("body should parse");
    let response =
        image_response_from_api("dall-e-3".to_string(), parsed).expect("response should convert");

    assert_eq!(response.url, "https://img.example/1.png");
    assert_eq!(response.revised_prompt.as_deref(), Some("a cat in a hat"));

    let empty: OpenAiApiImageResponse = serde_json::from_str("{}").expect("body should parse");
    let err = image_response_from_api("dall-e-3".to_string(), empty).expect_err("no data");
    assert_eq!(err.kind, ProviderErrorKind::EmptyResponse);
}
