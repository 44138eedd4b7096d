//! OpenAI HTTP payload serde models and conversion helpers.

use serde::{Deserialize, Serialize};

use crate::ProviderError;

use super::types::{
    OpenAiChatRequest, OpenAiChatResponse, OpenAiFinishReason, OpenAiImageRequest,
    OpenAiImageResponse, OpenAiMessage, OpenAiUsage,
};

pub(crate) fn build_chat_api_request(
    request: OpenAiChatRequest,
) -> Result<OpenAiApiChatRequest, ProviderError> {
    let messages = request
        .messages
        .into_iter()
        .map(OpenAiApiMessage::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    if messages.is_empty() {
        return Err(ProviderError::invalid_request(
            "OpenAI request requires at least one message",
        ));
    }

    Ok(OpenAiApiChatRequest {
        model: request.model,
        messages,
        temperature: request.temperature,
        top_p: request.top_p,
        max_tokens: request.max_tokens,
    })
}

pub(crate) fn build_image_api_request(
    request: OpenAiImageRequest,
) -> Result<OpenAiApiImageRequest, ProviderError> {
    if request.prompt.trim().is_empty() {
        return Err(ProviderError::invalid_request(
            "OpenAI image request requires a prompt",
        ));
    }

    Ok(OpenAiApiImageRequest {
        model: request.model,
        prompt: request.prompt,
        size: request.size,
        n: request.n.max(1),
    })
}

pub(crate) fn parse_finish_reason(value: Option<&str>) -> OpenAiFinishReason {
    match value {
        Some("stop") => OpenAiFinishReason::Stop,
        Some("length") => OpenAiFinishReason::Length,
        Some("content_filter") => OpenAiFinishReason::ContentFilter,
        _ => OpenAiFinishReason::Other,
    }
}

pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<OpenAiApiErrorEnvelope>(body).ok()?;
    Some(parsed.error.message)
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiErrorEnvelope {
    pub error: OpenAiApiError,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiError {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct OpenAiApiChatRequest {
    pub model: String,
    pub messages: Vec<OpenAiApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct OpenAiApiMessage {
    pub role: String,
    pub content: String,
}

impl TryFrom<OpenAiMessage> for OpenAiApiMessage {
    type Error = ProviderError;

    fn try_from(value: OpenAiMessage) -> Result<Self, Self::Error> {
        if value.content.trim().is_empty() {
            return Err(ProviderError::invalid_request(
                "OpenAI message content must not be empty",
            ));
        }

        Ok(Self {
            role: value.role.as_str().to_string(),
            content: value.content,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiChatResponse {
    pub model: String,
    pub choices: Vec<OpenAiApiChoice>,
    pub usage: Option<OpenAiApiUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiChoice {
    pub message: OpenAiApiAssistantMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiAssistantMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TryFrom<OpenAiApiChatResponse> for OpenAiChatResponse {
    type Error = ProviderError;

    fn try_from(value: OpenAiApiChatResponse) -> Result<Self, Self::Error> {
        let choice =
            value.choices.into_iter().next().ok_or_else(|| {
                ProviderError::empty_response("OpenAI response did not include choices")
            })?;

        let content = choice.message.content.unwrap_or_default();
        if content.trim().is_empty() {
            return Err(ProviderError::empty_response(
                "OpenAI response did not include message content",
            ));
        }

        let usage = value
            .usage
            .map(|usage| OpenAiUsage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            })
            .unwrap_or_default();

        Ok(Self {
            model: value.model,
            content,
            finish_reason: parse_finish_reason(choice.finish_reason.as_deref()),
            usage,
        })
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct OpenAiApiImageRequest {
    pub model: String,
    pub prompt: String,
    pub size: String,
    pub n: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiImageResponse {
    #[serde(default)]
    pub data: Vec<OpenAiApiImageData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiImageData {
    pub url: Option<String>,
    pub revised_prompt: Option<String>,
}

pub(crate) fn image_response_from_api(
    model: String,
    value: OpenAiApiImageResponse,
) -> Result<OpenAiImageResponse, ProviderError> {
    let first = value
        .data
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::empty_response("OpenAI image response had no data"))?;

    let url = first
        .url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| ProviderError::empty_response("OpenAI image response had no url"))?;

    Ok(OpenAiImageResponse {
        model,
        url,
        revised_prompt: first.revised_prompt,
    })
}
