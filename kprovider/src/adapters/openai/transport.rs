//! OpenAI transport trait and reqwest-based HTTP implementation.

use reqwest::{Client, Response};

use crate::{ProviderError, ProviderFuture};

use super::serde_api::{
    OpenAiApiChatResponse, OpenAiApiImageResponse, build_chat_api_request,
    build_image_api_request, extract_error_message, image_response_from_api,
};
use super::types::{
    OpenAiAuth, OpenAiChatRequest, OpenAiChatResponse, OpenAiImageRequest, OpenAiImageResponse,
};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

pub trait OpenAiTransport: Send + Sync + std::fmt::Debug {
    fn complete_chat<'a>(
        &'a self,
        request: OpenAiChatRequest,
        auth: OpenAiAuth,
    ) -> ProviderFuture<'a, Result<OpenAiChatResponse, ProviderError>>;

    fn generate_image<'a>(
        &'a self,
        request: OpenAiImageRequest,
        auth: OpenAiAuth,
    ) -> ProviderFuture<'a, Result<OpenAiImageResponse, ProviderError>>;
}

#[derive(Debug, Clone)]
pub struct OpenAiHttpTransport {
    client: Client,
    base_url: String,
}

impl OpenAiHttpTransport {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: OPENAI_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn apply_auth(
        &self,
        builder: reqwest::RequestBuilder,
        auth: &OpenAiAuth,
    ) -> reqwest::RequestBuilder {
        match auth {
            OpenAiAuth::ApiKey(key) => builder.bearer_auth(key.expose()),
        }
    }

    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        auth: &OpenAiAuth,
    ) -> Result<Response, ProviderError> {
        let response = self
            .apply_auth(builder, auth)
            .send()
            .await
            .map_err(map_send_error)?;

        if !response.status().is_success() {
            return Err(Self::parse_error(response).await);
        }

        Ok(response)
    }

    async fn parse_error(response: Response) -> ProviderError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body)
            .unwrap_or_else(|| format!("OpenAI request failed with status {status}"));

        ProviderError::from_status(status.as_u16(), message)
    }
}

fn map_send_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::timeout(err.to_string())
    } else {
        ProviderError::transport(err.to_string())
    }
}

impl OpenAiTransport for OpenAiHttpTransport {
    fn complete_chat<'a>(
        &'a self,
        request: OpenAiChatRequest,
        auth: OpenAiAuth,
    ) -> ProviderFuture<'a, Result<OpenAiChatResponse, ProviderError>> {
        Box::pin(async move {
            let api_request = build_chat_api_request(request)?;
            let builder = self
                .client
                .post(self.endpoint("chat/completions"))
                .json(&api_request);
            let response = self.send(builder, &auth).await?;

            let parsed: OpenAiApiChatResponse = response
                .json()
                .await
                .map_err(|err| ProviderError::transport(err.to_string()))?;

            OpenAiChatResponse::try_from(parsed)
        })
    }

    fn generate_image<'a>(
        &'a self,
        request: OpenAiImageRequest,
        auth: OpenAiAuth,
    ) -> ProviderFuture<'a, Result<OpenAiImageResponse, ProviderError>> {
        Box::pin(async move {
            let api_request = build_image_api_request(request)?;
            let model = api_request.model.clone();
            let builder = self
                .client
                .post(self.endpoint("images/generations"))
                .json(&api_request);
            let response = self.send(builder, &auth).await?;

            let parsed: OpenAiApiImageResponse = response
                .json()
                .await
                .map_err(|err| ProviderError::transport(err.to_string()))?;

            image_response_from_api(model, parsed)
        })
    }
}
