//! Provider construction from runtime configuration.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::{ImageProvider, ProviderError, SecureCredentialManager, TextProvider};
use crate::runtime::{ImageProviderKind, TextProviderKind};

pub const TEXT_REQUEST_TIMEOUT: Duration = Duration::from_secs(90);
pub const IMAGE_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct TextProviderConfig {
    pub kind: TextProviderKind,
    pub api_key: String,
    pub timeout: Duration,
}

impl TextProviderConfig {
    pub fn new(kind: TextProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            kind,
            api_key: api_key.into(),
            timeout: TEXT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ImageProviderConfig {
    pub kind: ImageProviderKind,
    /// Only the OpenAI image provider needs a key.
    pub api_key: Option<String>,
    /// Overrides the Pollinations endpoint.
    pub base_url: Option<String>,
    pub timeout: Duration,
}

impl ImageProviderConfig {
    pub fn new(kind: ImageProviderKind) -> Self {
        Self {
            kind,
            api_key: None,
            base_url: None,
            timeout: IMAGE_REQUEST_TIMEOUT,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub fn build_text_provider(
    config: TextProviderConfig,
) -> Result<Arc<dyn TextProvider>, ProviderError> {
    let api_key = required_key(&config.api_key)?;
    let credentials = Arc::new(SecureCredentialManager::new());
    let http = http_client(config.timeout)?;

    match config.kind {
        TextProviderKind::OpenAi => build_openai_text(credentials, api_key, http),
        TextProviderKind::OpenRouter => build_openrouter_text(credentials, api_key, http),
    }
}

pub fn build_image_provider(
    config: ImageProviderConfig,
) -> Result<Arc<dyn ImageProvider>, ProviderError> {
    match config.kind {
        ImageProviderKind::OpenAi => {
            let api_key = required_key(config.api_key.as_deref().unwrap_or_default())?;
            let credentials = Arc::new(SecureCredentialManager::new());
            build_openai_image(credentials, api_key, http_client(config.timeout)?)
        }
        ImageProviderKind::Pollinations => build_pollinations_image(config.base_url),
    }
}

fn required_key(api_key: &str) -> Result<String, ProviderError> {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(ProviderError::authentication(
            "provider API key must not be empty",
        ));
    }
    Ok(api_key.to_string())
}

fn http_client(timeout: Duration) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| ProviderError::transport(err.to_string()))
}

#[cfg(feature = "provider-openai")]
fn build_openai_text(
    credentials: Arc<SecureCredentialManager>,
    api_key: String,
    http: Client,
) -> Result<Arc<dyn TextProvider>, ProviderError> {
    credentials.set_openai_api_key(api_key)?;
    let transport = Arc::new(kprovider::adapters::openai::OpenAiHttpTransport::new(http));
    Ok(Arc::new(kprovider::adapters::openai::OpenAiTextProvider::new(
        credentials,
        transport,
    )))
}

#[cfg(not(feature = "provider-openai"))]
fn build_openai_text(
    _credentials: Arc<SecureCredentialManager>,
    _api_key: String,
    _http: Client,
) -> Result<Arc<dyn TextProvider>, ProviderError> {
    Err(ProviderError::invalid_request(
        "provider-openai feature is not enabled on kidopedia",
    ))
}

#[cfg(feature = "provider-openai")]
fn build_openai_image(
    credentials: Arc<SecureCredentialManager>,
    api_key: String,
    http: Client,
) -> Result<Arc<dyn ImageProvider>, ProviderError> {
    credentials.set_openai_api_key(api_key)?;
    let transport = Arc::new(kprovider::adapters::openai::OpenAiHttpTransport::new(http));
    Ok(Arc::new(kprovider::adapters::openai::OpenAiImageProvider::new(
        credentials,
        transport,
    )))
}

#[cfg(not(feature = "provider-openai"))]
fn build_openai_image(
    _credentials: Arc<SecureCredentialManager>,
    _api_key: String,
    _http: Client,
) -> Result<Arc<dyn ImageProvider>, ProviderError> {
    Err(ProviderError::invalid_request(
        "provider-openai feature is not enabled on kidopedia",
    ))
}

#[cfg(feature = "provider-openrouter")]
fn build_openrouter_text(
    credentials: Arc<SecureCredentialManager>,
    api_key: String,
    http: Client,
) -> Result<Arc<dyn TextProvider>, ProviderError> {
    use kprovider::adapters::openrouter::OpenRouterTextProvider;

    credentials.set_api_key(crate::ProviderId::OpenRouter, api_key)?;
    let transport = Arc::new(OpenRouterTextProvider::default_http_transport(http));
    Ok(Arc::new(OpenRouterTextProvider::new(credentials, transport)))
}

#[cfg(not(feature = "provider-openrouter"))]
fn build_openrouter_text(
    _credentials: Arc<SecureCredentialManager>,
    _api_key: String,
    _http: Client,
) -> Result<Arc<dyn TextProvider>, ProviderError> {
    Err(ProviderError::invalid_request(
        "provider-openrouter feature is not enabled on kidopedia",
    ))
}

#[cfg(feature = "provider-pollinations")]
fn build_pollinations_image(
    base_url: Option<String>,
) -> Result<Arc<dyn ImageProvider>, ProviderError> {
    use kprovider::adapters::pollinations::PollinationsImageProvider;

    let provider = match base_url {
        Some(base_url) if !base_url.trim().is_empty() => {
            PollinationsImageProvider::new().with_base_url(base_url.trim())
        }
        _ => PollinationsImageProvider::new(),
    };
    Ok(Arc::new(provider))
}

#[cfg(not(feature = "provider-pollinations"))]
fn build_pollinations_image(
    _base_url: Option<String>,
) -> Result<Arc<dyn ImageProvider>, ProviderError> {
    Err(ProviderError::invalid_request(
        "provider-pollinations feature is not enabled on kidopedia",
    ))
}
