//! Runtime configuration and dialog service wiring.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::providers::{
    IMAGE_REQUEST_TIMEOUT, ImageProviderConfig, TEXT_REQUEST_TIMEOUT, TextProviderConfig,
    build_image_provider, build_text_provider,
};
use crate::{
    DialogPolicy, DialogService, ImageProvider, InMemoryMemoryBackend, MemoryBackend,
    MemoryBackendConfig, MemoryError, MemorySessionStore, ProviderError, SafeDialogHooks,
    SafeProviderHooks, SessionStore, TextProvider, TracingObservabilityHooks,
    create_memory_backend,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextProviderKind {
    #[default]
    OpenAi,
    OpenRouter,
}

impl TextProviderKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "openrouter" => Some(Self::OpenRouter),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageProviderKind {
    #[default]
    OpenAi,
    Pollinations,
}

impl ImageProviderKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "pollinations" => Some(Self::Pollinations),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreKind {
    #[default]
    Memory,
    Filesystem,
    Sqlite,
}

impl StoreKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Some(Self::Memory),
            "filesystem" => Some(Self::Filesystem),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    Config,
    Provider,
    Store,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub message: String,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(RuntimeErrorKind::Config, message)
    }
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for RuntimeError {}

impl From<ProviderError> for RuntimeError {
    fn from(error: ProviderError) -> Self {
        Self::new(RuntimeErrorKind::Provider, error.to_string())
    }
}

impl From<MemoryError> for RuntimeError {
    fn from(error: MemoryError) -> Self {
        Self::new(RuntimeErrorKind::Store, error.to_string())
    }
}

/// Everything needed to assemble a [`DialogService`] from scratch.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub text_provider: TextProviderKind,
    pub image_provider: ImageProviderKind,
    pub openai_api_key: Option<String>,
    pub openrouter_api_key: Option<String>,
    pub pollinations_base_url: Option<String>,
    pub store: StoreKind,
    /// Filesystem root or SQLite file, depending on `store`.
    pub store_path: Option<PathBuf>,
    pub text_timeout: Duration,
    pub image_timeout: Duration,
    pub policy: DialogPolicy,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            text_provider: TextProviderKind::default(),
            image_provider: ImageProviderKind::default(),
            openai_api_key: None,
            openrouter_api_key: None,
            pollinations_base_url: None,
            store: StoreKind::default(),
            store_path: None,
            text_timeout: TEXT_REQUEST_TIMEOUT,
            image_timeout: IMAGE_REQUEST_TIMEOUT,
            policy: DialogPolicy::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Result<Self, RuntimeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`. Unset or blank values keep the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RuntimeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(value) = read("AI_TEXT_PROVIDER") {
            config.text_provider = TextProviderKind::parse(&value).ok_or_else(|| {
                RuntimeError::config(format!("unsupported AI_TEXT_PROVIDER '{value}'"))
            })?;
        }
        if let Some(value) = read("AI_IMAGE_PROVIDER") {
            config.image_provider = ImageProviderKind::parse(&value).ok_or_else(|| {
                RuntimeError::config(format!("unsupported AI_IMAGE_PROVIDER '{value}'"))
            })?;
        }
        if let Some(value) = read("KIDOPEDIA_STORE") {
            config.store = StoreKind::parse(&value).ok_or_else(|| {
                RuntimeError::config(format!("unsupported KIDOPEDIA_STORE '{value}'"))
            })?;
        }

        config.openai_api_key = read("OPENAI_API_KEY");
        config.openrouter_api_key = read("OPENROUTER_API_KEY");
        config.pollinations_base_url = read("POLLINATIONS_BASE_URL");
        config.store_path = read("KIDOPEDIA_STORE_PATH").map(PathBuf::from);

        Ok(config)
    }

    pub fn with_text_provider(mut self, kind: TextProviderKind) -> Self {
        self.text_provider = kind;
        self
    }

    pub fn with_image_provider(mut self, kind: ImageProviderKind) -> Self {
        self.image_provider = kind;
        self
    }

    pub fn with_openai_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.openai_api_key = Some(api_key.into());
        self
    }

    pub fn with_openrouter_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.openrouter_api_key = Some(api_key.into());
        self
    }

    pub fn with_pollinations_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.pollinations_base_url = Some(base_url.into());
        self
    }

    pub fn with_store(mut self, store: StoreKind) -> Self {
        self.store = store;
        self
    }

    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    pub fn with_timeouts(mut self, text: Duration, image: Duration) -> Self {
        self.text_timeout = text;
        self.image_timeout = image;
        self
    }

    pub fn with_policy(mut self, policy: DialogPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn text_provider_config(&self) -> Result<TextProviderConfig, RuntimeError> {
        let (key, variable) = match self.text_provider {
            TextProviderKind::OpenAi => (&self.openai_api_key, "OPENAI_API_KEY"),
            TextProviderKind::OpenRouter => (&self.openrouter_api_key, "OPENROUTER_API_KEY"),
        };
        let api_key = key
            .as_deref()
            .ok_or_else(|| RuntimeError::config(format!("{variable} is required")))?;
        Ok(TextProviderConfig::new(self.text_provider, api_key).with_timeout(self.text_timeout))
    }

    pub fn image_provider_config(&self) -> ImageProviderConfig {
        let mut config =
            ImageProviderConfig::new(self.image_provider).with_timeout(self.image_timeout);
        if let Some(api_key) = &self.openai_api_key {
            config = config.with_api_key(api_key.clone());
        }
        if let Some(base_url) = &self.pollinations_base_url {
            config = config.with_base_url(base_url.clone());
        }
        config
    }

    pub fn memory_backend_config(&self) -> Result<MemoryBackendConfig, RuntimeError> {
        match (self.store, &self.store_path) {
            (StoreKind::Memory, _) => Ok(MemoryBackendConfig::InMemory),
            (StoreKind::Filesystem, Some(root)) => Ok(MemoryBackendConfig::Filesystem {
                root: root.clone(),
            }),
            (StoreKind::Filesystem, None) => Err(RuntimeError::config(
                "KIDOPEDIA_STORE_PATH is required for the filesystem store",
            )),
            (StoreKind::Sqlite, Some(path)) => Ok(MemoryBackendConfig::Sqlite { path: path.clone() }),
            (StoreKind::Sqlite, None) => Ok(MemoryBackendConfig::default()),
        }
    }
}

pub fn in_memory_backend() -> Arc<dyn MemoryBackend> {
    Arc::new(InMemoryMemoryBackend::new())
}

/// Service with an in-process store and panic-safe tracing hooks.
pub fn dialog_service(
    text: Arc<dyn TextProvider>,
    image: Arc<dyn ImageProvider>,
) -> DialogService {
    dialog_service_with_memory(text, image, in_memory_backend(), DialogPolicy::default())
}

pub fn dialog_service_with_memory(
    text: Arc<dyn TextProvider>,
    image: Arc<dyn ImageProvider>,
    memory: Arc<dyn MemoryBackend>,
    policy: DialogPolicy,
) -> DialogService {
    let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new(memory));
    DialogService::builder(text, image)
        .store(store)
        .policy(policy)
        .hooks(Arc::new(SafeDialogHooks::new(TracingObservabilityHooks)))
        .provider_hooks(Arc::new(SafeProviderHooks::new(TracingObservabilityHooks)))
        .build()
}

pub fn build_dialog_service(config: &RuntimeConfig) -> Result<DialogService, RuntimeError> {
    let text = build_text_provider(config.text_provider_config()?)?;
    let image = build_image_provider(config.image_provider_config())?;
    let memory = create_memory_backend(config.memory_backend_config()?)?;

    Ok(dialog_service_with_memory(
        text,
        image,
        memory,
        config.policy.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use super::*;
    use crate::{
        ChatRequest, ImageRequest, ImageResponse, ProviderFuture, ProviderId, ResetRequest,
        StopReason, TextRequest, TextResponse, TokenUsage,
    };

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| values.get(key).cloned()
    }

    #[test]
    fn from_lookup_uses_defaults_when_unset() {
        let config = RuntimeConfig::from_lookup(lookup(&[])).expect("config should load");

        assert_eq!(config.text_provider, TextProviderKind::OpenAi);
        assert_eq!(config.image_provider, ImageProviderKind::OpenAi);
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.text_timeout, Duration::from_secs(90));
        assert_eq!(config.image_timeout, Duration::from_secs(120));
        assert_eq!(
            config.memory_backend_config().expect("memory store"),
            MemoryBackendConfig::InMemory
        );
    }

    #[test]
    fn from_lookup_reads_every_setting() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            ("AI_TEXT_PROVIDER", "OpenAI"),
            ("AI_IMAGE_PROVIDER", "openai"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENROUTER_API_KEY", "or-test"),
            ("POLLINATIONS_BASE_URL", "https://images.example"),
            ("KIDOPEDIA_STORE", "filesystem"),
            ("KIDOPEDIA_STORE_PATH", "/tmp/kidopedia"),
        ]))
        .expect("config should load");

        assert_eq!(config.text_provider, TextProviderKind::OpenAi);
        assert_eq!(config.image_provider, ImageProviderKind::OpenAi);
        assert_eq!(config.openrouter_api_key.as_deref(), Some("or-test"));
        assert_eq!(
            config.memory_backend_config().expect("filesystem store"),
            MemoryBackendConfig::Filesystem {
                root: PathBuf::from("/tmp/kidopedia")
            }
        );

        let image = config.image_provider_config();
        assert_eq!(image.api_key.as_deref(), Some("sk-test"));
        assert_eq!(image.base_url.as_deref(), Some("https://images.example"));
    }

    #[test]
    fn unsupported_values_are_config_errors() {
        let error = RuntimeConfig::from_lookup(lookup(&[("AI_TEXT_PROVIDER", "gemini")]))
            .expect_err("unknown provider must fail");
        assert_eq!(error.kind, RuntimeErrorKind::Config);

        let error = RuntimeConfig::from_lookup(lookup(&[("KIDOPEDIA_STORE", "redis")]))
            .expect_err("unknown store must fail");
        assert_eq!(error.kind, RuntimeErrorKind::Config);
    }

    #[test]
    fn missing_keys_and_paths_are_reported() {
        let config = RuntimeConfig::new().with_store(StoreKind::Filesystem);
        assert_eq!(
            config.text_provider_config().expect_err("key is required").message,
            "OPENAI_API_KEY is required"
        );
        assert!(config.memory_backend_config().is_err());
        assert!(build_dialog_service(&config).is_err());
    }

    #[test]
    fn build_dialog_service_wires_configured_parts() {
        let config = RuntimeConfig::new().with_openai_api_key("sk-test-key");
        let service = build_dialog_service(&config).expect("service should build");
        assert_eq!(service.policy().persona, crate::KIDOPEDIA_PERSONA);

        let config = RuntimeConfig::new()
            .with_text_provider(TextProviderKind::OpenRouter)
            .with_image_provider(ImageProviderKind::Pollinations)
            .with_openrouter_api_key("or-test-key")
            .with_store(StoreKind::Sqlite)
            .with_store_path(std::env::temp_dir().join("kidopedia-runtime-test.sqlite3"));
        assert!(build_dialog_service(&config).is_ok());
    }

    struct FakeText;

    impl TextProvider for FakeText {
        fn id(&self) -> ProviderId {
            ProviderId::OpenRouter
        }

        fn complete<'a>(
            &'a self,
            request: TextRequest,
        ) -> ProviderFuture<'a, Result<TextResponse, ProviderError>> {
            Box::pin(async move {
                request.validate()?;
                Ok(TextResponse {
                    provider: ProviderId::OpenRouter,
                    model: "openai/gpt-oss-20b:free".to_string(),
                    content: "Frogs can breathe through their skin!".to_string(),
                    stop_reason: StopReason::EndTurn,
                    usage: TokenUsage::default(),
                })
            })
        }
    }

    struct FakeImage;

    impl ImageProvider for FakeImage {
        fn id(&self) -> ProviderId {
            ProviderId::Pollinations
        }

        fn generate<'a>(
            &'a self,
            request: ImageRequest,
        ) -> ProviderFuture<'a, Result<ImageResponse, ProviderError>> {
            Box::pin(async move {
                Ok(ImageResponse {
                    provider: ProviderId::Pollinations,
                    model: "pollinations".to_string(),
                    url: format!("https://image.example/{}", request.prompt.len()),
                    revised_prompt: None,
                })
            })
        }
    }

    #[tokio::test]
    async fn dialog_service_with_memory_persists_to_backend() {
        let memory = in_memory_backend();
        let service = dialog_service_with_memory(
            Arc::new(FakeText),
            Arc::new(FakeImage),
            Arc::clone(&memory),
            DialogPolicy::default(),
        );

        let response = service
            .chat(ChatRequest::new("tell me about frogs").with_session_id("kid-1"))
            .await
            .expect("chat should succeed");
        assert_eq!(response.reply, "Frogs can breathe through their skin!");

        let stored = memory
            .load_transcript(&"kid-1".into())
            .await
            .expect("load should work")
            .expect("transcript should be stored");
        assert_eq!(stored.len(), 3);

        service
            .reset(ResetRequest::new("kid-1"))
            .await
            .expect("reset should succeed");
        assert!(
            memory
                .load_transcript(&"kid-1".into())
                .await
                .expect("load should work")
                .is_none()
        );
    }

    #[tokio::test]
    async fn dialog_service_draws_pictures() {
        let service = dialog_service(Arc::new(FakeText), Arc::new(FakeImage));

        let response = service
            .chat(ChatRequest::new("draw a frog").with_session_id("kid-2"))
            .await
            .expect("chat should succeed");
        assert!(response.image_url.is_some());
        assert_eq!(response.session_id, "kid-2");
    }
}
