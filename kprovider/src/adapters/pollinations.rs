//! Pollinations image provider.
//!
//! Pollinations renders images on request from a URL that embeds the prompt,
//! so generating an image only means building that URL.
//!
//! ```rust
//! use kprovider::adapters::pollinations::PollinationsImageProvider;
//!
//! let provider = PollinationsImageProvider::new();
//! let url = provider.image_url("a red kite").expect("url should build");
//! assert_eq!(url, "https://image.pollinations.ai/prompt/a%20red%20kite");
//! ```

use reqwest::Url;

use crate::{
    ImageProvider, ImageRequest, ImageResponse, ProviderError, ProviderFuture, ProviderId,
};

pub const POLLINATIONS_BASE_URL: &str = "https://image.pollinations.ai/prompt/";

#[derive(Debug, Clone)]
pub struct PollinationsImageProvider {
    base_url: String,
}

impl Default for PollinationsImageProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PollinationsImageProvider {
    pub fn new() -> Self {
        Self {
            base_url: POLLINATIONS_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn image_url(&self, prompt: &str) -> Result<String, ProviderError> {
        let mut url = Url::parse(&self.base_url).map_err(|err| {
            ProviderError::invalid_request(format!("invalid Pollinations base url: {err}"))
        })?;

        url.path_segments_mut()
            .map_err(|_| {
                ProviderError::invalid_request("Pollinations base url cannot carry a path")
            })?
            .pop_if_empty()
            .push(prompt.trim());

        Ok(url.into())
    }
}

impl ImageProvider for PollinationsImageProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Pollinations
    }

    fn generate<'a>(
        &'a self,
        request: ImageRequest,
    ) -> ProviderFuture<'a, Result<ImageResponse, ProviderError>> {
        Box::pin(async move {
            request.validate()?;
            let url = self.image_url(&request.prompt)?;
            let model = if request.model.trim().is_empty() {
                ProviderId::Pollinations.to_string()
            } else {
                request.model
            };

            Ok(ImageResponse {
                provider: ProviderId::Pollinations,
                model,
                url,
                revised_prompt: None,
            })
        })
    }
}
