use std::future::Future;
use std::pin::Pin;

use crate::{ImageRequest, ImageResponse, ProviderError, ProviderId, TextRequest, TextResponse};

pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait TextProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    fn complete<'a>(
        &'a self,
        request: TextRequest,
    ) -> ProviderFuture<'a, Result<TextResponse, ProviderError>>;
}

pub trait ImageProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    fn generate<'a>(
        &'a self,
        request: ImageRequest,
    ) -> ProviderFuture<'a, Result<ImageResponse, ProviderError>>;
}
