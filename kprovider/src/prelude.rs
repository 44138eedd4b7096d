//! Common `kprovider` imports for downstream crates.

pub use crate::{
    ImageProvider, ImageRequest, ImageResponse, Message, NoopOperationHooks, ProviderError,
    ProviderErrorKind, ProviderId, ProviderOperationHooks, RetryPolicy, RetryScope, Role,
    StopReason, TextProvider, TextRequest, TextRequestBuilder, TextResponse, TokenUsage,
    execute_with_retry,
};
pub use kcommon::{BoxFuture, GenerationOptions, MetadataMap};
