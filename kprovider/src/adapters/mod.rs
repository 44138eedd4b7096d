#[cfg(feature = "provider-openai")]
pub mod openai;

#[cfg(feature = "provider-openrouter")]
pub mod openrouter;

#[cfg(feature = "provider-pollinations")]
pub mod pollinations;
