//! Shared utilities and strongly-typed common values for workspace crates.
//!
//! ```rust
//! use kcommon::{GenerationOptions, MetadataMap, SessionId};
//!
//! let session = SessionId::from("session-1");
//! let mut metadata = MetadataMap::new();
//! metadata.insert("audience".to_string(), "kids".to_string());
//!
//! let options = GenerationOptions::default().with_temperature(0.4).with_top_p(0.9);
//! assert_eq!(session.as_str(), "session-1");
//! assert_eq!(options.top_p, Some(0.9));
//! ```

pub mod future {
    //! Shared async future aliases.
    //!
    //! ```rust
    //! use kcommon::BoxFuture;
    //!
    //! fn str_len<'a>(value: &'a str) -> BoxFuture<'a, usize> {
    //!     Box::pin(async move { value.len() })
    //! }
    //!
    //! let _future = str_len("hello");
    //! ```

    use std::future::Future;
    use std::pin::Pin;

    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
}

pub mod context {
    //! Shared metadata and the session identifier newtype.
    //!
    //! ```rust
    //! use kcommon::{MetadataMap, SessionId};
    //!
    //! let session = SessionId::new("session-42");
    //! let mut metadata = MetadataMap::new();
    //! metadata.insert("env".to_string(), "test".to_string());
    //!
    //! assert_eq!(session.to_string(), "session-42");
    //! assert!(!session.is_blank());
    //! ```

    use std::collections::HashMap;
    use std::fmt::{Display, Formatter};

    pub type MetadataMap = HashMap<String, String>;

    #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct SessionId(String);

    impl SessionId {
        pub fn new(value: impl Into<String>) -> Self {
            Self(value.into())
        }

        pub fn as_str(&self) -> &str {
            self.0.as_str()
        }

        pub fn is_blank(&self) -> bool {
            self.0.trim().is_empty()
        }

        pub fn into_string(self) -> String {
            self.0
        }
    }

    impl Display for SessionId {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<String> for SessionId {
        fn from(value: String) -> Self {
            Self(value)
        }
    }

    impl From<&str> for SessionId {
        fn from(value: &str) -> Self {
            Self(value.to_string())
        }
    }
}

pub mod model {
    //! Shared generation settings used by request types.
    //!
    //! ```rust
    //! use kcommon::GenerationOptions;
    //!
    //! let options = GenerationOptions::default()
    //!     .with_temperature(0.2)
    //!     .with_top_p(0.9)
    //!     .with_max_tokens(128);
    //!
    //! assert_eq!(options.temperature, Some(0.2));
    //! assert_eq!(options.top_p, Some(0.9));
    //! assert_eq!(options.max_tokens, Some(128));
    //! ```

    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct GenerationOptions {
        pub temperature: Option<f32>,
        pub top_p: Option<f32>,
        pub max_tokens: Option<u32>,
    }

    impl GenerationOptions {
        pub fn with_temperature(mut self, temperature: f32) -> Self {
            self.temperature = Some(temperature);
            self
        }

        pub fn with_top_p(mut self, top_p: f32) -> Self {
            self.top_p = Some(top_p);
            self
        }

        pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
            self.max_tokens = Some(max_tokens);
            self
        }

        /// Fills unset fields from `defaults`, keeping values already present.
        pub fn or(self, defaults: GenerationOptions) -> Self {
            Self {
                temperature: self.temperature.or(defaults.temperature),
                top_p: self.top_p.or(defaults.top_p),
                max_tokens: self.max_tokens.or(defaults.max_tokens),
            }
        }
    }
}

pub use context::{MetadataMap, SessionId};
pub use future::BoxFuture;
pub use model::GenerationOptions;

#[cfg(test)]
mod tests {
    use super::{GenerationOptions, SessionId};

    #[test]
    fn session_ids_expose_their_string() {
        let session = SessionId::new("session-1");

        assert_eq!(session.as_str(), "session-1");
        assert_eq!(session.to_string(), "session-1");
        assert_eq!(session.into_string(), "session-1");
    }

    #[test]
    fn blank_session_ids_are_detected() {
        assert!(SessionId::from("   ").is_blank());
        assert!(SessionId::from("").is_blank());
        assert!(!SessionId::from("kid-7").is_blank());
    }

    #[test]
    fn generation_options_builder_helpers_set_values() {
        let options = GenerationOptions::default()
            .with_temperature(0.3)
            .with_top_p(0.8)
            .with_max_tokens(123);

        assert_eq!(options.temperature, Some(0.3));
        assert_eq!(options.top_p, Some(0.8));
        assert_eq!(options.max_tokens, Some(123));
    }

    #[test]
    fn generation_options_or_keeps_explicit_values() {
        let defaults = GenerationOptions::default()
            .with_temperature(0.4)
            .with_max_tokens(150);
        let merged = GenerationOptions::default().with_temperature(0.9).or(defaults);

        assert_eq!(merged.temperature, Some(0.9));
        assert_eq!(merged.max_tokens, Some(150));
        assert_eq!(merged.top_p, None);
    }
}
