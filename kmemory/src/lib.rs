//! Durable session transcript storage with a kdialog `SessionStore` adapter.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use kmemory::{MemoryBackendConfig, MemorySessionStore, create_memory_backend};
//!
//! let backend = create_memory_backend(MemoryBackendConfig::InMemory)
//!     .expect("in-memory backend should build");
//! let store = MemorySessionStore::new(Arc::clone(&backend));
//! let _ = store.backend();
//! ```

mod adapter;
mod backend;
mod backends;
mod error;

pub mod prelude {
    pub use crate::{
        FilesystemMemoryBackend, InMemoryMemoryBackend, MemoryBackend, MemoryBackendConfig,
        MemoryError, MemoryErrorKind, MemorySessionStore, SqliteMemoryBackend,
        create_default_memory_backend, create_memory_backend,
    };
}

pub use adapter::MemorySessionStore;
pub use backend::{
    FilesystemMemoryBackend, InMemoryMemoryBackend, MemoryBackend, MemoryBackendConfig,
    SqliteMemoryBackend, create_default_memory_backend, create_memory_backend,
};
pub use error::{MemoryError, MemoryErrorKind};
