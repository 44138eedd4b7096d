//! Memory-layer errors for transcript persistence operations.

use std::error::Error;
use std::fmt::{Display, Formatter};

use kdialog::DialogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryErrorKind {
    /// The backing store (disk, database) rejected the operation.
    Storage,
    /// A stored record exists but cannot be decoded.
    Corrupt,
    /// The transcript cannot be represented by this backend.
    Unpersistable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryError {
    pub kind: MemoryErrorKind,
    pub message: String,
}

impl MemoryError {
    pub fn new(kind: MemoryErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(MemoryErrorKind::Storage, message)
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::new(MemoryErrorKind::Corrupt, message)
    }

    pub fn unpersistable(message: impl Into<String>) -> Self {
        Self::new(MemoryErrorKind::Unpersistable, message)
    }

    pub fn is_corrupt(&self) -> bool {
        self.kind == MemoryErrorKind::Corrupt
    }
}

impl Display for MemoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self.kind {
            MemoryErrorKind::Storage => "storage failure",
            MemoryErrorKind::Corrupt => "corrupt session record",
            MemoryErrorKind::Unpersistable => "unpersistable transcript",
        };
        write!(f, "{label}: {}", self.message)
    }
}

impl Error for MemoryError {}

impl From<MemoryError> for DialogError {
    fn from(value: MemoryError) -> Self {
        DialogError::store(value.to_string())
    }
}
