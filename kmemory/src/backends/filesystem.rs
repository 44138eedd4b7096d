use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use kcommon::{BoxFuture, SessionId};
use kdialog::Transcript;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::backend::MemoryBackend;
use crate::error::MemoryError;

const SCHEMA_VERSION: u32 = 1;
/// Longest hex stem kept verbatim; `.json.tmp` must still fit in 255 bytes.
const MAX_HEX_STEM: usize = 200;

/// One pretty-printed JSON file per session under `<root>/sessions/`.
#[derive(Debug)]
pub struct FilesystemMemoryBackend {
    root: PathBuf,
    lock: Mutex<()>,
}

impl FilesystemMemoryBackend {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("sessions")).map_err(|error| {
            MemoryError::storage(format!("failed to create filesystem backend root: {error}"))
        })?;
        Ok(Self {
            root,
            lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Session ids are hex-encoded so any id maps to a safe file name.
    /// Ids too long for that are named by their SHA-256 digest and byte length.
    pub fn session_path(&self, session_id: &SessionId) -> PathBuf {
        self.root
            .join("sessions")
            .join(format!("{}.json", file_stem(session_id.as_str())))
    }

    fn load_record(&self, session_id: &SessionId) -> Result<Option<PersistedTranscript>, MemoryError> {
        let path = self.session_path(session_id);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).map_err(|error| {
            MemoryError::storage(format!("failed to read session file: {error}"))
        })?;
        let record = serde_json::from_slice::<PersistedTranscript>(&bytes).map_err(|error| {
            MemoryError::corrupt(format!("failed to deserialize session file: {error}"))
        })?;
        if record.schema_version != SCHEMA_VERSION {
            return Err(MemoryError::corrupt(format!(
                "unsupported session schema version {}",
                record.schema_version
            )));
        }
        Ok(Some(record))
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, ()>, MemoryError> {
        self.lock
            .lock()
            .map_err(|_| MemoryError::storage("filesystem backend lock poisoned"))
    }
}

impl MemoryBackend for FilesystemMemoryBackend {
    fn load_transcript<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Option<Transcript>, MemoryError>> {
        Box::pin(async move {
            let _guard = self.guard()?;
            Ok(self.load_record(session_id)?.map(|record| record.turns))
        })
    }

    fn save_transcript<'a>(
        &'a self,
        session_id: &'a SessionId,
        transcript: &'a Transcript,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            let _guard = self.guard()?;
            let record = PersistedTranscriptRef {
                schema_version: SCHEMA_VERSION,
                turns: transcript,
            };
            let bytes = serde_json::to_vec_pretty(&record).map_err(|error| {
                MemoryError::storage(format!("failed to serialize session file: {error}"))
            })?;
            write_atomic(&self.session_path(session_id), &bytes)
        })
    }

    fn delete_transcript<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<bool, MemoryError>> {
        Box::pin(async move {
            let _guard = self.guard()?;
            let path = self.session_path(session_id);
            if !path.exists() {
                return Ok(false);
            }
            fs::remove_file(&path).map_err(|error| {
                MemoryError::storage(format!("failed to delete session file: {error}"))
            })?;
            Ok(true)
        })
    }
}

#[derive(Debug, Deserialize)]
struct PersistedTranscript {
    schema_version: u32,
    turns: Transcript,
}

#[derive(Debug, Serialize)]
struct PersistedTranscriptRef<'a> {
    schema_version: u32,
    turns: &'a Transcript,
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), MemoryError> {
    let Some(parent) = path.parent() else {
        return Err(MemoryError::storage("session file missing parent directory"));
    };
    fs::create_dir_all(parent).map_err(|error| {
        MemoryError::storage(format!("failed to create parent directory: {error}"))
    })?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).map_err(|error| {
        MemoryError::storage(format!("failed to write temporary session file: {error}"))
    })?;

    if path.exists() {
        fs::remove_file(path).map_err(|error| {
            MemoryError::storage(format!("failed to replace existing session file: {error}"))
        })?;
    }
    fs::rename(&tmp, path)
        .map_err(|error| MemoryError::storage(format!("failed to finalize session file: {error}")))
}

fn file_stem(session_id: &str) -> String {
    let bytes = session_id.as_bytes();
    if bytes.len() * 2 <= MAX_HEX_STEM {
        return hex_encode(bytes);
    }
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("sha256-{:x}-{}", hasher.finalize(), bytes.len())
}

fn hex_encode(input: &[u8]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    let mut output = String::with_capacity(input.len() * 2);
    for byte in input {
        output.push(DIGITS[usize::from(byte >> 4)] as char);
        output.push(DIGITS[usize::from(byte & 0x0f)] as char);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_encoding_is_lowercase() {
        assert_eq!(hex_encode(b"kid/1"), "6b69642f31");
        assert_eq!(hex_encode(b""), "");
    }

    #[test]
    fn long_ids_get_fixed_length_names() {
        let fits = "k".repeat(MAX_HEX_STEM / 2);
        assert_eq!(file_stem(&fits), hex_encode(fits.as_bytes()));

        let long = "k".repeat(200);
        let stem = file_stem(&long);
        assert!(stem.starts_with("sha256-"));
        assert!(stem.ends_with("-200"));
        assert!(stem.len() + ".json.tmp".len() <= 255);
        assert_ne!(stem, file_stem(&"k".repeat(201)));
        assert_eq!(file_stem(&"x".repeat(4096)).len(), "sha256-".len() + 64 + "-4096".len());
    }
}
