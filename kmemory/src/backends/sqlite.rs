use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use kcommon::{BoxFuture, SessionId};
use kdialog::{Transcript, Turn, TurnRole};
use rusqlite::{Connection, params};

use crate::backend::MemoryBackend;
use crate::error::MemoryError;

#[derive(Debug)]
pub struct SqliteMemoryBackend {
    connection: Mutex<Connection>,
}

impl SqliteMemoryBackend {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|error| {
                MemoryError::storage(format!(
                    "failed to create sqlite parent directory: {error}"
                ))
            })?;
        }

        let connection = Connection::open(path).map_err(|error| {
            MemoryError::storage(format!("failed to open sqlite database: {error}"))
        })?;
        Self::from_connection(connection)
    }

    pub fn new_in_memory() -> Result<Self, MemoryError> {
        let connection = Connection::open_in_memory().map_err(|error| {
            MemoryError::storage(format!("failed to open in-memory sqlite database: {error}"))
        })?;
        Self::from_connection(connection)
    }

    fn from_connection(connection: Connection) -> Result<Self, MemoryError> {
        connection
            .busy_timeout(Duration::from_secs(5))
            .map_err(|error| {
                MemoryError::storage(format!("failed to configure sqlite busy timeout: {error}"))
            })?;
        let backend = Self {
            connection: Mutex::new(connection),
        };
        backend.initialize_schema()?;
        Ok(backend)
    }

    fn connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>, MemoryError> {
        self.connection
            .lock()
            .map_err(|_| MemoryError::storage("sqlite backend lock poisoned"))
    }

    fn initialize_schema(&self) -> Result<(), MemoryError> {
        let conn = self.connection()?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            CREATE TABLE IF NOT EXISTS session_turns (
                session_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                image_url TEXT,
                image_prompt TEXT,
                summary INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (session_id, position)
            );
            ",
        )
        .map_err(|error| {
            MemoryError::storage(format!("failed to initialize sqlite schema: {error}"))
        })?;

        // Databases created before summaries were marked lack the column.
        let has_summary = conn
            .prepare("SELECT 1 FROM pragma_table_info('session_turns') WHERE name = 'summary'")
            .and_then(|mut stmt| stmt.exists([]))
            .map_err(|error| {
                MemoryError::storage(format!("failed to inspect sqlite schema: {error}"))
            })?;
        if !has_summary {
            conn.execute(
                "ALTER TABLE session_turns ADD COLUMN summary INTEGER NOT NULL DEFAULT 0",
                [],
            )
            .map_err(|error| {
                MemoryError::storage(format!("failed to migrate sqlite schema: {error}"))
            })?;
        }
        Ok(())
    }
}

impl MemoryBackend for SqliteMemoryBackend {
    fn load_transcript<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Option<Transcript>, MemoryError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            let mut stmt = conn
                .prepare(
                    "
                    SELECT role, content, image_url, image_prompt, summary
                    FROM session_turns
                    WHERE session_id = ?1
                    ORDER BY position ASC
                    ",
                )
                .map_err(|error| {
                    MemoryError::storage(format!("failed to prepare transcript query: {error}"))
                })?;
            let rows = stmt
                .query_map(params![session_id.as_str()], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, bool>(4)?,
                    ))
                })
                .map_err(|error| {
                    MemoryError::storage(format!("failed to query transcript rows: {error}"))
                })?;

            let mut turns = Vec::new();
            for row in rows {
                let (role, content, image_url, image_prompt, summary) =
                    row.map_err(|error| {
                        MemoryError::storage(format!("failed to read transcript row: {error}"))
                    })?;
                let turn = Turn::from_parts(role_from_str(&role)?, content, image_url, image_prompt)
                    .and_then(|turn| if summary { turn.into_summary() } else { Ok(turn) })
                    .map_err(|error| MemoryError::corrupt(error.message))?;
                turns.push(turn);
            }

            if turns.is_empty() {
                return Ok(None);
            }
            Ok(Some(Transcript::from_turns(turns)))
        })
    }

    fn save_transcript<'a>(
        &'a self,
        session_id: &'a SessionId,
        transcript: &'a Transcript,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            let mut conn = self.connection()?;
            let tx = conn.transaction().map_err(|error| {
                MemoryError::storage(format!("failed to begin transcript transaction: {error}"))
            })?;

            tx.execute(
                "DELETE FROM session_turns WHERE session_id = ?1",
                params![session_id.as_str()],
            )
            .map_err(|error| {
                MemoryError::storage(format!("failed to clear transcript rows: {error}"))
            })?;

            for (position, turn) in transcript.turns().iter().enumerate() {
                let position = i64::try_from(position).map_err(|_| {
                    MemoryError::unpersistable("transcript too long to persist")
                })?;
                tx.execute(
                    "
                    INSERT INTO session_turns
                        (session_id, position, role, content, image_url, image_prompt, summary)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    ",
                    params![
                        session_id.as_str(),
                        position,
                        turn.role.as_str(),
                        turn.content,
                        turn.image_url(),
                        turn.image_prompt(),
                        turn.is_summary()
                    ],
                )
                .map_err(|error| {
                    MemoryError::storage(format!("failed to insert transcript row: {error}"))
                })?;
            }

            tx.commit().map_err(|error| {
                MemoryError::storage(format!("failed to commit transcript: {error}"))
            })
        })
    }

    fn delete_transcript<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<bool, MemoryError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            let removed = conn
                .execute(
                    "DELETE FROM session_turns WHERE session_id = ?1",
                    params![session_id.as_str()],
                )
                .map_err(|error| {
                    MemoryError::storage(format!("failed to delete transcript rows: {error}"))
                })?;
            Ok(removed > 0)
        })
    }
}

fn role_from_str(value: &str) -> Result<TurnRole, MemoryError> {
    match value {
        "system" => Ok(TurnRole::System),
        "user" => Ok(TurnRole::User),
        "assistant" => Ok(TurnRole::Assistant),
        _ => Err(MemoryError::corrupt(format!(
            "unknown transcript role value '{value}'"
        ))),
    }
}

pub(crate) fn default_sqlite_path() -> PathBuf {
    if let Some(explicit) = std::env::var_os("KIDOPEDIA_SQLITE_PATH") {
        return PathBuf::from(explicit);
    }

    if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        return PathBuf::from(home)
            .join(".kidopedia")
            .join("sessions.sqlite3");
    }

    PathBuf::from("kidopedia-sessions.sqlite3")
}
