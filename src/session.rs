//! Durable slot holding the serialized current session.
//!
//! One key, read at startup and written on every login, cleared on logout.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::Session;

const SESSION_FILE: &str = "session.json";

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("session store i/o on '{path}': {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("session encode: {0}")]
    Encode(#[from] serde_json::Error),
}

pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<Session>, SessionStoreError>;
    fn save(&self, session: &Session) -> Result<(), SessionStoreError>;
    fn clear(&self) -> Result<(), SessionStoreError>;
}

/// JSON file under the data directory.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

    pub fn in_dir(dir: &Path) -> Self { Self::new(dir.join(SESSION_FILE)) }

    pub fn path(&self) -> &Path { &self.path }

    fn io_err(&self, source: std::io::Error) -> SessionStoreError {
        SessionStoreError::Io { path: self.path.clone(), source }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>, SessionStoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no stored session");
                return Ok(None);
            }
            Err(e) => return Err(self.io_err(e)),
        };
        // An unreadable slot counts as logged out rather than a hard failure.
        match serde_json::from_slice::<Session>(&bytes) {
            Ok(s) => Ok(Some(s)),
            Err(e) => {
                warn!(path = %self.path.display(), "ignoring corrupt session file: {e}");
                Ok(None)
            }
        }
    }

    fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        let body = serde_json::to_vec_pretty(session)?;
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| self.io_err(e))?;
        }
        std::fs::write(&self.path, body).map_err(|e| self.io_err(e))
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_err(e)),
        }
    }
}

/// Process-local slot; clones share the same cell.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    slot: Arc<Mutex<Option<Session>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_session(session: Session) -> Self {
        Self { slot: Arc::new(Mutex::new(Some(session))) }
    }

    pub fn peek(&self) -> Option<Session> {
        self.slot.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>, SessionStoreError> { Ok(self.peek()) }

    fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        *self.slot.lock().unwrap_or_else(|p| p.into_inner()) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        *self.slot.lock().unwrap_or_else(|p| p.into_inner()) = None;
        Ok(())
    }
}
