//! Customer session persistence.
//!
//! The logged-in customer of a storefront (`{id, phone, name}`) is kept
//! under the `store-customer` key, one JSON file in the data directory.
//! Reads never fail: an absent or corrupt session is simply no session.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Key the session is stored under.
pub const SESSION_KEY: &str = "store-customer";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSession {
    pub id: String,
    pub phone: String,
    pub name: String,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session has no customer id")]
    MissingId,

    #[error("failed to write session at {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to remove session at {path}: {source}")]
    Remove { path: PathBuf, source: io::Error },

    #[error("failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

/// File-backed key-value slot for the customer session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{SESSION_KEY}.json"))
    }

    /// Read the stored session, if there is a usable one.
    pub fn load(&self) -> Option<CustomerSession> {
        let path = self.path();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no stored session");
                return None;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable session ignored");
                return None;
            }
        };

        match serde_json::from_str::<CustomerSession>(&text) {
            Ok(session) if !session.id.trim().is_empty() => Some(session),
            Ok(_) => {
                warn!(path = %path.display(), "session without customer id ignored");
                None
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt session ignored");
                None
            }
        }
    }

    /// Store `session`, replacing any previous one.
    pub fn save(&self, session: &CustomerSession) -> Result<(), SessionError> {
        if session.id.trim().is_empty() {
            return Err(SessionError::MissingId);
        }
        let json = serde_json::to_string(session)?;
        let path = self.path();
        let write_err = |source: io::Error| SessionError::Write {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(write_err)?;
        // write then rename, so a crash never leaves a half-written session
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(write_err)?;
        fs::rename(&tmp, &path).map_err(write_err)?;
        Ok(())
    }

    /// Forget the stored session. Clearing an absent session succeeds.
    pub fn clear(&self) -> Result<(), SessionError> {
        let path = self.path();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SessionError::Remove { path, source }),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
