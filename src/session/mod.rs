//! Local persistence of the login session.
//!
//! One record, JSON-encoded, read and written only by the view-model.
//! Expired records are dropped lazily the next time they are read.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::models::Session;

pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<Session>, ClientError>;
    fn save(&self, session: &Session) -> Result<(), ClientError>;
    fn clear(&self) -> Result<(), ClientError>;
}

// Older login pages wrote `{employeeName, username, exp}` with exp in epoch millis
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredSession {
    Current(Session),
    Legacy {
        #[serde(rename = "employeeName", alias = "name")]
        employee_name: String,
        #[serde(default)]
        username: String,
        exp: i64,
    },
}

impl StoredSession {
    fn into_session(self) -> Option<Session> {
        match self {
            StoredSession::Current(session) => Some(session),
            StoredSession::Legacy {
                employee_name,
                username,
                exp,
            } => {
                let expires_at: DateTime<Utc> = Utc.timestamp_millis_opt(exp).single()?;
                Some(Session {
                    employee_name,
                    username,
                    // Legacy records never carried a creation time
                    created_at: expires_at,
                    expires_at,
                })
            }
        }
    }
}

pub fn decode_session(raw: &str) -> Option<Session> {
    match serde_json::from_str::<StoredSession>(raw) {
        Ok(stored) => stored.into_session(),
        Err(e) => {
            warn!("Ignoring unreadable session record: {}", e);
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>, ClientError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(decode_session(&raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, session: &Session) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let body = serde_json::to_string(session)?;
        fs::write(&self.path, body)?;
        debug!("Session written to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Seed the slot with an arbitrary raw record
    pub fn with_raw(raw: &str) -> Self {
        Self {
            slot: Mutex::new(Some(raw.to_string())),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>, ClientError> {
        Ok(self.raw().as_deref().and_then(decode_session))
    }

    fn save(&self, session: &Session) -> Result<(), ClientError> {
        let body = serde_json::to_string(session)?;
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(body);
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}
