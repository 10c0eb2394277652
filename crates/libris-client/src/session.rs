//! # Application Context
//!
//! Holds the logged-in staff session and keeps it on disk between runs.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Session Lifecycle                                 │
//! │                                                                         │
//! │  AppContext::init(path) ── reads session.json (if any)                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  login(response) ──► memory + session.json                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  HttpApi reads token() for every request                               │
//! │       │                                                                 │
//! │       ├── 401 from any endpoint ──► clear() ── memory + file removed   │
//! │       ├── logout ─────────────────► clear()                            │
//! │       └── process exit ───────────► teardown() ── file kept            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only login, logout and 401 handling write to the context. Everything
//! else reads it through a shared `Arc<AppContext>`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::ClientResult;
use libris_core::{LoginResponse, Role};

/// The logged-in staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub role: Role,
    pub token: String,
}

impl From<LoginResponse> for Session {
    fn from(resp: LoginResponse) -> Self {
        Session {
            username: resp.username,
            role: resp.role,
            token: resp.token,
        }
    }
}

/// Shared session state.
#[derive(Debug)]
pub struct AppContext {
    session: RwLock<Option<Session>>,
    store: Option<PathBuf>,
}

impl AppContext {
    /// Loads the persisted session from `store`, if one exists.
    ///
    /// A missing or unreadable file starts logged out. Passing `None`
    /// keeps the session in memory only.
    pub async fn init(store: Option<PathBuf>) -> Self {
        let session = match &store {
            Some(path) => read_session(path).await,
            None => None,
        };

        if let Some(s) = &session {
            debug!(username = %s.username, "Restored persisted session");
        }

        AppContext {
            session: RwLock::new(session),
            store,
        }
    }

    /// Context with no persistence and nobody logged in.
    pub fn ephemeral() -> Self {
        AppContext {
            session: RwLock::new(None),
            store: None,
        }
    }

    /// Current session, if logged in.
    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    /// Bearer token for the next request.
    pub async fn token(&self) -> Option<String> {
        self.session.read().await.as_ref().map(|s| s.token.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_some()
    }

    /// Where the session is persisted.
    pub fn store_path(&self) -> Option<&Path> {
        self.store.as_deref()
    }

    /// Stores a fresh login and persists it.
    pub async fn login(&self, response: LoginResponse) -> ClientResult<Session> {
        let session = Session::from(response);

        if let Some(path) = &self.store {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let json = serde_json::to_vec_pretty(&session)?;
            tokio::fs::write(path, json).await?;
        }

        info!(username = %session.username, role = %session.role, "Logged in");
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    /// Forgets the session and removes the persisted copy.
    ///
    /// Used by logout and by the 401 handler. Removing a file that is
    /// already gone is not an error.
    pub async fn clear(&self) -> ClientResult<()> {
        let previous = self.session.write().await.take();

        if let Some(path) = &self.store {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        if let Some(s) = previous {
            info!(username = %s.username, "Session cleared");
        }
        Ok(())
    }

    /// Drops the in-memory session at shutdown. The persisted file stays
    /// so the next run starts logged in.
    pub async fn teardown(&self) {
        self.session.write().await.take();
    }
}

async fn read_session(path: &Path) -> Option<Session> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(?path, error = %e, "Could not read session file");
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(session) => Some(session),
        Err(e) => {
            warn!(?path, error = %e, "Ignoring corrupt session file");
            None
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
