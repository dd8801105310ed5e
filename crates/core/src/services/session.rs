//! Persisted login session.
//!
//! The authenticated user and their bearer token survive restarts as a
//! small JSON file. Loading is forgiving: a missing or unreadable file
//! just means nobody is signed in.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use vigia_common::{AppError, AppResult, SessionConfig};
use vigia_store::{Role, UserRecord};

/// An authenticated session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// The signed-in user as returned by the login endpoint.
    pub user: UserRecord,
    /// Bearer token for subsequent requests.
    pub token: String,
}

impl Session {
    /// Create a new session.
    #[must_use]
    pub const fn new(user: UserRecord, token: String) -> Self {
        Self { user, token }
    }

    /// Role of the signed-in user.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.user.role
    }
}

/// Session persistence on the local filesystem.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Create a store writing to the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a store from configuration.
    #[must_use]
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.path.as_str())
    }

    /// Load the persisted session, if any.
    ///
    /// A missing file is the normal signed-out state. Unreadable or
    /// corrupt files are logged and treated as signed out rather than
    /// refusing to start.
    pub async fn load(&self) -> Option<Session> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read session file");
                return None;
            }
        };

        match serde_json::from_slice::<Session>(&bytes) {
            Ok(session) => {
                debug!(user_id = %session.user.id, "restored session");
                Some(session)
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "discarding unparseable session file");
                None
            }
        }
    }

    /// Persist a session, replacing any previous one.
    pub async fn save(&self, session: &Session) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to create directory: {e}")))?;
        }

        let bytes = serde_json::to_vec_pretty(session)
            .map_err(|e| AppError::Internal(format!("Failed to serialize session: {e}")))?;

        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write session file: {e}")))?;

        debug!(path = %self.path.display(), user_id = %session.user.id, "saved session");
        Ok(())
    }

    /// Remove the persisted session.
    ///
    /// Clearing an already-absent session is not an error.
    pub async fn clear(&self) -> AppResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "cleared session");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Internal(format!(
                "Failed to remove session file: {e}"
            ))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use vigia_common::IdGenerator;

    fn sample_user() -> UserRecord {
        UserRecord {
            id: "u1".to_string(),
            name: "Rosa Morales".to_string(),
            email: "rosa@example.com".to_string(),
            role: Role::Assignee,
            is_active: true,
            is_verified: true,
            organization: Some("Obras Publicas".to_string()),
            phone: None,
            zone: Some("Centro".to_string()),
            created_at: Utc::now(),
        }
    }

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("vigia-session-{}", IdGenerator::new().generate()))
            .join("session.json")
    }

    #[tokio::test]
    async fn test_save_load_clear_round_trip() {
        let store = SessionStore::new(scratch_path());

        assert!(store.load().await.is_none());

        let session = Session::new(sample_user(), "tok-123".to_string());
        store.save(&session).await.unwrap();

        let restored = store.load().await.unwrap();
        assert_eq!(restored.user.id, "u1");
        assert_eq!(restored.token, "tok-123");
        assert_eq!(restored.role(), Role::Assignee);

        store.clear().await.unwrap();
        assert!(store.load().await.is_none());

        // Clearing again is still fine.
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_file_reads_as_signed_out() {
        let path = scratch_path();
        tokio::fs::create_dir_all(path.parent().unwrap())
            .await
            .unwrap();
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        let store = SessionStore::new(&path);
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_session() {
        let store = SessionStore::new(scratch_path());

        store
            .save(&Session::new(sample_user(), "first".to_string()))
            .await
            .unwrap();
        store
            .save(&Session::new(sample_user(), "second".to_string()))
            .await
            .unwrap();

        assert_eq!(store.load().await.unwrap().token, "second");
    }
}
