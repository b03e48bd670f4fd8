//! Persistent CLI state: the logged-in session plus the cookie jar contents
//! and server it belongs to, so later invocations stay signed in.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shared::{Session, SessionStore, SessionStoreError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct StoredState {
    #[serde(default)]
    session: Option<Session>,
    /// Server the session was opened against
    #[serde(default)]
    server: Option<String>,
    /// `Cookie` header replayed into the jar on the next run (cookie mode)
    #[serde(default)]
    cookie_header: Option<String>,
}

/// Session store backed by a JSON file, written atomically.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `session.json` in the per-user config directory.
    pub fn default_location() -> Result<Self> {
        let config_dir = directories::ProjectDirs::from("com", "securita", "securita-admin")
            .context("Failed to determine config directory")?
            .config_dir()
            .to_path_buf();
        Ok(Self::at(config_dir.join("session.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<StoredState, SessionStoreError> {
        if !self.path.exists() {
            return Ok(StoredState::default());
        }
        let contents = fs::read_to_string(&self.path)
            .map_err(|e| SessionStoreError::Unavailable(e.to_string()))?;
        serde_json::from_str(&contents).map_err(|e| SessionStoreError::Corrupt(e.to_string()))
    }

    fn write(&self, state: &StoredState) -> Result<(), SessionStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| SessionStoreError::Write(e.to_string()))?;
        }
        let contents = serde_json::to_string_pretty(state)
            .map_err(|e| SessionStoreError::Write(e.to_string()))?;

        // Write to temp file first, then rename over the real one
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, contents).map_err(|e| SessionStoreError::Write(e.to_string()))?;
        fs::rename(&temp_path, &self.path).map_err(|e| SessionStoreError::Write(e.to_string()))
    }

    pub fn server(&self) -> Result<Option<String>, SessionStoreError> {
        Ok(self.read()?.server)
    }

    pub fn cookie_header(&self) -> Result<Option<String>, SessionStoreError> {
        Ok(self.read()?.cookie_header)
    }

    /// Remember which server and cookies go with the stored session.
    pub fn set_connection(
        &self,
        server: &str,
        cookie_header: Option<String>,
    ) -> Result<(), SessionStoreError> {
        let mut state = self.read()?;
        state.server = Some(server.to_string());
        state.cookie_header = cookie_header.filter(|c| !c.is_empty());
        self.write(&state)
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>, SessionStoreError> {
        Ok(self.read()?.session)
    }

    fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        let mut state = self.read()?;
        state.session = Some(session.clone());
        self.write(&state)
    }

    /// Forget everything, cookies included.
    fn clear(&self) -> Result<(), SessionStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionStoreError::Write(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::AuthMode;

    fn session() -> Session {
        Session {
            username: "admin".to_string(),
            token: Some("tok".to_string()),
            user_id: Some("u1".to_string()),
            auth_mode: AuthMode::Bearer,
        }
    }

    #[test]
    fn missing_file_means_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::at(dir.path().join("session.json"));
        assert_eq!(store.load().unwrap(), None);
        assert!(!store.is_authenticated());
    }

    #[test]
    fn save_then_load_in_a_new_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        FileSessionStore::at(&path).save(&session()).unwrap();

        let reopened = FileSessionStore::at(&path);
        assert_eq!(reopened.load().unwrap(), Some(session()));
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn connection_survives_session_save() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::at(dir.path().join("session.json"));
        store
            .set_connection("http://localhost:8080", Some("sid=abc".to_string()))
            .unwrap();
        store.save(&session()).unwrap();

        assert_eq!(store.server().unwrap().as_deref(), Some("http://localhost:8080"));
        assert_eq!(store.cookie_header().unwrap().as_deref(), Some("sid=abc"));
    }

    #[test]
    fn clear_removes_everything_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::at(dir.path().join("session.json"));
        store.save(&session()).unwrap();
        store.set_connection("http://x", Some("sid=1".to_string())).unwrap();

        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        assert_eq!(store.cookie_header().unwrap(), None);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();
        let err = FileSessionStore::at(&path).load().unwrap_err();
        assert!(matches!(err, SessionStoreError::Corrupt(_)));
    }
}
