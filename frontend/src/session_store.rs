//! Browser session persistence.

use shared::{Session, SessionStore, SessionStoreError};
use web_sys::Storage;

const SESSION_KEY: &str = "securita.session";

/// Session kept in `localStorage` so it survives reloads.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LocalStorageSessionStore;

fn storage() -> Result<Storage, SessionStoreError> {
    web_sys::window()
        .and_then(|w| w.local_storage().ok().flatten())
        .ok_or_else(|| SessionStoreError::Unavailable("localStorage".to_string()))
}

impl SessionStore for LocalStorageSessionStore {
    fn load(&self) -> Result<Option<Session>, SessionStoreError> {
        let Some(json) = storage()?.get_item(SESSION_KEY).ok().flatten() else {
            return Ok(None);
        };
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| SessionStoreError::Corrupt(e.to_string()))
    }

    fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        let json =
            serde_json::to_string(session).map_err(|e| SessionStoreError::Write(e.to_string()))?;
        storage()?
            .set_item(SESSION_KEY, &json)
            .map_err(|e| SessionStoreError::Write(format!("{:?}", e)))
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        storage()?
            .remove_item(SESSION_KEY)
            .map_err(|e| SessionStoreError::Write(format!("{:?}", e)))
    }
}

/// 401 from any call: drop the local session and go back to login.
pub fn expire_session() {
    log::info!("Session expired, returning to login");
    if let Err(e) = LocalStorageSessionStore.clear() {
        log::error!("Failed to clear session: {}", e);
    }
    if let Some(window) = web_sys::window() {
        let _ = window.location().set_href("/login");
    }
}
