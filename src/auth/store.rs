//! Persisted session slot.
//!
//! A single JSON file holding the last authenticated profile, read once at
//! startup, written on login and cleared on logout. Malformed contents are
//! treated as "no session", never as a fatal error.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::db::UserProfile;

/// File-backed slot for one serialized [`UserProfile`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Create a store over the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored profile, if a readable one exists.
    ///
    /// A missing file is simply `None`. Unreadable or malformed contents are
    /// logged, removed, and also reported as `None`.
    pub fn load(&self) -> Option<UserProfile> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read session slot");
                return None;
            }
        };

        match serde_json::from_str::<UserProfile>(&content) {
            Ok(profile) => {
                debug!(email = %profile.email, "loaded persisted session");
                Some(profile)
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "malformed session slot, discarding");
                if let Err(e) = self.clear() {
                    warn!(error = %e, "failed to remove malformed session slot");
                }
                None
            }
        }
    }

    /// Write the profile to the slot, replacing any previous contents.
    pub fn save(&self, profile: &UserProfile) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(profile)?;
        std::fs::write(&self.path, json)
    }

    /// Remove the slot. Missing file counts as success.
    pub fn clear(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Role;
    use tempfile::tempdir;

    fn profile() -> UserProfile {
        UserProfile {
            id: "u1".to_string(),
            email: "ana@example.com".to_string(),
            display_name: "Ana".to_string(),
            role: Role::Admin,
            avatar_url: None,
        }
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        assert!(store.load().is_none());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));

        store.save(&profile()).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, profile());
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested/dir/session.json"));
        store.save(&profile()).unwrap();
        assert!(store.load().is_some());
    }

    #[test]
    fn test_malformed_contents_discarded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = SessionStore::new(&path);
        assert!(store.load().is_none());
        // The malformed file was removed.
        assert!(!path.exists());
    }

    #[test]
    fn test_unknown_role_is_malformed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(
            &path,
            r#"{"id":"u1","email":"a@b.c","display_name":"A","role":"overlord"}"#,
        )
        .unwrap();

        let store = SessionStore::new(&path);
        assert!(store.load().is_none());
    }

    #[test]
    fn test_clear_idempotent() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));

        store.save(&profile()).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.load().is_none());
    }
}
