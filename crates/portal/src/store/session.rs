//! Durable session slot.
//!
//! The current session token is the only persisted artifact. It lives under
//! one well-known key; absence of the key means "no session".

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tempfile::NamedTempFile;

use super::StoreError;

/// Key under which the session token is stored.
pub const SESSION_KEY: &str = "library_token";

/// A single-key store for the current session token.
///
/// Implementations are shared through `Arc<dyn SessionStore>`; every call
/// comes from the access controller, which serializes its writes.
pub trait SessionStore: Send + Sync {
    /// Overwrite the stored token.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the token cannot be written.
    fn save(&self, token: &str) -> Result<(), StoreError>;

    /// Read the stored token, if any.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the slot exists but cannot be read, or
    /// `StoreError::Corrupt` if its contents are not a token string.
    fn load(&self) -> Result<Option<String>, StoreError>;

    /// Remove the stored token. Removing an absent token succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the slot exists but cannot be removed.
    fn clear(&self) -> Result<(), StoreError>;
}

/// File-backed session slot.
///
/// The token is kept in a file named [`SESSION_KEY`] inside the data
/// directory. Saves write a uniquely named sibling temp file and rename it
/// into place, so neither a crash nor a second process saving at the same
/// time leaves a half-written token behind.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Create a store rooted at `dir`. The directory is created on first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file holding the token.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.join(SESSION_KEY)
    }

    /// Directory holding the slot.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SessionStore for FileSessionStore {
    fn save(&self, token: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;

        // Uniquely named per save, so concurrent writers never share a file
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(token.as_bytes())?;
        tmp.as_file().sync_all()?;

        // Token lets anyone holding it act as the account
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o600))?;
        }

        tmp.persist(self.path()).map_err(|e| e.error)?;
        tracing::debug!(path = %self.path().display(), "Session token saved");
        Ok(())
    }

    fn load(&self) -> Result<Option<String>, StoreError> {
        match fs::read(self.path()) {
            Ok(bytes) => {
                let token = String::from_utf8(bytes)
                    .map_err(|e| StoreError::Corrupt(e.to_string()))?;
                let token = token.trim();
                Ok((!token.is_empty()).then(|| token.to_owned()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(self.path()) {
            Ok(()) => {
                tracing::debug!(path = %self.path().display(), "Session token removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory session slot.
///
/// Lost when the process exits. Used by tests and by callers that do not
/// want a session to outlive the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<String>>,
}

impl MemorySessionStore {
    /// Create an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a slot already holding `token`.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(token.into())),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, token: &str) -> Result<(), StoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_owned());
        Ok(())
    }

    fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_roundtrip() {
        let temp = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp.path().join("nested"));

        assert!(store.load().unwrap().is_none());

        store.save("a.b.c").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("a.b.c"));
        assert!(store.path().ends_with(SESSION_KEY));

        store.save("d.e.f").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("d.e.f"));
    }

    #[test]
    fn test_file_store_survives_new_instance() {
        let temp = TempDir::new().unwrap();
        FileSessionStore::new(temp.path()).save("a.b.c").unwrap();

        let reopened = FileSessionStore::new(temp.path());
        assert_eq!(reopened.load().unwrap().as_deref(), Some("a.b.c"));
    }

    #[test]
    fn test_file_store_clear_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp.path());

        store.clear().unwrap();
        store.save("a.b.c").unwrap();
        store.clear().unwrap();
        store.clear().unwrap();

        assert!(store.load().unwrap().is_none());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_file_store_rejects_non_utf8() {
        let temp = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp.path());
        fs::write(store.path(), [0xff, 0xfe, 0xfd]).unwrap();

        assert!(matches!(store.load(), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_concurrent_saves_leave_one_whole_token() {
        let temp = TempDir::new().unwrap();
        let tokens: Vec<String> = (0..8).map(|i| format!("h{i}.p{i}.s{i}")).collect();

        std::thread::scope(|scope| {
            for token in &tokens {
                let dir = temp.path();
                scope.spawn(move || {
                    let store = FileSessionStore::new(dir);
                    for _ in 0..20 {
                        store.save(token).unwrap();
                    }
                });
            }
        });

        let store = FileSessionStore::new(temp.path());
        let saved = store.load().unwrap().unwrap();
        assert!(tokens.contains(&saved));

        // No temp files left behind
        let entries: Vec<_> = fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp.path());
        store.save("a.b.c").unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::with_token("a.b.c");
        assert_eq!(store.load().unwrap().as_deref(), Some("a.b.c"));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());

        store.save("x.y.z").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("x.y.z"));
    }
}
