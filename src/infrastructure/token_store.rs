use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use crate::domain::ports::TokenStore;

/// Keeps the bearer token in a single file, created on first save.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<String> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        let token = raw.trim();
        (!token.is_empty()).then(|| token.to_string())
    }

    fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&self.path, token)
            .with_context(|| format!("Failed to write token to {}", self.path.display()))?;
        debug!(path = %self.path.display(), "token saved");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "token removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove token at {}", self.path.display())),
        }
    }
}

/// In-process token store for tests and embedding.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.lock().ok().and_then(|t| t.clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        let mut slot = self
            .token
            .lock()
            .map_err(|_| anyhow::anyhow!("token store poisoned"))?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut slot = self
            .token
            .lock()
            .map_err(|_| anyhow::anyhow!("token store poisoned"))?;
        *slot = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested/token"));
        assert!(store.load().is_none());

        store.save("abc\n").unwrap();
        assert_eq!(store.load().as_deref(), Some("abc"));

        store.clear().unwrap();
        assert!(store.load().is_none());
        // clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn blank_file_is_no_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "  \n").unwrap();
        assert!(FileTokenStore::new(path).load().is_none());
    }

    #[test]
    fn memory_store() {
        let store = MemoryTokenStore::with_token("t");
        assert_eq!(store.load().as_deref(), Some("t"));
        store.clear().unwrap();
        assert!(store.load().is_none());
    }
}
