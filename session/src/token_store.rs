//! Where the access/refresh pair lives between runs.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::{fs, io};

use thiserror::Error;
use visitdesk_types::TokenPair;
use visitdesk_utils::{atomic_write, ensure_private_dir, recover_bak_file, remove_if_exists};

#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("failed to read token file {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write token file {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("token file {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to encode tokens: {0}")]
    Encode(#[source] serde_json::Error),
}

pub trait TokenStore: Send + Sync {
    /// The stored pair, if both tokens are present.
    fn load(&self) -> Result<Option<TokenPair>, TokenStoreError>;
    fn save(&self, tokens: &TokenPair) -> Result<(), TokenStoreError>;
    fn clear(&self) -> Result<(), TokenStoreError>;
}

/// JSON file, owner-only, written atomically. Default `~/.visitdesk/session.json`.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<TokenPair>, TokenStoreError> {
        recover_bak_file(&self.path);
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(TokenStoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let pair: TokenPair =
            serde_json::from_str(&data).map_err(|source| TokenStoreError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        if pair.access.is_empty() || pair.refresh.is_empty() {
            return Ok(None);
        }
        Ok(Some(pair))
    }

    fn save(&self, tokens: &TokenPair) -> Result<(), TokenStoreError> {
        let write_err = |source| TokenStoreError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            ensure_private_dir(parent).map_err(write_err)?;
        }
        let data = serde_json::to_vec_pretty(tokens).map_err(TokenStoreError::Encode)?;
        atomic_write(&self.path, &data).map_err(write_err)?;
        tracing::debug!(path = %self.path.display(), "Saved session tokens");
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        let removed = remove_if_exists(&self.path).map_err(|source| TokenStoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        if removed {
            tracing::debug!(path = %self.path.display(), "Removed session tokens");
        }
        Ok(())
    }
}

/// In-process store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<Option<TokenPair>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_tokens(tokens: TokenPair) -> Self {
        Self {
            tokens: Mutex::new(Some(tokens)),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<TokenPair> {
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<TokenPair>, TokenStoreError> {
        Ok(self.snapshot())
    }

    fn save(&self, tokens: &TokenPair) -> Result<(), TokenStoreError> {
        *self.tokens.lock().unwrap_or_else(PoisonError::into_inner) = Some(tokens.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        *self.tokens.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
