//! Per-request scratch workspace. An in-memory registry of active request
//! keys is the concurrency lock; the directory on disk is staging only.

use crate::utils::error::{KinolistError, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const DOCX_NAME: &str = "list.docx";
pub const PDF_NAME: &str = "list.pdf";

#[derive(Debug, Clone)]
pub struct RequestRegistry {
    base_dir: PathBuf,
    active: Arc<Mutex<HashSet<String>>>,
}

impl RequestRegistry {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Claim `key` and create its scratch directory. A second concurrent
    /// request for the same key is rejected immediately, first-writer-wins.
    /// A stale directory whose key is not active is leftover staging from a
    /// crashed run and gets replaced.
    pub fn begin(&self, key: &str) -> Result<RequestGuard> {
        {
            let mut active = self.active.lock().unwrap();
            if !active.insert(key.to_string()) {
                return Err(KinolistError::RequestInProgress {
                    key: key.to_string(),
                });
            }
        }

        let dir = self.base_dir.join(key);
        let prepared = prepare_dir(&dir);
        if let Err(err) = prepared {
            self.active.lock().unwrap().remove(key);
            return Err(err);
        }

        Ok(RequestGuard {
            key: key.to_string(),
            dir,
            active: Arc::clone(&self.active),
        })
    }

    pub fn is_active(&self, key: &str) -> bool {
        self.active.lock().unwrap().contains(key)
    }
}

fn prepare_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        tracing::warn!("Removing stale scratch directory {}", dir.display());
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

/// Exclusive ownership of one request's scratch directory. Dropping the
/// guard deletes the directory and releases the key.
#[derive(Debug)]
pub struct RequestGuard {
    key: String,
    dir: PathBuf,
    active: Arc<Mutex<HashSet<String>>>,
}

impl RequestGuard {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn docx_path(&self) -> PathBuf {
        self.dir.join(DOCX_NAME)
    }

    pub fn pdf_path(&self) -> PathBuf {
        self.dir.join(PDF_NAME)
    }

    /// Explicit cleanup after artifact delivery; identical to dropping.
    pub fn finish(self) {}
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_dir_all(&self.dir) {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    "Could not remove scratch directory {}: {}",
                    self.dir.display(),
                    err
                );
            }
        }
        self.active.lock().unwrap().remove(&self.key);
    }
}
