// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Temp-file store — staging area for conversion artifacts.
//
// Every artifact gets a uuid-named path so concurrent requests never collide.
// Files are not deleted after delivery; a periodic sweep reclaims anything
// older than the retention window. The sweep takes no locks against running
// requests — retention is orders of magnitude above any request lifetime.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use blattwerk_core::error::Result;
use blattwerk_core::types::{ArtifactId, DocumentType};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Staging directory for uploads and conversion results.
pub struct TempStore {
    root: PathBuf,
}

impl TempStore {
    /// Open (and create if needed) the store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        info!(root = %root.display(), "temp store ready");
        Ok(Self { root })
    }

    /// The store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// A fresh, collision-free path with the given extension (leading dot).
    pub fn unique_path(&self, ext: &str) -> PathBuf {
        self.root.join(format!("{}{ext}", ArtifactId::new()))
    }

    /// Write a finished conversion artifact and return its path.
    pub fn write_artifact(&self, bytes: &[u8], doc_type: DocumentType) -> Result<PathBuf> {
        let path = self.unique_path(doc_type.extension());
        std::fs::write(&path, bytes)?;
        debug!(path = %path.display(), bytes = bytes.len(), "artifact written");
        Ok(path)
    }

    /// Delete everything under the root older than `max_age` (by mtime).
    ///
    /// Individual failures are skipped, never fatal — a file may legitimately
    /// disappear between listing and deletion. Returns the number of entries
    /// removed.
    pub fn sweep(&self, max_age: Duration) -> usize {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(error = %err, root = %self.root.display(), "sweep cannot list temp dir");
                return 0;
            }
        };

        let now = std::time::SystemTime::now();
        let mut removed = 0;

        for entry in entries.flatten() {
            let path = entry.path();
            let age = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .ok()
                .and_then(|modified| now.duration_since(modified).ok());

            let Some(age) = age else { continue };
            if age < max_age {
                continue;
            }

            let result = if path.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
            match result {
                Ok(()) => removed += 1,
                Err(err) => debug!(path = %path.display(), error = %err, "sweep skip"),
            }
        }

        if removed > 0 {
            info!(removed, "sweep reclaimed stale artifacts");
        }
        removed
    }
}

/// Spawn the background cleanup task: sweep every `interval`, reclaiming
/// entries older than `max_age`. Runs for the lifetime of the process.
pub fn spawn_sweeper(
    store: Arc<TempStore>,
    interval: Duration,
    max_age: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The immediate first tick would sweep at startup before anything
        // can be stale; consume it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            store.sweep(max_age);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, TempStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = TempStore::new(dir.path()).expect("store");
        (dir, store)
    }

    #[test]
    fn unique_paths_do_not_collide() {
        let (_dir, store) = store();
        let first = store.unique_path(".pdf");
        let second = store.unique_path(".pdf");
        assert_ne!(first, second);
        assert!(first.to_string_lossy().ends_with(".pdf"));
    }

    #[test]
    fn write_artifact_lands_in_root_with_extension() {
        let (_dir, store) = store();
        let path = store
            .write_artifact(b"%PDF-1.5 stub", DocumentType::Pdf)
            .expect("write");
        assert!(path.exists());
        assert_eq!(path.parent(), Some(store.root()));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("pdf"));
    }

    #[test]
    fn sweep_removes_everything_with_zero_retention() {
        let (_dir, store) = store();
        store
            .write_artifact(b"stale", DocumentType::PlainText)
            .expect("write");
        std::fs::create_dir(store.root().join("request-folder")).expect("mkdir");

        let removed = store.sweep(Duration::ZERO);
        assert_eq!(removed, 2);
        assert_eq!(std::fs::read_dir(store.root()).unwrap().count(), 0);
    }

    #[test]
    fn sweep_keeps_fresh_files() {
        let (_dir, store) = store();
        let path = store
            .write_artifact(b"fresh", DocumentType::PlainText)
            .expect("write");

        let removed = store.sweep(Duration::from_secs(3600));
        assert_eq!(removed, 0);
        assert!(path.exists());
    }

    #[test]
    fn sweep_on_missing_root_is_harmless() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = TempStore::new(dir.path().join("sub")).expect("store");
        std::fs::remove_dir_all(store.root()).expect("remove root");
        assert_eq!(store.sweep(Duration::ZERO), 0);
    }
}
