use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::errors::IngestResult;
use crate::storage::key::{cache_key, file_name};
use crate::storage::traits::{CacheEntry, CacheStore, ContentKind};

/// One file per locator under `dir`, named `{sha256}.{suffix}`.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    dir: PathBuf,
    enabled: bool,
}

impl FileCacheStore {
    pub fn new<P: AsRef<Path>>(dir: P, enabled: bool) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            enabled,
        }
    }

    pub fn disabled() -> Self {
        Self::new(".cache", false)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, locator: &str, kind: ContentKind) -> PathBuf {
        self.dir.join(file_name(locator, kind))
    }

    /// Remove every cached file. Operators call this out-of-band.
    pub fn clear(&self) -> IngestResult<usize> {
        if !self.enabled || !self.dir.exists() {
            return Ok(0);
        }

        let mut count = 0;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                fs::remove_file(entry.path())?;
                count += 1;
            }
        }

        debug!(dir = %self.dir.display(), removed = count, "cache cleared");
        Ok(count)
    }

    // Write to a sibling temp file, then rename over the target so readers
    // only ever see a complete payload.
    fn write_atomic(&self, target: &Path, payload: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(payload.as_bytes())?;
        tmp.flush()?;
        tmp.persist(target).map_err(|e| e.error)?;
        Ok(())
    }

    fn read(&self, path: &Path, locator: &str) -> Option<String> {
        match fs::read_to_string(path) {
            Ok(payload) => Some(payload),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(locator, error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }
}

impl CacheStore for FileCacheStore {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn get(&self, locator: &str, kind: ContentKind) -> Option<String> {
        if !self.enabled {
            return None;
        }

        let payload = self.read(&self.path_for(locator, kind), locator)?;
        debug!(locator, "cache hit");
        Some(payload)
    }

    fn set(&self, locator: &str, payload: &str, kind: ContentKind) {
        if !self.enabled {
            return;
        }

        let target = self.path_for(locator, kind);
        match self.write_atomic(&target, payload) {
            Ok(()) => debug!(locator, bytes = payload.len(), "cache save"),
            Err(e) => warn!(locator, error = %e, "cache write failed, entry left untouched"),
        }
    }

    fn entry(&self, locator: &str, kind: ContentKind) -> Option<CacheEntry> {
        if !self.enabled {
            return None;
        }

        let path = self.path_for(locator, kind);
        let payload = self.read(&path, locator)?;
        let stored_at = fs::metadata(&path)
            .and_then(|m| m.modified())
            .map(DateTime::<Utc>::from)
            .ok()?;

        Some(CacheEntry {
            key: cache_key(locator),
            kind,
            payload,
            stored_at,
        })
    }
}
