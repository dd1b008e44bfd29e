//! store::local
//!
//! Filesystem-backed content store.
//!
//! # Storage
//!
//! Each location maps to a file under the configured root, with
//! intermediate directories created on write:
//!
//! - `<root>/<location>` - object bytes
//! - `<root>/.lock` - OS-level exclusive lock held during writes
//!
//! # Invariants
//!
//! - Writes are atomic (temp file + rename); readers never see partial JSON
//! - Precondition check and write happen under the same lock, so two
//!   processes cannot both win a compare-and-swap on one object
//! - Version tokens are the SHA-256 of the file content
//!
//! # Runtime
//!
//! File I/O and lock waits run on tokio's blocking pool, so a writer
//! waiting on another process never stalls the async executor.
//!
//! # Example
//!
//! ```ignore
//! use linkcode::store::local::LocalStore;
//!
//! let store = LocalStore::new("data");
//! let obj = store.read(&layout.root_counter()).await?;
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;
use sha2::{Digest, Sha256};

use super::traits::{ContentStore, Precondition, StoreError, StoredObject, Version};
use crate::core::layout::Location;

/// Name of the lock file under the root.
const LOCK_FILE: &str = ".lock";

/// Suffix of in-flight temp files.
const TEMP_SUFFIX: &str = ".tmp";

/// Content store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

/// Exclusive lock on the store root, released on drop.
struct RootLock {
    file: File,
}

impl Drop for RootLock {
    fn drop(&mut self) {
        // Best-effort release on drop
        let _ = self.file.unlock();
    }
}

impl LocalStore {
    /// Create a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a location to a filesystem path.
    fn path_for(&self, location: &Location) -> Result<PathBuf, StoreError> {
        let mut path = self.root.clone();
        for seg in location.segments() {
            if seg == "." || seg == ".." {
                return Err(StoreError::Io {
                    location: location.clone(),
                    source: std::io::Error::new(
                        ErrorKind::InvalidInput,
                        "relative segment in location",
                    ),
                });
            }
            path.push(seg);
        }
        Ok(path)
    }

    fn io_err(location: &Location) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
        move |source| StoreError::Io {
            location: location.clone(),
            source,
        }
    }

    /// Block until the root lock is held.
    fn lock(&self, location: &Location) -> Result<RootLock, StoreError> {
        fs::create_dir_all(&self.root).map_err(Self::io_err(location))?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.root.join(LOCK_FILE))
            .map_err(Self::io_err(location))?;
        file.lock_exclusive().map_err(Self::io_err(location))?;
        Ok(RootLock { file })
    }

    fn read_file(path: &Path, location: &Location) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            // A directory at an object location reads as absent, like a missing file
            Err(_) if path.is_dir() => Ok(None),
            Err(e) => Err(Self::io_err(location)(e)),
        }
    }

    fn write_atomic(path: &Path, bytes: &[u8], location: &Location) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(Self::io_err(location))?;
        }

        let mut temp = path.as_os_str().to_owned();
        temp.push(TEMP_SUFFIX);
        let temp = PathBuf::from(temp);

        let mut file = File::create(&temp).map_err(Self::io_err(location))?;
        file.write_all(bytes).map_err(Self::io_err(location))?;
        file.sync_all().map_err(Self::io_err(location))?;

        fs::rename(&temp, path).map_err(Self::io_err(location))
    }
}

/// Version token for local content.
pub fn content_version(bytes: &[u8]) -> Version {
    Version(hex::encode(Sha256::digest(bytes)))
}

impl LocalStore {
    fn read_blocking(&self, location: &Location) -> Result<Option<StoredObject>, StoreError> {
        let path = self.path_for(location)?;
        Ok(Self::read_file(&path, location)?.map(|bytes| StoredObject {
            version: content_version(&bytes),
            bytes,
        }))
    }

    fn write_blocking(
        &self,
        location: &Location,
        bytes: &[u8],
        precondition: Precondition,
    ) -> Result<Version, StoreError> {
        let path = self.path_for(location)?;
        let _lock = self.lock(location)?;

        let current = Self::read_file(&path, location)?.map(|b| content_version(&b));
        match (&precondition, &current) {
            (Precondition::Any, _) => {}
            (Precondition::Absent, None) => {}
            (Precondition::Absent, Some(_)) => {
                return Err(StoreError::Conflict {
                    location: location.clone(),
                    message: "object already exists".into(),
                })
            }
            (Precondition::Matches(expected), Some(actual)) if expected == actual => {}
            (Precondition::Matches(expected), actual) => {
                return Err(StoreError::Conflict {
                    location: location.clone(),
                    message: format!(
                        "expected version {}, found {}",
                        expected,
                        actual.as_ref().map_or("nothing", |v| v.as_str())
                    ),
                })
            }
        }

        Self::write_atomic(&path, bytes, location)?;
        Ok(content_version(bytes))
    }

    fn list_blocking(&self, prefix: &Location) -> Result<Vec<String>, StoreError> {
        let dir = self.path_for(prefix)?;
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&dir).map_err(Self::io_err(prefix))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(Self::io_err(prefix))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') || name.ends_with(TEMP_SUFFIX) {
                continue;
            }
            names.push(name);
        }
        names.sort();
        Ok(names)
    }
}

/// Run filesystem work on the blocking pool.
async fn run_blocking<T, F>(location: Location, work: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| StoreError::Io {
            location,
            source: std::io::Error::other(e),
        })?
}

#[async_trait]
impl ContentStore for LocalStore {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn read(&self, location: &Location) -> Result<Option<StoredObject>, StoreError> {
        let store = self.clone();
        let target = location.clone();
        run_blocking(location.clone(), move || store.read_blocking(&target)).await
    }

    async fn write(
        &self,
        location: &Location,
        bytes: &[u8],
        _message: &str,
        precondition: Precondition,
    ) -> Result<Version, StoreError> {
        let store = self.clone();
        let target = location.clone();
        let bytes = bytes.to_vec();
        run_blocking(location.clone(), move || {
            store.write_blocking(&target, &bytes, precondition)
        })
        .await
    }

    async fn list(&self, prefix: &Location) -> Result<Vec<String>, StoreError> {
        let store = self.clone();
        let target = prefix.clone();
        run_blocking(prefix.clone(), move || store.list_blocking(&target)).await
    }
}
