//! store::memory
//!
//! In-memory content store for deterministic testing.
//!
//! # Design
//!
//! Objects live in a `BTreeMap` keyed by location. Version tokens are a
//! global write sequence number, so every write produces a fresh token.
//! Failures can be injected per location and every call is recorded.
//!
//! # Example
//!
//! ```
//! use linkcode::core::layout::Location;
//! use linkcode::store::memory::MemoryStore;
//! use linkcode::store::{ContentStore, Precondition};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let store = MemoryStore::new();
//! let loc = Location::from_segments(&["a.json"]);
//!
//! store.write(&loc, b"{}", "create", Precondition::Absent).await.unwrap();
//! assert_eq!(store.read(&loc).await.unwrap().unwrap().bytes, b"{}");
//! # });
//! ```

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::traits::{ContentStore, Precondition, StoreError, StoredObject, Version};
use crate::core::layout::Location;

/// In-memory store.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    objects: BTreeMap<String, (Vec<u8>, Version)>,
    sequence: u64,
    fail_on: Vec<FailOn>,
    operations: Vec<MemoryOperation>,
}

/// Injected failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailOn {
    /// Reject the next `times` conditional writes to `location` as conflicts.
    Conflict { location: String, times: usize },
    /// Fail every write to `location`.
    Write { location: String },
    /// Fail every read of `location`.
    Read { location: String },
}

/// Recorded call for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryOperation {
    Read {
        location: String,
    },
    Write {
        location: String,
        message: String,
        precondition: Precondition,
    },
    List {
        prefix: String,
    },
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an injected failure.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.inner.lock().unwrap().fail_on.push(fail_on);
        self
    }

    /// Clear all injected failures.
    pub fn clear_fail_on(&self) {
        self.inner.lock().unwrap().fail_on.clear();
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MemoryOperation> {
        self.inner.lock().unwrap().operations.clone()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        self.inner.lock().unwrap().operations.clear();
    }

    /// Locations of every stored object, sorted.
    pub fn locations(&self) -> Vec<String> {
        self.inner.lock().unwrap().objects.keys().cloned().collect()
    }

    /// Object content as UTF-8 (for test verification).
    pub fn get_string(&self, location: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .objects
            .get(location)
            .map(|(bytes, _)| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Insert an object directly, bypassing preconditions.
    pub fn put(&self, location: &str, bytes: &[u8]) {
        let mut inner = self.inner.lock().unwrap();
        inner.sequence += 1;
        let version = Version(format!("v{}", inner.sequence));
        inner
            .objects
            .insert(location.to_string(), (bytes.to_vec(), version));
    }

    /// Remove an object directly.
    pub fn remove(&self, location: &str) -> bool {
        self.inner.lock().unwrap().objects.remove(location).is_some()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn read(&self, location: &Location) -> Result<Option<StoredObject>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(MemoryOperation::Read {
            location: location.to_string(),
        });

        let fails = inner
            .fail_on
            .iter()
            .any(|f| matches!(f, FailOn::Read { location: l } if l == location.as_str()));
        if fails {
            return Err(StoreError::Injected {
                location: location.clone(),
                message: "read failure".into(),
            });
        }

        Ok(inner
            .objects
            .get(location.as_str())
            .map(|(bytes, version)| StoredObject {
                bytes: bytes.clone(),
                version: version.clone(),
            }))
    }

    async fn write(
        &self,
        location: &Location,
        bytes: &[u8],
        message: &str,
        precondition: Precondition,
    ) -> Result<Version, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(MemoryOperation::Write {
            location: location.to_string(),
            message: message.to_string(),
            precondition: precondition.clone(),
        });

        let key = location.as_str();
        if inner
            .fail_on
            .iter()
            .any(|f| matches!(f, FailOn::Write { location: l } if l == key))
        {
            return Err(StoreError::Injected {
                location: location.clone(),
                message: "write failure".into(),
            });
        }

        if precondition != Precondition::Any {
            for fail in inner.fail_on.iter_mut() {
                if let FailOn::Conflict { location: l, times } = fail {
                    if l.as_str() == key && *times > 0 {
                        *times -= 1;
                        return Err(StoreError::Conflict {
                            location: location.clone(),
                            message: "injected conflict".into(),
                        });
                    }
                }
            }
        }

        let current = inner.objects.get(key).map(|(_, v)| v.clone());
        let ok = match (&precondition, &current) {
            (Precondition::Any, _) => true,
            (Precondition::Absent, current) => current.is_none(),
            (Precondition::Matches(expected), Some(actual)) => expected == actual,
            (Precondition::Matches(_), None) => false,
        };
        if !ok {
            return Err(StoreError::Conflict {
                location: location.clone(),
                message: format!("precondition {:?} not met", precondition),
            });
        }

        inner.sequence += 1;
        let version = Version(format!("v{}", inner.sequence));
        inner
            .objects
            .insert(key.to_string(), (bytes.to_vec(), version.clone()));
        Ok(version)
    }

    async fn list(&self, prefix: &Location) -> Result<Vec<String>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(MemoryOperation::List {
            prefix: prefix.to_string(),
        });

        let dir = if prefix.as_str().is_empty() {
            String::new()
        } else {
            format!("{}/", prefix)
        };

        let mut names: Vec<String> = inner
            .objects
            .keys()
            .filter_map(|k| k.strip_prefix(dir.as_str()))
            .map(|rest| rest.split('/').next().unwrap_or(rest).to_string())
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(s: &str) -> Location {
        Location::from_segments(&[s])
    }

    #[tokio::test]
    async fn versions_change_on_every_write() {
        let store = MemoryStore::new();
        let v1 = store.write(&loc("a"), b"x", "m", Precondition::Any).await.unwrap();
        let v2 = store.write(&loc("a"), b"x", "m", Precondition::Any).await.unwrap();
        assert_ne!(v1, v2);
    }

    #[tokio::test]
    async fn preconditions() {
        let store = MemoryStore::new();
        let v = store.write(&loc("a"), b"1", "m", Precondition::Absent).await.unwrap();
        assert!(store
            .write(&loc("a"), b"2", "m", Precondition::Absent)
            .await
            .unwrap_err()
            .is_conflict());
        store
            .write(&loc("a"), b"3", "m", Precondition::Matches(v.clone()))
            .await
            .unwrap();
        assert!(store
            .write(&loc("a"), b"4", "m", Precondition::Matches(v))
            .await
            .unwrap_err()
            .is_conflict());
        assert_eq!(store.get_string("a").as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn injected_conflicts_are_consumed() {
        let store = MemoryStore::new().fail_on(FailOn::Conflict {
            location: "c".into(),
            times: 1,
        });
        let first = store.write(&loc("c"), b"1", "m", Precondition::Absent).await;
        assert!(first.unwrap_err().is_conflict());
        store
            .write(&loc("c"), b"1", "m", Precondition::Absent)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn injected_read_failure() {
        let store = MemoryStore::new().fail_on(FailOn::Read {
            location: "r".into(),
        });
        assert!(matches!(
            store.read(&loc("r")).await,
            Err(StoreError::Injected { .. })
        ));
        store.clear_fail_on();
        assert!(store.read(&loc("r")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_direct_children() {
        let store = MemoryStore::new();
        store.put("d/a.json", b"{}");
        store.put("d/b.json", b"{}");
        store.put("d/sub/c.json", b"{}");
        store.put("other.json", b"{}");

        assert_eq!(
            store.list(&loc("d")).await.unwrap(),
            vec!["a.json", "b.json", "sub"]
        );
        assert!(store.list(&loc("missing")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn records_operations() {
        let store = MemoryStore::new();
        store.read(&loc("x")).await.unwrap();
        store.list(&loc("y")).await.unwrap();
        assert_eq!(
            store.operations(),
            vec![
                MemoryOperation::Read {
                    location: "x".into()
                },
                MemoryOperation::List { prefix: "y".into() },
            ]
        );
    }
}
