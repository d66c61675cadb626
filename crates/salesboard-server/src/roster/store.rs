//! RosterStore: the roster as one JSON document on disk.
//!
//! Reads load the whole document. Mutations go through a RosterTxn, which
//! holds the store's write lock from load until commit. Commits write a
//! sibling temp file and rename it over the document.

use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use super::error::RosterError;
use super::models::Roster;

pub struct RosterStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl RosterStore {
    /// Open the store, creating an empty document (and its directory) if needed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, RosterError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| RosterError::io(parent, e))?;
        }

        if !fs::try_exists(&path)
            .await
            .map_err(|e| RosterError::io(&path, e))?
        {
            fs::write(&path, "{}")
                .await
                .map_err(|e| RosterError::io(&path, e))?;
            info!("Created empty roster at {}", path.display());
        }

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<Roster, RosterError> {
        let json = fs::read_to_string(&self.path)
            .await
            .map_err(|e| RosterError::io(&self.path, e))?;
        if json.trim().is_empty() {
            return Ok(Roster::new());
        }
        Ok(serde_json::from_str(&json)?)
    }

    /// Lock the document for a read-modify-write cycle.
    pub async fn begin(&self) -> Result<RosterTxn<'_>, RosterError> {
        let guard = self.write_lock.lock().await;
        let roster = self.load().await?;
        Ok(RosterTxn {
            _guard: guard,
            store: self,
            roster,
        })
    }

    async fn write(&self, roster: &Roster) -> Result<(), RosterError> {
        let json = serde_json::to_string_pretty(roster)?;
        let tmp = self.path.with_extension("json.tmp");

        fs::write(&tmp, json)
            .await
            .map_err(|e| RosterError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| RosterError::io(&self.path, e))?;

        debug!("Roster saved with {} entries", roster.len());
        Ok(())
    }
}

/// Exclusive view of the roster; dropped without `commit`, nothing is written.
pub struct RosterTxn<'a> {
    _guard: MutexGuard<'a, ()>,
    store: &'a RosterStore,
    roster: Roster,
}

impl RosterTxn<'_> {
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn roster_mut(&mut self) -> &mut Roster {
        &mut self.roster
    }

    pub async fn commit(self) -> Result<(), RosterError> {
        self.store.write(&self.roster).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::models::RosterEntry;
    use std::sync::Arc;

    fn entry(short: &str) -> RosterEntry {
        RosterEntry {
            short: short.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_open_creates_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");

        let store = RosterStore::open(&path).await.unwrap();
        assert!(store.load().await.unwrap().is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_commit_persists_in_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = RosterStore::open(dir.path().join("data.json")).await.unwrap();

        let mut txn = store.begin().await.unwrap();
        txn.roster_mut().insert("Zed Zulu".to_string(), entry("ZZ"));
        txn.roster_mut().insert("Amy Alpha".to_string(), entry("AA"));
        txn.commit().await.unwrap();

        let names: Vec<String> = store.load().await.unwrap().keys().cloned().collect();
        assert_eq!(names, vec!["Zed Zulu", "Amy Alpha"]);
    }

    #[tokio::test]
    async fn test_dropped_txn_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = RosterStore::open(dir.path().join("data.json")).await.unwrap();

        {
            let mut txn = store.begin().await.unwrap();
            txn.roster_mut().insert("Ghost".to_string(), entry("G"));
        }

        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_edits_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(RosterStore::open(dir.path().join("data.json")).await.unwrap());

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let mut txn = store.begin().await.unwrap();
                    txn.roster_mut()
                        .insert(format!("Person {}", i), entry(&format!("P{}", i)));
                    txn.commit().await.unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.load().await.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_corrupt_document_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = RosterStore::open(&path).await.unwrap();
        assert!(matches!(store.load().await, Err(RosterError::Json(_))));
    }
}
