use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::paging::CrmError;
use super::source::CrmSource;

/// Name reported for ids missing from the directory.
pub const UNKNOWN_OWNER: &str = "Unknown";

/// Snapshot of the CRM owner list: id -> display name.
#[derive(Debug, Clone, Default)]
pub struct OwnerMap {
    names: HashMap<String, String>,
}

impl OwnerMap {
    pub fn new(names: HashMap<String, String>) -> Self {
        Self { names }
    }

    pub fn resolve(&self, owner_id: &str) -> &str {
        self.names
            .get(owner_id)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_OWNER)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OwnerSummary {
    pub id: String,
    pub name: String,
}

/// Process-wide owner directory.
///
/// Filled once, on first use; concurrent first callers wait on the same load.
/// Only a complete listing is kept. A load that halted is served to its caller
/// but not cached, so the next caller fetches again. Once kept, the snapshot
/// is never refreshed and owners added in the CRM later show up as
/// [`UNKNOWN_OWNER`] until restart.
pub struct OwnerDirectory {
    source: Arc<dyn CrmSource>,
    cache: OnceCell<Arc<OwnerMap>>,
}

impl OwnerDirectory {
    pub fn new(source: Arc<dyn CrmSource>) -> Self {
        Self {
            source,
            cache: OnceCell::new(),
        }
    }

    pub async fn snapshot(&self) -> Arc<OwnerMap> {
        let loaded = self
            .cache
            .get_or_try_init(|| async move {
                let (owners, halt) = self.load().await;
                match halt {
                    None => Ok(Arc::new(owners)),
                    Some(halt) => Err((owners, halt)),
                }
            })
            .await;

        match loaded {
            Ok(owners) => owners.clone(),
            Err((partial, halt)) => {
                warn!(
                    "Owner listing incomplete ({} owners), not caching: {}",
                    partial.len(),
                    halt
                );
                Arc::new(partial)
            }
        }
    }

    pub async fn resolve(&self, owner_id: &str) -> String {
        self.snapshot().await.resolve(owner_id).to_string()
    }

    /// All owners, sorted by display name, blank names left out.
    pub async fn owners(&self) -> Vec<OwnerSummary> {
        let mut owners: Vec<OwnerSummary> = self
            .snapshot()
            .await
            .names
            .iter()
            .filter(|(_, name)| !name.is_empty())
            .map(|(id, name)| OwnerSummary {
                id: id.clone(),
                name: name.clone(),
            })
            .collect();
        owners.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        owners
    }

    pub fn is_loaded(&self) -> bool {
        self.cache.initialized()
    }

    async fn load(&self) -> (OwnerMap, Option<CrmError>) {
        let outcome = self.source.owners().await;
        let halt = outcome.halt;

        let names: HashMap<String, String> = outcome
            .records
            .into_iter()
            .map(|owner| {
                let name = owner.display_name();
                (owner.id, name)
            })
            .collect();

        if halt.is_none() {
            info!("Owner directory loaded with {} owners", names.len());
        }
        (OwnerMap::new(names), halt)
    }
}
