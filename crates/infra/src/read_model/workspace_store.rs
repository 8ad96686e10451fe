use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Storage for disposable read models, partitioned by workspace id.
///
/// A record written under one workspace is never listed under another.
pub trait WorkspaceStore<K, V>: Send + Sync {
    /// Insert or replace the record at `key`, returning the one it replaced.
    fn upsert(&self, workspace_id: &str, key: K, value: V) -> Option<V>;

    /// Every record of one workspace, in no particular order.
    fn list(&self, workspace_id: &str) -> Vec<V>;
}

/// In-memory store for tests and single-node deployments.
///
/// A writer that panicked mid-update does not lose later writes: the
/// partition map is recovered from a poisoned lock.
#[derive(Debug)]
pub struct InMemoryWorkspaceStore<K, V> {
    partitions: Mutex<HashMap<String, HashMap<K, V>>>,
}

impl<K, V> Default for InMemoryWorkspaceStore<K, V> {
    fn default() -> Self {
        Self {
            partitions: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> InMemoryWorkspaceStore<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held for one workspace.
    pub fn len(&self, workspace_id: &str) -> usize {
        self.partitions().get(workspace_id).map_or(0, HashMap::len)
    }

    fn partitions(&self) -> MutexGuard<'_, HashMap<String, HashMap<K, V>>> {
        self.partitions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K, V> WorkspaceStore<K, V> for InMemoryWorkspaceStore<K, V>
where
    K: Eq + Hash + Send,
    V: Clone + Send,
{
    fn upsert(&self, workspace_id: &str, key: K, value: V) -> Option<V> {
        self.partitions()
            .entry(workspace_id.to_string())
            .or_default()
            .insert(key, value)
    }

    fn list(&self, workspace_id: &str) -> Vec<V> {
        self.partitions()
            .get(workspace_id)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default()
    }
}
