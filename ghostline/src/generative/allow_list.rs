use crate::collaborator::Collaborator;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Session-wide memo of "is this command resolvable on PATH".
///
/// Entries are never evicted; PATH is assumed stable for the session.
#[derive(Debug, Default)]
pub struct AllowListCache {
    entries: RwLock<HashMap<String, bool>>,
}

impl AllowListCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.entries.read().get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look `name` up, asking the collaborator once on a miss.
    ///
    /// A failed lookup counts as "not resolvable" and is not remembered.
    pub async fn resolve(&self, name: &str, collaborator: &dyn Collaborator) -> bool {
        if let Some(hit) = self.get(name) {
            return hit;
        }
        match collaborator.is_executable_on_path(name).await {
            Ok(found) => {
                debug!(command = name, found, "allow-list lookup");
                self.entries.write().insert(name.to_string(), found);
                found
            }
            Err(err) => {
                warn!("PATH lookup for {name} failed: {err:?}");
                false
            }
        }
    }
}
