// Property Cache - values already observed for a node, per property and direction.
// Entries only ever grow: new values are appended, never reordered or evicted.

use std::collections::HashMap;
use tessera_common::Direction;
use super::Node;

#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct CacheKey {
    pub property: String,
    pub direction: Direction,
}

impl CacheKey {
    pub fn new(property: impl Into<String>, direction: Direction) -> Self {
        Self {
            property: property.into(),
            direction,
        }
    }
}

/// Owned by a single `Node`; the node's identity is the implicit third key part.
#[derive(Debug, Clone, Default)]
pub struct PropertyCache {
    entries: HashMap<CacheKey, Vec<Node>>,
}

impl PropertyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<&[Node]> {
        self.entries.get(key).map(|v| v.as_slice())
    }

    /// Number of values held for `key`.
    pub fn count(&self, key: &CacheKey) -> usize {
        self.entries.get(key).map_or(0, |v| v.len())
    }

    /// Returns the first `limit` values when the cache already holds at
    /// least that many, `None` when a fetch is needed.
    pub fn lookup(&self, key: &CacheKey, limit: usize) -> Option<Vec<Node>> {
        let held = self.count(key);
        if held >= limit {
            tracing::debug!(
                "Cache HIT for {}/{} (held={}, limit={})",
                key.property,
                key.direction.as_str(),
                held,
                limit
            );
            return Some(self.get(key).unwrap_or_default()[..limit].to_vec());
        }

        tracing::debug!(
            "Cache MISS for {}/{} (held={}, limit={})",
            key.property,
            key.direction.as_str(),
            held,
            limit
        );
        None
    }

    /// Appends every fetched node not already present (by node equality) and
    /// returns the first `limit` values of the grown entry.
    pub fn merge_and_truncate(&mut self, key: CacheKey, fetched: Vec<Node>, limit: usize) -> Vec<Node> {
        let entry = self.entries.entry(key).or_default();
        let before = entry.len();

        for node in fetched {
            if !entry.iter().any(|held| *held == node) {
                entry.push(node);
            }
        }

        tracing::debug!("Cache grew from {} to {} values", before, entry.len());
        entry.iter().take(limit).cloned().collect()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            values: self.entries.values().map(|v| v.len()).sum(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub values: usize,
}
