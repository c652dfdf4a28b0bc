//! Numeric identifier allocation.
//!
//! Drawing objects in a document carry integer ids (`wp:docPr/@id`) that must be
//! unique within a numbering scope. An [`IdScopes`] hands out ids per named scope
//! from a high-water mark: ids only grow, so an id is never handed out twice even if
//! the element that consumed it is later removed from the markup.

use std::collections::HashMap;

/// Named, independent id sequences.
#[derive(Debug, Default, Clone)]
pub struct IdScopes {
    /// Highest id issued or reserved per scope
    high_water: HashMap<String, u32>,
}

impl IdScopes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id in `scope`. The first id of an untouched scope is 1.
    ///
    /// Returns `None` once `u32::MAX` has been issued or reserved.
    pub fn next_id(&mut self, scope: &str) -> Option<u32> {
        let slot = self.high_water.entry(scope.to_string()).or_insert(0);
        *slot = slot.checked_add(1)?;
        Some(*slot)
    }

    /// Mark `id` as used in `scope` so that later allocations stay above it.
    pub fn reserve(&mut self, scope: &str, id: u32) {
        let slot = self.high_water.entry(scope.to_string()).or_insert(0);
        if id > *slot {
            *slot = id;
        }
    }

    /// Highest id issued or reserved in `scope`, 0 when nothing was.
    pub fn high_water(&self, scope: &str) -> u32 {
        self.high_water.get(scope).copied().unwrap_or(0)
    }
}
