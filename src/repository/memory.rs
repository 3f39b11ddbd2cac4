//! In-memory rule repository.
//!
//! The reference implementation of `RuleRepository`: two maps behind
//! `RwLock`s, one for records and one head-predicate index. Also the
//! working set [`JsonRepository`](super::JsonRepository) loads into.

use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::rule::RuleId;
use crate::Result;
use super::{RuleRecord, RuleRepository};

/// In-memory rule store. Cloning shares the underlying maps.
#[derive(Clone, Default)]
pub struct MemoryRepository {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    records: RwLock<HashMap<RuleId, RuleRecord>>,
    /// head predicate → rule ids, insertion order
    by_head: RwLock<HashMap<String, Vec<RuleId>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record, replacing any record with the same id.
    pub fn insert(&self, record: RuleRecord) {
        let mut records = self.inner.records.write();
        let mut by_head = self.inner.by_head.write();
        if let Some(old) = records.remove(&record.id) {
            if let Some(ids) = by_head.get_mut(&old.head) {
                ids.retain(|id| *id != old.id);
            }
        }
        by_head.entry(record.head.clone()).or_default().push(record.id.clone());
        records.insert(record.id.clone(), record);
    }

    pub fn remove(&self, id: &str) -> Option<RuleRecord> {
        let mut records = self.inner.records.write();
        let old = records.remove(id)?;
        if let Some(ids) = self.inner.by_head.write().get_mut(&old.head) {
            ids.retain(|i| i != id);
        }
        Some(old)
    }

    /// Every record, sorted by id.
    pub fn records(&self) -> Vec<RuleRecord> {
        let mut records: Vec<RuleRecord> = self.inner.records.read().values().cloned().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }
}

impl RuleRepository for MemoryRepository {
    fn by_head_predicate(&self, predicate: &str) -> Result<Vec<RuleId>> {
        Ok(self.inner.by_head.read().get(predicate).cloned().unwrap_or_default())
    }

    fn get(&self, id: &str) -> Result<Option<RuleRecord>> {
        Ok(self.inner.records.read().get(id).cloned())
    }

    fn len(&self) -> usize {
        self.inner.records.read().len()
    }
}

impl std::fmt::Debug for MemoryRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRepository").field("rules", &self.len()).finish()
    }
}
