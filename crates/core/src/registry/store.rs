//! Identifier-to-record map

use std::collections::HashMap;
use std::sync::Arc;

use memora_domain::FunctionId;
use parking_lot::RwLock;

use super::record::MemoInfo;
use crate::errors::MemoizeError;

/// Records of every memoized function, keyed by identity
///
/// Holds at most one record per identifier. Records of anonymous functions
/// keep the original alive, so its address stays a valid identity.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    records: RwLock<HashMap<FunctionId, Arc<MemoInfo>>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record under its identifier
    pub fn register(&self, record: MemoInfo) -> Result<Arc<MemoInfo>, MemoizeError> {
        let mut records = self.records.write();
        if records.contains_key(record.id()) {
            return Err(MemoizeError::AlreadyMemoized { id: record.id().clone() });
        }
        let record = Arc::new(record);
        records.insert(record.id().clone(), Arc::clone(&record));
        Ok(record)
    }

    pub fn lookup(&self, id: &FunctionId) -> Option<Arc<MemoInfo>> {
        self.records.read().get(id).cloned()
    }

    pub fn contains(&self, id: &FunctionId) -> bool {
        self.records.read().contains_key(id)
    }

    pub fn remove(&self, id: &FunctionId) -> Result<Arc<MemoInfo>, MemoizeError> {
        self.records
            .write()
            .remove(id)
            .ok_or_else(|| MemoizeError::NotMemoized { id: id.clone() })
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Snapshot of registered identifiers, sorted
    pub fn ids(&self) -> Vec<FunctionId> {
        let mut ids: Vec<FunctionId> = self.records.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Remove every record and hand them back
    pub fn clear(&self) -> Vec<Arc<MemoInfo>> {
        let mut records: Vec<Arc<MemoInfo>> =
            self.records.write().drain().map(|(_, record)| record).collect();
        records.sort_by(|a, b| a.id().cmp(b.id()));
        records
    }
}
