//! In-memory repository implementation.

use super::{ListQuery, Record, Repository, RepositoryError, RepositoryResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

/// Vec-backed store, kept in insertion order.
pub struct InMemoryRepository<T> {
    records: RwLock<Vec<T>>,
}

impl<T: Record> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Store pre-built records, skipping uniqueness checks.
    pub fn with_records(records: Vec<T>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn check_unique(records: &[T], candidate: &T) -> RepositoryResult<()> {
        let keys = candidate.unique_keys();
        for other in records.iter().filter(|r| r.id() != candidate.id()) {
            for (field, value) in other.unique_keys() {
                if keys.iter().any(|(f, v)| *f == field && *v == value) {
                    return Err(RepositoryError::Duplicate { field, value });
                }
            }
        }
        Ok(())
    }
}

impl<T: Record> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Merge top-level fields of `patch` into `record`. The id never changes.
fn apply_patch<T: Record>(record: &T, patch: &Value) -> RepositoryResult<T> {
    let Value::Object(fields) = patch else {
        return Err(RepositoryError::Invalid("patch must be an object".into()));
    };

    let mut current = serde_json::to_value(record)?;
    if let Value::Object(target) = &mut current {
        for (key, value) in fields {
            if key != "id" {
                target.insert(key.clone(), value.clone());
            }
        }
    }

    serde_json::from_value(current).map_err(|e| RepositoryError::Invalid(e.to_string()))
}

#[async_trait]
impl<T: Record> Repository<T> for InMemoryRepository<T> {
    async fn find(&self, query: &ListQuery) -> RepositoryResult<Vec<T>> {
        let records = self.records.read();
        let serialized = records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;

        let hits = query.select(&serialized);
        debug!(resource = T::RESOURCE, matched = hits.len(), "Repository find");
        Ok(hits.into_iter().map(|i| records[i].clone()).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<T>> {
        Ok(self.records.read().iter().find(|r| r.id() == id).cloned())
    }

    async fn create(&self, record: T) -> RepositoryResult<T> {
        let mut records = self.records.write();
        Self::check_unique(&records, &record)?;
        records.push(record.clone());
        debug!(resource = T::RESOURCE, id = %record.id(), "Record created");
        Ok(record)
    }

    async fn update(&self, id: Uuid, patch: Value) -> RepositoryResult<Option<T>> {
        let mut records = self.records.write();
        let Some(index) = records.iter().position(|r| r.id() == id) else {
            return Ok(None);
        };

        let updated = apply_patch(&records[index], &patch)?;
        Self::check_unique(&records, &updated)?;
        records[index] = updated.clone();
        debug!(resource = T::RESOURCE, id = %id, "Record updated");
        Ok(Some(updated))
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<bool> {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|r| r.id() != id);
        Ok(records.len() < before)
    }
}
