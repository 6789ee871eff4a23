//! Persistence collaborator.
//!
//! Handlers talk to storage through [`Repository`]; the server ships the
//! in-memory implementation in [`memory`]. Records cross the trait boundary
//! as typed values, while filtering and partial updates work on their JSON
//! form so one implementation serves every resource.

pub mod memory;
pub mod query;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub use memory::InMemoryRepository;
pub use query::{Condition, ListQuery, SortKey};

/// Repository operation result.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Repository errors.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("duplicate {field}: {value}")]
    Duplicate { field: &'static str, value: String },
    #[error("invalid update: {0}")]
    Invalid(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A storable resource.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Singular resource name used in error messages.
    const RESOURCE: &'static str;

    fn id(&self) -> Uuid;

    /// Values that must be unique across the collection, tagged by field.
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

/// CRUD access to one resource collection.
#[async_trait]
pub trait Repository<T: Record>: Send + Sync {
    /// Records matching `query`, sorted and paginated.
    async fn find(&self, query: &ListQuery) -> RepositoryResult<Vec<T>>;

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<T>>;

    async fn create(&self, record: T) -> RepositoryResult<T>;

    /// Merge the fields of `patch` into the record. `None` when absent.
    async fn update(&self, id: Uuid, patch: Value) -> RepositoryResult<Option<T>>;

    /// `false` when nothing was deleted.
    async fn delete(&self, id: Uuid) -> RepositoryResult<bool>;

    /// First record whose `field` equals `value`.
    async fn find_one(&self, field: &str, value: Value) -> RepositoryResult<Option<T>> {
        let query = ListQuery::new()
            .filter(Condition::Eq(field.to_string(), value))
            .limit(1);
        Ok(self.find(&query).await?.into_iter().next())
    }
}
