//! Remote store capability boundary.
//!
//! The engine consumes the document store through this narrow trait so
//! reconciliation and access logic can run against an in-memory fake
//! (see [`crate::MemoryStore`]) as well as a real network client. The
//! trait does not model the wire protocol; implementations own
//! connection management and transient-fault retry.

use crate::error::EngineResult;
use async_trait::async_trait;
use serde_json::Value;
use shardstore_protocol::{
    ContainerHandle, ContainerSpec, DatabaseHandle, DatabaseSpec, FeedPage, PartitionKey, Query,
    ReadOptions, StoreStatus, StoredProcedureSpec, WriteOptions,
};

/// A store response carrying a status and, when the call produced one,
/// a resource reference or payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceResponse<T> {
    /// Status of the call.
    pub status: StoreStatus,
    /// The resource, when the store returned one.
    pub resource: Option<T>,
}

impl<T> ResourceResponse<T> {
    /// Creates a response with a resource.
    pub fn new(status: StoreStatus, resource: T) -> Self {
        Self {
            status,
            resource: Some(resource),
        }
    }

    /// Creates a response with no resource.
    pub fn empty(status: StoreStatus) -> Self {
        Self {
            status,
            resource: None,
        }
    }
}

/// Client capability surface of the remote document store.
///
/// All operations are asynchronous and may fail with a remote fault
/// carrying a status code and diagnostics. Implementations must be safe
/// for concurrent use by many callers.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Creates the database if it does not exist, returning a reference
    /// either way when one is available.
    async fn create_database_if_not_exists(
        &self,
        spec: &DatabaseSpec,
    ) -> EngineResult<ResourceResponse<DatabaseHandle>>;

    /// Creates a container if it does not exist, returning a reference
    /// either way when one is available.
    async fn create_container_if_not_exists(
        &self,
        database: &DatabaseHandle,
        spec: &ContainerSpec,
    ) -> EngineResult<ResourceResponse<ContainerHandle>>;

    /// Reads a stored procedure's body by id.
    async fn read_stored_procedure(
        &self,
        container: &ContainerHandle,
        procedure_id: &str,
    ) -> EngineResult<ResourceResponse<String>>;

    /// Registers a new stored procedure.
    async fn create_stored_procedure(
        &self,
        container: &ContainerHandle,
        spec: &StoredProcedureSpec,
    ) -> EngineResult<StoreStatus>;

    /// Replaces an existing stored procedure's body.
    async fn replace_stored_procedure(
        &self,
        container: &ContainerHandle,
        spec: &StoredProcedureSpec,
    ) -> EngineResult<StoreStatus>;

    /// Writes a single document.
    async fn create_item(
        &self,
        container: &ContainerHandle,
        item: Value,
        partition_key: &PartitionKey,
        options: &WriteOptions,
    ) -> EngineResult<StoreStatus>;

    /// Executes a stored procedure within one partition, atomically.
    async fn execute_stored_procedure(
        &self,
        container: &ContainerHandle,
        procedure_id: &str,
        partition_key: &PartitionKey,
        args: Vec<Value>,
    ) -> EngineResult<Value>;

    /// Opens a query cursor over a container.
    async fn query_items(
        &self,
        container: &ContainerHandle,
        query: &Query,
        options: &ReadOptions,
    ) -> EngineResult<Box<dyn DocumentCursor>>;
}

/// A forward-only cursor over query result pages.
///
/// Cursors are consumed exactly once and cannot be rewound. After
/// exhaustion, `fetch_next` must return an empty page rather than fail.
#[async_trait]
pub trait DocumentCursor: Send {
    /// Returns true while more pages remain.
    fn has_more(&self) -> bool;

    /// Fetches the next page.
    async fn fetch_next(&mut self) -> EngineResult<FeedPage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_response_constructors() {
        let response = ResourceResponse::new(StoreStatus::Created, DatabaseHandle::new("orders"));
        assert_eq!(response.status, StoreStatus::Created);
        assert!(response.resource.is_some());

        let empty: ResourceResponse<DatabaseHandle> =
            ResourceResponse::empty(StoreStatus::ServiceUnavailable);
        assert!(empty.resource.is_none());
    }
}
