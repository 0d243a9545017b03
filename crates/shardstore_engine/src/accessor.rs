//! Per-container data access.
//!
//! A [`ContainerAccessor`] owns one container's spec and its lazily
//! bound handle. The handle goes through an explicit two-phase
//! lifecycle: `Unbound` until schema reconciliation publishes it, then
//! `Bound` for the rest of the process lifetime. Every data operation
//! checks the binding and fails with a named precondition error, never
//! a null fault or a silent no-op.

use crate::bulk::BulkWriteCoordinator;
use crate::error::{EngineError, EngineResult};
use crate::paged;
use crate::reconcile::SchemaReconciler;
use crate::store::{DocumentCursor, RemoteStore};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use shardstore_protocol::{
    BulkWriteOutcome, ContainerHandle, ContainerSpec, DatabaseHandle, PagedReadResult,
    PartitionKey, Query, ReadOptions, WriteOptions,
};
use std::sync::Arc;

/// Binding state of a container handle.
enum Binding {
    Unbound,
    Bound(ContainerHandle),
}

/// Facade over one logical container.
///
/// Written once by reconciliation, read many times afterwards; the
/// binding lock is only ever contended during startup.
pub struct ContainerAccessor<S: RemoteStore> {
    store: Arc<S>,
    spec: ContainerSpec,
    binding: RwLock<Binding>,
}

impl<S: RemoteStore> ContainerAccessor<S> {
    /// Creates an unbound accessor for the given container spec.
    pub fn new(store: Arc<S>, spec: ContainerSpec) -> Self {
        Self {
            store,
            spec,
            binding: RwLock::new(Binding::Unbound),
        }
    }

    /// The container's desired-state spec.
    pub fn spec(&self) -> &ContainerSpec {
        &self.spec
    }

    /// Returns true once reconciliation has bound the handle.
    pub fn is_bound(&self) -> bool {
        matches!(*self.binding.read(), Binding::Bound(_))
    }

    /// Returns the bound handle, or a precondition error when schema
    /// reconciliation has not completed for this container.
    pub fn handle(&self) -> EngineResult<ContainerHandle> {
        match &*self.binding.read() {
            Binding::Bound(handle) => Ok(handle.clone()),
            Binding::Unbound => Err(EngineError::NotBound {
                container_id: self.spec.id.clone(),
            }),
        }
    }

    /// Publishes the handle. Called by reconciliation, exactly once per
    /// pass; later passes republish the same handle.
    pub(crate) fn bind(&self, handle: ContainerHandle) {
        *self.binding.write() = Binding::Bound(handle);
    }

    /// Reconciles this container (creation, stored procedures) against
    /// the given database and binds the handle.
    pub async fn create_if_not_exists(&self, database: &DatabaseHandle) -> EngineResult<()> {
        SchemaReconciler::new(Arc::clone(&self.store))
            .reconcile_container(database, self)
            .await
    }

    /// Runs a query to exhaustion and returns the aggregated result.
    ///
    /// A session token in `options` is treated as the caller's override
    /// for the result's session state.
    pub async fn read_page<T: DeserializeOwned>(
        &self,
        query: &Query,
        options: &ReadOptions,
    ) -> EngineResult<PagedReadResult<T>> {
        let handle = self.handle()?;
        let cursor = self.store.query_items(&handle, query, options).await?;
        paged::drain(cursor, options.session_token.clone()).await
    }

    /// Drains an already-open cursor (e.g. a change-feed style
    /// iterator) into one aggregated result.
    pub async fn read_from_cursor<T: DeserializeOwned>(
        &self,
        cursor: Box<dyn DocumentCursor>,
        session_token: Option<String>,
    ) -> EngineResult<PagedReadResult<T>> {
        self.handle()?;
        paged::drain(cursor, session_token).await
    }

    /// Writes many documents concurrently with per-item failure
    /// isolation. See [`BulkWriteCoordinator`].
    pub async fn store_many<T: Serialize>(
        &self,
        items: &[T],
        partition_key: &PartitionKey,
        options: &WriteOptions,
    ) -> EngineResult<BulkWriteOutcome> {
        let handle = self.handle()?;
        let documents = self.to_documents(items)?;

        Ok(BulkWriteCoordinator::new(self.store.as_ref(), &handle)
            .write(documents, partition_key, options)
            .await)
    }

    /// Delegates an entire batch to one server-side stored procedure
    /// invocation scoped to the partition key.
    ///
    /// All-or-nothing from the caller's perspective: one remote call,
    /// one result. An empty `procedure_id` is a caller contract
    /// violation.
    pub async fn store_many_via_procedure<T: Serialize>(
        &self,
        items: &[T],
        partition_key: &PartitionKey,
        procedure_id: &str,
    ) -> EngineResult<BulkWriteOutcome> {
        if procedure_id.trim().is_empty() {
            return Err(EngineError::invalid_argument(
                "a stored procedure id is required for the stored-procedure write path",
            ));
        }

        let handle = self.handle()?;
        let documents = self.to_documents(items)?;
        let requested = documents.len();

        self.store
            .execute_stored_procedure(
                &handle,
                procedure_id,
                partition_key,
                vec![Value::Array(documents)],
            )
            .await?;

        Ok(BulkWriteOutcome::new(requested, requested))
    }

    fn to_documents<T: Serialize>(&self, items: &[T]) -> EngineResult<Vec<Value>> {
        items
            .iter()
            .map(|item| serde_json::to_value(item).map_err(EngineError::from))
            .collect()
    }
}
