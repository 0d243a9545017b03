//! Per-call observation hooks.
//!
//! The engine allows a pluggable interception hook around every remote
//! call, used purely for observability. [`ObservedStore`] decorates any
//! [`RemoteStore`]; the observer sees operation name, target, status
//! and consumption cost, and can never alter request or response
//! semantics.

use crate::error::{EngineError, EngineResult};
use crate::store::{DocumentCursor, RemoteStore, ResourceResponse};
use async_trait::async_trait;
use serde_json::Value;
use shardstore_protocol::{
    ContainerHandle, ContainerSpec, DatabaseHandle, DatabaseSpec, FeedPage, PartitionKey, Query,
    ReadOptions, StoreStatus, StoredProcedureSpec, WriteOptions,
};
use std::sync::Arc;

/// One observed remote call.
#[derive(Debug, Clone)]
pub struct RequestCall {
    /// Operation name, e.g. `create_item`.
    pub operation: &'static str,
    /// The resource the call addressed (database, container, item id).
    pub target: String,
    /// Status of the response, when one was produced.
    pub status: Option<StoreStatus>,
    /// Consumption cost, where the store reports one (page fetches).
    pub request_charge: Option<f64>,
}

/// Observer invoked after every remote call.
pub trait RequestObserver: Send + Sync {
    /// Reports one completed call.
    fn observe(&self, call: &RequestCall);
}

/// An observer that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RequestObserver for NoopObserver {
    fn observe(&self, _call: &RequestCall) {}
}

/// A [`RemoteStore`] decorator reporting each call to an observer.
pub struct ObservedStore<S> {
    inner: S,
    observer: Arc<dyn RequestObserver>,
}

impl<S: RemoteStore> ObservedStore<S> {
    /// Wraps a store with the given observer.
    pub fn new(inner: S, observer: Arc<dyn RequestObserver>) -> Self {
        Self { inner, observer }
    }

    /// Returns the wrapped store.
    pub fn into_inner(self) -> S {
        self.inner
    }

    fn report(
        &self,
        operation: &'static str,
        target: impl Into<String>,
        status: Option<StoreStatus>,
        request_charge: Option<f64>,
    ) {
        self.observer.observe(&RequestCall {
            operation,
            target: target.into(),
            status,
            request_charge,
        });
    }

    fn status_of<T>(result: &EngineResult<T>, on_ok: impl Fn(&T) -> Option<StoreStatus>) -> Option<StoreStatus> {
        match result {
            Ok(value) => on_ok(value),
            Err(EngineError::Remote { status, .. }) => Some(*status),
            Err(_) => None,
        }
    }
}

#[async_trait]
impl<S: RemoteStore> RemoteStore for ObservedStore<S> {
    async fn create_database_if_not_exists(
        &self,
        spec: &DatabaseSpec,
    ) -> EngineResult<ResourceResponse<DatabaseHandle>> {
        let result = self.inner.create_database_if_not_exists(spec).await;
        let status = Self::status_of(&result, |r| Some(r.status));
        self.report("create_database_if_not_exists", &spec.id, status, None);
        result
    }

    async fn create_container_if_not_exists(
        &self,
        database: &DatabaseHandle,
        spec: &ContainerSpec,
    ) -> EngineResult<ResourceResponse<ContainerHandle>> {
        let result = self
            .inner
            .create_container_if_not_exists(database, spec)
            .await;
        let status = Self::status_of(&result, |r| Some(r.status));
        self.report(
            "create_container_if_not_exists",
            format!("{}/{}", database.database_id, spec.id),
            status,
            None,
        );
        result
    }

    async fn read_stored_procedure(
        &self,
        container: &ContainerHandle,
        procedure_id: &str,
    ) -> EngineResult<ResourceResponse<String>> {
        let result = self.inner.read_stored_procedure(container, procedure_id).await;
        let status = Self::status_of(&result, |r| Some(r.status));
        self.report(
            "read_stored_procedure",
            format!("{}/{}", container.container_id, procedure_id),
            status,
            None,
        );
        result
    }

    async fn create_stored_procedure(
        &self,
        container: &ContainerHandle,
        spec: &StoredProcedureSpec,
    ) -> EngineResult<StoreStatus> {
        let result = self.inner.create_stored_procedure(container, spec).await;
        let status = Self::status_of(&result, |s| Some(*s));
        self.report(
            "create_stored_procedure",
            format!("{}/{}", container.container_id, spec.id),
            status,
            None,
        );
        result
    }

    async fn replace_stored_procedure(
        &self,
        container: &ContainerHandle,
        spec: &StoredProcedureSpec,
    ) -> EngineResult<StoreStatus> {
        let result = self.inner.replace_stored_procedure(container, spec).await;
        let status = Self::status_of(&result, |s| Some(*s));
        self.report(
            "replace_stored_procedure",
            format!("{}/{}", container.container_id, spec.id),
            status,
            None,
        );
        result
    }

    async fn create_item(
        &self,
        container: &ContainerHandle,
        item: Value,
        partition_key: &PartitionKey,
        options: &WriteOptions,
    ) -> EngineResult<StoreStatus> {
        let result = self
            .inner
            .create_item(container, item, partition_key, options)
            .await;
        let status = Self::status_of(&result, |s| Some(*s));
        self.report("create_item", &container.container_id, status, None);
        result
    }

    async fn execute_stored_procedure(
        &self,
        container: &ContainerHandle,
        procedure_id: &str,
        partition_key: &PartitionKey,
        args: Vec<Value>,
    ) -> EngineResult<Value> {
        let result = self
            .inner
            .execute_stored_procedure(container, procedure_id, partition_key, args)
            .await;
        let status = Self::status_of(&result, |_| Some(StoreStatus::Ok));
        self.report(
            "execute_stored_procedure",
            format!("{}/{}", container.container_id, procedure_id),
            status,
            None,
        );
        result
    }

    async fn query_items(
        &self,
        container: &ContainerHandle,
        query: &Query,
        options: &ReadOptions,
    ) -> EngineResult<Box<dyn DocumentCursor>> {
        let result = self.inner.query_items(container, query, options).await;
        let status = Self::status_of(&result, |_| None);
        self.report("query_items", &container.container_id, status, None);

        match result {
            Ok(cursor) => Ok(Box::new(ObservedCursor {
                inner: cursor,
                observer: Arc::clone(&self.observer),
                target: container.container_id.clone(),
            })),
            Err(e) => Err(e),
        }
    }
}

/// Cursor decorator reporting each page fetch with its charge.
struct ObservedCursor {
    inner: Box<dyn DocumentCursor>,
    observer: Arc<dyn RequestObserver>,
    target: String,
}

#[async_trait]
impl DocumentCursor for ObservedCursor {
    fn has_more(&self) -> bool {
        self.inner.has_more()
    }

    async fn fetch_next(&mut self) -> EngineResult<FeedPage> {
        let result = self.inner.fetch_next().await;
        let (status, charge) = match &result {
            Ok(page) => (Some(page.status), Some(page.request_charge)),
            Err(EngineError::Remote { status, .. }) => (Some(*status), None),
            Err(_) => (None, None),
        };
        self.observer.observe(&RequestCall {
            operation: "fetch_next",
            target: self.target.clone(),
            status,
            request_charge: charge,
        });
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Default)]
    struct RecordingObserver {
        calls: Mutex<Vec<RequestCall>>,
    }

    impl RequestObserver for RecordingObserver {
        fn observe(&self, call: &RequestCall) {
            self.calls.lock().push(call.clone());
        }
    }

    #[tokio::test]
    async fn observer_sees_one_entry_per_call() {
        let observer = Arc::new(RecordingObserver::default());
        let store = ObservedStore::new(MemoryStore::new(), observer.clone());

        let db = store
            .create_database_if_not_exists(&DatabaseSpec::new("db"))
            .await
            .unwrap()
            .resource
            .unwrap();
        store
            .create_container_if_not_exists(&db, &ContainerSpec::new("events", "/pk"))
            .await
            .unwrap();

        let calls = observer.calls.lock();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].operation, "create_database_if_not_exists");
        assert_eq!(calls[0].status, Some(StoreStatus::Created));
        assert_eq!(calls[1].operation, "create_container_if_not_exists");
        assert_eq!(calls[1].target, "db/events");
    }

    #[tokio::test]
    async fn observer_reports_page_charges() {
        let observer = Arc::new(RecordingObserver::default());
        let inner = MemoryStore::new();
        let store = ObservedStore::new(inner.clone(), observer.clone());

        let db = store
            .create_database_if_not_exists(&DatabaseSpec::new("db"))
            .await
            .unwrap()
            .resource
            .unwrap();
        let container = store
            .create_container_if_not_exists(&db, &ContainerSpec::new("events", "/pk"))
            .await
            .unwrap()
            .resource
            .unwrap();

        inner.seed_documents(
            &container,
            &"pk".into(),
            vec![json!({"id": 1}), json!({"id": 2})],
        );

        let mut cursor = store
            .query_items(&container, &Query::new("SELECT * FROM c"), &ReadOptions::new())
            .await
            .unwrap();
        while cursor.has_more() {
            cursor.fetch_next().await.unwrap();
        }

        let calls = observer.calls.lock();
        let fetches: Vec<_> = calls.iter().filter(|c| c.operation == "fetch_next").collect();
        assert_eq!(fetches.len(), 1);
        assert_eq!(fetches[0].request_charge, Some(2.0));
    }

    #[tokio::test]
    async fn observer_does_not_alter_results() {
        let observer = Arc::new(RecordingObserver::default());
        let store = ObservedStore::new(MemoryStore::new(), observer);

        // Errors pass through untouched.
        let result = store
            .read_stored_procedure(&ContainerHandle::new("db", "missing"), "p")
            .await;
        assert!(matches!(
            result,
            Err(EngineError::Remote {
                status: StoreStatus::NotFound,
                ..
            })
        ));
    }
}
