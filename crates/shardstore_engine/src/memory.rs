//! In-memory store implementation.
//!
//! [`MemoryStore`] implements the full [`RemoteStore`] surface against
//! process-local state. It backs the engine's test suite and doubles as
//! a reference for the trait's contract: status semantics, not-found
//! behavior, cursor paging. Fault injection hooks let tests engineer
//! the degraded paths the engine must absorb.

use crate::error::{EngineError, EngineResult};
use crate::store::{DocumentCursor, RemoteStore, ResourceResponse};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use shardstore_protocol::{
    ContainerHandle, ContainerSpec, DatabaseHandle, DatabaseSpec, FeedPage, PartitionKey, Query,
    ReadOptions, StoreStatus, StoredProcedureSpec, WriteOptions,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

#[derive(Default)]
struct MemoryContainer {
    partition_key_path: String,
    throughput: Option<u32>,
    procedures: HashMap<String, String>,
    documents: Vec<(String, Value)>,
}

#[derive(Default)]
struct MemoryDatabase {
    throughput: Option<u32>,
    containers: HashMap<String, MemoryContainer>,
}

#[derive(Default)]
struct Inner {
    databases: HashMap<String, MemoryDatabase>,
    journal: Vec<String>,
    mutations: u64,
    failing_item_ids: HashSet<String>,
    refuse_databases: bool,
    refuse_containers: bool,
    fail_procedure_writes: bool,
}

impl Inner {
    fn container_mut(
        &mut self,
        handle: &ContainerHandle,
    ) -> EngineResult<&mut MemoryContainer> {
        self.databases
            .get_mut(&handle.database_id)
            .and_then(|db| db.containers.get_mut(&handle.container_id))
            .ok_or_else(|| {
                EngineError::remote(
                    StoreStatus::NotFound,
                    format!(
                        "container '{}/{}' does not exist",
                        handle.database_id, handle.container_id
                    ),
                )
            })
    }
}

/// An in-memory document store.
///
/// Cheaply clonable; clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every call issued against the store, in order, as
    /// `operation:target` entries.
    pub fn journal(&self) -> Vec<String> {
        self.inner.read().journal.clone()
    }

    /// Returns how many calls mutated store state (creates, replaces,
    /// item writes). If-not-exists calls that found an existing
    /// resource do not count.
    pub fn mutation_count(&self) -> u64 {
        self.inner.read().mutations
    }

    /// Returns a container's documents in insertion order.
    pub fn documents(&self, database_id: &str, container_id: &str) -> Vec<Value> {
        self.inner
            .read()
            .databases
            .get(database_id)
            .and_then(|db| db.containers.get(container_id))
            .map(|c| c.documents.iter().map(|(_, doc)| doc.clone()).collect())
            .unwrap_or_default()
    }

    /// Returns a stored procedure's body, if registered.
    pub fn procedure_body(
        &self,
        database_id: &str,
        container_id: &str,
        procedure_id: &str,
    ) -> Option<String> {
        self.inner
            .read()
            .databases
            .get(database_id)
            .and_then(|db| db.containers.get(container_id))
            .and_then(|c| c.procedures.get(procedure_id).cloned())
    }

    /// Returns the partition key path a container was created with.
    pub fn partition_key_path(&self, database_id: &str, container_id: &str) -> Option<String> {
        self.inner
            .read()
            .databases
            .get(database_id)
            .and_then(|db| db.containers.get(container_id))
            .map(|c| c.partition_key_path.clone())
    }

    /// Returns the throughput a database or container was provisioned
    /// with. `container_id` of `None` addresses the database itself.
    pub fn provisioned_throughput(
        &self,
        database_id: &str,
        container_id: Option<&str>,
    ) -> Option<u32> {
        let inner = self.inner.read();
        let db = inner.databases.get(database_id)?;
        match container_id {
            None => db.throughput,
            Some(id) => db.containers.get(id).and_then(|c| c.throughput),
        }
    }

    /// Seeds documents directly into a container, bypassing the write
    /// path. The container must exist.
    pub fn seed_documents(
        &self,
        handle: &ContainerHandle,
        partition_key: &PartitionKey,
        items: Vec<Value>,
    ) {
        let mut inner = self.inner.write();
        if let Ok(container) = inner.container_mut(handle) {
            for item in items {
                container.documents.push((partition_key.0.clone(), item));
            }
        }
    }

    /// Makes item writes fail with a 503 when the document's `id`
    /// field matches.
    pub fn fail_items_with_id(&self, id: impl Into<String>) {
        self.inner.write().failing_item_ids.insert(id.into());
    }

    /// Makes database creation return a non-success status with no
    /// resource.
    pub fn refuse_databases(&self, refuse: bool) {
        self.inner.write().refuse_databases = refuse;
    }

    /// Makes container creation return a non-success status with no
    /// resource.
    pub fn refuse_containers(&self, refuse: bool) {
        self.inner.write().refuse_containers = refuse;
    }

    /// Makes stored-procedure create/replace calls report a 503
    /// without changing state.
    pub fn fail_procedure_writes(&self, fail: bool) {
        self.inner.write().fail_procedure_writes = fail;
    }

    fn record(&self, operation: &str, target: impl AsRef<str>) {
        self.inner
            .write()
            .journal
            .push(format!("{}:{}", operation, target.as_ref()));
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn create_database_if_not_exists(
        &self,
        spec: &DatabaseSpec,
    ) -> EngineResult<ResourceResponse<DatabaseHandle>> {
        self.record("create_database", &spec.id);
        let mut inner = self.inner.write();

        if inner.refuse_databases {
            return Ok(ResourceResponse::empty(StoreStatus::ServiceUnavailable));
        }

        if inner.databases.contains_key(&spec.id) {
            return Ok(ResourceResponse::new(
                StoreStatus::Ok,
                DatabaseHandle::new(spec.id.clone()),
            ));
        }

        inner.databases.insert(
            spec.id.clone(),
            MemoryDatabase {
                throughput: spec.throughput,
                containers: HashMap::new(),
            },
        );
        inner.mutations += 1;
        Ok(ResourceResponse::new(
            StoreStatus::Created,
            DatabaseHandle::new(spec.id.clone()),
        ))
    }

    async fn create_container_if_not_exists(
        &self,
        database: &DatabaseHandle,
        spec: &ContainerSpec,
    ) -> EngineResult<ResourceResponse<ContainerHandle>> {
        self.record(
            "create_container",
            format!("{}/{}", database.database_id, spec.id),
        );
        let mut inner = self.inner.write();

        if inner.refuse_containers {
            return Ok(ResourceResponse::empty(StoreStatus::ServiceUnavailable));
        }

        let db = inner
            .databases
            .get_mut(&database.database_id)
            .ok_or_else(|| {
                EngineError::remote(
                    StoreStatus::NotFound,
                    format!("database '{}' does not exist", database.database_id),
                )
            })?;

        let handle = ContainerHandle::new(database.database_id.clone(), spec.id.clone());
        if db.containers.contains_key(&spec.id) {
            return Ok(ResourceResponse::new(StoreStatus::Ok, handle));
        }

        db.containers.insert(
            spec.id.clone(),
            MemoryContainer {
                partition_key_path: spec.partition_key_path.clone(),
                throughput: spec.throughput,
                procedures: HashMap::new(),
                documents: Vec::new(),
            },
        );
        inner.mutations += 1;
        Ok(ResourceResponse::new(StoreStatus::Created, handle))
    }

    async fn read_stored_procedure(
        &self,
        container: &ContainerHandle,
        procedure_id: &str,
    ) -> EngineResult<ResourceResponse<String>> {
        self.record(
            "read_procedure",
            format!("{}/{}", container.container_id, procedure_id),
        );
        let mut inner = self.inner.write();
        let target = inner.container_mut(container)?;

        match target.procedures.get(procedure_id) {
            Some(body) => Ok(ResourceResponse::new(StoreStatus::Ok, body.clone())),
            None => Ok(ResourceResponse::empty(StoreStatus::NotFound)),
        }
    }

    async fn create_stored_procedure(
        &self,
        container: &ContainerHandle,
        spec: &StoredProcedureSpec,
    ) -> EngineResult<StoreStatus> {
        self.record(
            "create_procedure",
            format!("{}/{}", container.container_id, spec.id),
        );
        let mut inner = self.inner.write();
        if inner.fail_procedure_writes {
            return Ok(StoreStatus::ServiceUnavailable);
        }

        let target = inner.container_mut(container)?;
        if target.procedures.contains_key(&spec.id) {
            return Ok(StoreStatus::Conflict);
        }
        target.procedures.insert(spec.id.clone(), spec.body.clone());
        inner.mutations += 1;
        Ok(StoreStatus::Created)
    }

    async fn replace_stored_procedure(
        &self,
        container: &ContainerHandle,
        spec: &StoredProcedureSpec,
    ) -> EngineResult<StoreStatus> {
        self.record(
            "replace_procedure",
            format!("{}/{}", container.container_id, spec.id),
        );
        let mut inner = self.inner.write();
        if inner.fail_procedure_writes {
            return Ok(StoreStatus::ServiceUnavailable);
        }

        let target = inner.container_mut(container)?;
        match target.procedures.get_mut(&spec.id) {
            Some(body) => {
                *body = spec.body.clone();
                inner.mutations += 1;
                Ok(StoreStatus::Ok)
            }
            None => Ok(StoreStatus::NotFound),
        }
    }

    async fn create_item(
        &self,
        container: &ContainerHandle,
        item: Value,
        partition_key: &PartitionKey,
        _options: &WriteOptions,
    ) -> EngineResult<StoreStatus> {
        let item_id = item
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("<no id>")
            .to_string();
        self.record(
            "create_item",
            format!("{}/{}", container.container_id, item_id),
        );

        let mut inner = self.inner.write();
        if inner.failing_item_ids.contains(&item_id) {
            return Err(EngineError::remote(
                StoreStatus::ServiceUnavailable,
                format!("injected failure for item '{item_id}'"),
            ));
        }

        let target = inner.container_mut(container)?;
        target.documents.push((partition_key.0.clone(), item));
        inner.mutations += 1;
        Ok(StoreStatus::Created)
    }

    async fn execute_stored_procedure(
        &self,
        container: &ContainerHandle,
        procedure_id: &str,
        partition_key: &PartitionKey,
        args: Vec<Value>,
    ) -> EngineResult<Value> {
        self.record(
            "execute_procedure",
            format!("{}/{}", container.container_id, procedure_id),
        );
        let mut inner = self.inner.write();
        let target = inner.container_mut(container)?;

        if !target.procedures.contains_key(procedure_id) {
            return Err(EngineError::remote(
                StoreStatus::NotFound,
                format!("stored procedure '{procedure_id}' is not registered"),
            ));
        }

        // Bulk-import contract: one array argument, each element stored
        // as a document in the scoped partition.
        let batch = args
            .first()
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let count = batch.len();
        for item in batch {
            target.documents.push((partition_key.0.clone(), item));
        }
        inner.mutations += 1;
        Ok(Value::from(count as u64))
    }

    async fn query_items(
        &self,
        container: &ContainerHandle,
        _query: &Query,
        options: &ReadOptions,
    ) -> EngineResult<Box<dyn DocumentCursor>> {
        self.record("query_items", &container.container_id);
        let mut inner = self.inner.write();
        let target = inner.container_mut(container)?;

        let documents: Vec<Value> = target.documents.iter().map(|(_, doc)| doc.clone()).collect();
        let page_size = options.page_size.map(|size| size.max(1) as usize);

        Ok(Box::new(MemoryCursor::new(documents, page_size)))
    }
}

/// Cursor over a snapshot of a container's documents.
struct MemoryCursor {
    pages: VecDeque<Vec<Value>>,
    next_page: usize,
}

impl MemoryCursor {
    fn new(documents: Vec<Value>, page_size: Option<usize>) -> Self {
        let mut pages = VecDeque::new();
        match page_size {
            Some(size) => {
                let mut documents = documents;
                while !documents.is_empty() {
                    let rest = documents.split_off(documents.len().min(size));
                    pages.push_back(documents);
                    documents = rest;
                }
            }
            None => {
                if !documents.is_empty() {
                    pages.push_back(documents);
                }
            }
        }
        Self {
            pages,
            next_page: 0,
        }
    }
}

#[async_trait]
impl DocumentCursor for MemoryCursor {
    fn has_more(&self) -> bool {
        !self.pages.is_empty()
    }

    async fn fetch_next(&mut self) -> EngineResult<FeedPage> {
        let Some(items) = self.pages.pop_front() else {
            return Ok(FeedPage::empty());
        };
        self.next_page += 1;

        Ok(FeedPage {
            request_charge: items.len() as f64,
            continuation_token: Some(format!("page-{}", self.next_page)),
            session_token: Some(format!("session-{}", self.next_page)),
            status: StoreStatus::Ok,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn handle() -> ContainerHandle {
        ContainerHandle::new("db", "events")
    }

    async fn store_with_container() -> MemoryStore {
        let store = MemoryStore::new();
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
        store
    }

    #[tokio::test]
    async fn database_creation_is_idempotent() {
        let store = MemoryStore::new();
        let spec = DatabaseSpec::new("db");

        let first = store.create_database_if_not_exists(&spec).await.unwrap();
        assert_eq!(first.status, StoreStatus::Created);

        let second = store.create_database_if_not_exists(&spec).await.unwrap();
        assert_eq!(second.status, StoreStatus::Ok);
        assert_eq!(store.mutation_count(), 1);
    }

    #[tokio::test]
    async fn specs_propagate_to_created_resources() {
        let store = MemoryStore::new();
        let db = store
            .create_database_if_not_exists(&DatabaseSpec::new("db").with_throughput(400))
            .await
            .unwrap()
            .resource
            .unwrap();
        store
            .create_container_if_not_exists(
                &db,
                &ContainerSpec::new("events", "/tenantId").with_throughput(500),
            )
            .await
            .unwrap();

        assert_eq!(store.provisioned_throughput("db", None), Some(400));
        assert_eq!(store.provisioned_throughput("db", Some("events")), Some(500));
        assert_eq!(
            store.partition_key_path("db", "events").as_deref(),
            Some("/tenantId")
        );
    }

    #[tokio::test]
    async fn container_requires_database() {
        let store = MemoryStore::new();
        let result = store
            .create_container_if_not_exists(
                &DatabaseHandle::new("missing"),
                &ContainerSpec::new("events", "/pk"),
            )
            .await;
        assert!(matches!(
            result,
            Err(EngineError::Remote {
                status: StoreStatus::NotFound,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn procedure_read_create_replace() {
        let store = store_with_container().await;
        let spec = StoredProcedureSpec::new("bulkImport", "function a() {}");

        let read = store
            .read_stored_procedure(&handle(), "bulkImport")
            .await
            .unwrap();
        assert_eq!(read.status, StoreStatus::NotFound);

        let created = store.create_stored_procedure(&handle(), &spec).await.unwrap();
        assert_eq!(created, StoreStatus::Created);

        let replaced = store
            .replace_stored_procedure(&handle(), &StoredProcedureSpec::new("bulkImport", "function b() {}"))
            .await
            .unwrap();
        assert_eq!(replaced, StoreStatus::Ok);
        assert_eq!(
            store.procedure_body("db", "events", "bulkImport").as_deref(),
            Some("function b() {}")
        );
    }

    #[tokio::test]
    async fn injected_item_failure() {
        let store = store_with_container().await;
        store.fail_items_with_id("bad");

        let ok = store
            .create_item(
                &handle(),
                json!({"id": "good"}),
                &"pk".into(),
                &WriteOptions::new(),
            )
            .await;
        assert!(ok.is_ok());

        let failed = store
            .create_item(
                &handle(),
                json!({"id": "bad"}),
                &"pk".into(),
                &WriteOptions::new(),
            )
            .await;
        assert!(failed.is_err());
        assert_eq!(store.documents("db", "events").len(), 1);
    }

    #[tokio::test]
    async fn cursor_pages_in_insertion_order() {
        let store = store_with_container().await;
        let items: Vec<Value> = (0..8).map(|i| json!({"id": i})).collect();
        store.seed_documents(&handle(), &"pk".into(), items);

        let mut cursor = store
            .query_items(
                &handle(),
                &Query::new("SELECT * FROM c"),
                &ReadOptions::new().with_page_size(3),
            )
            .await
            .unwrap();

        let mut sizes = Vec::new();
        let mut seen = Vec::new();
        while cursor.has_more() {
            let page = cursor.fetch_next().await.unwrap();
            sizes.push(page.items.len());
            seen.extend(page.items);
        }
        assert_eq!(sizes, vec![3, 3, 2]);
        let ids: Vec<i64> = seen.iter().map(|v| v["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, (0..8).collect::<Vec<_>>());

        // Exhausted cursor yields an empty page, not an error.
        let after = cursor.fetch_next().await.unwrap();
        assert!(after.items.is_empty());
    }

    #[tokio::test]
    async fn execute_procedure_appends_batch() {
        let store = store_with_container().await;
        store
            .create_stored_procedure(&handle(), &StoredProcedureSpec::new("bulkImport", "fn"))
            .await
            .unwrap();

        let result = store
            .execute_stored_procedure(
                &handle(),
                "bulkImport",
                &"pk".into(),
                vec![json!([{"id": 1}, {"id": 2}])],
            )
            .await
            .unwrap();
        assert_eq!(result, Value::from(2u64));
        assert_eq!(store.documents("db", "events").len(), 2);
    }
}
