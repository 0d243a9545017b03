//! Schema reconciliation.
//!
//! [`SchemaReconciler`] makes the remote schema match the desired specs
//! idempotently: create what is missing, replace what drifted, leave
//! the rest alone. It runs once per process start, strictly
//! sequentially: throughput and status side effects on a shared
//! database must not race, and startup latency is not critical.

use crate::accessor::ContainerAccessor;
use crate::error::{EngineError, EngineResult};
use crate::store::RemoteStore;
use shardstore_protocol::{ContainerHandle, DatabaseHandle, DatabaseSpec, StoredProcedureSpec};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};

/// A shared cancellation flag, checked before every remote call.
///
/// Tripping it makes the reconciliation pass stop at the next check
/// with [`EngineError::Cancelled`]; no further calls are issued.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates an untripped flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trips the flag.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true once tripped.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Reconciles desired database/container/procedure state against the
/// remote store.
pub struct SchemaReconciler<S: RemoteStore> {
    store: Arc<S>,
    cancel: CancelFlag,
}

impl<S: RemoteStore> SchemaReconciler<S> {
    /// Creates a reconciler over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            cancel: CancelFlag::new(),
        }
    }

    /// Uses an externally owned cancellation flag.
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns the cancellation flag.
    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    fn check_cancelled(&self) -> EngineResult<()> {
        if self.cancel.is_cancelled() {
            Err(EngineError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Runs one full reconciliation pass: the database first, then each
    /// container (with its stored procedures) in declaration order.
    ///
    /// Safe to re-run; a pass over converged state performs no mutating
    /// calls. Fails fatally if the database or any container yields no
    /// usable reference.
    pub async fn reconcile(
        &self,
        database: &DatabaseSpec,
        containers: &[Arc<ContainerAccessor<S>>],
    ) -> EngineResult<DatabaseHandle> {
        let handle = self.reconcile_database(database).await?;

        for accessor in containers {
            self.reconcile_container(&handle, accessor).await?;
        }

        Ok(handle)
    }

    async fn reconcile_database(&self, spec: &DatabaseSpec) -> EngineResult<DatabaseHandle> {
        self.check_cancelled()?;
        let response = self.store.create_database_if_not_exists(spec).await?;

        match response.status {
            status if status.is_created() => {
                info!(database = %spec.id, "created database");
            }
            status if status.is_success() => {
                info!(database = %spec.id, "database already existed");
            }
            status => {
                error!(database = %spec.id, %status, "unexpected status creating database");
            }
        }

        response.resource.ok_or_else(|| EngineError::DatabaseUnavailable {
            database_id: spec.id.clone(),
            status: response.status,
        })
    }

    /// Reconciles a single container and its stored procedures, then
    /// binds the resulting handle into the accessor.
    pub async fn reconcile_container(
        &self,
        database: &DatabaseHandle,
        accessor: &ContainerAccessor<S>,
    ) -> EngineResult<()> {
        let spec = accessor.spec();

        self.check_cancelled()?;
        let response = self
            .store
            .create_container_if_not_exists(database, spec)
            .await?;

        match response.status {
            status if status.is_created() => {
                info!(container = %spec.id, "created container");
            }
            status if status.is_success() => {
                info!(container = %spec.id, "container already existed");
            }
            status => {
                error!(container = %spec.id, %status, "unexpected status creating container");
            }
        }

        let handle = response
            .resource
            .ok_or_else(|| EngineError::ContainerUnavailable {
                container_id: spec.id.clone(),
                status: response.status,
            })?;

        for procedure in &spec.stored_procedures {
            self.reconcile_procedure(&handle, procedure).await?;
        }

        accessor.bind(handle);
        Ok(())
    }

    /// Create / replace / leave alone for one stored procedure.
    ///
    /// Non-success outcomes are logged and absorbed; a drifted or
    /// failing procedure does not abort the pass.
    async fn reconcile_procedure(
        &self,
        container: &ContainerHandle,
        spec: &StoredProcedureSpec,
    ) -> EngineResult<()> {
        self.check_cancelled()?;

        let existing = match self.store.read_stored_procedure(container, &spec.id).await {
            Ok(response) if response.status.is_not_found() => None,
            Ok(response) => response.resource,
            Err(EngineError::Remote { status, .. }) if status.is_not_found() => None,
            Err(e @ EngineError::Cancelled) => return Err(e),
            Err(e) => {
                error!(
                    container = %container.container_id,
                    procedure = %spec.id,
                    error = %e,
                    "failed to read stored procedure, skipping"
                );
                return Ok(());
            }
        };

        match existing {
            None => {
                self.check_cancelled()?;
                match self.store.create_stored_procedure(container, spec).await {
                    Ok(status) if status.is_created() => {
                        info!(container = %container.container_id, procedure = %spec.id, "created stored procedure");
                    }
                    Ok(status) => {
                        error!(
                            container = %container.container_id,
                            procedure = %spec.id,
                            %status,
                            "unexpected status creating stored procedure"
                        );
                    }
                    Err(e @ EngineError::Cancelled) => return Err(e),
                    Err(e) => {
                        error!(
                            container = %container.container_id,
                            procedure = %spec.id,
                            error = %e,
                            "failed to create stored procedure"
                        );
                    }
                }
            }
            Some(body) if spec.body_matches(&body) => {
                info!(container = %container.container_id, procedure = %spec.id, "stored procedure up to date");
            }
            Some(_) => {
                self.check_cancelled()?;
                match self.store.replace_stored_procedure(container, spec).await {
                    Ok(status) if status.is_success() => {
                        info!(container = %container.container_id, procedure = %spec.id, "replaced stored procedure");
                    }
                    Ok(status) => {
                        error!(
                            container = %container.container_id,
                            procedure = %spec.id,
                            %status,
                            "unexpected status replacing stored procedure"
                        );
                    }
                    Err(e @ EngineError::Cancelled) => return Err(e),
                    Err(e) => {
                        error!(
                            container = %container.container_id,
                            procedure = %spec.id,
                            error = %e,
                            "failed to replace stored procedure"
                        );
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use shardstore_protocol::ContainerSpec;

    fn accessor(
        store: &Arc<MemoryStore>,
        spec: ContainerSpec,
    ) -> Arc<ContainerAccessor<MemoryStore>> {
        Arc::new(ContainerAccessor::new(Arc::clone(store), spec))
    }

    fn events_spec() -> ContainerSpec {
        ContainerSpec::new("events", "/tenantId")
            .with_stored_procedure(StoredProcedureSpec::new("bulkImport", "function bulk() {}"))
    }

    #[tokio::test]
    async fn reconcile_creates_database_container_and_procedures() {
        let store = Arc::new(MemoryStore::new());
        let reconciler = SchemaReconciler::new(Arc::clone(&store));
        let events = accessor(&store, events_spec());

        let handle = reconciler
            .reconcile(&DatabaseSpec::new("db"), &[Arc::clone(&events)])
            .await
            .unwrap();

        assert_eq!(handle.database_id, "db");
        assert!(events.is_bound());
        assert_eq!(
            store.procedure_body("db", "events", "bulkImport").as_deref(),
            Some("function bulk() {}")
        );
    }

    #[tokio::test]
    async fn second_pass_performs_no_mutating_calls() {
        let store = Arc::new(MemoryStore::new());
        let reconciler = SchemaReconciler::new(Arc::clone(&store));
        let events = accessor(&store, events_spec());

        reconciler
            .reconcile(&DatabaseSpec::new("db"), &[Arc::clone(&events)])
            .await
            .unwrap();
        let after_first = store.mutation_count();

        reconciler
            .reconcile(&DatabaseSpec::new("db"), &[Arc::clone(&events)])
            .await
            .unwrap();
        assert_eq!(store.mutation_count(), after_first);
        assert!(events.is_bound());
    }

    #[tokio::test]
    async fn drifted_procedure_is_replaced_exactly_once() {
        let store = Arc::new(MemoryStore::new());
        let reconciler = SchemaReconciler::new(Arc::clone(&store));
        let events = accessor(&store, events_spec());

        reconciler
            .reconcile(&DatabaseSpec::new("db"), &[Arc::clone(&events)])
            .await
            .unwrap();

        // Simulate drift.
        let handle = events.handle().unwrap();
        store
            .replace_stored_procedure(&handle, &StoredProcedureSpec::new("bulkImport", "function old() {}"))
            .await
            .unwrap();

        reconciler
            .reconcile(&DatabaseSpec::new("db"), &[Arc::clone(&events)])
            .await
            .unwrap();
        assert_eq!(
            store.procedure_body("db", "events", "bulkImport").as_deref(),
            Some("function bulk() {}")
        );
        let replaces_after_convergence = store
            .journal()
            .iter()
            .filter(|entry| entry.starts_with("replace_procedure"))
            .count();

        reconciler
            .reconcile(&DatabaseSpec::new("db"), &[events])
            .await
            .unwrap();
        let replaces_after_third = store
            .journal()
            .iter()
            .filter(|entry| entry.starts_with("replace_procedure"))
            .count();
        assert_eq!(replaces_after_third, replaces_after_convergence);
    }

    #[tokio::test]
    async fn containers_reconcile_in_declaration_order() {
        let store = Arc::new(MemoryStore::new());
        let reconciler = SchemaReconciler::new(Arc::clone(&store));
        let containers: Vec<_> = ["alpha", "beta", "gamma"]
            .iter()
            .map(|id| accessor(&store, ContainerSpec::new(*id, "/pk")))
            .collect();

        reconciler
            .reconcile(&DatabaseSpec::new("db"), &containers)
            .await
            .unwrap();

        let creations: Vec<String> = store
            .journal()
            .into_iter()
            .filter(|entry| entry.starts_with("create_container"))
            .collect();
        assert_eq!(
            creations,
            vec![
                "create_container:db/alpha",
                "create_container:db/beta",
                "create_container:db/gamma"
            ]
        );
    }

    #[tokio::test]
    async fn missing_database_reference_is_fatal() {
        let store = Arc::new(MemoryStore::new());
        store.refuse_databases(true);
        let reconciler = SchemaReconciler::new(Arc::clone(&store));

        let result = reconciler.reconcile(&DatabaseSpec::new("db"), &[]).await;
        assert!(matches!(
            result,
            Err(EngineError::DatabaseUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn missing_container_reference_is_fatal() {
        let store = Arc::new(MemoryStore::new());
        store.refuse_containers(true);
        let reconciler = SchemaReconciler::new(Arc::clone(&store));
        let events = accessor(&store, events_spec());

        let result = reconciler
            .reconcile(&DatabaseSpec::new("db"), &[Arc::clone(&events)])
            .await;
        assert!(matches!(
            result,
            Err(EngineError::ContainerUnavailable { .. })
        ));
        assert!(!events.is_bound());
    }

    #[tokio::test]
    async fn failed_procedure_write_does_not_abort_the_pass() {
        let store = Arc::new(MemoryStore::new());
        store.fail_procedure_writes(true);
        let reconciler = SchemaReconciler::new(Arc::clone(&store));
        let events = accessor(&store, events_spec());

        reconciler
            .reconcile(&DatabaseSpec::new("db"), &[Arc::clone(&events)])
            .await
            .unwrap();

        // The pass completed and bound the handle despite the failure.
        assert!(events.is_bound());
        assert!(store.procedure_body("db", "events", "bulkImport").is_none());

        // Once writes recover, the next pass converges.
        store.fail_procedure_writes(false);
        reconciler
            .reconcile(&DatabaseSpec::new("db"), &[events])
            .await
            .unwrap();
        assert!(store.procedure_body("db", "events", "bulkImport").is_some());
    }

    #[tokio::test]
    async fn cancellation_stops_before_any_call() {
        let store = Arc::new(MemoryStore::new());
        let reconciler = SchemaReconciler::new(Arc::clone(&store));
        reconciler.cancel_flag().cancel();

        let result = reconciler.reconcile(&DatabaseSpec::new("db"), &[]).await;
        assert!(matches!(result, Err(EngineError::Cancelled)));
        assert!(store.journal().is_empty());
    }
}
