//! One-shot startup sequencing.
//!
//! Schema reconciliation must run to completion (or fatal failure)
//! exactly once per process before any data operation is legal.
//! [`StartupGate`] models that as a run-once barrier: concurrent
//! callers coalesce onto a single reconciliation run, and readiness is
//! only signalled after the run succeeded.

use crate::accessor::ContainerAccessor;
use crate::config::StoreConfig;
use crate::error::EngineResult;
use crate::reconcile::{CancelFlag, SchemaReconciler};
use crate::store::RemoteStore;
use shardstore_protocol::DatabaseHandle;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

/// Run-once gate around schema reconciliation.
///
/// A failed run does not poison the gate: the cell stays empty, so a
/// later `ensure_ready` call starts a fresh pass.
pub struct StartupGate<S: RemoteStore> {
    reconciler: SchemaReconciler<S>,
    config: StoreConfig,
    containers: Vec<Arc<ContainerAccessor<S>>>,
    ready: OnceCell<DatabaseHandle>,
}

impl<S: RemoteStore> StartupGate<S> {
    /// Creates a gate for the configured database and its containers.
    pub fn new(
        store: Arc<S>,
        config: StoreConfig,
        containers: Vec<Arc<ContainerAccessor<S>>>,
    ) -> Self {
        Self {
            reconciler: SchemaReconciler::new(store),
            config,
            containers,
            ready: OnceCell::new(),
        }
    }

    /// Uses an externally owned cancellation flag for the
    /// reconciliation pass.
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.reconciler = self.reconciler.with_cancel_flag(cancel);
        self
    }

    /// Runs schema reconciliation if it has not completed yet, and
    /// returns the bound database handle.
    ///
    /// Concurrent callers share one run; later callers get the cached
    /// handle without touching the store.
    pub async fn ensure_ready(&self) -> EngineResult<&DatabaseHandle> {
        self.ready
            .get_or_try_init(|| async {
                let spec = self.config.database_spec();
                let handle = self.reconciler.reconcile(&spec, &self.containers).await?;
                info!(database = %spec.id, "schema reconciliation complete, ready to serve");
                Ok(handle)
            })
            .await
    }

    /// Returns true once a reconciliation run has completed.
    pub fn is_ready(&self) -> bool {
        self.ready.initialized()
    }

    /// The registered container accessors, in declaration order.
    pub fn containers(&self) -> &[Arc<ContainerAccessor<S>>] {
        &self.containers
    }

    /// Looks up a registered accessor by container id.
    pub fn container(&self, container_id: &str) -> Option<&Arc<ContainerAccessor<S>>> {
        self.containers
            .iter()
            .find(|accessor| accessor.spec().id == container_id)
    }
}
