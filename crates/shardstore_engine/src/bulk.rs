//! Fan-out/fan-in bulk writes.
//!
//! Every item is an independent in-flight request: all futures are
//! built before any is awaited, then joined with a wait-for-all
//! combinator. Partial failure is the normal case: a failing item is
//! logged and counted out without cancelling or delaying the rest.

use crate::store::RemoteStore;
use futures::future::join_all;
use serde_json::Value;
use shardstore_protocol::{BulkWriteOutcome, ContainerHandle, PartitionKey, WriteOptions};
use tracing::error;

/// Coordinates a multi-document write against one container.
pub struct BulkWriteCoordinator<'a, S: RemoteStore> {
    store: &'a S,
    container: &'a ContainerHandle,
}

impl<'a, S: RemoteStore> BulkWriteCoordinator<'a, S> {
    /// Creates a coordinator for the given container.
    pub fn new(store: &'a S, container: &'a ContainerHandle) -> Self {
        Self { store, container }
    }

    /// Writes all items concurrently and reports the aggregate outcome.
    ///
    /// Never fails fast: every request settles before this returns. A
    /// count mismatch in the outcome signals degraded writes; no
    /// per-item error detail is surfaced beyond the log.
    pub async fn write(
        &self,
        items: Vec<Value>,
        partition_key: &PartitionKey,
        options: &WriteOptions,
    ) -> BulkWriteOutcome {
        let requested = items.len();

        let requests = items.into_iter().map(|item| {
            let item_id = item
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or("<no id>")
                .to_string();
            let write = self.store.create_item(self.container, item, partition_key, options);
            async move { (item_id, write.await) }
        });

        let mut succeeded = 0usize;
        for (item_id, result) in join_all(requests).await {
            match result {
                Ok(status) if status.is_success() => succeeded += 1,
                Ok(status) => {
                    error!(
                        container = %self.container.container_id,
                        item = %item_id,
                        %status,
                        "bulk write item rejected"
                    );
                }
                Err(e) => {
                    let status = e
                        .status()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "none".into());
                    error!(
                        container = %self.container.container_id,
                        item = %item_id,
                        %status,
                        error = %e,
                        "bulk write item failed"
                    );
                }
            }
        }

        BulkWriteOutcome::new(requested, succeeded)
    }
}
