//! Configuration for the access layer.

use shardstore_protocol::DatabaseSpec;
use std::time::Duration;

/// Configuration consumed at store-client construction time.
///
/// The engine treats these values as opaque inputs: the retry ceilings
/// and bulk toggle are handed to the concrete store client, which owns
/// transient-fault retry. The engine never retries on top of it.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Application name reported to the store.
    pub app_name: String,
    /// Account endpoint.
    pub endpoint: String,
    /// Target database id.
    pub database_id: String,
    /// Throughput to provision if the database has to be created.
    pub database_throughput: Option<u32>,
    /// Maximum retry attempts for rate-limited requests.
    pub max_retry_attempts: u32,
    /// Maximum cumulative wait across those retries.
    pub max_retry_wait: Duration,
    /// Whether the store client may batch/pipeline item writes.
    pub allow_bulk: bool,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl StoreConfig {
    /// Creates a configuration for the given endpoint and database id.
    pub fn new(endpoint: impl Into<String>, database_id: impl Into<String>) -> Self {
        Self {
            app_name: "shardstore".into(),
            endpoint: endpoint.into(),
            database_id: database_id.into(),
            database_throughput: None,
            max_retry_attempts: 9,
            max_retry_wait: Duration::from_secs(30),
            allow_bulk: true,
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Sets the application name.
    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    /// Sets the database throughput.
    pub fn with_database_throughput(mut self, throughput: u32) -> Self {
        self.database_throughput = Some(throughput);
        self
    }

    /// Sets the retry ceilings for rate-limited requests.
    pub fn with_retry(mut self, max_attempts: u32, max_wait: Duration) -> Self {
        self.max_retry_attempts = max_attempts;
        self.max_retry_wait = max_wait;
        self
    }

    /// Disables bulk batching in the store client.
    pub fn without_bulk(mut self) -> Self {
        self.allow_bulk = false;
        self
    }

    /// Sets the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// The database spec this configuration describes.
    pub fn database_spec(&self) -> DatabaseSpec {
        let spec = DatabaseSpec::new(self.database_id.clone());
        match self.database_throughput {
            Some(throughput) => spec.with_throughput(throughput),
            None => spec,
        }
    }
}
