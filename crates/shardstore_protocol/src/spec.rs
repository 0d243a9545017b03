//! Desired-state specifications and bound resource handles.
//!
//! Specs describe what the remote schema should look like; they are
//! built once from configuration and never mutated afterwards. Handles
//! are the opaque references the store hands back once a resource is
//! known to exist; the engine never fabricates a handle itself.

use serde::{Deserialize, Serialize};

/// Desired state of the target database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSpec {
    /// Database id.
    pub id: String,
    /// Provisioned throughput to request when the database has to be
    /// created. `None` leaves the store's default in place.
    pub throughput: Option<u32>,
}

impl DatabaseSpec {
    /// Creates a spec for the given database id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            throughput: None,
        }
    }

    /// Sets the desired throughput.
    pub fn with_throughput(mut self, throughput: u32) -> Self {
        self.throughput = Some(throughput);
        self
    }
}

/// Desired state of one container, including its server-side stored
/// procedures.
///
/// The `id` is the container's identity within its database; the
/// reconciler assumes it is unique there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    /// Container id.
    pub id: String,
    /// Partition key path, e.g. `/tenantId`.
    pub partition_key_path: String,
    /// Provisioned throughput to request on creation.
    pub throughput: Option<u32>,
    /// Stored procedures to reconcile, in declaration order.
    pub stored_procedures: Vec<StoredProcedureSpec>,
}

impl ContainerSpec {
    /// Creates a spec for the given container id and partition key path.
    pub fn new(id: impl Into<String>, partition_key_path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            partition_key_path: partition_key_path.into(),
            throughput: None,
            stored_procedures: Vec::new(),
        }
    }

    /// Sets the desired throughput.
    pub fn with_throughput(mut self, throughput: u32) -> Self {
        self.throughput = Some(throughput);
        self
    }

    /// Appends a stored procedure to reconcile.
    pub fn with_stored_procedure(mut self, procedure: StoredProcedureSpec) -> Self {
        self.stored_procedures.push(procedure);
        self
    }
}

/// Desired state of one server-side stored procedure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredProcedureSpec {
    /// Procedure id.
    pub id: String,
    /// Procedure body (script source).
    pub body: String,
}

impl StoredProcedureSpec {
    /// Creates a spec for the given procedure id and body.
    pub fn new(id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body: body.into(),
        }
    }

    /// Compares the desired body against a remote copy.
    ///
    /// The comparison is exact apart from ASCII case; a match means the
    /// remote procedure needs no replacement.
    pub fn body_matches(&self, remote_body: &str) -> bool {
        self.body.eq_ignore_ascii_case(remote_body)
    }
}

/// A bound reference to a remote database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseHandle {
    /// Id of the database this handle is bound to.
    pub database_id: String,
}

impl DatabaseHandle {
    /// Creates a handle for the given database id.
    pub fn new(database_id: impl Into<String>) -> Self {
        Self {
            database_id: database_id.into(),
        }
    }
}

/// A bound reference to a remote container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHandle {
    /// Id of the owning database.
    pub database_id: String,
    /// Id of the container this handle is bound to.
    pub container_id: String,
}

impl ContainerHandle {
    /// Creates a handle for the given database and container ids.
    pub fn new(database_id: impl Into<String>, container_id: impl Into<String>) -> Self {
        Self {
            database_id: database_id.into(),
            container_id: container_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_spec_builder() {
        let spec = DatabaseSpec::new("orders").with_throughput(400);
        assert_eq!(spec.id, "orders");
        assert_eq!(spec.throughput, Some(400));
    }

    #[test]
    fn container_spec_builder() {
        let spec = ContainerSpec::new("events", "/tenantId")
            .with_throughput(1000)
            .with_stored_procedure(StoredProcedureSpec::new("bulkImport", "function() {}"));

        assert_eq!(spec.id, "events");
        assert_eq!(spec.partition_key_path, "/tenantId");
        assert_eq!(spec.throughput, Some(1000));
        assert_eq!(spec.stored_procedures.len(), 1);
        assert_eq!(spec.stored_procedures[0].id, "bulkImport");
    }

    #[test]
    fn procedure_body_comparison_ignores_ascii_case() {
        let spec = StoredProcedureSpec::new("upsert", "function Upsert() { RETURN 1; }");
        assert!(spec.body_matches("function upsert() { return 1; }"));
        assert!(spec.body_matches("FUNCTION UPSERT() { RETURN 1; }"));
        assert!(!spec.body_matches("function upsert() { return 2; }"));
        assert!(!spec.body_matches("function upsert() { return 1; } "));
    }
}
