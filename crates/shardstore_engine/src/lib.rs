//! # Shardstore Engine
//!
//! Schema reconciliation and bulk data access for a partitioned,
//! schema-less document store.
//!
//! This crate provides:
//! - A narrow [`RemoteStore`] capability trait over the document store,
//!   with an in-memory implementation for tests
//! - [`SchemaReconciler`]: idempotent create/update/leave-alone
//!   reconciliation of databases, containers, and stored procedures
//! - [`ContainerAccessor`]: per-container facade with an explicit
//!   two-phase (unbound/bound) handle lifecycle
//! - [`BulkWriteCoordinator`]: concurrent fan-out writes with per-item
//!   failure isolation
//! - Paged read aggregation draining a cursor into one result
//! - [`StartupGate`]: run-once startup sequencing
//! - Pluggable per-call observation ([`ObservedStore`])
//!
//! ## Architecture
//!
//! On process start, the [`StartupGate`] runs the reconciler once,
//! sequentially, for the database and each registered container; each
//! container also reconciles its own stored procedures. After this
//! gate, accessor operations become legal and run independently and
//! concurrently.
//!
//! ## Key invariants
//!
//! - Reconciliation is idempotent and converges in one pass
//! - Containers and procedures reconcile in strict declaration order
//! - Bulk writes never fail fast; partial failure is the normal case
//! - Data operations on an unbound container fail with a named
//!   precondition error, never a null fault

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod accessor;
mod bulk;
mod config;
mod error;
mod memory;
mod paged;
mod reconcile;
mod startup;
mod store;
mod telemetry;

pub use accessor::ContainerAccessor;
pub use bulk::BulkWriteCoordinator;
pub use config::StoreConfig;
pub use error::{EngineError, EngineResult};
pub use memory::MemoryStore;
pub use paged::drain;
pub use reconcile::{CancelFlag, SchemaReconciler};
pub use startup::StartupGate;
pub use store::{DocumentCursor, RemoteStore, ResourceResponse};
pub use telemetry::{NoopObserver, ObservedStore, RequestCall, RequestObserver};
