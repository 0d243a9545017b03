//! # Shardstore Protocol
//!
//! Shared data types for the shardstore access layer.
//!
//! This crate provides:
//! - Schema specifications (`DatabaseSpec`, `ContainerSpec`, `StoredProcedureSpec`)
//! - Bound resource handles (`DatabaseHandle`, `ContainerHandle`)
//! - Remote status codes (`StoreStatus`)
//! - Parameterized queries with safe IN-clause expansion (`Query`)
//! - Per-call options (`ReadOptions`, `WriteOptions`, `PartitionKey`)
//! - Result shapes (`FeedPage`, `PagedReadResult`, `BulkWriteOutcome`)
//!
//! This is a pure data crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod options;
mod query;
mod result;
mod spec;
mod status;

pub use options::{PartitionKey, ReadOptions, WriteOptions};
pub use query::{Query, QueryParameter};
pub use result::{BulkWriteOutcome, FeedPage, PagedReadResult};
pub use spec::{ContainerHandle, ContainerSpec, DatabaseHandle, DatabaseSpec, StoredProcedureSpec};
pub use status::StoreStatus;
