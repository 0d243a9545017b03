//! Result shapes for bulk writes and paginated reads.

use crate::status::StoreStatus;
use serde_json::Value;

/// One page of query results as delivered by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage {
    /// Items in arrival order.
    pub items: Vec<Value>,
    /// Continuation token positioned after this page.
    pub continuation_token: Option<String>,
    /// Session consistency token from this page's response headers.
    pub session_token: Option<String>,
    /// Consumption cost charged for this page.
    pub request_charge: f64,
    /// Status of this page's fetch.
    pub status: StoreStatus,
}

impl FeedPage {
    /// An empty page, as returned by an exhausted cursor.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            continuation_token: None,
            session_token: None,
            request_charge: 0.0,
            status: StoreStatus::Ok,
        }
    }
}

/// The fully drained result of a paged read.
///
/// `continuation_token`, `session_token` and `status` reflect the final
/// page only: the state after the drain completed, not any
/// intermediate page. `request_charge` is the running sum across all
/// pages.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedReadResult<T> {
    /// All items across all pages, in arrival order.
    pub items: Vec<T>,
    /// Continuation token from the final page.
    pub continuation_token: Option<String>,
    /// Session token: the caller's override if one was supplied,
    /// otherwise the final page's.
    pub session_token: Option<String>,
    /// Total consumption cost across all pages.
    pub request_charge: f64,
    /// Status of the final page.
    pub status: StoreStatus,
}

impl<T> PagedReadResult<T> {
    /// The result of draining a cursor that produced no pages.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            continuation_token: None,
            session_token: None,
            request_charge: 0.0,
            status: StoreStatus::Ok,
        }
    }
}

/// Aggregate outcome of a multi-document write.
///
/// Per-item failure detail is deliberately not carried here; failures
/// are logged where they happen, and callers detect degradation by
/// comparing the two counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkWriteOutcome {
    /// Number of items submitted.
    pub requested: usize,
    /// Number of items the store accepted.
    pub succeeded: usize,
}

impl BulkWriteOutcome {
    /// Creates an outcome from the two counts.
    pub fn new(requested: usize, succeeded: usize) -> Self {
        Self {
            requested,
            succeeded,
        }
    }

    /// Returns true if every requested item succeeded.
    pub fn is_complete(&self) -> bool {
        self.succeeded == self.requested
    }

    /// Number of items that failed.
    pub fn failed(&self) -> usize {
        self.requested.saturating_sub(self.succeeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_page_defaults() {
        let page = FeedPage::empty();
        assert!(page.items.is_empty());
        assert!(page.continuation_token.is_none());
        assert_eq!(page.request_charge, 0.0);
        assert_eq!(page.status, StoreStatus::Ok);
    }

    #[test]
    fn outcome_counts() {
        let outcome = BulkWriteOutcome::new(5, 5);
        assert!(outcome.is_complete());
        assert_eq!(outcome.failed(), 0);

        let degraded = BulkWriteOutcome::new(5, 3);
        assert!(!degraded.is_complete());
        assert_eq!(degraded.failed(), 2);
    }

    #[test]
    fn empty_read_result() {
        let result: PagedReadResult<Value> = PagedReadResult::empty();
        assert!(result.items.is_empty());
        assert_eq!(result.request_charge, 0.0);
        assert!(result.session_token.is_none());
    }
}
