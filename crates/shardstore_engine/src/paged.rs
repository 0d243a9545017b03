//! Paged read aggregation.
//!
//! Drains a multi-page cursor into one materialized result. Single
//! pass, forward only: the cursor is consumed exactly once and the full
//! cursor is always drained; callers wanting bounded results slice at
//! the query level via page-size options.

use crate::error::EngineResult;
use crate::store::DocumentCursor;
use serde::de::DeserializeOwned;
use shardstore_protocol::PagedReadResult;

/// Drains `cursor` to exhaustion.
///
/// Items accumulate in arrival order across pages; the per-page
/// consumption cost is summed. The result's continuation token and
/// status reflect the final page only. The session token is
/// `session_token_override` verbatim when supplied, otherwise the final
/// page's.
///
/// Draining an already exhausted cursor yields an empty result.
pub async fn drain<T: DeserializeOwned>(
    mut cursor: Box<dyn DocumentCursor>,
    session_token_override: Option<String>,
) -> EngineResult<PagedReadResult<T>> {
    let mut result = PagedReadResult::empty();
    let mut last_session_token = None;

    while cursor.has_more() {
        let page = cursor.fetch_next().await?;

        result.items.reserve(page.items.len());
        for item in page.items {
            result.items.push(serde_json::from_value(item)?);
        }
        result.request_charge += page.request_charge;
        result.continuation_token = page.continuation_token;
        result.status = page.status;
        last_session_token = page.session_token;
    }

    result.session_token = session_token_override.or(last_session_token);
    Ok(result)
}
