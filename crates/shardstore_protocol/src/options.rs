//! Per-call options and partition keys.

/// The partition key value accompanying every document operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionKey(pub String);

impl PartitionKey {
    /// Returns the key value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PartitionKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PartitionKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Options for paginated read operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Maximum items per page; `None` lets the store choose.
    pub page_size: Option<u32>,
    /// Session token to request session-level read consistency.
    pub session_token: Option<String>,
    /// Continuation token to resume a previous query.
    pub continuation_token: Option<String>,
}

impl ReadOptions {
    /// Creates default read options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Sets the session token.
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Sets the continuation token.
    pub fn with_continuation_token(mut self, token: impl Into<String>) -> Self {
        self.continuation_token = Some(token.into());
        self
    }
}

/// Options for document write operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Whether the store should echo the written document back.
    /// Disabled by default to save response bandwidth on bulk paths.
    pub content_response_on_write: bool,
}

impl WriteOptions {
    /// Creates default write options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the written document in the response.
    pub fn with_content_response(mut self) -> Self {
        self.content_response_on_write = true;
        self
    }
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            content_response_on_write: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_key_conversions() {
        let a: PartitionKey = "tenant-1".into();
        let b: PartitionKey = String::from("tenant-1").into();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "tenant-1");
        assert_eq!(a.to_string(), "tenant-1");
    }

    #[test]
    fn read_options_builder() {
        let options = ReadOptions::new()
            .with_page_size(50)
            .with_session_token("session-9")
            .with_continuation_token("page-3");

        assert_eq!(options.page_size, Some(50));
        assert_eq!(options.session_token.as_deref(), Some("session-9"));
        assert_eq!(options.continuation_token.as_deref(), Some("page-3"));
    }

    #[test]
    fn write_options_default_suppresses_content() {
        assert!(!WriteOptions::new().content_response_on_write);
        assert!(WriteOptions::new().with_content_response().content_response_on_write);
    }
}
