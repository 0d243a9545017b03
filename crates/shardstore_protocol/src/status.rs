//! Status codes returned by the remote document store.

/// A status code attached to every remote store response.
///
/// The store speaks an HTTP-like status space; the engine only ever
/// branches on a handful of codes (created, ok, not-found), so anything
/// else is carried verbatim in `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStatus {
    /// 200: request succeeded, resource already existed.
    Ok,
    /// 201: resource was created.
    Created,
    /// 204: request succeeded with no response body.
    NoContent,
    /// 304: resource unchanged.
    NotModified,
    /// 400: malformed request.
    BadRequest,
    /// 401: credentials rejected.
    Unauthorized,
    /// 403: operation not permitted.
    Forbidden,
    /// 404: resource does not exist.
    NotFound,
    /// 409: resource id conflict.
    Conflict,
    /// 412: precondition (etag) failed.
    PreconditionFailed,
    /// 413: document exceeds the store's size limit.
    EntityTooLarge,
    /// 429: request was rate limited.
    TooManyRequests,
    /// 500: store-side failure.
    InternalError,
    /// 503: store temporarily unavailable.
    ServiceUnavailable,
    /// Any other status code.
    Other(u16),
}

impl StoreStatus {
    /// Returns the numeric status code.
    pub fn code(&self) -> u16 {
        match self {
            StoreStatus::Ok => 200,
            StoreStatus::Created => 201,
            StoreStatus::NoContent => 204,
            StoreStatus::NotModified => 304,
            StoreStatus::BadRequest => 400,
            StoreStatus::Unauthorized => 401,
            StoreStatus::Forbidden => 403,
            StoreStatus::NotFound => 404,
            StoreStatus::Conflict => 409,
            StoreStatus::PreconditionFailed => 412,
            StoreStatus::EntityTooLarge => 413,
            StoreStatus::TooManyRequests => 429,
            StoreStatus::InternalError => 500,
            StoreStatus::ServiceUnavailable => 503,
            StoreStatus::Other(code) => *code,
        }
    }

    /// Maps a numeric status code to its variant.
    pub fn from_code(code: u16) -> Self {
        match code {
            200 => StoreStatus::Ok,
            201 => StoreStatus::Created,
            204 => StoreStatus::NoContent,
            304 => StoreStatus::NotModified,
            400 => StoreStatus::BadRequest,
            401 => StoreStatus::Unauthorized,
            403 => StoreStatus::Forbidden,
            404 => StoreStatus::NotFound,
            409 => StoreStatus::Conflict,
            412 => StoreStatus::PreconditionFailed,
            413 => StoreStatus::EntityTooLarge,
            429 => StoreStatus::TooManyRequests,
            500 => StoreStatus::InternalError,
            503 => StoreStatus::ServiceUnavailable,
            other => StoreStatus::Other(other),
        }
    }

    /// Returns true for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code())
    }

    /// Returns true if the resource was newly created.
    pub fn is_created(&self) -> bool {
        matches!(self, StoreStatus::Created)
    }

    /// Returns true if the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreStatus::NotFound)
    }

    /// Returns true if a retry may succeed (rate limiting or transient
    /// store-side failure).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreStatus::TooManyRequests | StoreStatus::InternalError | StoreStatus::ServiceUnavailable
        )
    }
}

impl std::fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
