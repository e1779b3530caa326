//! Error types.
//!
//! Two kinds of failure exist in weft and they travel different roads:
//!
//! - [`Error`] is what a middleware returns or what the server hits while
//!   binding and accepting. A middleware `Err` lands in the response's error
//!   slot and routes the request to the error-handling elements.
//! - [`RequestError`] is the error *kind* a typed handler or a capability
//!   reports. It maps to exactly one HTTP status through [`RequestError::status`].

use http::StatusCode;

/// The error type returned by weft's fallible operations and by middleware.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid socket address: {0}")]
    Address(#[from] std::net::AddrParseError),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// The typed adapter could not recover a value it erased itself.
    #[error("internal adapter fault: {0}")]
    Adapter(&'static str),

    #[error(transparent)]
    Handler(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps any application error so a middleware can `?` it.
    pub fn handler(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Handler(Box::new(err))
    }
}

/// Error kinds a typed handler or capability can report.
///
/// The mapping to HTTP status is fixed; see [`RequestError::status`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum RequestError {
    #[error("bad request")]
    BadRequest,
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("not acceptable")]
    NotAcceptable,
    #[error("conflict")]
    Conflict,
    #[error("gone")]
    Gone,
    #[error("precondition failed")]
    PreconditionFailed,
    #[error("payload too large")]
    PayloadTooLarge,
    #[error("unsupported media type")]
    UnsupportedMediaType,
    #[error("unprocessable entity")]
    UnprocessableEntity,
    #[error("too many requests")]
    TooManyRequests,
    #[error("internal server error")]
    InternalServerError,
    #[error("not implemented")]
    NotImplemented,
    #[error("bad gateway")]
    BadGateway,
    #[error("service unavailable")]
    ServiceUnavailable,
    /// Any status without a dedicated variant.
    #[error("http status {0}")]
    Status(StatusCode),
}

impl RequestError {
    pub fn status(self) -> StatusCode {
        match self {
            Self::BadRequest           => StatusCode::BAD_REQUEST,
            Self::Unauthorized         => StatusCode::UNAUTHORIZED,
            Self::Forbidden            => StatusCode::FORBIDDEN,
            Self::NotFound             => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed     => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotAcceptable        => StatusCode::NOT_ACCEPTABLE,
            Self::Conflict             => StatusCode::CONFLICT,
            Self::Gone                 => StatusCode::GONE,
            Self::PreconditionFailed   => StatusCode::PRECONDITION_FAILED,
            Self::PayloadTooLarge      => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::UnprocessableEntity  => StatusCode::UNPROCESSABLE_ENTITY,
            Self::TooManyRequests      => StatusCode::TOO_MANY_REQUESTS,
            Self::InternalServerError  => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotImplemented       => StatusCode::NOT_IMPLEMENTED,
            Self::BadGateway           => StatusCode::BAD_GATEWAY,
            Self::ServiceUnavailable   => StatusCode::SERVICE_UNAVAILABLE,
            Self::Status(code)         => code,
        }
    }
}

impl From<RequestError> for StatusCode {
    fn from(kind: RequestError) -> StatusCode {
        kind.status()
    }
}
