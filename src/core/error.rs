//! Core error types.

use std::fmt;

/// Errors surfaced to handlers by the binding, rendering and serving layers.
#[derive(Debug)]
pub enum Error {
    /// I/O error (listener setup, file serving).
    Io(std::io::Error),

    /// HTTP protocol error.
    Http(http::Error),

    /// Transport-level error while reading a request body.
    Hyper(hyper::Error),

    /// JSON encode/decode error.
    Json(serde_json::Error),

    /// Query/form binding failure (missing field, bad coercion).
    Bind(String),

    /// Struct validation failure.
    Validation(String),

    /// Template render failure.
    Render(String),

    /// Protobuf decode error.
    #[cfg(feature = "protobuf")]
    Decode(prost::DecodeError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Http(e) => write!(f, "HTTP error: {}", e),
            Error::Hyper(e) => write!(f, "transport error: {}", e),
            Error::Json(e) => write!(f, "JSON error: {}", e),
            Error::Bind(msg) => write!(f, "bind error: {}", msg),
            Error::Validation(msg) => write!(f, "validation error: {}", msg),
            Error::Render(msg) => write!(f, "render error: {}", msg),
            #[cfg(feature = "protobuf")]
            Error::Decode(e) => write!(f, "protobuf decode error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Http(e) => Some(e),
            Error::Hyper(e) => Some(e),
            Error::Json(e) => Some(e),
            #[cfg(feature = "protobuf")]
            Error::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<http::Error> for Error {
    fn from(e: http::Error) -> Self {
        Error::Http(e)
    }
}

impl From<hyper::Error> for Error {
    fn from(e: hyper::Error) -> Self {
        Error::Hyper(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

#[cfg(feature = "protobuf")]
impl From<prost::DecodeError> for Error {
    fn from(e: prost::DecodeError) -> Self {
        Error::Decode(e)
    }
}

/// Result type alias for framework operations.
pub type Result<T> = std::result::Result<T, Error>;
