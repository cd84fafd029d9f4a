use std::fmt;

/// The error type for Trellis operations.
#[derive(Debug)]
pub enum Error {
    /// IO error reading a schema or data file.
    Io(std::io::Error),
    /// The schema description could not be assembled.
    Schema(trellis_api::SchemaError),
    /// Request parameters failed to compile.
    Query(trellis_query::Error),
    /// Malformed JSON input.
    Json(serde_json::Error),
}

impl Error {
    /// HTTP-style status: compile errors are client errors, the rest are
    /// server-side failures.
    pub fn status(&self) -> u16 {
        match self {
            Error::Query(e) => e.status(),
            _ => 500,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Schema(e) => write!(f, "Schema error: {}", e),
            Error::Query(e) => write!(f, "Query error: {}", e),
            Error::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Schema(e) => Some(e),
            Error::Query(e) => Some(e),
            Error::Json(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<trellis_api::SchemaError> for Error {
    fn from(e: trellis_api::SchemaError) -> Self {
        match e {
            trellis_api::SchemaError::Json(e) => Error::Json(e),
            other => Error::Schema(other),
        }
    }
}

impl From<trellis_query::Error> for Error {
    fn from(e: trellis_query::Error) -> Self {
        Error::Query(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

/// A specialized Result type for Trellis operations.
pub type Result<T> = std::result::Result<T, Error>;
