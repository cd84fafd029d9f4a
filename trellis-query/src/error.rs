//! Error and result types for the query compiler.
//!
//! Every failure is a client error: malformed input is deterministic, so
//! nothing here is retried and nothing is swallowed apart from the
//! documented no-ops (excluding a relationship that was never included,
//! duplicate sorts, `mapBy` on a to-one relationship).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("{0}")]
    InvalidPath(String),
    #[error("{0}")]
    PathTooLong(String),
    #[error("{0}")]
    MalformedInclude(String),
    #[error("{0}")]
    MalformedSort(String),
    #[error("{0}")]
    InvalidExclude(String),
    #[error("{0}")]
    InvalidDirection(String),
    #[error("{0}")]
    DisallowedPathPrefix(String),
    #[error("{0}")]
    InvalidDateLiteral(String),
    #[error("{0}")]
    BadFilterSpec(String),
}

/// Machine-checkable error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidPath,
    PathTooLong,
    MalformedInclude,
    MalformedSort,
    InvalidExclude,
    InvalidDirection,
    DisallowedPathPrefix,
    InvalidDateLiteral,
    BadFilterSpec,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidPath(_) => ErrorKind::InvalidPath,
            Error::PathTooLong(_) => ErrorKind::PathTooLong,
            Error::MalformedInclude(_) => ErrorKind::MalformedInclude,
            Error::MalformedSort(_) => ErrorKind::MalformedSort,
            Error::InvalidExclude(_) => ErrorKind::InvalidExclude,
            Error::InvalidDirection(_) => ErrorKind::InvalidDirection,
            Error::DisallowedPathPrefix(_) => ErrorKind::DisallowedPathPrefix,
            Error::InvalidDateLiteral(_) => ErrorKind::InvalidDateLiteral,
            Error::BadFilterSpec(_) => ErrorKind::BadFilterSpec,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Error::InvalidPath(m)
            | Error::PathTooLong(m)
            | Error::MalformedInclude(m)
            | Error::MalformedSort(m)
            | Error::InvalidExclude(m)
            | Error::InvalidDirection(m)
            | Error::DisallowedPathPrefix(m)
            | Error::InvalidDateLiteral(m)
            | Error::BadFilterSpec(m) => m,
        }
    }

    /// HTTP status class of the error. Always "bad request".
    pub fn status(&self) -> u16 {
        400
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_is_a_client_error() {
        let errors = [
            Error::InvalidPath("a".into()),
            Error::PathTooLong("b".into()),
            Error::BadFilterSpec("c".into()),
            Error::InvalidDateLiteral("d".into()),
        ];
        for err in errors {
            assert!(err.is_client_error());
            assert_eq!(err.status(), 400);
        }
    }

    #[test]
    fn display_is_the_message() {
        let err = Error::InvalidDirection("Direction is invalid: asc".into());
        assert_eq!(err.to_string(), "Direction is invalid: asc");
        assert_eq!(err.message(), "Direction is invalid: asc");
        assert_eq!(err.kind(), ErrorKind::InvalidDirection);
    }
}
