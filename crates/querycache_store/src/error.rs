// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for store and cache operations.

use std::fmt;

/// Classifies the failure carried by an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The backend is configured in a way that forbids the requested operation.
    Configuration,
    /// A payload could not be encoded.
    Serialization,
    /// The backend could not be reached or rejected the operation.
    Unavailable,
    /// A counter operation targeted a value that is not an integer.
    NotNumeric,
    /// A key pattern or regular expression could not be compiled.
    InvalidPattern,
    /// No store is registered under the requested driver name.
    UnknownStore,
    /// The query engine failed while computing a result.
    Query,
}

impl ErrorKind {
    /// Returns a short, stable identifier for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Serialization => "serialization",
            Self::Unavailable => "unavailable",
            Self::NotNumeric => "not_numeric",
            Self::InvalidPattern => "invalid_pattern",
            Self::UnknownStore => "unknown_store",
            Self::Query => "query",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error from a store, repository or cached query operation.
///
/// Inspect [`Error::kind`] to branch on the failure class. Failures raised by a
/// backend or query engine are kept as the error source and can be recovered
/// with [`ohno::ErrorExt::find_source`].
///
/// # Examples
///
/// ```
/// use querycache_store::{Error, ErrorKind};
///
/// let error = Error::configuration("introspection is disabled");
/// assert_eq!(error.kind(), ErrorKind::Configuration);
/// ```
#[ohno::error]
#[display("{kind} error")]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    /// Returns the class of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Creates a configuration error with a remediation message.
    pub fn configuration(message: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Configuration, message)
    }

    /// Creates an error signaling that the backend is unreachable or refused the call.
    ///
    /// This is the constructor external store implementations should use to report
    /// their own transport or backend failures.
    pub fn unavailable(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Unavailable, cause)
    }

    /// Creates an error for a payload that could not be encoded.
    pub fn serialization(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Serialization, cause)
    }

    /// Creates an error for a counter operation on a value that is not an integer.
    pub fn not_numeric(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::NotNumeric, cause)
    }

    /// Creates an error for a key pattern that cannot be compiled.
    pub fn invalid_pattern(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::InvalidPattern, cause)
    }

    /// Creates an error for a driver name with no registered store.
    pub fn unknown_store(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::UnknownStore, cause)
    }

    /// Creates an error wrapping a query engine failure.
    pub fn query(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Query, cause)
    }
}

/// A specialized [`Result`] type for store operations.
pub type Result<T> = std::result::Result<T, Error>;
