//! Error types for cellarr.
//!
//! This module provides structured error types for all cellarr operations:
//!
//! - [`enum@Error`] - Main error enum that wraps all error types
//! - [`SchemaError`] - Errors from schema translation and validation
//! - [`QueryError`] - Errors from query submission and finalization
//! - [`CatalogError`] - Errors from fragment catalog lookups
//!
//! All errors implement `std::error::Error` and carry enough context to act on.
//!
//! An `Incomplete` query status is *not* an error anywhere in this crate; it
//! is the normal pagination signal of the read loop (see
//! [`crate::query::QueryExecutor`]).

use thiserror::Error;

/// Main error type for cellarr operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Error translating or validating a schema
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Error during query submission or finalization
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// Error from a fragment catalog lookup
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

/// Errors related to schema translation and validation.
///
/// None of these are retryable: the caller must adjust the column schema or
/// the partition configuration before trying again.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Native datatype has no column-type equivalent
    #[error("Native type {datatype} has no column equivalent")]
    UnsupportedType { datatype: &'static str },

    /// Column type cannot be stored as a native attribute
    #[error("Column type not supported for attribute '{field}': {column_type}")]
    UnsupportedColumnType { field: String, column_type: String },

    /// Column type cannot be used as a dimension
    #[error("Column type not supported for dimension '{field}': {column_type}")]
    UnsupportedDimensionType { field: String, column_type: String },

    /// Native validation rejected an assembled array schema
    #[error("Invalid array schema: {reason}")]
    InvalidSchema { reason: String },

    /// Two fields in a column schema share a name
    #[error("Duplicate field name: {name}")]
    DuplicateField { name: String },

    /// A column was named as a dimension but no domain/extent was configured
    #[error("No dimension spec configured for partition column '{name}'")]
    MissingDimensionSpec { name: String },
}

/// Errors related to query execution.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The native engine reported a failure during submission
    #[error("Query failed: {message}")]
    Failed { message: String },

    /// The native engine reported a failure during finalize
    #[error("Query finalize failed: {message}")]
    Finalize { message: String },

    /// Submit called on a query in a terminal state
    #[error("Cannot submit a {state} query")]
    InvalidState { state: &'static str },

    /// A buffer was attached for a field the query does not know
    #[error("Unknown query field: {name}")]
    UnknownField { name: String },

    /// Offset data supplied for a field with no offset region
    #[error("Field '{field}' is not variable-length")]
    NotVariableLength { field: String },

    /// A read pass came back incomplete without producing a single cell
    #[error("Read made no progress: buffers too small to hold the next cell")]
    NoProgress,

    /// Write-side fill exceeds a buffer's fixed capacity
    #[error("Buffer for '{field}' too small: need {needed} bytes, capacity {capacity}")]
    BufferTooSmall {
        field: String,
        needed: usize,
        capacity: usize,
    },
}

/// Errors related to fragment catalog lookups. These indicate caller bugs,
/// not engine failures.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// No committed fragments or schema at the given URI
    #[error("Array not found: {uri}")]
    ArrayNotFound { uri: String },

    /// Fragment index out of range
    #[error("Fragment index {index} out of range (fragment count {count})")]
    IndexOutOfRange { index: usize, count: usize },

    /// No dimension with the given index or name
    #[error("Dimension not found: {dim}")]
    DimensionNotFound { dim: String },

    /// Fixed-domain accessor used on a var dimension, or vice versa
    #[error("Dimension '{dim}' holds a {actual} non-empty domain")]
    WrongDomainKind { dim: String, actual: &'static str },

    /// Fragment directory name does not follow the `__start_end_id_version` encoding
    #[error("Malformed fragment name: {name}")]
    BadFragmentName { name: String },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
