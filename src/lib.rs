//! # cellarr
//!
//! Storage-engine access layer for multi-dimensional arrays.
//!
//! This crate sits between a flat, column-oriented relational schema and a
//! native multi-dimensional array engine. It owns the two pieces with real
//! decisions in them - schema translation and the buffered query protocol -
//! and consumes the engine itself (tile layout, compression, I/O) through
//! narrow capability traits.
//!
//! ## Features
//!
//! - **Schema translation**: map column types to dimension/attribute
//!   descriptors and back, including fixed-vs-variable cell-value-count
//!   decisions and dimension partitioning
//! - **Buffered queries**: fixed-capacity typed buffers with the
//!   incomplete/resubmit protocol, offset decoding for variable-length
//!   cells, and the submit-finalize write path
//! - **Fragment introspection**: immutable snapshots of per-fragment
//!   metadata (non-empty domains, cell counts, timestamp ranges,
//!   consolidation status)
//!
//! ## Quick Start
//!
//! ```rust
//! use cellarr::prelude::*;
//! use cellarr::schema::{self, DimensionSpec, PartitionConfig};
//!
//! // Describe the data in relational terms.
//! let mut columns = ColumnSchema::new();
//! columns.push(ColumnField::scalar("pos", ScalarKind::Int64)).unwrap();
//! columns.push(ColumnField::text("alleles")).unwrap();
//!
//! // Partition on "pos" and build the native schema.
//! let config = PartitionConfig::new()
//!     .with_dimension("pos", DimensionSpec::new((1, 1000), 100));
//! let array_schema = schema::build(&columns, &config).unwrap();
//!
//! // Project it back, narrowed to one column.
//! let required = std::collections::HashSet::from(["alleles".to_string()]);
//! let narrowed = schema::project(&array_schema, Some(&required)).unwrap();
//! assert_eq!(narrowed.len(), 1);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------------------------------------+
//! |                             cellarr                                |
//! +--------------------------------------------------------------------+
//! |  schema/    - ColumnField, ColumnType, translation (engine-free)   |
//! |  array/     - Datatype, Dimension, Attribute, ArraySchema::check   |
//! |  query/     - BufferSet, QueryExecutor, incomplete/resubmit loop   |
//! |  fragment/  - Fragment, FragmentCatalog snapshots                  |
//! |  engine/    - capability traits + in-memory reference engine       |
//! |  error/     - Error types                                          |
//! +--------------------------------------------------------------------+
//! ```
//!
//! The relational-engine integration layer (column pruning, predicate
//! pushdown, option parsing) and the native engine's physical storage both
//! live outside this crate; only their narrow interfaces appear here.

pub mod array;
pub mod engine;
pub mod error;
pub mod fragment;
pub mod prelude;
pub mod query;
pub mod schema;

// Re-export commonly used types at crate root for convenience
pub use array::{ArrayKind, ArraySchema, Attribute, CellValNum, Datatype, Dimension, Layout};
pub use error::{CatalogError, Error, QueryError, Result, SchemaError};
pub use fragment::{Fragment, FragmentCatalog, NonEmptyDomain};
pub use query::{BufferSet, FieldSpec, QueryBuffer, QueryExecutor, QueryState};
pub use schema::{ColumnField, ColumnSchema, ColumnType, ScalarKind};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
