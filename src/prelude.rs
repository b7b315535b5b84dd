//! Convenient re-exports for common usage.
//!
//! # Example
//!
//! ```rust
//! use cellarr::prelude::*;
//!
//! let mut schema = ColumnSchema::new();
//! schema.push(ColumnField::scalar("row", ScalarKind::Int64)).unwrap();
//! ```

// Schema types
pub use crate::schema::{
    build, project, ColumnField, ColumnSchema, ColumnType, DimensionSpec, PartitionConfig,
    ScalarKind,
};

// Native array types
pub use crate::array::{
    ArrayKind, ArraySchema, Attribute, CellValNum, Datatype, Dimension, Layout,
};

// Query types
pub use crate::query::{BufferSet, FieldSpec, QueryExecutor, QueryState};

// Fragment types
pub use crate::fragment::{DimensionKey, Fragment, FragmentCatalog, NonEmptyDomain};

// Engine traits
pub use crate::engine::{FragmentSource, NativeStatus, QueryBackend};

// Error types
pub use crate::error::{Error, Result};
