//! Engine-agnostic column schema types and schema translation.
//!
//! This module describes arrays in flat relational terms, without depending
//! on any specific SQL engine: a [`ColumnSchema`] is an ordered list of
//! [`ColumnField`]s, and [`translate`] maps those to and from the native
//! array model in [`crate::array`].
//!
//! # Example
//!
//! ```rust
//! use cellarr::schema::{ColumnField, ColumnSchema, ScalarKind};
//!
//! let mut schema = ColumnSchema::new();
//! schema.push(ColumnField::scalar("pos", ScalarKind::Int64)).unwrap();
//! schema.push(ColumnField::text("alleles")).unwrap();
//! ```

mod field;
mod kind;
pub mod translate;

pub use field::{ColumnField, ColumnSchema};
pub use kind::{ColumnType, ScalarKind};
pub use translate::{build, project, DimensionSpec, PartitionConfig};
