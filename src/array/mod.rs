//! Native-side array schema model.
//!
//! These types mirror what the native storage engine validates and persists:
//! a [`Datatype`] plus [`CellValNum`] per field, dimensions grouped into an
//! [`ArrayDomain`], and an [`ArraySchema`] that must pass
//! [`ArraySchema::check`] before any query runs against it.

mod datatype;
mod schema;

pub use datatype::{CellValNum, Datatype};
pub use schema::{ArrayDomain, ArrayKind, ArraySchema, Attribute, Dimension, Layout};
