//! Buffered query execution.
//!
//! ```text
//! +----------------------------------------------------------------+
//! |  buffers.rs  - FieldSpec, QueryBuffer, BufferSet, decoding     |
//! |  executor.rs - QueryState machine, resubmit loop, write path   |
//! +----------------------------------------------------------------+
//! ```
//!
//! The caller allocates a [`BufferSet`] sized by its own policy, opens a
//! native query through an [`crate::engine::QueryBackend`], and lets a
//! [`QueryExecutor`] page results through the fixed-capacity regions until
//! the engine reports completion.

mod buffers;
mod executor;

pub use buffers::{BufferSet, CoordinateBuffer, FieldSpec, QueryBuffer, OFFSET_SIZE};
pub use executor::{QueryExecutor, QueryState};
