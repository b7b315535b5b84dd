//! Capability traits over the native storage engine.
//!
//! The native engine (array open/close, physical tile layout, I/O) is an
//! external collaborator; this crate consumes it through the narrow,
//! synchronous surfaces below instead of holding raw handles. A real binding
//! wraps its FFI calls behind these traits; [`mem::MemEngine`] is the
//! in-memory reference implementation the test-suite runs against.

pub mod mem;

use crate::error::Error;
use crate::fragment::Fragment;
use crate::query::BufferSet;

/// Outcome of one successful native submission.
///
/// `Incomplete` means the supplied buffers were too small to hold all
/// matching cells in one pass; it is a pagination signal, not an error.
/// Native failures are reported as `Err`, never as a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeStatus {
    Completed,
    Incomplete,
}

/// A read- or write-capable native query bound to one open array.
///
/// `submit` and `finalize` are blocking and may perform I/O. Implementations
/// fill (reads) or consume (writes) the attached buffer regions and report
/// used-byte counts through the [`BufferSet`] itself.
pub trait QueryBackend {
    /// Perform one native submission against the attached buffers.
    fn submit(&mut self, buffers: &mut BufferSet) -> Result<NativeStatus, Error>;

    /// Commit buffered write state. Required for global-order variable-length
    /// writes; skipping it leaves the fragment uncommitted.
    fn finalize(&mut self) -> Result<(), Error>;
}

/// Enumerates the committed fragments of an array for catalog construction.
pub trait FragmentSource {
    /// Dimension names (in domain order) and all fragments committed at call
    /// time, in commit order. Fails when the URI has no schema or fragments.
    fn load_fragments(&self, uri: &str) -> Result<(Vec<String>, Vec<Fragment>), Error>;
}
