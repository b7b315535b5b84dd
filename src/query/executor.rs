//! Query execution: the incomplete/resubmit protocol.
//!
//! A [`QueryExecutor`] drives one native query to completion against a
//! caller-supplied [`BufferSet`]. Reads page through the
//! `Incomplete`/resubmit loop; writes are a single submission followed by
//! `finalize`. The executor borrows the buffer set and never resizes it; a
//! read pass that comes back `Incomplete` without producing a single cell
//! fails the query with [`QueryError::NoProgress`], and the caller must
//! reallocate larger buffers and restart.
//!
//! Not safe for concurrent `submit` calls: every submission overwrites the
//! shared buffer-fill state the previous one produced.

use tracing::debug;

use crate::engine::{NativeStatus, QueryBackend};
use crate::error::{Error, QueryError, Result};

use super::BufferSet;

/// Lifecycle of one query.
///
/// `Created -> Submitted -> {Incomplete, Completed, Failed}`, with
/// `Incomplete -> Submitted` the only cycle. `Completed` and `Failed` are
/// terminal; resubmitting a terminal query is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Created,
    Submitted,
    Incomplete,
    Completed,
    Failed,
}

impl QueryState {
    /// True for `Completed` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, QueryState::Completed | QueryState::Failed)
    }

    fn name(&self) -> &'static str {
        match self {
            QueryState::Created => "created",
            QueryState::Submitted => "submitted",
            QueryState::Incomplete => "incomplete",
            QueryState::Completed => "completed",
            QueryState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for QueryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Drives a read or write query across one or more native submissions.
pub struct QueryExecutor<Q: QueryBackend> {
    backend: Q,
    state: QueryState,
    submissions: u64,
}

impl<Q: QueryBackend> QueryExecutor<Q> {
    /// Wrap a native query in the `Created` state.
    pub fn new(backend: Q) -> Self {
        Self {
            backend,
            state: QueryState::Created,
            submissions: 0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> QueryState {
        self.state
    }

    /// Number of native submissions performed so far.
    pub fn submissions(&self) -> u64 {
        self.submissions
    }

    /// Perform one native submission.
    ///
    /// Valid from `Created` and `Incomplete` only. On success the returned
    /// state is `Completed` or `Incomplete`; on native failure the query
    /// moves to `Failed` and the native message is propagated. An
    /// `Incomplete` result is a normal pagination signal: the buffers hold a
    /// full batch that must be drained before the next call overwrites it.
    pub fn submit(&mut self, buffers: &mut BufferSet) -> Result<QueryState> {
        if self.state.is_terminal() {
            return Err(QueryError::InvalidState {
                state: self.state.name(),
            }
            .into());
        }
        self.state = QueryState::Submitted;
        self.submissions += 1;
        match self.backend.submit(buffers) {
            Ok(NativeStatus::Completed) => self.state = QueryState::Completed,
            Ok(NativeStatus::Incomplete) => self.state = QueryState::Incomplete,
            Err(err) => {
                self.state = QueryState::Failed;
                debug!(submission = self.submissions, error = %err, "query submission failed");
                return Err(QueryError::Failed {
                    message: err.to_string(),
                }
                .into());
            }
        }
        debug!(submission = self.submissions, state = %self.state, "query submitted");
        Ok(self.state)
    }

    /// Run the read loop to completion.
    ///
    /// Submits, hands the filled buffers to `consume`, and resubmits while
    /// the engine reports `Incomplete`. `consume` runs after every
    /// submission, including the final `Completed` one, since cells are
    /// produced alongside either status. Buffers are overwritten from offset
    /// zero on each pass, so `consume` must fully drain what it needs.
    ///
    /// An `Incomplete` pass that produced zero cells means no buffer can hold
    /// even the next single cell; resubmitting would spin forever, so the
    /// query moves to `Failed` with [`QueryError::NoProgress`].
    pub fn read_to_completion<F>(&mut self, buffers: &mut BufferSet, mut consume: F) -> Result<()>
    where
        F: FnMut(&BufferSet) -> Result<()>,
    {
        loop {
            let state = self.submit(buffers)?;
            if state == QueryState::Incomplete && produced_nothing(buffers) {
                self.state = QueryState::Failed;
                return Err(QueryError::NoProgress.into());
            }
            consume(buffers)?;
            if state == QueryState::Completed {
                return Ok(());
            }
        }
    }

    /// Run the write path: one submission, then finalize.
    ///
    /// Finalize is what commits global-order variable-length writes; a query
    /// dropped without it leaves the fragment uncommitted. Finalize failure
    /// moves the query to `Failed` and is not retried.
    pub fn write(&mut self, buffers: &mut BufferSet) -> Result<()> {
        let state = self.submit(buffers)?;
        if state != QueryState::Completed {
            self.state = QueryState::Failed;
            return Err(QueryError::Failed {
                message: format!("write submission ended {}", state),
            }
            .into());
        }
        if let Err(err) = self.backend.finalize() {
            self.state = QueryState::Failed;
            return Err(QueryError::Finalize {
                message: err.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Release the executor and hand back the native query.
    pub fn into_inner(self) -> Q {
        self.backend
    }
}

fn produced_nothing(buffers: &BufferSet) -> bool {
    buffers.buffers().all(|b| b.cell_count() == 0)
        && buffers.coordinates().map_or(true, |c| c.used_bytes() == 0)
}
