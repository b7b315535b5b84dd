//! Fixed-capacity query buffers.
//!
//! A [`BufferSet`] is the per-query collection of typed memory regions the
//! native engine reads from or writes into: one data region per field, an
//! offset region alongside each variable-length field, and optionally a
//! coordinates region for sparse reads. The set carries no policy beyond its
//! allocation sizes; regions are never resized, only their used-byte counts
//! move.
//!
//! All decoding helpers work from the *used* counts reported after a
//! submission, never from capacity - bytes past the used mark are stale
//! leftovers from a previous submission.

use std::ops::Range;

use crate::array::Datatype;
use crate::error::QueryError;

/// Offsets are 8-byte counters in the native wire format.
pub const OFFSET_SIZE: usize = 8;

/// Name, datatype, and variable-length flag for one buffered field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub datatype: Datatype,
    pub var: bool,
}

impl FieldSpec {
    /// Fixed-width field.
    pub fn fixed(name: impl Into<String>, datatype: Datatype) -> Self {
        Self {
            name: name.into(),
            datatype,
            var: false,
        }
    }

    /// Variable-length field (gets an offset region on allocation).
    pub fn var(name: impl Into<String>, datatype: Datatype) -> Self {
        Self {
            name: name.into(),
            datatype,
            var: true,
        }
    }
}

/// One field's data region, plus its offset region for variable-length fields.
#[derive(Debug)]
pub struct QueryBuffer {
    name: String,
    datatype: Datatype,
    data: Vec<u8>,
    data_used: usize,
    offsets: Option<Vec<u64>>,
    offsets_used: usize,
}

impl QueryBuffer {
    fn new(spec: &FieldSpec, data_capacity: usize, offset_slots: usize) -> Self {
        Self {
            name: spec.name.clone(),
            datatype: spec.datatype,
            data: vec![0; data_capacity],
            data_used: 0,
            offsets: spec.var.then(|| vec![0; offset_slots]),
            offsets_used: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn datatype(&self) -> Datatype {
        self.datatype
    }

    /// True if this field carries an offset region.
    pub fn is_var(&self) -> bool {
        self.offsets.is_some()
    }

    /// Fixed byte capacity of the data region.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of offset slots allocated for this field (0 for fixed fields).
    pub fn offset_capacity(&self) -> usize {
        self.offsets.as_ref().map_or(0, Vec::len)
    }

    /// Bytes of the data region filled by the last submission.
    pub fn used_bytes(&self) -> usize {
        self.data_used
    }

    /// Bytes of the offset region filled by the last submission.
    pub fn used_offset_bytes(&self) -> usize {
        self.offsets_used
    }

    /// Valid portion of the data region.
    pub fn data(&self) -> &[u8] {
        &self.data[..self.data_used]
    }

    /// Valid portion of the offset region.
    pub fn offsets(&self) -> &[u64] {
        match &self.offsets {
            Some(slots) => &slots[..self.offsets_used / OFFSET_SIZE],
            None => &[],
        }
    }

    /// Whole data region, for the engine to fill.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Whole offset region, for the engine to fill.
    pub fn offsets_mut(&mut self) -> Option<&mut [u64]> {
        self.offsets.as_deref_mut()
    }

    /// Record how many data bytes the engine produced or consumed.
    pub fn set_used_bytes(&mut self, bytes: usize) {
        debug_assert!(bytes <= self.data.len());
        self.data_used = bytes;
    }

    /// Record how many offset bytes the engine produced or consumed.
    pub fn set_used_offset_bytes(&mut self, bytes: usize) {
        self.offsets_used = bytes;
    }

    /// Number of logical cells produced by the last submission.
    ///
    /// For variable-length fields this is `used_offset_bytes / 8`; for fixed
    /// fields, `used_bytes / element_size`.
    pub fn cell_count(&self) -> usize {
        if self.is_var() {
            self.offsets_used / OFFSET_SIZE
        } else {
            self.data_used / self.datatype.size()
        }
    }

    /// Byte ranges of each logical cell within the data region.
    ///
    /// Cell `r` spans `[offsets[r], offsets[r+1])`; the last produced cell is
    /// closed by the used-byte count.
    pub fn var_ranges(&self) -> Vec<Range<usize>> {
        let offsets = self.offsets();
        let mut ranges = Vec::with_capacity(offsets.len());
        for (r, &start) in offsets.iter().enumerate() {
            let end = match offsets.get(r + 1) {
                Some(&next) => next as usize,
                None => self.data_used,
            };
            ranges.push(start as usize..end);
        }
        ranges
    }

    /// Bytes of logical cell `r`, by offset decoding.
    pub fn var_cell(&self, r: usize) -> Option<&[u8]> {
        let offsets = self.offsets();
        let start = *offsets.get(r)? as usize;
        let end = match offsets.get(r + 1) {
            Some(&next) => next as usize,
            None => self.data_used,
        };
        Some(&self.data[start..end])
    }

    /// Write-side fill for a fixed field.
    pub fn fill(&mut self, bytes: &[u8]) -> Result<(), QueryError> {
        if bytes.len() > self.data.len() {
            return Err(QueryError::BufferTooSmall {
                field: self.name.clone(),
                needed: bytes.len(),
                capacity: self.data.len(),
            });
        }
        self.data[..bytes.len()].copy_from_slice(bytes);
        self.data_used = bytes.len();
        Ok(())
    }

    /// Write-side fill for a variable-length field: cumulative cell-start
    /// offsets plus the packed data bytes.
    pub fn fill_var(&mut self, offsets: &[u64], bytes: &[u8]) -> Result<(), QueryError> {
        let slots = self
            .offsets
            .as_mut()
            .ok_or_else(|| QueryError::NotVariableLength {
                field: self.name.clone(),
            })?;
        if offsets.len() > slots.len() {
            return Err(QueryError::BufferTooSmall {
                field: self.name.clone(),
                needed: offsets.len() * OFFSET_SIZE,
                capacity: slots.len() * OFFSET_SIZE,
            });
        }
        slots[..offsets.len()].copy_from_slice(offsets);
        self.offsets_used = offsets.len() * OFFSET_SIZE;
        self.fill(bytes)
    }

    fn reset(&mut self) {
        self.data_used = 0;
        self.offsets_used = 0;
    }
}

/// Interleaved coordinates region for sparse reads.
///
/// All dimensions' values are packed per cell in domain order:
/// `dim0_cell0, dim1_cell0, dim0_cell1, dim1_cell1, ...`.
#[derive(Debug)]
pub struct CoordinateBuffer {
    datatype: Datatype,
    dim_count: usize,
    data: Vec<u8>,
    used: usize,
}

impl CoordinateBuffer {
    pub fn datatype(&self) -> Datatype {
        self.datatype
    }

    pub fn dim_count(&self) -> usize {
        self.dim_count
    }

    pub fn data(&self) -> &[u8] {
        &self.data[..self.used]
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn used_bytes(&self) -> usize {
        self.used
    }

    pub fn set_used_bytes(&mut self, bytes: usize) {
        debug_assert!(bytes <= self.data.len());
        self.used = bytes;
    }

    /// Number of cells: `used / (element_size * dimension_count)`.
    pub fn cell_count(&self) -> usize {
        self.used / (self.datatype.size() * self.dim_count)
    }
}

/// The per-query collection of buffers, one per requested field.
#[derive(Debug, Default)]
pub struct BufferSet {
    buffers: Vec<QueryBuffer>,
    coordinates: Option<CoordinateBuffer>,
}

impl BufferSet {
    /// Allocate one buffer per field, sized by the capacity policy.
    ///
    /// Variable-length fields also get `policy(field) * 2` offset slots, the
    /// ratio the original client code sizes its offset regions with: each
    /// slot is 8 bytes, so the ratio governs how many logical cells can be
    /// addressed before the data region fills.
    pub fn allocate<F>(fields: &[FieldSpec], policy: F) -> Self
    where
        F: Fn(&FieldSpec) -> usize,
    {
        let buffers = fields
            .iter()
            .map(|spec| QueryBuffer::new(spec, policy(spec), policy(spec) * 2))
            .collect();
        Self {
            buffers,
            coordinates: None,
        }
    }

    /// Allocate with one flat byte capacity for every field.
    pub fn allocate_uniform(fields: &[FieldSpec], capacity: usize) -> Self {
        Self::allocate(fields, |_| capacity)
    }

    /// Builder: attach an interleaved coordinates region.
    pub fn with_coordinates(
        mut self,
        datatype: Datatype,
        dim_count: usize,
        capacity: usize,
    ) -> Self {
        self.coordinates = Some(CoordinateBuffer {
            datatype,
            dim_count,
            data: vec![0; capacity],
            used: 0,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn buffer(&self, name: &str) -> Option<&QueryBuffer> {
        self.buffers.iter().find(|b| b.name() == name)
    }

    pub fn buffer_mut(&mut self, name: &str) -> Option<&mut QueryBuffer> {
        self.buffers.iter_mut().find(|b| b.name() == name)
    }

    pub fn buffers(&self) -> impl Iterator<Item = &QueryBuffer> {
        self.buffers.iter()
    }

    pub fn buffers_mut(&mut self) -> impl Iterator<Item = &mut QueryBuffer> {
        self.buffers.iter_mut()
    }

    pub fn coordinates(&self) -> Option<&CoordinateBuffer> {
        self.coordinates.as_ref()
    }

    pub fn coordinates_mut(&mut self) -> Option<&mut CoordinateBuffer> {
        self.coordinates.as_mut()
    }

    /// Zero all used counts. Each submission overwrites from offset 0;
    /// nothing is appended across submissions.
    pub fn reset(&mut self) {
        for buffer in &mut self.buffers {
            buffer.reset();
        }
        if let Some(coords) = &mut self.coordinates {
            coords.used = 0;
        }
    }
}
