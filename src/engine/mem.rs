//! In-memory reference engine.
//!
//! [`MemEngine`] implements both capability sides of [`crate::engine`]
//! against process memory: arrays are created from a checked
//! [`ArraySchema`], each finalized write query commits one immutable
//! fragment with logical commit timestamps, and reads page committed cells
//! back through fixed-capacity buffers, reporting `Incomplete` whenever a
//! batch does not fit.
//!
//! This is the reference implementation of the engine contract, not a
//! storage engine: no persistence, no compression, no consolidation, and
//! reads replay committed cells fragment by fragment (no dense-fragment
//! merging or subarray filtering on the read path).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::array::{ArrayKind, ArraySchema, CellValNum, Datatype};
use crate::error::{CatalogError, Error, QueryError, Result};
use crate::fragment::{Fragment, NonEmptyDomain};
use crate::query::BufferSet;

use super::{FragmentSource, NativeStatus, QueryBackend};

/// Fragment format version stamped on every commit.
pub const FORMAT_VERSION: u32 = 10;

fn engine_err(message: impl Into<String>) -> Error {
    QueryError::Failed {
        message: message.into(),
    }
    .into()
}

/// Little-endian integer decode for a dimension value of the given datatype.
fn decode_int(datatype: Datatype, bytes: &[u8]) -> i64 {
    match datatype {
        Datatype::Int8 => bytes[0] as i8 as i64,
        Datatype::Int16 => i16::from_le_bytes([bytes[0], bytes[1]]) as i64,
        Datatype::Int32 => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as i64,
        Datatype::Int64 => i64::from_le_bytes(bytes[..8].try_into().unwrap()),
        Datatype::UInt8 => bytes[0] as i64,
        Datatype::UInt16 => u16::from_le_bytes([bytes[0], bytes[1]]) as i64,
        Datatype::UInt32 => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as i64,
        Datatype::UInt64 => u64::from_le_bytes(bytes[..8].try_into().unwrap()) as i64,
        _ => 0,
    }
}

/// One field's committed cells, each cell its own byte payload.
#[derive(Debug, Clone, Default)]
struct FieldCells {
    var: bool,
    cells: Vec<Vec<u8>>,
}

#[derive(Debug)]
struct MemFragment {
    meta: Fragment,
    cells: HashMap<String, FieldCells>,
}

#[derive(Debug)]
struct MemArray {
    schema: ArraySchema,
    fragments: Vec<MemFragment>,
    clock: u64,
}

type SharedStore = Arc<Mutex<HashMap<String, MemArray>>>;

/// In-memory array store.
#[derive(Debug, Clone, Default)]
pub struct MemEngine {
    store: SharedStore,
}

impl MemEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an array at `uri`. The schema is validated first.
    pub fn create(&self, uri: &str, schema: ArraySchema) -> Result<()> {
        schema.check()?;
        let mut store = self.store.lock().unwrap();
        if store.contains_key(uri) {
            return Err(engine_err(format!("array already exists: {uri}")));
        }
        store.insert(
            uri.to_string(),
            MemArray {
                schema,
                fragments: Vec::new(),
                clock: 0,
            },
        );
        Ok(())
    }

    /// Open a write query against an existing array.
    pub fn writer(&self, uri: &str) -> Result<MemWriteQuery> {
        let store = self.store.lock().unwrap();
        let array = store.get(uri).ok_or_else(|| CatalogError::ArrayNotFound {
            uri: uri.to_string(),
        })?;
        Ok(MemWriteQuery {
            store: self.store.clone(),
            uri: uri.to_string(),
            schema: array.schema.clone(),
            subarray: None,
            pending: HashMap::new(),
            pending_cells: 0,
        })
    }

    /// Open a read query replaying all fragments committed so far.
    pub fn reader(&self, uri: &str) -> Result<MemReadQuery> {
        let store = self.store.lock().unwrap();
        let array = store.get(uri).ok_or_else(|| CatalogError::ArrayNotFound {
            uri: uri.to_string(),
        })?;

        let mut cells: HashMap<String, FieldCells> = HashMap::new();
        let mut total = 0usize;
        for fragment in &array.fragments {
            total += fragment.meta.cell_count as usize;
            for (name, field) in &fragment.cells {
                let entry = cells.entry(name.clone()).or_insert_with(|| FieldCells {
                    var: field.var,
                    cells: Vec::new(),
                });
                entry.cells.extend(field.cells.iter().cloned());
            }
        }
        let dims: Vec<(String, Datatype, bool)> = array
            .schema
            .domain
            .dimensions()
            .map(|d| (d.name.clone(), d.datatype, d.is_var()))
            .collect();
        Ok(MemReadQuery {
            cells,
            dims,
            sparse: array.schema.kind == ArrayKind::Sparse,
            total,
            cursor: 0,
        })
    }
}

impl FragmentSource for MemEngine {
    fn load_fragments(&self, uri: &str) -> Result<(Vec<String>, Vec<Fragment>)> {
        let store = self.store.lock().unwrap();
        let array = store.get(uri).ok_or_else(|| CatalogError::ArrayNotFound {
            uri: uri.to_string(),
        })?;
        let dim_names = array
            .schema
            .domain
            .dimensions()
            .map(|d| d.name.clone())
            .collect();
        let fragments = array.fragments.iter().map(|f| f.meta.clone()).collect();
        Ok((dim_names, fragments))
    }
}

/// Write-capable query. Cells accumulate across submissions and commit as
/// one fragment at finalize; dropping the query without finalizing commits
/// nothing.
pub struct MemWriteQuery {
    store: SharedStore,
    uri: String,
    schema: ArraySchema,
    subarray: Option<Vec<(i64, i64)>>,
    pending: HashMap<String, FieldCells>,
    pending_cells: u64,
}

impl MemWriteQuery {
    /// Set the target subarray, one inclusive range per dimension. Required
    /// for dense writes, where coordinates are implicit.
    pub fn set_subarray(&mut self, ranges: Vec<(i64, i64)>) {
        self.subarray = Some(ranges);
    }

    fn field_layout(&self, name: &str) -> Result<(Datatype, CellValNum)> {
        if let Some(dim) = self.schema.domain.dimension_by_name(name) {
            let cvn = if dim.is_var() {
                CellValNum::Var
            } else {
                CellValNum::single()
            };
            return Ok((dim.datatype, cvn));
        }
        if let Some(attr) = self.schema.attribute(name) {
            return Ok((attr.datatype, attr.cell_val_num));
        }
        Err(QueryError::UnknownField {
            name: name.to_string(),
        }
        .into())
    }

    fn capture(&self, buffers: &BufferSet) -> Result<(HashMap<String, FieldCells>, u64)> {
        let mut captured = HashMap::new();
        let mut cell_count: Option<usize> = None;
        for buffer in buffers.buffers() {
            let (datatype, cvn) = self.field_layout(buffer.name())?;
            let cells: Vec<Vec<u8>> = match cvn {
                CellValNum::Var => buffer
                    .var_ranges()
                    .into_iter()
                    .map(|r| buffer.data()[r].to_vec())
                    .collect(),
                CellValNum::Fixed(n) => {
                    let width = datatype.size() * n as usize;
                    if buffer.used_bytes() % width != 0 {
                        return Err(engine_err(format!(
                            "field '{}' wrote {} bytes, not a multiple of the {width}-byte cell",
                            buffer.name(),
                            buffer.used_bytes()
                        )));
                    }
                    buffer.data().chunks(width).map(<[u8]>::to_vec).collect()
                }
            };
            match cell_count {
                None => cell_count = Some(cells.len()),
                Some(expected) if expected != cells.len() => {
                    return Err(engine_err(format!(
                        "field '{}' wrote {} cells, expected {}",
                        buffer.name(),
                        cells.len(),
                        expected
                    )));
                }
                Some(_) => {}
            }
            captured.insert(
                buffer.name().to_string(),
                FieldCells {
                    var: cvn.is_var(),
                    cells,
                },
            );
        }
        let count = cell_count.unwrap_or(0) as u64;

        // Dense writes carry no coordinates; the subarray shape fixes the
        // cell count.
        if self.schema.kind == ArrayKind::Dense {
            let subarray = self
                .subarray
                .as_ref()
                .ok_or_else(|| engine_err("dense write requires a subarray"))?;
            let expected: u64 = subarray
                .iter()
                .map(|(lo, hi)| (hi - lo + 1) as u64)
                .product();
            if count != expected {
                return Err(engine_err(format!(
                    "dense write of {count} cells does not match subarray of {expected}"
                )));
            }
        } else {
            for dim in self.schema.domain.dimensions() {
                if !captured.contains_key(&dim.name) {
                    return Err(engine_err(format!(
                        "sparse write missing dimension buffer '{}'",
                        dim.name
                    )));
                }
            }
        }

        // Every attribute must be written; a fragment with a partial field
        // set would leave later multi-fragment reads with ragged cell runs.
        for attr in self.schema.attributes() {
            if !captured.contains_key(&attr.name) {
                return Err(engine_err(format!(
                    "write missing attribute buffer '{}'",
                    attr.name
                )));
            }
        }
        Ok((captured, count))
    }

    fn non_empty_domains(&self) -> Vec<NonEmptyDomain> {
        self.schema
            .domain
            .dimensions()
            .enumerate()
            .map(|(i, dim)| {
                if self.schema.kind == ArrayKind::Dense {
                    let (lo, hi) = self.subarray.as_ref().unwrap()[i];
                    return NonEmptyDomain::Fixed(lo, hi);
                }
                let cells = &self.pending[&dim.name].cells;
                if dim.is_var() {
                    let lo = cells.iter().min().cloned().unwrap_or_default();
                    let hi = cells.iter().max().cloned().unwrap_or_default();
                    NonEmptyDomain::Var(lo, hi)
                } else {
                    let values = cells.iter().map(|c| decode_int(dim.datatype, c));
                    let lo = values.clone().min().unwrap_or(0);
                    let hi = values.max().unwrap_or(0);
                    NonEmptyDomain::Fixed(lo, hi)
                }
            })
            .collect()
    }
}

impl QueryBackend for MemWriteQuery {
    fn submit(&mut self, buffers: &mut BufferSet) -> Result<NativeStatus> {
        let (captured, count) = self.capture(buffers)?;
        for (name, field) in captured {
            let entry = self.pending.entry(name).or_insert_with(|| FieldCells {
                var: field.var,
                cells: Vec::new(),
            });
            entry.cells.extend(field.cells);
        }
        self.pending_cells += count;
        Ok(NativeStatus::Completed)
    }

    fn finalize(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let non_empty = self.non_empty_domains();
        let size_bytes: u64 = self
            .pending
            .values()
            .map(|f| {
                f.cells.iter().map(|c| c.len() as u64).sum::<u64>()
                    + if f.var { 8 * f.cells.len() as u64 } else { 0 }
            })
            .sum();

        let mut store = self.store.lock().unwrap();
        let array = store
            .get_mut(&self.uri)
            .ok_or_else(|| CatalogError::ArrayNotFound {
                uri: self.uri.clone(),
            })?;
        array.clock += 1;
        let timestamp = array.clock;
        let name = format!(
            "__{timestamp}_{timestamp}_{:032x}_{FORMAT_VERSION}",
            array.fragments.len() + 1
        );
        let meta = Fragment {
            uri: format!("{}/{}", self.uri, name),
            size_bytes,
            kind: self.schema.kind,
            timestamp_range: (timestamp, timestamp),
            non_empty,
            cell_count: self.pending_cells,
            format_version: FORMAT_VERSION,
            has_consolidated_metadata: false,
        };
        debug!(uri = %meta.uri, cells = self.pending_cells, "committed fragment");
        array.fragments.push(MemFragment {
            meta,
            cells: std::mem::take(&mut self.pending),
        });
        self.pending_cells = 0;
        Ok(())
    }
}

/// Read-capable query over a snapshot of committed cells.
///
/// Fills only the buffers present in the supplied [`BufferSet`]; pages with
/// `Incomplete` whenever the next cell does not fit every attached region.
pub struct MemReadQuery {
    cells: HashMap<String, FieldCells>,
    dims: Vec<(String, Datatype, bool)>,
    sparse: bool,
    total: usize,
    cursor: usize,
}

impl MemReadQuery {
    fn field(&self, name: &str) -> Result<&FieldCells> {
        self.cells.get(name).ok_or_else(|| {
            QueryError::UnknownField {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Can cell `r` be appended given the bytes already placed this pass?
    fn cell_fits(
        &self,
        r: usize,
        buffers: &BufferSet,
        fill: &HashMap<String, (usize, usize)>,
        coord_used: usize,
    ) -> Result<bool> {
        for buffer in buffers.buffers() {
            let field = self.field(buffer.name())?;
            let cell_len = field.cells[r].len();
            let (data_used, cells_placed) = fill[buffer.name()];
            if data_used + cell_len > buffer.capacity() {
                return Ok(false);
            }
            if buffer.is_var() && cells_placed + 1 > buffer.offset_capacity() {
                return Ok(false);
            }
        }
        if let Some(coords) = buffers.coordinates() {
            let width: usize = self.dims.iter().map(|(_, dt, _)| dt.size()).sum();
            if coord_used + width > coords.capacity() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl QueryBackend for MemReadQuery {
    fn submit(&mut self, buffers: &mut BufferSet) -> Result<NativeStatus> {
        if buffers.coordinates().is_some() {
            if !self.sparse {
                return Err(engine_err("coordinates requested on a dense read"));
            }
            if self.dims.iter().any(|(_, _, var)| *var) {
                return Err(engine_err(
                    "coordinates buffer unsupported with string dimensions",
                ));
            }
        }

        buffers.reset();

        // (bytes placed, cells placed) per requested field this pass.
        let mut fill: HashMap<String, (usize, usize)> = buffers
            .buffers()
            .map(|b| (b.name().to_string(), (0, 0)))
            .collect();
        let mut coord_used = 0usize;
        let mut produced = 0usize;

        while self.cursor + produced < self.total {
            let r = self.cursor + produced;
            if !self.cell_fits(r, buffers, &fill, coord_used)? {
                break;
            }
            for buffer in buffers.buffers_mut() {
                let name = buffer.name().to_string();
                let cell = self.cells[&name].cells[r].clone();
                let entry = fill.get_mut(&name).unwrap();
                if buffer.is_var() {
                    let offsets = buffer.offsets_mut().unwrap();
                    offsets[entry.1] = entry.0 as u64;
                }
                buffer.data_mut()[entry.0..entry.0 + cell.len()].copy_from_slice(&cell);
                entry.0 += cell.len();
                entry.1 += 1;
            }
            if let Some(coords) = buffers.coordinates_mut() {
                for (dim_name, _, _) in &self.dims {
                    let cell = &self.cells[dim_name].cells[r];
                    coords.data_mut()[coord_used..coord_used + cell.len()].copy_from_slice(cell);
                    coord_used += cell.len();
                }
            }
            produced += 1;
        }

        for buffer in buffers.buffers_mut() {
            let (data_used, cells_placed) = fill[buffer.name()];
            buffer.set_used_bytes(data_used);
            if buffer.is_var() {
                buffer.set_used_offset_bytes(cells_placed * 8);
            }
        }
        if let Some(coords) = buffers.coordinates_mut() {
            coords.set_used_bytes(coord_used);
        }

        self.cursor += produced;
        debug!(produced, remaining = self.total - self.cursor, "read batch");
        if self.cursor < self.total {
            Ok(NativeStatus::Incomplete)
        } else {
            Ok(NativeStatus::Completed)
        }
    }

    fn finalize(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::{Attribute, Dimension};
    use crate::query::{FieldSpec, QueryExecutor};

    fn sparse_int_array(engine: &MemEngine, uri: &str) {
        let mut schema = ArraySchema::new(ArrayKind::Sparse);
        schema
            .domain
            .add_dimension(Dimension::new("d", Datatype::Int32, (1, 100), 10))
            .unwrap();
        schema
            .add_attribute(Attribute::new("a", Datatype::Int32))
            .unwrap();
        engine.create(uri, schema).unwrap();
    }

    fn le_i32s(values: &[i32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn write_cells(engine: &MemEngine, uri: &str, coords: &[i32], values: &[i32]) {
        let mut buffers = BufferSet::allocate_uniform(
            &[
                FieldSpec::fixed("d", Datatype::Int32),
                FieldSpec::fixed("a", Datatype::Int32),
            ],
            256,
        );
        buffers.buffer_mut("d").unwrap().fill(&le_i32s(coords)).unwrap();
        buffers.buffer_mut("a").unwrap().fill(&le_i32s(values)).unwrap();
        let mut executor = QueryExecutor::new(engine.writer(uri).unwrap());
        executor.write(&mut buffers).unwrap();
    }

    #[test]
    fn test_unfinalized_write_commits_nothing() {
        let engine = MemEngine::new();
        sparse_int_array(&engine, "a");
        let mut buffers = BufferSet::allocate_uniform(
            &[
                FieldSpec::fixed("d", Datatype::Int32),
                FieldSpec::fixed("a", Datatype::Int32),
            ],
            64,
        );
        buffers.buffer_mut("d").unwrap().fill(&le_i32s(&[1])).unwrap();
        buffers.buffer_mut("a").unwrap().fill(&le_i32s(&[7])).unwrap();

        let mut query = engine.writer("a").unwrap();
        query.submit(&mut buffers).unwrap();
        drop(query);

        let (_, fragments) = engine.load_fragments("a").unwrap();
        assert!(fragments.is_empty());
    }

    #[test]
    fn test_write_then_read_back() {
        let engine = MemEngine::new();
        sparse_int_array(&engine, "a");
        write_cells(&engine, "a", &[3, 5, 9], &[30, 50, 90]);

        let mut buffers =
            BufferSet::allocate_uniform(&[FieldSpec::fixed("a", Datatype::Int32)], 256);
        let mut executor = QueryExecutor::new(engine.reader("a").unwrap());
        let mut seen = Vec::new();
        executor
            .read_to_completion(&mut buffers, |set| {
                let a = set.buffer("a").unwrap();
                for chunk in a.data().chunks(4) {
                    seen.push(i32::from_le_bytes(chunk.try_into().unwrap()));
                }
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, vec![30, 50, 90]);
        assert_eq!(executor.submissions(), 1);
    }

    #[test]
    fn test_small_buffers_page_with_incomplete() {
        let engine = MemEngine::new();
        sparse_int_array(&engine, "a");
        write_cells(&engine, "a", &[1, 2, 3, 4, 5], &[10, 20, 30, 40, 50]);

        // Room for exactly two i32 cells per pass.
        let mut buffers =
            BufferSet::allocate_uniform(&[FieldSpec::fixed("a", Datatype::Int32)], 8);
        let mut executor = QueryExecutor::new(engine.reader("a").unwrap());
        let mut seen = Vec::new();
        executor
            .read_to_completion(&mut buffers, |set| {
                let a = set.buffer("a").unwrap();
                for chunk in a.data().chunks(4) {
                    seen.push(i32::from_le_bytes(chunk.try_into().unwrap()));
                }
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, vec![10, 20, 30, 40, 50]);
        assert_eq!(executor.submissions(), 3);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let engine = MemEngine::new();
        sparse_int_array(&engine, "a");
        write_cells(&engine, "a", &[1], &[10]);

        let mut buffers =
            BufferSet::allocate_uniform(&[FieldSpec::fixed("nope", Datatype::Int32)], 64);
        let mut executor = QueryExecutor::new(engine.reader("a").unwrap());
        let err = executor.submit(&mut buffers).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_write_must_cover_every_attribute() {
        let engine = MemEngine::new();
        let mut schema = ArraySchema::new(ArrayKind::Sparse);
        schema
            .domain
            .add_dimension(Dimension::new("d", Datatype::Int32, (1, 100), 10))
            .unwrap();
        schema
            .add_attribute(Attribute::new("a", Datatype::Int32))
            .unwrap();
        schema
            .add_attribute(Attribute::new("b", Datatype::Int32))
            .unwrap();
        engine.create("two-attrs", schema).unwrap();

        let mut full = BufferSet::allocate_uniform(
            &[
                FieldSpec::fixed("d", Datatype::Int32),
                FieldSpec::fixed("a", Datatype::Int32),
                FieldSpec::fixed("b", Datatype::Int32),
            ],
            64,
        );
        full.buffer_mut("d").unwrap().fill(&le_i32s(&[1])).unwrap();
        full.buffer_mut("a").unwrap().fill(&le_i32s(&[7])).unwrap();
        full.buffer_mut("b").unwrap().fill(&le_i32s(&[9])).unwrap();
        let mut executor = QueryExecutor::new(engine.writer("two-attrs").unwrap());
        executor.write(&mut full).unwrap();

        // A second fragment that skips "b" would leave reads of "b" with
        // fewer cells than the array total.
        let mut partial = BufferSet::allocate_uniform(
            &[
                FieldSpec::fixed("d", Datatype::Int32),
                FieldSpec::fixed("a", Datatype::Int32),
            ],
            64,
        );
        partial.buffer_mut("d").unwrap().fill(&le_i32s(&[2])).unwrap();
        partial.buffer_mut("a").unwrap().fill(&le_i32s(&[8])).unwrap();
        let mut query = engine.writer("two-attrs").unwrap();
        let err = query.submit(&mut partial).unwrap_err();
        assert!(err.to_string().contains("attribute buffer 'b'"));

        let (_, fragments) = engine.load_fragments("two-attrs").unwrap();
        assert_eq!(fragments.len(), 1);
    }

    #[test]
    fn test_mismatched_cell_counts_rejected() {
        let engine = MemEngine::new();
        sparse_int_array(&engine, "a");
        let mut buffers = BufferSet::allocate_uniform(
            &[
                FieldSpec::fixed("d", Datatype::Int32),
                FieldSpec::fixed("a", Datatype::Int32),
            ],
            64,
        );
        buffers.buffer_mut("d").unwrap().fill(&le_i32s(&[1, 2])).unwrap();
        buffers.buffer_mut("a").unwrap().fill(&le_i32s(&[7])).unwrap();
        let mut query = engine.writer("a").unwrap();
        assert!(query.submit(&mut buffers).is_err());
    }
}
