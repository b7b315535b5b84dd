//! End-to-end buffered query tests: write through the public API, read back
//! through the incomplete/resubmit loop, decoding variable-length cells and
//! interleaved coordinates from the reported used-byte counts.

use cellarr::engine::mem::MemEngine;
use cellarr::prelude::*;
use cellarr::QueryError;

/// Sparse 1-D array with a float attribute and a var-length text attribute,
/// shaped like a small variant-call store.
fn create_array(engine: &MemEngine, uri: &str) {
    let mut schema = ArraySchema::new(ArrayKind::Sparse);
    schema
        .domain
        .add_dimension(Dimension::new("pos", Datatype::Int32, (1, 1000), 100))
        .unwrap();
    schema
        .add_attribute(Attribute::new("qual", Datatype::Float32))
        .unwrap();
    schema
        .add_attribute(
            Attribute::new("alleles", Datatype::StringAscii)
                .with_cell_val_num(CellValNum::Var),
        )
        .unwrap();
    engine.create(uri, schema).unwrap();
}

const POSITIONS: [i32; 5] = [10, 20, 30, 40, 50];
const QUALS: [f32; 5] = [0.5, 1.5, 2.5, 3.5, 4.5];
const ALLELES: [&str; 5] = ["A", "CG", "T", "GATT", "C"];

fn write_cells(engine: &MemEngine, uri: &str) {
    let pos: Vec<u8> = POSITIONS.iter().flat_map(|v| v.to_le_bytes()).collect();
    let qual: Vec<u8> = QUALS.iter().flat_map(|v| v.to_le_bytes()).collect();
    let mut offsets = Vec::new();
    let mut data = Vec::new();
    for a in ALLELES {
        offsets.push(data.len() as u64);
        data.extend_from_slice(a.as_bytes());
    }

    let mut buffers = BufferSet::allocate_uniform(
        &[
            FieldSpec::fixed("pos", Datatype::Int32),
            FieldSpec::fixed("qual", Datatype::Float32),
            FieldSpec::var("alleles", Datatype::StringAscii),
        ],
        256,
    );
    buffers.buffer_mut("pos").unwrap().fill(&pos).unwrap();
    buffers.buffer_mut("qual").unwrap().fill(&qual).unwrap();
    buffers
        .buffer_mut("alleles")
        .unwrap()
        .fill_var(&offsets, &data)
        .unwrap();

    let mut executor = QueryExecutor::new(engine.writer(uri).unwrap());
    executor.write(&mut buffers).unwrap();
    assert_eq!(executor.state(), QueryState::Completed);
}

fn drain(set: &BufferSet, quals: &mut Vec<f32>, alleles: &mut Vec<String>, coords: &mut Vec<i32>) {
    let qual = set.buffer("qual").unwrap();
    for chunk in qual.data().chunks(4) {
        quals.push(f32::from_le_bytes(chunk.try_into().unwrap()));
    }

    let var = set.buffer("alleles").unwrap();
    for r in 0..var.cell_count() {
        let cell = var.var_cell(r).unwrap();
        alleles.push(String::from_utf8(cell.to_vec()).unwrap());
    }

    let coord_buffer = set.coordinates().unwrap();
    for chunk in coord_buffer.data().chunks(4) {
        coords.push(i32::from_le_bytes(chunk.try_into().unwrap()));
    }
}

#[test]
fn read_completes_in_one_pass_with_large_buffers() {
    let engine = MemEngine::new();
    create_array(&engine, "mem://vcf");
    write_cells(&engine, "mem://vcf");

    let mut buffers = BufferSet::allocate_uniform(
        &[
            FieldSpec::fixed("qual", Datatype::Float32),
            FieldSpec::var("alleles", Datatype::StringAscii),
        ],
        2048,
    )
    .with_coordinates(Datatype::Int32, 1, 2048);

    let mut executor = QueryExecutor::new(engine.reader("mem://vcf").unwrap());
    let (mut quals, mut alleles, mut coords) = (Vec::new(), Vec::new(), Vec::new());
    executor
        .read_to_completion(&mut buffers, |set| {
            drain(set, &mut quals, &mut alleles, &mut coords);
            Ok(())
        })
        .unwrap();

    assert_eq!(executor.submissions(), 1);
    assert_eq!(quals, QUALS);
    assert_eq!(alleles, ALLELES);
    assert_eq!(coords, POSITIONS);
}

#[test]
fn small_buffers_page_until_complete() {
    let engine = MemEngine::new();
    create_array(&engine, "mem://vcf");
    write_cells(&engine, "mem://vcf");

    // Two float cells per pass; everything else has slack.
    let mut buffers = BufferSet::allocate(
        &[
            FieldSpec::fixed("qual", Datatype::Float32),
            FieldSpec::var("alleles", Datatype::StringAscii),
        ],
        |spec| if spec.var { 64 } else { 8 },
    )
    .with_coordinates(Datatype::Int32, 1, 64);

    let mut executor = QueryExecutor::new(engine.reader("mem://vcf").unwrap());
    let (mut quals, mut alleles, mut coords) = (Vec::new(), Vec::new(), Vec::new());
    let mut batches = 0;
    executor
        .read_to_completion(&mut buffers, |set| {
            batches += 1;
            // Cell counts line up across fields within a batch.
            assert_eq!(
                set.buffer("qual").unwrap().cell_count(),
                set.buffer("alleles").unwrap().cell_count()
            );
            assert_eq!(
                set.coordinates().unwrap().cell_count(),
                set.buffer("qual").unwrap().cell_count()
            );
            drain(set, &mut quals, &mut alleles, &mut coords);
            Ok(())
        })
        .unwrap();

    assert_eq!(batches, 3);
    assert_eq!(executor.submissions(), 3);
    assert_eq!(executor.state(), QueryState::Completed);
    assert_eq!(quals, QUALS);
    assert_eq!(alleles, ALLELES);
    assert_eq!(coords, POSITIONS);
}

#[test]
fn buffers_smaller_than_one_cell_fail_the_read() {
    let engine = MemEngine::new();
    create_array(&engine, "mem://vcf");
    write_cells(&engine, "mem://vcf");

    // Two bytes can never hold a four-byte float cell.
    let mut buffers =
        BufferSet::allocate_uniform(&[FieldSpec::fixed("qual", Datatype::Float32)], 2);
    let mut executor = QueryExecutor::new(engine.reader("mem://vcf").unwrap());
    let err = executor
        .read_to_completion(&mut buffers, |_| Ok(()))
        .unwrap_err();

    assert!(matches!(err, Error::Query(QueryError::NoProgress)));
    assert_eq!(executor.state(), QueryState::Failed);
    assert_eq!(executor.submissions(), 1);
}

#[test]
fn reads_span_multiple_fragments_in_commit_order() {
    let engine = MemEngine::new();
    create_array(&engine, "mem://vcf");
    write_cells(&engine, "mem://vcf");
    write_cells(&engine, "mem://vcf");

    let mut buffers = BufferSet::allocate_uniform(
        &[FieldSpec::fixed("qual", Datatype::Float32)],
        2048,
    );
    let mut executor = QueryExecutor::new(engine.reader("mem://vcf").unwrap());
    let mut quals = Vec::new();
    executor
        .read_to_completion(&mut buffers, |set| {
            for chunk in set.buffer("qual").unwrap().data().chunks(4) {
                quals.push(f32::from_le_bytes(chunk.try_into().unwrap()));
            }
            Ok(())
        })
        .unwrap();

    let expected: Vec<f32> = QUALS.iter().chain(QUALS.iter()).copied().collect();
    assert_eq!(quals, expected);
}

#[test]
fn schema_built_from_columns_round_trips_through_engine() {
    use cellarr::schema::{self, DimensionSpec, PartitionConfig};

    let mut columns = ColumnSchema::new();
    columns
        .push(ColumnField::scalar("pos", ScalarKind::Int32))
        .unwrap();
    columns
        .push(ColumnField::nullable(
            "qual",
            ColumnType::Scalar(ScalarKind::Float32),
        ))
        .unwrap();
    columns.push(ColumnField::text("alleles")).unwrap();

    let config = PartitionConfig::new()
        .with_dimension("pos", DimensionSpec::new((1, 1000), 100));
    let array_schema = schema::build(&columns, &config).unwrap();

    let engine = MemEngine::new();
    engine.create("mem://built", array_schema).unwrap();
    write_cells(&engine, "mem://built");

    let info = FragmentCatalog::open(&engine, "mem://built").unwrap();
    assert_eq!(info.fragment_count(), 1);
    assert_eq!(info.cell_count(0).unwrap(), 5);
    assert!(info.is_sparse(0).unwrap());
    assert_eq!(info.non_empty_domain(0, "pos").unwrap(), (10, 50));
}
