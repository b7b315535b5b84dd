//! Translation between column schemas and native array schemas.
//!
//! The mapping is bidirectional:
//!
//! - [`project`] narrows a native [`ArraySchema`] to a flat [`ColumnSchema`],
//!   optionally restricted to a required set of column names (column pruning
//!   happens upstream; only the name set arrives here).
//! - [`build`] assembles a native schema from a column schema plus a
//!   [`PartitionConfig`] naming which columns become dimensions.
//!
//! Every type branch either maps or fails; there are no silent no-op
//! mappings. Unsupported combinations fail with the matching
//! [`SchemaError`] variant at the first offending field.

use std::collections::HashMap;
use std::collections::HashSet;

use crate::array::{
    ArrayKind, ArraySchema, Attribute, CellValNum, Datatype, Dimension, Layout,
};
use crate::error::SchemaError;

use super::{ColumnField, ColumnSchema, ColumnType, ScalarKind};

/// Domain and tile extent for one partition column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionSpec {
    /// Inclusive lower/upper bounds
    pub domain: (i64, i64),
    /// Number of domain values per physical tile
    pub extent: i64,
}

impl DimensionSpec {
    pub fn new(domain: (i64, i64), extent: i64) -> Self {
        Self { domain, extent }
    }
}

/// Which columns become dimensions, plus the array-level build knobs.
///
/// Dimension order in the built schema follows the order columns appear in
/// the input [`ColumnSchema`], not insertion order here.
#[derive(Debug, Clone, Default)]
pub struct PartitionConfig {
    dimensions: HashMap<String, DimensionSpec>,
    pub array_kind: ArrayKind,
    pub tile_order: Layout,
    pub cell_order: Layout,
}

impl PartitionConfig {
    /// Sparse, row-major configuration with no dimensions assigned yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: mark a column as a dimension.
    pub fn with_dimension(mut self, name: impl Into<String>, spec: DimensionSpec) -> Self {
        self.dimensions.insert(name.into(), spec);
        self
    }

    /// Builder: set the array kind.
    pub fn with_array_kind(mut self, kind: ArrayKind) -> Self {
        self.array_kind = kind;
        self
    }

    /// Builder: set tile and cell order together.
    pub fn with_layout(mut self, tile_order: Layout, cell_order: Layout) -> Self {
        self.tile_order = tile_order;
        self.cell_order = cell_order;
        self
    }

    /// True if the named column is designated a dimension.
    pub fn is_dimension(&self, name: &str) -> bool {
        self.dimensions.contains_key(name)
    }

    /// Spec for a designated dimension column.
    pub fn dimension_spec(&self, name: &str) -> Option<&DimensionSpec> {
        self.dimensions.get(name)
    }
}

fn native_datatype(kind: ScalarKind) -> Datatype {
    match kind {
        ScalarKind::Int8 => Datatype::Int8,
        ScalarKind::Int16 => Datatype::Int16,
        ScalarKind::Int32 => Datatype::Int32,
        ScalarKind::Int64 => Datatype::Int64,
        ScalarKind::UInt8 => Datatype::UInt8,
        ScalarKind::UInt16 => Datatype::UInt16,
        ScalarKind::UInt32 => Datatype::UInt32,
        ScalarKind::UInt64 => Datatype::UInt64,
        ScalarKind::Float32 => Datatype::Float32,
        ScalarKind::Float64 => Datatype::Float64,
        ScalarKind::Bool => Datatype::Bool,
    }
}

fn scalar_kind(datatype: Datatype) -> Option<ScalarKind> {
    match datatype {
        Datatype::Int8 => Some(ScalarKind::Int8),
        Datatype::Int16 => Some(ScalarKind::Int16),
        Datatype::Int32 => Some(ScalarKind::Int32),
        Datatype::Int64 => Some(ScalarKind::Int64),
        Datatype::UInt8 => Some(ScalarKind::UInt8),
        Datatype::UInt16 => Some(ScalarKind::UInt16),
        Datatype::UInt32 => Some(ScalarKind::UInt32),
        Datatype::UInt64 => Some(ScalarKind::UInt64),
        Datatype::Float32 => Some(ScalarKind::Float32),
        Datatype::Float64 => Some(ScalarKind::Float64),
        Datatype::Bool => Some(ScalarKind::Bool),
        Datatype::StringAscii | Datatype::Blob => None,
    }
}

/// Map a native datatype plus cell-value-count to a column type.
///
/// Character kinds always map to [`ColumnType::Text`] regardless of the
/// declared count. A count above one on a scalar kind yields a fixed-length
/// list; a variable count yields a variable-length list.
pub fn to_column_type(
    datatype: Datatype,
    cell_val_num: CellValNum,
) -> Result<ColumnType, SchemaError> {
    if datatype.is_string() {
        return Ok(ColumnType::Text);
    }
    let kind = scalar_kind(datatype).ok_or(SchemaError::UnsupportedType {
        datatype: datatype.type_name(),
    })?;
    Ok(match cell_val_num {
        CellValNum::Fixed(1) => ColumnType::Scalar(kind),
        CellValNum::Fixed(n) => ColumnType::FixedList(kind, n),
        CellValNum::Var => ColumnType::VarList(kind),
    })
}

/// Map a column field to a native attribute.
///
/// Numeric and bool scalars map one-to-one with a single-value cell; text
/// maps to variable-length character data; lists map to their element
/// datatype with the matching cell-value-count. List elements must be
/// numeric; anything else fails with
/// [`SchemaError::UnsupportedColumnType`].
pub fn to_native_attribute(field: &ColumnField) -> Result<Attribute, SchemaError> {
    let unsupported = || SchemaError::UnsupportedColumnType {
        field: field.name.clone(),
        column_type: field.column_type.to_string(),
    };
    let (datatype, cell_val_num) = match &field.column_type {
        ColumnType::Scalar(kind) => (native_datatype(*kind), CellValNum::single()),
        ColumnType::Text => (Datatype::StringAscii, CellValNum::Var),
        ColumnType::FixedList(kind, n) => {
            if !kind.is_integer() && !kind.is_float() {
                return Err(unsupported());
            }
            (native_datatype(*kind), CellValNum::Fixed(*n))
        }
        ColumnType::VarList(kind) => {
            if !kind.is_integer() && !kind.is_float() {
                return Err(unsupported());
            }
            (native_datatype(*kind), CellValNum::Var)
        }
    };
    Ok(Attribute::new(field.name.clone(), datatype)
        .with_cell_val_num(cell_val_num)
        .set_nullable(field.nullable))
}

/// Map a column field to a native dimension.
///
/// Only integer scalar kinds are legal; domain and tile extent come from the
/// partition configuration entry for the column.
pub fn to_native_dimension(
    field: &ColumnField,
    config: &PartitionConfig,
) -> Result<Dimension, SchemaError> {
    let kind = match &field.column_type {
        ColumnType::Scalar(kind) if kind.is_integer() => *kind,
        _ => {
            return Err(SchemaError::UnsupportedDimensionType {
                field: field.name.clone(),
                column_type: field.column_type.to_string(),
            })
        }
    };
    let spec = config
        .dimension_spec(&field.name)
        .ok_or_else(|| SchemaError::MissingDimensionSpec {
            name: field.name.clone(),
        })?;
    Ok(Dimension::new(
        field.name.clone(),
        native_datatype(kind),
        spec.domain,
        spec.extent,
    ))
}

/// Project a native array schema to a column schema.
///
/// Dimensions come first, in domain order, then attributes in schema order.
/// When `required` is present, only named fields are included. Fails fast at
/// the first field whose type has no column equivalent.
pub fn project(
    schema: &ArraySchema,
    required: Option<&HashSet<String>>,
) -> Result<ColumnSchema, SchemaError> {
    let wanted = |name: &str| required.map_or(true, |set| set.contains(name));
    let mut out = ColumnSchema::new();
    for dim in schema.domain.dimensions() {
        if !wanted(&dim.name) {
            continue;
        }
        let cell_val_num = if dim.is_var() {
            CellValNum::Var
        } else {
            CellValNum::single()
        };
        let column_type = to_column_type(dim.datatype, cell_val_num)?;
        out.push(ColumnField::new(dim.name.clone(), column_type))?;
    }
    for attr in schema.attributes() {
        if !wanted(&attr.name) {
            continue;
        }
        let column_type = to_column_type(attr.datatype, attr.cell_val_num)?;
        out.push(
            ColumnField::new(attr.name.clone(), column_type).set_nullable(attr.nullable),
        )?;
    }
    Ok(out)
}

/// Build a native array schema from a column schema and partition config.
///
/// Columns designated as dimensions are converted in field order and appended
/// to the domain; everything else becomes an attribute, also in field order.
/// The assembled schema is validated before it is returned; validation
/// failure surfaces as [`SchemaError::InvalidSchema`].
pub fn build(
    schema: &ColumnSchema,
    config: &PartitionConfig,
) -> Result<ArraySchema, SchemaError> {
    let mut out = ArraySchema::new(config.array_kind)
        .with_tile_order(config.tile_order)
        .with_cell_order(config.cell_order);
    for field in schema.fields() {
        if config.is_dimension(&field.name) {
            out.domain.add_dimension(to_native_dimension(field, config)?)?;
        } else {
            out.add_attribute(to_native_attribute(field)?)?;
        }
    }
    out.check()?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vcf_schema() -> ColumnSchema {
        let mut schema = ColumnSchema::new();
        schema
            .push(ColumnField::scalar("pos", ScalarKind::Int64))
            .unwrap();
        schema
            .push(ColumnField::nullable(
                "qual",
                ColumnType::Scalar(ScalarKind::Float32),
            ))
            .unwrap();
        schema.push(ColumnField::text("alleles")).unwrap();
        schema
            .push(ColumnField::new(
                "filter_ids",
                ColumnType::VarList(ScalarKind::Int32),
            ))
            .unwrap();
        schema
    }

    fn pos_partition() -> PartitionConfig {
        PartitionConfig::new().with_dimension("pos", DimensionSpec::new((1, 4), 2))
    }

    #[test]
    fn test_cell_val_num_policy() {
        for (datatype, kind) in [
            (Datatype::Int8, ScalarKind::Int8),
            (Datatype::Int64, ScalarKind::Int64),
            (Datatype::UInt16, ScalarKind::UInt16),
            (Datatype::Float32, ScalarKind::Float32),
            (Datatype::Bool, ScalarKind::Bool),
        ] {
            assert_eq!(
                to_column_type(datatype, CellValNum::single()).unwrap(),
                ColumnType::Scalar(kind)
            );
            assert_eq!(
                to_column_type(datatype, CellValNum::Fixed(3)).unwrap(),
                ColumnType::FixedList(kind, 3)
            );
            assert_eq!(
                to_column_type(datatype, CellValNum::Var).unwrap(),
                ColumnType::VarList(kind)
            );
        }
    }

    #[test]
    fn test_char_kind_always_text() {
        for cvn in [CellValNum::single(), CellValNum::Fixed(7), CellValNum::Var] {
            assert_eq!(
                to_column_type(Datatype::StringAscii, cvn).unwrap(),
                ColumnType::Text
            );
        }
    }

    #[test]
    fn test_blob_fails_closed() {
        let err = to_column_type(Datatype::Blob, CellValNum::single()).unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedType { datatype } if datatype == "BLOB"));
    }

    #[test]
    fn test_attribute_mapping() {
        let attr =
            to_native_attribute(&ColumnField::scalar("a", ScalarKind::Int32)).unwrap();
        assert_eq!(attr.datatype, Datatype::Int32);
        assert_eq!(attr.cell_val_num, CellValNum::single());
        assert!(!attr.nullable);

        let attr = to_native_attribute(&ColumnField::text("s").set_nullable(true)).unwrap();
        assert_eq!(attr.datatype, Datatype::StringAscii);
        assert!(attr.is_var());
        assert!(attr.nullable);

        let attr = to_native_attribute(&ColumnField::new(
            "v",
            ColumnType::FixedList(ScalarKind::Float64, 2),
        ))
        .unwrap();
        assert_eq!(attr.datatype, Datatype::Float64);
        assert_eq!(attr.cell_val_num, CellValNum::Fixed(2));
    }

    #[test]
    fn test_bool_list_attribute_fails_closed() {
        let err = to_native_attribute(&ColumnField::new(
            "flags",
            ColumnType::VarList(ScalarKind::Bool),
        ))
        .unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedColumnType { .. }));
    }

    #[test]
    fn test_dimension_mapping() {
        let config = pos_partition();
        let dim =
            to_native_dimension(&ColumnField::scalar("pos", ScalarKind::Int64), &config)
                .unwrap();
        assert_eq!(dim.datatype, Datatype::Int64);
        assert_eq!(dim.domain, Some((1, 4)));
        assert_eq!(dim.extent, Some(2));
    }

    #[test]
    fn test_non_integer_dimension_rejected() {
        let config = PartitionConfig::new()
            .with_dimension("alleles", DimensionSpec::new((1, 4), 2))
            .with_dimension("qual", DimensionSpec::new((1, 4), 2));
        for field in [
            ColumnField::text("alleles"),
            ColumnField::scalar("qual", ScalarKind::Float32),
        ] {
            let err = to_native_dimension(&field, &config).unwrap_err();
            assert!(matches!(err, SchemaError::UnsupportedDimensionType { .. }));
        }
    }

    #[test]
    fn test_missing_dimension_spec() {
        let err = to_native_dimension(
            &ColumnField::scalar("pos", ScalarKind::Int64),
            &PartitionConfig::new(),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::MissingDimensionSpec { name } if name == "pos"));
    }

    #[test]
    fn test_build_defaults_sparse_row_major() {
        let built = build(&vcf_schema(), &pos_partition()).unwrap();
        assert_eq!(built.kind, ArrayKind::Sparse);
        assert_eq!(built.tile_order, Layout::RowMajor);
        assert_eq!(built.cell_order, Layout::RowMajor);
        assert_eq!(built.domain.ndim(), 1);
        assert_eq!(built.nattr(), 3);
        assert!(built.attribute("alleles").unwrap().is_var());
    }

    #[test]
    fn test_build_validation_failure() {
        // Extent larger than the domain range fails native validation.
        let config = PartitionConfig::new()
            .with_dimension("pos", DimensionSpec::new((1, 4), 100));
        let err = build(&vcf_schema(), &config).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidSchema { .. }));
    }

    #[test]
    fn test_project_dimensions_first() {
        let built = build(&vcf_schema(), &pos_partition()).unwrap();
        let projected = project(&built, None).unwrap();
        let names: Vec<_> = projected.names().collect();
        assert_eq!(names, vec!["pos", "qual", "alleles", "filter_ids"]);
    }

    #[test]
    fn test_project_required_subset() {
        let built = build(&vcf_schema(), &pos_partition()).unwrap();

        let required: HashSet<String> = ["alleles", "pos"].iter().map(|s| s.to_string()).collect();
        let projected = project(&built, Some(&required)).unwrap();
        let names: Vec<_> = projected.names().collect();
        assert_eq!(names, vec!["pos", "alleles"]);

        let empty = HashSet::new();
        assert!(project(&built, Some(&empty)).unwrap().is_empty());

        let all: HashSet<String> = vcf_schema().names().map(str::to_string).collect();
        assert_eq!(project(&built, Some(&all)).unwrap().len(), 4);
    }

    #[test]
    fn test_build_project_round_trip() {
        let source = vcf_schema();
        let built = build(&source, &pos_partition()).unwrap();
        let projected = project(&built, None).unwrap();

        assert_eq!(projected.len(), source.len());
        for field in source.fields() {
            let back = projected.field(&field.name).unwrap();
            assert_eq!(back.column_type, field.column_type, "field {}", field.name);
        }
    }
}
