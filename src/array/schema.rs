//! Native array schema model: dimensions, attributes, and validation.

use smallvec::SmallVec;

use crate::error::SchemaError;

use super::{CellValNum, Datatype};

/// Physical ordering of tiles or cells within a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    #[default]
    RowMajor,
    ColMajor,
}

/// Dense arrays materialize every coordinate in the domain; sparse arrays
/// store only written coordinates explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrayKind {
    Dense,
    #[default]
    Sparse,
}

/// A component of the array's coordinate domain.
///
/// Integer dimensions carry an inclusive domain and a tile extent; string
/// dimensions are variable-length and carry neither. A dimension datatype is
/// never a variable-length array type.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    pub name: String,
    pub datatype: Datatype,
    /// Inclusive lower/upper bounds; None for string dimensions
    pub domain: Option<(i64, i64)>,
    /// Number of domain values grouped per physical tile; None for string dimensions
    pub extent: Option<i64>,
}

impl Dimension {
    /// Create an integer dimension with a domain and tile extent.
    pub fn new(
        name: impl Into<String>,
        datatype: Datatype,
        domain: (i64, i64),
        extent: i64,
    ) -> Self {
        Self {
            name: name.into(),
            datatype,
            domain: Some(domain),
            extent: Some(extent),
        }
    }

    /// Create a variable-length string dimension (sparse arrays only).
    pub fn string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            datatype: Datatype::StringAscii,
            domain: None,
            extent: None,
        }
    }

    /// True for variable-length (string) dimensions.
    pub fn is_var(&self) -> bool {
        self.datatype.is_string()
    }
}

/// The ordered, non-empty set of dimensions addressing the array's cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayDomain {
    dimensions: SmallVec<[Dimension; 4]>,
}

impl ArrayDomain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a dimension, rejecting duplicate names.
    pub fn add_dimension(&mut self, dimension: Dimension) -> Result<(), SchemaError> {
        if self.dimensions.iter().any(|d| d.name == dimension.name) {
            return Err(SchemaError::DuplicateField {
                name: dimension.name,
            });
        }
        self.dimensions.push(dimension);
        Ok(())
    }

    pub fn ndim(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    pub fn dimension(&self, index: usize) -> Option<&Dimension> {
        self.dimensions.get(index)
    }

    pub fn dimension_by_name(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    /// Iterate dimensions in declaration order.
    pub fn dimensions(&self) -> impl Iterator<Item = &Dimension> {
        self.dimensions.iter()
    }
}

/// A named value stored per cell, distinct from the coordinate dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub datatype: Datatype,
    pub cell_val_num: CellValNum,
    pub nullable: bool,
}

impl Attribute {
    /// Create a fixed single-value attribute.
    pub fn new(name: impl Into<String>, datatype: Datatype) -> Self {
        Self {
            name: name.into(),
            datatype,
            cell_val_num: CellValNum::single(),
            nullable: false,
        }
    }

    /// Builder: set the cell-value-count.
    pub fn with_cell_val_num(mut self, cell_val_num: CellValNum) -> Self {
        self.cell_val_num = cell_val_num;
        self
    }

    /// Builder: set nullability.
    pub fn set_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// True for variable-length cells.
    pub fn is_var(&self) -> bool {
        self.cell_val_num.is_var()
    }
}

/// A complete native array schema.
///
/// Must pass [`ArraySchema::check`] before use; a schema that fails
/// validation is unusable and must be rebuilt.
#[derive(Debug, Clone, PartialEq)]
pub struct ArraySchema {
    pub kind: ArrayKind,
    pub domain: ArrayDomain,
    attributes: Vec<Attribute>,
    pub tile_order: Layout,
    pub cell_order: Layout,
}

impl ArraySchema {
    /// Create an empty schema of the given kind with row-major orders.
    pub fn new(kind: ArrayKind) -> Self {
        Self {
            kind,
            domain: ArrayDomain::new(),
            attributes: Vec::new(),
            tile_order: Layout::RowMajor,
            cell_order: Layout::RowMajor,
        }
    }

    /// Builder: set the tile order.
    pub fn with_tile_order(mut self, order: Layout) -> Self {
        self.tile_order = order;
        self
    }

    /// Builder: set the cell order.
    pub fn with_cell_order(mut self, order: Layout) -> Self {
        self.cell_order = order;
        self
    }

    /// Append an attribute, rejecting names that collide with other
    /// attributes or with dimensions.
    pub fn add_attribute(&mut self, attribute: Attribute) -> Result<(), SchemaError> {
        if self.attributes.iter().any(|a| a.name == attribute.name)
            || self.domain.dimension_by_name(&attribute.name).is_some()
        {
            return Err(SchemaError::DuplicateField {
                name: attribute.name,
            });
        }
        self.attributes.push(attribute);
        Ok(())
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Iterate attributes in declaration order.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }

    pub fn nattr(&self) -> usize {
        self.attributes.len()
    }

    /// Validate the assembled schema. Failure is terminal for this instance.
    ///
    /// Checks, in order: non-empty domain; dimension datatype legality
    /// (integer or string only, strings only in sparse arrays); dense arrays
    /// require a domain and extent on every dimension; extents must be
    /// positive and fit the domain range.
    pub fn check(&self) -> Result<(), SchemaError> {
        if self.domain.is_empty() {
            return Err(SchemaError::InvalidSchema {
                reason: "domain has no dimensions".into(),
            });
        }
        for dim in self.domain.dimensions() {
            if !dim.datatype.is_integer() && !dim.datatype.is_string() {
                return Err(SchemaError::InvalidSchema {
                    reason: format!(
                        "dimension '{}' has non-dimension datatype {}",
                        dim.name, dim.datatype
                    ),
                });
            }
            if dim.is_var() {
                if self.kind == ArrayKind::Dense {
                    return Err(SchemaError::InvalidSchema {
                        reason: format!(
                            "dense array cannot have string dimension '{}'",
                            dim.name
                        ),
                    });
                }
                continue;
            }
            match (dim.domain, dim.extent) {
                (Some((lo, hi)), Some(extent)) => {
                    if lo > hi {
                        return Err(SchemaError::InvalidSchema {
                            reason: format!(
                                "dimension '{}' has empty domain [{}, {}]",
                                dim.name, lo, hi
                            ),
                        });
                    }
                    let range = hi.saturating_sub(lo).saturating_add(1);
                    if extent <= 0 || extent > range {
                        return Err(SchemaError::InvalidSchema {
                            reason: format!(
                                "dimension '{}' extent {} incompatible with domain [{}, {}]",
                                dim.name, extent, lo, hi
                            ),
                        });
                    }
                }
                _ if self.kind == ArrayKind::Dense => {
                    return Err(SchemaError::InvalidSchema {
                        reason: format!(
                            "dense array dimension '{}' needs a domain and tile extent",
                            dim.name
                        ),
                    });
                }
                _ => {
                    return Err(SchemaError::InvalidSchema {
                        reason: format!(
                            "integer dimension '{}' needs both domain and extent or neither",
                            dim.name
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}
