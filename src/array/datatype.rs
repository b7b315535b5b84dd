//! Native datatype and cell-value-count definitions.

/// Datatypes understood by the native array engine.
///
/// This is the storage-side counterpart of
/// [`ColumnType`](crate::schema::ColumnType): a scalar payload kind plus a
/// separate [`CellValNum`] deciding how many values each cell holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Datatype {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Bool,
    /// ASCII character data; always variable-length on the column side
    StringAscii,
    /// Opaque bytes; has no column-type equivalent
    Blob,
}

impl Datatype {
    /// Size of one value in bytes.
    pub fn size(&self) -> usize {
        match self {
            Datatype::Int8 | Datatype::UInt8 | Datatype::Bool => 1,
            Datatype::Int16 | Datatype::UInt16 => 2,
            Datatype::Int32 | Datatype::UInt32 | Datatype::Float32 => 4,
            Datatype::Int64 | Datatype::UInt64 | Datatype::Float64 => 8,
            Datatype::StringAscii | Datatype::Blob => 1,
        }
    }

    /// True for the integer kinds (signed or unsigned).
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Datatype::Int8
                | Datatype::Int16
                | Datatype::Int32
                | Datatype::Int64
                | Datatype::UInt8
                | Datatype::UInt16
                | Datatype::UInt32
                | Datatype::UInt64
        )
    }

    /// True for character data.
    pub fn is_string(&self) -> bool {
        matches!(self, Datatype::StringAscii)
    }

    /// Human-readable type name for display.
    pub fn type_name(&self) -> &'static str {
        match self {
            Datatype::Int8 => "INT8",
            Datatype::Int16 => "INT16",
            Datatype::Int32 => "INT32",
            Datatype::Int64 => "INT64",
            Datatype::UInt8 => "UINT8",
            Datatype::UInt16 => "UINT16",
            Datatype::UInt32 => "UINT32",
            Datatype::UInt64 => "UINT64",
            Datatype::Float32 => "FLOAT32",
            Datatype::Float64 => "FLOAT64",
            Datatype::Bool => "BOOL",
            Datatype::StringAscii => "STRING_ASCII",
            Datatype::Blob => "BLOB",
        }
    }
}

impl std::fmt::Display for Datatype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Number of scalar values per cell for a dimension or attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellValNum {
    /// Every cell holds exactly this many values (>= 1)
    Fixed(u32),
    /// Cells hold a variable number of values; requires an offset buffer
    Var,
}

impl CellValNum {
    /// One value per cell.
    pub fn single() -> Self {
        CellValNum::Fixed(1)
    }

    /// True for variable-length cells.
    pub fn is_var(&self) -> bool {
        matches!(self, CellValNum::Var)
    }
}

impl std::fmt::Display for CellValNum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValNum::Fixed(n) => write!(f, "{}", n),
            CellValNum::Var => write!(f, "var"),
        }
    }
}
