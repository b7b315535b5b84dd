//! Engine-agnostic column type definitions.

/// Scalar kinds that can appear in a column, either standalone or as the
/// element kind of an array column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// Signed 8-bit integer
    Int8,
    /// Signed 16-bit integer
    Int16,
    /// Signed 32-bit integer
    Int32,
    /// Signed 64-bit integer
    Int64,
    /// Unsigned 8-bit integer
    UInt8,
    /// Unsigned 16-bit integer
    UInt16,
    /// Unsigned 32-bit integer
    UInt32,
    /// Unsigned 64-bit integer
    UInt64,
    /// 32-bit floating point
    Float32,
    /// 64-bit floating point
    Float64,
    /// Boolean (true/false)
    Bool,
}

impl ScalarKind {
    /// Size of one value in bytes.
    pub fn size(&self) -> usize {
        match self {
            ScalarKind::Int8 | ScalarKind::UInt8 | ScalarKind::Bool => 1,
            ScalarKind::Int16 | ScalarKind::UInt16 => 2,
            ScalarKind::Int32 | ScalarKind::UInt32 | ScalarKind::Float32 => 4,
            ScalarKind::Int64 | ScalarKind::UInt64 | ScalarKind::Float64 => 8,
        }
    }

    /// True for the integer kinds (signed or unsigned).
    pub fn is_integer(&self) -> bool {
        !matches!(
            self,
            ScalarKind::Float32 | ScalarKind::Float64 | ScalarKind::Bool
        )
    }

    /// True for the floating-point kinds.
    pub fn is_float(&self) -> bool {
        matches!(self, ScalarKind::Float32 | ScalarKind::Float64)
    }

    /// Human-readable type name for display.
    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarKind::Int8 => "i8",
            ScalarKind::Int16 => "i16",
            ScalarKind::Int32 => "i32",
            ScalarKind::Int64 => "i64",
            ScalarKind::UInt8 => "u8",
            ScalarKind::UInt16 => "u16",
            ScalarKind::UInt32 => "u32",
            ScalarKind::UInt64 => "u64",
            ScalarKind::Float32 => "f32",
            ScalarKind::Float64 => "f64",
            ScalarKind::Bool => "bool",
        }
    }
}

impl std::fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Column types that can be represented in a flat relational schema.
///
/// These map bidirectionally to a native dimension/attribute datatype plus a
/// cell-value-count; see [`crate::schema::translate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// Single fixed-width value per cell
    Scalar(ScalarKind),

    /// Variable-length UTF-8/ASCII text
    Text,

    /// Fixed-length array of scalars (length known up front, same for every cell)
    FixedList(ScalarKind, u32),

    /// Variable-length array of scalars
    VarList(ScalarKind),
}

impl ColumnType {
    /// Size in bytes of one cell for fixed-width types, None for variable-width.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            ColumnType::Scalar(k) => Some(k.size()),
            ColumnType::FixedList(k, n) => Some(k.size() * *n as usize),
            ColumnType::Text | ColumnType::VarList(_) => None,
        }
    }

    /// Element kind for list types, None otherwise.
    pub fn list_element(&self) -> Option<ScalarKind> {
        match self {
            ColumnType::FixedList(k, _) | ColumnType::VarList(k) => Some(*k),
            _ => None,
        }
    }

    /// Human-readable type name for display.
    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnType::Scalar(k) => k.type_name(),
            ColumnType::Text => "text",
            ColumnType::FixedList(..) => "fixed_list",
            ColumnType::VarList(_) => "var_list",
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::Scalar(k) => write!(f, "{}", k),
            ColumnType::Text => write!(f, "text"),
            ColumnType::FixedList(k, n) => write!(f, "[{}; {}]", k, n),
            ColumnType::VarList(k) => write!(f, "[{}]", k),
        }
    }
}
