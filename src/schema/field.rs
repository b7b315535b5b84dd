//! Column field and schema containers.

use crate::error::SchemaError;

use super::{ColumnType, ScalarKind};

/// A single column in a relational schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnField {
    /// Field name (unique within a schema)
    pub name: String,

    /// Column type
    pub column_type: ColumnType,

    /// Whether the field can be NULL
    pub nullable: bool,
}

impl ColumnField {
    /// Create a new non-nullable field.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: false,
        }
    }

    /// Create a new nullable field.
    pub fn nullable(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
        }
    }

    /// Builder: set nullability.
    pub fn set_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Shorthand for a scalar field.
    pub fn scalar(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self::new(name, ColumnType::Scalar(kind))
    }

    /// Shorthand for a text field.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Text)
    }
}

/// An ordered, name-unique sequence of [`ColumnField`].
///
/// Order is significant for positional APIs (schema building walks fields in
/// order); lookups are by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnSchema {
    fields: Vec<ColumnField>,
}

impl ColumnSchema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field, rejecting duplicate names.
    pub fn push(&mut self, field: ColumnField) -> Result<(), SchemaError> {
        if self.fields.iter().any(|f| f.name == field.name) {
            return Err(SchemaError::DuplicateField { name: field.name });
        }
        self.fields.push(field);
        Ok(())
    }

    /// Builder: append a field, rejecting duplicate names.
    pub fn with_field(mut self, field: ColumnField) -> Result<Self, SchemaError> {
        self.push(field)?;
        Ok(self)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if the schema has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&ColumnField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field at a position.
    pub fn field_at(&self, index: usize) -> Option<&ColumnField> {
        self.fields.get(index)
    }

    /// Iterate fields in schema order.
    pub fn fields(&self) -> impl Iterator<Item = &ColumnField> {
        self.fields.iter()
    }

    /// Field names in schema order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

impl FromIterator<ColumnField> for Result<ColumnSchema, SchemaError> {
    fn from_iter<I: IntoIterator<Item = ColumnField>>(iter: I) -> Self {
        let mut schema = ColumnSchema::new();
        for field in iter {
            schema.push(field)?;
        }
        Ok(schema)
    }
}
