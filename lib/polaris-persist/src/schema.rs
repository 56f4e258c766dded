//! Static schema descriptors for persisted models.
//!
//! Types implementing `Model` describe their persisted columns up front instead
//! of having them discovered at runtime. Add `#[derive(Model)]` and tag each
//! persisted field with `#[column]` to generate the implementation.

use crate::{PersistError, derive_name, quote_identifier, validate_identifier};

/// Trait for types that can be migrated into a table or collection.
///
/// # Example
///
/// ```text
/// #[derive(Model)]
/// #[model(name = "shop.User")]       // optional, defaults to the struct name
/// pub struct User {
///     #[column(primary_key)]
///     pub id: String,
///     #[column(name = "display_name")]
///     pub name: String,
///     #[column]
///     pub age: i32,
///     #[column(kind = "json")]
///     pub settings: Settings,        // stored as jsonb
///     pub scratch: Vec<u8>,          // untagged, never persisted
/// }
/// ```
///
/// # Column Mapping
///
/// | Rust type | Kind | Column type |
/// |-----------|------|-------------|
/// | `String`, `&str`, `char` | Text | `varchar(255)` |
/// | `i8`..`i64`, `u8`..`u64`, `isize`, `usize` | Integer | `int` |
/// | `f32`, `f64` | Float | `float` |
/// | `bool` | Boolean | `boolean` |
/// | `DateTime<_>`, `NaiveDateTime`, `SystemTime` | Timestamp | `timestamp` |
/// | `serde_json::Value`, `Json<T>` | Json | `jsonb` |
///
/// `Option<T>` maps as `T`. Anything else becomes `FieldKind::Unsupported` and
/// is skipped (with a warning) when a table is created.
pub trait Model {
    /// The schema descriptor for this type.
    fn schema() -> &'static ModelSchema;

    /// The table name for this type under `namespace` (empty for none).
    fn table_name(namespace: &str) -> String {
        Self::schema().table_name(namespace)
    }
}

/// Semantic kind of a persisted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Float,
    Boolean,
    Timestamp,
    Json,
    /// No mapping exists; holds the Rust type as written.
    Unsupported(&'static str),
}

impl FieldKind {
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            FieldKind::Text => Some(ColumnType::Varchar),
            FieldKind::Integer => Some(ColumnType::Int),
            FieldKind::Float => Some(ColumnType::Float),
            FieldKind::Boolean => Some(ColumnType::Boolean),
            FieldKind::Timestamp => Some(ColumnType::Timestamp),
            FieldKind::Json => Some(ColumnType::Jsonb),
            FieldKind::Unsupported(_) => None,
        }
    }
}

/// SQL column types the adapters create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Varchar,
    Int,
    Float,
    Boolean,
    Timestamp,
    Jsonb,
}

impl ColumnType {
    pub fn sql(&self) -> &'static str {
        match self {
            ColumnType::Varchar => "varchar(255)",
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Jsonb => "jsonb",
        }
    }
}

/// One tagged field of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSchema {
    /// Rust field name.
    pub name: &'static str,
    /// Column name in the database.
    pub column: &'static str,
    pub kind: FieldKind,
    pub primary_key: bool,
}

impl FieldSchema {
    pub fn column_type(&self) -> Result<ColumnType, PersistError> {
        self.kind
            .column_type()
            .ok_or_else(|| PersistError::UnsupportedType {
                field: self.name.to_string(),
                rust_type: match self.kind {
                    FieldKind::Unsupported(rust_type) => rust_type.to_string(),
                    kind => format!("{:?}", kind),
                },
            })
    }
}

/// A column ready to be written into DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub primary_key: bool,
}

impl ColumnDefinition {
    /// `"name" type`, with `PRIMARY KEY` appended for key columns.
    pub fn to_sql(&self) -> String {
        let name = quote_identifier(self.name);
        if self.primary_key {
            format!("{} {} PRIMARY KEY", name, self.column_type.sql())
        } else {
            format!("{} {}", name, self.column_type.sql())
        }
    }
}

/// Schema descriptor for a model type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSchema {
    /// Type name used for table name derivation, e.g. `User` or `*pkg.User`.
    pub type_name: &'static str,
    /// Tagged fields in declaration order.
    pub fields: &'static [FieldSchema],
}

impl ModelSchema {
    pub fn table_name(&self, namespace: &str) -> String {
        derive_name(self.type_name, namespace)
    }

    /// Columns with a known mapping. Unsupported fields are logged and left out.
    ///
    /// Fails with `InvalidIdentifier` if any column name, mapped or not, is
    /// not a plain identifier.
    pub fn column_definitions(&self) -> Result<Vec<ColumnDefinition>, PersistError> {
        let mut columns = Vec::with_capacity(self.fields.len());
        for field in self.fields {
            validate_identifier(field.column)?;
            match field.column_type() {
                Ok(column_type) => columns.push(ColumnDefinition {
                    name: field.column,
                    column_type,
                    primary_key: field.primary_key,
                }),
                Err(e) => {
                    tracing::warn!(
                        model = self.type_name,
                        column = field.column,
                        "skipping field: {}",
                        e
                    );
                }
            }
        }
        Ok(columns)
    }
}
