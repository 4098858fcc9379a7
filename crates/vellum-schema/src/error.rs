/// Errors from schema declaration and index key derivation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// A schema must declare at least one table.
    #[error("schema declares no tables")]
    NoTables,

    /// Every table needs at least its primary index.
    #[error("table {table} declares no indexes")]
    EmptyTable { table: usize },

    /// Index 0 identifies objects and must be declared unique.
    #[error("table {table}: primary index {name:?} is not unique")]
    PrimaryNotUnique { table: usize, name: &'static str },

    /// Index names are diagnostics and must not collide within a table.
    #[error("table {table}: duplicate index name {name:?}")]
    DuplicateIndexName { table: usize, name: &'static str },

    /// An accessor was handed an object of the wrong type, or could not
    /// derive a key from it.
    #[error("index cannot derive a key: {reason}")]
    MalformedObject { reason: String },
}

/// Result alias for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;
