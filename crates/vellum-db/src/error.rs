use vellum_schema::SchemaError;

/// Errors from store and transaction operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DbError {
    /// `delete` was given an object whose primary key is not stored.
    #[error("object not found")]
    NotFound,

    /// The transaction has already committed or aborted. Only `commit` and
    /// `abort` themselves tolerate this; every other operation fails.
    #[error("transaction is closed")]
    TransactionClosed,

    /// A mutation was attempted through a read-only transaction.
    #[error("cannot mutate through a read-only transaction")]
    ReadOnlyTransaction,

    /// No table at this position in the schema.
    #[error("unknown table {0}")]
    UnknownTable(usize),

    /// No index at this position in the table.
    #[error("table {table} has no index {index}")]
    UnknownIndex { table: usize, index: usize },

    /// Key derivation failed (malformed object) — see [`SchemaError`].
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Result alias for store operations.
pub type DbResult<T> = Result<T, DbError>;
