//! Table and index declarations, validated once at store construction.
//!
//! Tables and indexes are addressed by position: table `t` is the `t`-th
//! [`TableDef`], index `i` within it is the `i`-th [`IndexDef`], and index 0
//! is always the primary index. A [`Schema`] that constructed successfully is
//! immutable and safe to share across threads.

use std::sync::Arc;

use crate::error::{SchemaError, SchemaResult};
use crate::index::IndexAccessor;

/// The primary index of every table sits at position 0.
pub const PRIMARY: usize = 0;

/// One index declaration: a diagnostic name, a uniqueness flag, and the
/// accessor deriving key bytes from an object.
#[derive(Clone)]
pub struct IndexDef {
    name: &'static str,
    unique: bool,
    accessor: Arc<dyn IndexAccessor>,
}

impl IndexDef {
    /// A unique index: at most one object per key.
    pub fn unique(name: &'static str, accessor: Arc<dyn IndexAccessor>) -> Self {
        IndexDef {
            name,
            unique: true,
            accessor,
        }
    }

    /// A non-unique index: many objects may share a key; entries are stored
    /// under the index key extended with the object's primary key.
    pub fn non_unique(name: &'static str, accessor: Arc<dyn IndexAccessor>) -> Self {
        IndexDef {
            name,
            unique: false,
            accessor,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn accessor(&self) -> &dyn IndexAccessor {
        self.accessor.as_ref()
    }
}

impl std::fmt::Debug for IndexDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexDef")
            .field("name", &self.name)
            .field("unique", &self.unique)
            .finish()
    }
}

/// One table: its ordered index declarations. Position 0 is primary.
#[derive(Clone, Debug)]
pub struct TableDef {
    indexes: Vec<IndexDef>,
}

impl TableDef {
    pub fn new(indexes: Vec<IndexDef>) -> Self {
        TableDef { indexes }
    }

    pub fn indexes(&self) -> &[IndexDef] {
        &self.indexes
    }

    pub fn index(&self, index: usize) -> Option<&IndexDef> {
        self.indexes.get(index)
    }

    pub fn primary(&self) -> &IndexDef {
        &self.indexes[PRIMARY]
    }
}

/// A validated table/index registry.
#[derive(Debug)]
pub struct Schema {
    tables: Vec<TableDef>,
}

impl Schema {
    /// Validate the declarations once. Violations are configuration errors:
    /// the schema (and therefore the store) is simply not created.
    pub fn new(tables: Vec<TableDef>) -> SchemaResult<Self> {
        if tables.is_empty() {
            return Err(SchemaError::NoTables);
        }
        for (table, def) in tables.iter().enumerate() {
            if def.indexes.is_empty() {
                return Err(SchemaError::EmptyTable { table });
            }
            let primary = &def.indexes[PRIMARY];
            if !primary.unique {
                return Err(SchemaError::PrimaryNotUnique {
                    table,
                    name: primary.name,
                });
            }
            for (i, index) in def.indexes.iter().enumerate() {
                if def.indexes[..i].iter().any(|other| other.name == index.name) {
                    return Err(SchemaError::DuplicateIndexName {
                        table,
                        name: index.name,
                    });
                }
            }
        }
        Ok(Schema { tables })
    }

    pub fn tables(&self) -> &[TableDef] {
        &self.tables
    }

    pub fn table(&self, table: usize) -> Option<&TableDef> {
        self.tables.get(table)
    }
}
