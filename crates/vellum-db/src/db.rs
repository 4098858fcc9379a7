//! The store root: published index roots and transaction creation.

use std::any::Any;
use std::sync::{Arc, Mutex, RwLock};

use tracing::debug;
use vellum_schema::{Schema, SchemaResult, TableDef};
use vellum_tree::Tree;

use crate::txn::Transaction;

/// A stored object: opaque to the store beyond what index accessors extract.
/// Objects are shared, never copied — every index entry holds the same `Arc`.
pub type Object = Arc<dyn Any + Send + Sync>;

/// One published version of every index of every table.
///
/// All roots live in a single value replaced by one assignment, so a reader
/// either sees a commit in every index or in none.
pub(crate) struct Snapshot {
    pub(crate) tables: Vec<Vec<Tree<Object>>>,
}

impl Snapshot {
    fn empty(schema: &Schema) -> Self {
        Snapshot {
            tables: schema
                .tables()
                .iter()
                .map(|table| table.indexes().iter().map(|_| Tree::new()).collect())
                .collect(),
        }
    }
}

/// An in-process, multi-indexed, transactional object store.
///
/// Reads are snapshot-isolated and never block; writes are serialized by a
/// single writer lock and become visible all at once on commit. Durability is
/// out of scope: the store lives and dies with the process.
pub struct Database {
    schema: Arc<Schema>,
    snapshot: RwLock<Arc<Snapshot>>,
    writer: Mutex<()>,
}

impl Database {
    /// Validate the schema and create an empty store. Schema violations are
    /// configuration errors: the store is not created.
    pub fn new(tables: Vec<TableDef>) -> SchemaResult<Self> {
        let schema = Arc::new(Schema::new(tables)?);
        let snapshot = Arc::new(Snapshot::empty(&schema));
        debug!(tables = schema.tables().len(), "database created");
        Ok(Database {
            schema,
            snapshot: RwLock::new(snapshot),
            writer: Mutex::new(()),
        })
    }

    /// The validated schema this store was created with.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Open a read-only transaction over the roots published right now.
    ///
    /// Never blocks and never conflicts with a writer; the view stays fixed
    /// until the transaction is dropped, regardless of later commits.
    pub fn begin_read(&self) -> Transaction<'_> {
        Transaction::read(self, self.current())
    }

    /// Open the write transaction, blocking until any previous writer
    /// commits or aborts. The working set is captured after the lock is
    /// acquired, so it includes the previous writer's commit.
    pub fn begin_write(&self) -> Transaction<'_> {
        let guard = self.writer.lock().expect("lock poisoned");
        Transaction::write(self, self.current(), guard)
    }

    pub(crate) fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot.read().expect("lock poisoned"))
    }

    /// Atomically replace the published roots. Called only by the committing
    /// write transaction, which still holds the writer lock.
    pub(crate) fn publish(&self, snapshot: Arc<Snapshot>) {
        *self.snapshot.write().expect("lock poisoned") = snapshot;
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("tables", &self.schema.tables().len())
            .finish()
    }
}
