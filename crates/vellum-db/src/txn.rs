//! Transactions: snapshot-isolated reads and atomic multi-index writes.

use std::any::Any;
use std::sync::{Arc, MutexGuard};

use tracing::debug;
use vellum_schema::{encode_parts, Key, KeyPart, TableDef, PRIMARY};
use vellum_tree::Tree;

use crate::cursor::Cursor;
use crate::db::{Database, Object, Snapshot};
use crate::error::{DbError, DbResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Active,
    Committed,
    Aborted,
}

/// A transaction over every table and index of the store.
///
/// Read transactions operate on the roots published when they began and are
/// never affected by later commits. The (single) write transaction operates
/// on working copies of those roots; its edits are visible to its own
/// lookups immediately and to nobody else until [`commit`](Self::commit)
/// publishes them all at once. Dropping an active transaction aborts it.
pub struct Transaction<'db> {
    db: &'db Database,
    write: bool,
    state: State,
    tables: Vec<Vec<Tree<Object>>>,
    modified: bool,
    _writer: Option<MutexGuard<'db, ()>>,
}

impl<'db> Transaction<'db> {
    pub(crate) fn read(db: &'db Database, snapshot: Arc<Snapshot>) -> Self {
        Transaction {
            db,
            write: false,
            state: State::Active,
            tables: snapshot.tables.clone(),
            modified: false,
            _writer: None,
        }
    }

    pub(crate) fn write(
        db: &'db Database,
        snapshot: Arc<Snapshot>,
        guard: MutexGuard<'db, ()>,
    ) -> Self {
        Transaction {
            db,
            write: true,
            state: State::Active,
            tables: snapshot.tables.clone(),
            modified: false,
            _writer: Some(guard),
        }
    }

    /// Whether this transaction may mutate.
    pub fn is_write(&self) -> bool {
        self.write
    }

    fn ensure_active(&self) -> DbResult<()> {
        if self.state != State::Active {
            return Err(DbError::TransactionClosed);
        }
        Ok(())
    }

    fn ensure_writable(&self) -> DbResult<()> {
        self.ensure_active()?;
        if !self.write {
            return Err(DbError::ReadOnlyTransaction);
        }
        Ok(())
    }

    fn table_def(&self, table: usize) -> DbResult<&'db TableDef> {
        self.db
            .schema()
            .table(table)
            .ok_or(DbError::UnknownTable(table))
    }

    /// Store `object` under every index of `table`, returning the object it
    /// replaced at the same primary key, if any.
    ///
    /// When a previous version exists, its secondary entries are removed
    /// first, keyed by the *old* object's field values; then the new object
    /// is inserted everywhere. All keys are derived before the first tree is
    /// touched, so a failing accessor leaves the transaction exactly as it
    /// was.
    pub fn insert(&mut self, table: usize, object: Object) -> DbResult<Option<Object>> {
        self.ensure_writable()?;
        let def = self.table_def(table)?;

        let pk = single_key(def.primary().accessor().keys(object.as_ref())?)?;
        let existing = self.tables[table][PRIMARY].get(&pk).cloned();

        let mut removals: Vec<(usize, Key)> = Vec::new();
        let mut insertions: Vec<(usize, Key)> = Vec::new();
        for (i, index) in def.indexes().iter().enumerate().skip(1) {
            if let Some(old) = &existing {
                for key in index.accessor().keys(old.as_ref())? {
                    removals.push((i, composite(index.is_unique(), key, &pk)));
                }
            }
            for key in index.accessor().keys(object.as_ref())? {
                insertions.push((i, composite(index.is_unique(), key, &pk)));
            }
        }

        for (i, key) in &removals {
            let (tree, _) = self.tables[table][*i].remove(key);
            self.tables[table][*i] = tree;
        }
        let (tree, _) = self.tables[table][PRIMARY].insert(&pk, Arc::clone(&object));
        self.tables[table][PRIMARY] = tree;
        for (i, key) in &insertions {
            let (tree, _) = self.tables[table][*i].insert(key, Arc::clone(&object));
            self.tables[table][*i] = tree;
        }
        self.modified = true;
        Ok(existing)
    }

    /// Remove the object stored under `object`'s primary key from every
    /// index and return it.
    ///
    /// Only the primary key is taken from the argument; secondary entries
    /// are removed by the *stored* object's field values, which may differ
    /// from the caller's copy. An absent primary key is
    /// [`DbError::NotFound`] and leaves the working trees unchanged.
    pub fn delete(&mut self, table: usize, object: &(dyn Any + Send + Sync)) -> DbResult<Object> {
        self.ensure_writable()?;
        let def = self.table_def(table)?;

        let pk = single_key(def.primary().accessor().keys(object)?)?;
        let stored = self.tables[table][PRIMARY]
            .get(&pk)
            .cloned()
            .ok_or(DbError::NotFound)?;

        let mut removals: Vec<(usize, Key)> = Vec::new();
        for (i, index) in def.indexes().iter().enumerate().skip(1) {
            for key in index.accessor().keys(stored.as_ref())? {
                removals.push((i, composite(index.is_unique(), key, &pk)));
            }
        }

        let (tree, _) = self.tables[table][PRIMARY].remove(&pk);
        self.tables[table][PRIMARY] = tree;
        for (i, key) in &removals {
            let (tree, _) = self.tables[table][*i].remove(key);
            self.tables[table][*i] = tree;
        }
        self.modified = true;
        Ok(stored)
    }

    /// The first object in `index` order matching `args`, if any. With no
    /// arguments, the smallest entry of the whole index. On a non-unique
    /// index, ties on the secondary value resolve to the smallest primary
    /// key.
    pub fn first(
        &self,
        table: usize,
        index: usize,
        args: &[&dyn KeyPart],
    ) -> DbResult<Option<Object>> {
        Ok(self.get(table, index, args)?.next())
    }

    /// The last object in `index` order matching `args`, if any. The mirror
    /// of [`first`](Self::first): ties resolve to the largest primary key.
    pub fn last(
        &self,
        table: usize,
        index: usize,
        args: &[&dyn KeyPart],
    ) -> DbResult<Option<Object>> {
        Ok(self.get_reverse(table, index, args)?.next())
    }

    /// Ascending cursor over every entry of `index` matching `args`
    /// (everything, when `args` is empty).
    ///
    /// Inside a write transaction the cursor observes the transaction's own
    /// uncommitted edits as of this call.
    pub fn get(&self, table: usize, index: usize, args: &[&dyn KeyPart]) -> DbResult<Cursor> {
        let (tree, prefix) = self.scan_target(table, index, args)?;
        Ok(Cursor::forward(tree.iter_prefix(&prefix)))
    }

    /// Descending cursor over the same sequence [`get`](Self::get) produces.
    pub fn get_reverse(
        &self,
        table: usize,
        index: usize,
        args: &[&dyn KeyPart],
    ) -> DbResult<Cursor> {
        let (tree, prefix) = self.scan_target(table, index, args)?;
        Ok(Cursor::reverse(tree.iter_prefix_rev(&prefix)))
    }

    fn scan_target(
        &self,
        table: usize,
        index: usize,
        args: &[&dyn KeyPart],
    ) -> DbResult<(&Tree<Object>, Key)> {
        self.ensure_active()?;
        let def = self.table_def(table)?;
        if def.index(index).is_none() {
            return Err(DbError::UnknownIndex { table, index });
        }
        Ok((&self.tables[table][index], encode_parts(args)))
    }

    /// Publish every working root as one atomic unit and close the
    /// transaction. On a transaction that never modified anything (or a
    /// read transaction) this merely closes it. Idempotent: repeated calls,
    /// or calls after [`abort`](Self::abort), are no-ops.
    pub fn commit(&mut self) {
        if self.state != State::Active {
            return;
        }
        self.state = State::Committed;
        if self.write && self.modified {
            self.db.publish(Arc::new(Snapshot {
                tables: self.tables.clone(),
            }));
            debug!("write transaction committed");
        }
        self._writer = None;
    }

    /// Discard every working root and close the transaction. Never touches
    /// the store. Idempotent, also after [`commit`](Self::commit).
    pub fn abort(&mut self) {
        if self.state != State::Active {
            return;
        }
        self.state = State::Aborted;
        self._writer = None;
        debug!(write = self.write, "transaction aborted");
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.state == State::Active {
            self.abort();
        }
    }
}

impl std::fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("write", &self.write)
            .field("state", &self.state)
            .finish()
    }
}

/// For a non-unique index the stored key is the index key extended with the
/// primary key: equal secondary values stay grouped, ordered by primary key,
/// and each (value, primary key) pair owns exactly one entry.
fn composite(unique: bool, mut key: Key, pk: &[u8]) -> Key {
    if !unique {
        key.extend_from_slice(pk);
    }
    key
}

fn single_key(mut keys: Vec<Key>) -> DbResult<Key> {
    if keys.len() != 1 {
        return Err(DbError::Schema(vellum_schema::SchemaError::MalformedObject {
            reason: format!("primary index must derive exactly one key, got {}", keys.len()),
        }));
    }
    Ok(keys.remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_schema::{FieldIndex, IndexDef, TableDef};

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Item {
        id: [u8; 2],
        tag: String,
    }

    fn schema() -> Vec<TableDef> {
        vec![TableDef::new(vec![
            IndexDef::unique(
                "id",
                Arc::new(FieldIndex::new(|item: &Item, key: &mut Key| {
                    item.id.encode_into(key)
                })),
            ),
            IndexDef::non_unique(
                "tag",
                Arc::new(FieldIndex::new(|item: &Item, key: &mut Key| {
                    item.tag.encode_into(key)
                })),
            ),
        ])]
    }

    fn item(id: u8, tag: &str) -> Object {
        Arc::new(Item {
            id: [0, id],
            tag: tag.into(),
        })
    }

    // -----------------------------------------------------------------------
    // State machine
    // -----------------------------------------------------------------------

    #[test]
    fn operations_fail_after_commit() {
        let db = Database::new(schema()).unwrap();
        let mut txn = db.begin_write();
        txn.commit();

        assert_eq!(
            txn.insert(0, item(1, "a")).err().unwrap(),
            DbError::TransactionClosed
        );
        assert_eq!(
            txn.delete(0, &Item { id: [0, 1], tag: "a".into() }).err().unwrap(),
            DbError::TransactionClosed
        );
        assert_eq!(txn.first(0, 0, &[]).err().unwrap(), DbError::TransactionClosed);
        assert_eq!(txn.get(0, 0, &[]).unwrap_err(), DbError::TransactionClosed);
    }

    #[test]
    fn read_transaction_rejects_mutation() {
        let db = Database::new(schema()).unwrap();
        let mut txn = db.begin_read();
        assert!(!txn.is_write());
        assert_eq!(
            txn.insert(0, item(1, "a")).err().unwrap(),
            DbError::ReadOnlyTransaction
        );
        assert_eq!(
            txn.delete(0, &Item { id: [0, 1], tag: "a".into() }).err().unwrap(),
            DbError::ReadOnlyTransaction
        );
    }

    #[test]
    fn drop_of_active_write_txn_releases_the_writer() {
        let db = Database::new(schema()).unwrap();
        {
            let mut txn = db.begin_write();
            txn.insert(0, item(1, "a")).unwrap();
            // Dropped without commit: edits must vanish.
        }
        let mut txn = db.begin_write();
        assert!(txn.first(0, 0, &[]).unwrap().is_none());
        txn.insert(0, item(1, "a")).unwrap();
        txn.commit();
    }

    // -----------------------------------------------------------------------
    // Addressing errors
    // -----------------------------------------------------------------------

    #[test]
    fn unknown_table_and_index() {
        let db = Database::new(schema()).unwrap();
        let mut txn = db.begin_write();
        assert_eq!(txn.insert(9, item(1, "a")).err().unwrap(), DbError::UnknownTable(9));
        assert_eq!(
            txn.first(0, 7, &[]).err().unwrap(),
            DbError::UnknownIndex { table: 0, index: 7 }
        );
    }

    #[test]
    fn wrong_object_type_leaves_trees_untouched() {
        let db = Database::new(schema()).unwrap();
        let mut txn = db.begin_write();
        txn.insert(0, item(1, "a")).unwrap();

        let err = txn.insert(0, Arc::new("not an item".to_string())).err().unwrap();
        assert!(matches!(err, DbError::Schema(_)));

        // The earlier insert is still there, nothing else appeared.
        let all: Vec<Object> = txn.get(0, 0, &[]).unwrap().collect();
        assert_eq!(all.len(), 1);
        let tagged: Vec<Object> = txn.get(0, 1, &[]).unwrap().collect();
        assert_eq!(tagged.len(), 1);
    }
}
