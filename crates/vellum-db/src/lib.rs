//! In-process, multi-indexed, transactional object store.
//!
//! A [`Database`] keeps every declared index of every table as a persistent
//! radix tree ([`vellum_tree::Tree`]) and publishes all of their roots as a
//! single snapshot value. That gives database-like semantics purely in
//! memory:
//!
//! - **Snapshot-isolated reads** — [`Database::begin_read`] captures the
//!   published roots; the view never changes, no matter what commits later.
//! - **Atomic multi-index writes** — the single write transaction
//!   ([`Database::begin_write`]) edits working copies and
//!   [`Transaction::commit`] swaps every root in at once, or
//!   [`Transaction::abort`] drops them all.
//! - **Ordered lookups** — [`Transaction::first`] / [`Transaction::last`]
//!   point lookups and [`Transaction::get`] / [`Transaction::get_reverse`]
//!   range scans over any index, non-unique indexes tie-broken by primary
//!   key.
//!
//! Tables, indexes, and key encodings are declared through
//! [`vellum_schema`]; objects themselves stay opaque ([`Object`] is
//! `Arc<dyn Any + Send + Sync>`).
//!
//! Durability, replication, and query planning are explicitly out of scope:
//! the store lives and dies with the process.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use vellum_db::Database;
//! use vellum_schema::{FieldIndex, IndexDef, Key, KeyPart, TableDef};
//!
//! #[derive(Clone)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! let db = Database::new(vec![TableDef::new(vec![
//!     IndexDef::unique(
//!         "id",
//!         Arc::new(FieldIndex::new(|u: &User, key: &mut Key| {
//!             u.id.encode_into(key)
//!         })),
//!     ),
//!     IndexDef::non_unique(
//!         "name",
//!         Arc::new(FieldIndex::new(|u: &User, key: &mut Key| {
//!             u.name.encode_into(key)
//!         })),
//!     ),
//! ])])
//! .unwrap();
//!
//! let mut txn = db.begin_write();
//! txn.insert(0, Arc::new(User { id: 1, name: "ada".into() })).unwrap();
//! txn.commit();
//!
//! let txn = db.begin_read();
//! let found = txn.first(0, 1, &[&"ada"]).unwrap().unwrap();
//! assert_eq!(found.downcast_ref::<User>().unwrap().id, 1);
//! ```

pub mod cursor;
pub mod db;
pub mod error;
pub mod txn;

pub use cursor::Cursor;
pub use db::{Database, Object};
pub use error::{DbError, DbResult};
pub use txn::Transaction;
