//! Table and index declarations for Vellum.
//!
//! This crate is the boundary between typed application objects and the
//! byte-keyed trees the store runs on. It supplies:
//!
//! - [`KeyPart`] — order-preserving byte encodings for key material
//! - [`IndexAccessor`] — object → key derivation, with the closure-based
//!   [`FieldIndex`] and [`MultiFieldIndex`] helpers
//! - [`Schema`] / [`TableDef`] / [`IndexDef`] — the registry, validated once
//!   at construction; index 0 of every table is its unique primary index
//!
//! The store itself never inspects objects; everything it knows about them
//! flows through the accessors declared here.

pub mod error;
pub mod index;
pub mod key;
pub mod schema;

pub use error::{SchemaError, SchemaResult};
pub use index::{FieldIndex, IndexAccessor, MultiFieldIndex};
pub use key::{encode_parts, Key, KeyPart};
pub use schema::{IndexDef, Schema, TableDef, PRIMARY};
