//! Index accessors: pure functions from a typed object to index key bytes.
//!
//! The store treats objects as opaque; accessors are the only code that looks
//! inside them. An accessor downcasts the object to its concrete type and
//! encodes the indexed field(s) with the [`KeyPart`](crate::key::KeyPart)
//! rules, so lookup arguments and stored keys always agree byte-for-byte.

use std::any::{type_name, Any};
use std::marker::PhantomData;

use crate::error::{SchemaError, SchemaResult};
use crate::key::Key;

/// Derives the key(s) an object occupies in one index.
///
/// Most indexes are single-valued and return one key. A multi-valued index
/// (one entry per element of a collection field) may return several; it must
/// never return duplicates within one object.
pub trait IndexAccessor: Send + Sync {
    fn keys(&self, object: &(dyn Any + Send + Sync)) -> SchemaResult<Vec<Key>>;
}

fn downcast<O: Any>(object: &(dyn Any + Send + Sync)) -> SchemaResult<&O> {
    object
        .downcast_ref::<O>()
        .ok_or_else(|| SchemaError::MalformedObject {
            reason: format!("object is not a {}", type_name::<O>()),
        })
}

/// Single-valued accessor over one object type: a closure encodes the
/// indexed field into the key buffer.
pub struct FieldIndex<O, F> {
    encode: F,
    _object: PhantomData<fn(&O)>,
}

impl<O, F> FieldIndex<O, F>
where
    O: Any,
    F: Fn(&O, &mut Key),
{
    pub fn new(encode: F) -> Self {
        FieldIndex {
            encode,
            _object: PhantomData,
        }
    }
}

impl<O, F> IndexAccessor for FieldIndex<O, F>
where
    O: Any,
    F: Fn(&O, &mut Key) + Send + Sync,
{
    fn keys(&self, object: &(dyn Any + Send + Sync)) -> SchemaResult<Vec<Key>> {
        let object = downcast::<O>(object)?;
        let mut key = Key::new();
        (self.encode)(object, &mut key);
        Ok(vec![key])
    }
}

/// Multi-valued accessor: the closure returns one key per indexed element.
pub struct MultiFieldIndex<O, F> {
    encode: F,
    _object: PhantomData<fn(&O)>,
}

impl<O, F> MultiFieldIndex<O, F>
where
    O: Any,
    F: Fn(&O) -> Vec<Key>,
{
    pub fn new(encode: F) -> Self {
        MultiFieldIndex {
            encode,
            _object: PhantomData,
        }
    }
}

impl<O, F> IndexAccessor for MultiFieldIndex<O, F>
where
    O: Any,
    F: Fn(&O) -> Vec<Key> + Send + Sync,
{
    fn keys(&self, object: &(dyn Any + Send + Sync)) -> SchemaResult<Vec<Key>> {
        Ok((self.encode)(downcast::<O>(object)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyPart;

    struct Account {
        id: [u8; 4],
        owner: String,
        tags: Vec<String>,
    }

    fn account() -> Account {
        Account {
            id: [0, 0, 0, 7],
            owner: "ada".into(),
            tags: vec!["a".into(), "b".into()],
        }
    }

    #[test]
    fn field_index_encodes_single_key() {
        let by_owner = FieldIndex::new(|a: &Account, key: &mut Key| a.owner.encode_into(key));
        let keys = by_owner.keys(&account()).unwrap();
        assert_eq!(keys, vec![b"ada\0".to_vec()]);
    }

    #[test]
    fn multi_field_index_encodes_each_element() {
        let by_tag = MultiFieldIndex::new(|a: &Account| {
            a.tags
                .iter()
                .map(|tag| {
                    let mut key = Key::new();
                    tag.encode_into(&mut key);
                    key
                })
                .collect()
        });
        let keys = by_tag.keys(&account()).unwrap();
        assert_eq!(keys, vec![b"a\0".to_vec(), b"b\0".to_vec()]);
    }

    #[test]
    fn wrong_object_type_is_malformed() {
        let by_id = FieldIndex::new(|a: &Account, key: &mut Key| a.id.encode_into(key));
        let err = by_id.keys(&"not an account".to_string()).unwrap_err();
        assert!(matches!(err, SchemaError::MalformedObject { .. }));
    }
}
