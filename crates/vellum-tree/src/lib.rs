//! Persistent copy-on-write radix tree for Vellum.
//!
//! This crate implements the ordered map underneath every Vellum index: an
//! immutable radix tree keyed by byte strings, mutated by path copying. A
//! [`Tree`] handle is a snapshot; `insert`/`remove` return a *new* handle and
//! leave the old one untouched, sharing every subtree off the edit path.
//!
//! # Key Properties
//!
//! - Keys are ordered by unsigned lexicographic byte comparison.
//! - Handles are cheap to clone (`Arc` root + length) and safe to read from
//!   any number of threads concurrently.
//! - Cursors ([`Iter`], [`RevIter`]) are lazy, walk the version they were
//!   created from, and never observe later mutations.
//! - Prefix cursors are cheap: all keys sharing a prefix occupy one subtree.

pub mod iter;
pub mod node;

pub use iter::{Iter, RevIter};
pub use node::Entry;

use std::sync::Arc;

use node::Node;

/// One immutable version of an ordered byte-keyed map.
///
/// Cloning a `Tree` clones an `Arc` and a length; both handles then evolve
/// independently. Dropping the last handle reaching a subtree reclaims it.
pub struct Tree<T> {
    root: Arc<Node<T>>,
    len: usize,
}

impl<T> Clone for Tree<T> {
    fn clone(&self) -> Self {
        Tree {
            root: Arc::clone(&self.root),
            len: self.len,
        }
    }
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Tree<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tree").field("len", &self.len).finish()
    }
}

impl<T> Tree<T> {
    /// The empty map.
    pub fn new() -> Self {
        Tree {
            root: Arc::new(Node::empty()),
            len: 0,
        }
    }

    /// Number of entries in this version.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if this version holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Exact-match lookup.
    pub fn get(&self, key: &[u8]) -> Option<&T> {
        node::get(&self.root, key).map(|entry| entry.value())
    }

    /// Produce a new version with `key` bound to `value`, along with the
    /// entry the key previously held, if any. `self` is unaffected.
    pub fn insert(&self, key: &[u8], value: T) -> (Tree<T>, Option<Arc<Entry<T>>>) {
        let entry = Arc::new(Entry {
            key: key.to_vec(),
            value,
        });
        let (root, old) = node::insert(&self.root, 0, entry);
        let len = if old.is_some() { self.len } else { self.len + 1 };
        (
            Tree {
                root: Arc::new(root),
                len,
            },
            old,
        )
    }

    /// Produce a new version without `key`, along with the removed entry.
    /// An absent key yields an unchanged version and `None` — not an error.
    pub fn remove(&self, key: &[u8]) -> (Tree<T>, Option<Arc<Entry<T>>>) {
        match node::remove(&self.root, key, true) {
            None => (self.clone(), None),
            Some((replacement, old)) => {
                let root = replacement.unwrap_or_else(Node::empty);
                (
                    Tree {
                        root: Arc::new(root),
                        len: self.len - 1,
                    },
                    Some(old),
                )
            }
        }
    }

    /// Ascending cursor over every entry.
    pub fn iter(&self) -> Iter<T> {
        Iter::new(Arc::clone(&self.root))
    }

    /// Descending cursor over every entry.
    pub fn iter_rev(&self) -> RevIter<T> {
        RevIter::new(Arc::clone(&self.root))
    }

    /// Ascending cursor starting at the smallest key `>= bound`.
    pub fn iter_lower_bound(&self, bound: &[u8]) -> Iter<T> {
        Iter::lower_bound(Arc::clone(&self.root), bound)
    }

    /// Ascending cursor over every key starting with `prefix`.
    pub fn iter_prefix(&self, prefix: &[u8]) -> Iter<T> {
        match self.prefix_subtree(prefix) {
            Some(subtree) => Iter::new(subtree),
            None => Iter::none(),
        }
    }

    /// Descending cursor over every key starting with `prefix`.
    pub fn iter_prefix_rev(&self, prefix: &[u8]) -> RevIter<T> {
        match self.prefix_subtree(prefix) {
            Some(subtree) => RevIter::new(subtree),
            None => RevIter::none(),
        }
    }

    /// The subtree containing exactly the keys that start with `prefix`.
    /// A prefix ending mid-edge matches the subtree iff the edge bytes agree.
    fn prefix_subtree(&self, prefix: &[u8]) -> Option<Arc<Node<T>>> {
        let mut node = Arc::clone(&self.root);
        let mut search = prefix;
        loop {
            if search.is_empty() {
                return Some(node);
            }
            let pos = node.edge_index(search[0]).ok()?;
            let child = Arc::clone(&node.edges[pos].node);
            if search.len() <= child.prefix.len() {
                if child.prefix.starts_with(search) {
                    return Some(child);
                }
                return None;
            }
            if !search.starts_with(&child.prefix) {
                return None;
            }
            search = &search[child.prefix.len()..];
            node = child;
        }
    }
}
