//! Lazy result cursors over one index.

use vellum_tree::{Iter, RevIter};

use crate::db::Object;

/// An ordered, lazy sequence of objects from one index scan.
///
/// The cursor walks the tree version current when it was created: further
/// mutations through the same transaction — including deleting objects the
/// cursor has yielded or will yield — do not disturb it. Once exhausted it
/// keeps returning `None`.
pub struct Cursor {
    inner: Inner,
}

enum Inner {
    Forward(Iter<Object>),
    Reverse(RevIter<Object>),
}

impl Cursor {
    pub(crate) fn forward(iter: Iter<Object>) -> Self {
        Cursor {
            inner: Inner::Forward(iter),
        }
    }

    pub(crate) fn reverse(iter: RevIter<Object>) -> Self {
        Cursor {
            inner: Inner::Reverse(iter),
        }
    }
}

impl Iterator for Cursor {
    type Item = Object;

    fn next(&mut self) -> Option<Object> {
        match &mut self.inner {
            Inner::Forward(iter) => iter.next().map(|entry| entry.value().clone()),
            Inner::Reverse(iter) => iter.next().map(|entry| entry.value().clone()),
        }
    }
}

impl std::fmt::Debug for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let direction = match self.inner {
            Inner::Forward(_) => "forward",
            Inner::Reverse(_) => "reverse",
        };
        f.debug_struct("Cursor").field("direction", &direction).finish()
    }
}
