//! Radix tree nodes and the path-copying mutation algorithms.
//!
//! Nodes are immutable once linked into a published tree version. Insert and
//! remove rebuild only the nodes on the descent path; every untouched subtree
//! is carried over by cloning its `Arc`. Old roots therefore remain complete,
//! consistent snapshots for as long as anything holds them.

use std::sync::Arc;

/// A stored key/value pair. Leaves keep the full key so that cursors can
/// yield it without reassembling edge prefixes.
pub struct Entry<T> {
    pub(crate) key: Vec<u8>,
    pub(crate) value: T,
}

impl<T> Entry<T> {
    /// The full key of this entry.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// The stored value.
    pub fn value(&self) -> &T {
        &self.value
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Entry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("key", &hex::encode(&self.key))
            .field("value", &self.value)
            .finish()
    }
}

/// An outgoing edge. `label` always equals `node.prefix[0]`; edges are kept
/// sorted by label so traversal order is byte order.
pub(crate) struct Edge<T> {
    pub(crate) label: u8,
    pub(crate) node: Arc<Node<T>>,
}

impl<T> Clone for Edge<T> {
    fn clone(&self) -> Self {
        Edge {
            label: self.label,
            node: Arc::clone(&self.node),
        }
    }
}

/// A radix tree node: a compressed edge prefix, an optional entry whose key
/// ends exactly here, and sorted edges to longer keys. The root node has an
/// empty prefix; every other node has a non-empty one.
pub(crate) struct Node<T> {
    pub(crate) prefix: Vec<u8>,
    pub(crate) leaf: Option<Arc<Entry<T>>>,
    pub(crate) edges: Vec<Edge<T>>,
}

impl<T> Clone for Node<T> {
    fn clone(&self) -> Self {
        Node {
            prefix: self.prefix.clone(),
            leaf: self.leaf.clone(),
            edges: self.edges.clone(),
        }
    }
}

impl<T> Node<T> {
    pub(crate) fn empty() -> Self {
        Node {
            prefix: Vec::new(),
            leaf: None,
            edges: Vec::new(),
        }
    }

    /// Position of the edge with the given label, or the insertion point.
    pub(crate) fn edge_index(&self, label: u8) -> Result<usize, usize> {
        self.edges.binary_search_by_key(&label, |e| e.label)
    }

    /// Fold the single remaining child into this node. Caller guarantees the
    /// node is leafless, non-root, and has exactly one edge.
    fn merge_child(&mut self) {
        let edge = match self.edges.pop() {
            Some(edge) => edge,
            None => return,
        };
        self.prefix.extend_from_slice(&edge.node.prefix);
        self.leaf = edge.node.leaf.clone();
        self.edges = edge.node.edges.clone();
    }
}

pub(crate) fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

/// Exact-match lookup. Never allocates, never mutates.
pub(crate) fn get<'a, T>(root: &'a Node<T>, key: &[u8]) -> Option<&'a Arc<Entry<T>>> {
    let mut node = root;
    let mut search = key;
    loop {
        if search.is_empty() {
            return node.leaf.as_ref();
        }
        let pos = node.edge_index(search[0]).ok()?;
        let child = &node.edges[pos].node;
        if !search.starts_with(&child.prefix) {
            return None;
        }
        search = &search[child.prefix.len()..];
        node = child;
    }
}

/// Insert by path copying. `depth` is how many bytes of `entry.key` the path
/// down to `node` has already consumed (including the node's own prefix).
/// Returns the rebuilt node and the entry it replaced, if any.
pub(crate) fn insert<T>(
    node: &Node<T>,
    depth: usize,
    entry: Arc<Entry<T>>,
) -> (Node<T>, Option<Arc<Entry<T>>>) {
    let search = &entry.key[depth..];
    if search.is_empty() {
        let mut new = node.clone();
        let old = new.leaf.replace(entry);
        return (new, old);
    }
    match node.edge_index(search[0]) {
        Err(pos) => {
            // No edge under this label: attach a fresh leaf node.
            let child = Node {
                prefix: search.to_vec(),
                leaf: Some(Arc::clone(&entry)),
                edges: Vec::new(),
            };
            let mut new = node.clone();
            new.edges.insert(
                pos,
                Edge {
                    label: search[0],
                    node: Arc::new(child),
                },
            );
            (new, None)
        }
        Ok(pos) => {
            let child = &node.edges[pos].node;
            let common = common_prefix_len(search, &child.prefix);
            if common == child.prefix.len() {
                // The edge is fully consumed; continue below it.
                let (rebuilt, old) = insert(child, depth + common, entry);
                let mut new = node.clone();
                new.edges[pos].node = Arc::new(rebuilt);
                (new, old)
            } else {
                // The key diverges inside the edge: split it at the shared
                // prefix. The existing child keeps its subtree untouched,
                // only its prefix is shortened.
                let mut moved = (**child).clone();
                moved.prefix = child.prefix[common..].to_vec();
                let moved_label = moved.prefix[0];

                let mut split = Node {
                    prefix: search[..common].to_vec(),
                    leaf: None,
                    edges: Vec::new(),
                };
                let rest = &search[common..];
                if rest.is_empty() {
                    // New key ends exactly at the split point.
                    split.leaf = Some(Arc::clone(&entry));
                    split.edges.push(Edge {
                        label: moved_label,
                        node: Arc::new(moved),
                    });
                } else {
                    let leaf_node = Node {
                        prefix: rest.to_vec(),
                        leaf: Some(Arc::clone(&entry)),
                        edges: Vec::new(),
                    };
                    let mut pair = vec![
                        Edge {
                            label: moved_label,
                            node: Arc::new(moved),
                        },
                        Edge {
                            label: rest[0],
                            node: Arc::new(leaf_node),
                        },
                    ];
                    pair.sort_by_key(|e| e.label);
                    split.edges = pair;
                }

                let mut new = node.clone();
                new.edges[pos].node = Arc::new(split);
                (new, None)
            }
        }
    }
}

/// Remove by path copying. Returns `None` if the key is absent. On success,
/// returns the replacement node (`None` when the whole subtree vanishes) and
/// the removed entry. Leafless single-edge nodes are merged with their child
/// on the way back up so the compressed shape stays canonical.
pub(crate) fn remove<T>(
    node: &Node<T>,
    search: &[u8],
    is_root: bool,
) -> Option<(Option<Node<T>>, Arc<Entry<T>>)> {
    if search.is_empty() {
        let old = node.leaf.clone()?;
        if node.edges.is_empty() {
            if is_root {
                return Some((Some(Node::empty()), old));
            }
            return Some((None, old));
        }
        let mut new = node.clone();
        new.leaf = None;
        if !is_root && new.edges.len() == 1 {
            new.merge_child();
        }
        return Some((Some(new), old));
    }

    let pos = node.edge_index(search[0]).ok()?;
    let child = &node.edges[pos].node;
    if !search.starts_with(&child.prefix) {
        return None;
    }
    let (replacement, old) = remove(child, &search[child.prefix.len()..], false)?;

    let mut new = node.clone();
    match replacement {
        Some(rebuilt) => new.edges[pos].node = Arc::new(rebuilt),
        None => {
            new.edges.remove(pos);
        }
    }
    if !is_root && new.leaf.is_none() {
        match new.edges.len() {
            0 => return Some((None, old)),
            1 => new.merge_child(),
            _ => {}
        }
    }
    Some((Some(new), old))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &[u8], value: u32) -> Arc<Entry<u32>> {
        Arc::new(Entry {
            key: key.to_vec(),
            value,
        })
    }

    fn build(keys: &[&[u8]]) -> Node<u32> {
        let mut node = Node::empty();
        for (i, key) in keys.iter().enumerate() {
            let (next, old) = insert(&node, 0, entry(key, i as u32));
            assert!(old.is_none(), "key {:?} inserted twice", key);
            node = next;
        }
        node
    }

    // -----------------------------------------------------------------------
    // Insert shapes
    // -----------------------------------------------------------------------

    #[test]
    fn insert_splits_shared_prefix() {
        let node = build(&[b"apple", b"apply"]);
        // One edge under 'a' whose prefix is the shared "appl".
        assert_eq!(node.edges.len(), 1);
        let split = &node.edges[0].node;
        assert_eq!(split.prefix, b"appl");
        assert!(split.leaf.is_none());
        assert_eq!(split.edges.len(), 2);
        assert_eq!(split.edges[0].label, b'e');
        assert_eq!(split.edges[1].label, b'y');
    }

    #[test]
    fn insert_key_that_is_prefix_of_existing() {
        let node = build(&[b"roam", b"ro"]);
        let child = &node.edges[0].node;
        assert_eq!(child.prefix, b"ro");
        assert!(child.leaf.is_some());
        assert_eq!(child.edges.len(), 1);
        assert_eq!(get(&node, b"ro").unwrap().value, 1);
        assert_eq!(get(&node, b"roam").unwrap().value, 0);
    }

    #[test]
    fn insert_empty_key_lands_on_root() {
        let node = build(&[b""]);
        assert!(node.leaf.is_some());
        assert_eq!(get(&node, b"").unwrap().value, 0);
    }

    #[test]
    fn insert_replaces_and_returns_old() {
        let node = build(&[b"k"]);
        let (node, old) = insert(&node, 0, entry(b"k", 9));
        assert_eq!(old.unwrap().value, 0);
        assert_eq!(get(&node, b"k").unwrap().value, 9);
    }

    // -----------------------------------------------------------------------
    // Remove shapes
    // -----------------------------------------------------------------------

    #[test]
    fn remove_merges_single_child() {
        let node = build(&[b"apple", b"apply"]);
        let (replacement, old) = remove(&node, b"apple", true).unwrap();
        assert_eq!(old.value, 0);
        let node = replacement.unwrap();
        // The split node collapses back into a single compressed edge.
        assert_eq!(node.edges.len(), 1);
        assert_eq!(node.edges[0].node.prefix, b"apply");
        assert!(node.edges[0].node.edges.is_empty());
    }

    #[test]
    fn remove_missing_key_is_none() {
        let node = build(&[b"apple"]);
        assert!(remove(&node, b"app", true).is_none());
        assert!(remove(&node, b"apples", true).is_none());
        assert!(remove(&node, b"banana", true).is_none());
    }

    #[test]
    fn remove_last_key_leaves_empty_root() {
        let node = build(&[b"only"]);
        let (replacement, _) = remove(&node, b"only", true).unwrap();
        let node = replacement.unwrap();
        assert!(node.leaf.is_none());
        assert!(node.edges.is_empty());
    }

    #[test]
    fn remove_keeps_leaf_carrying_ancestor() {
        let node = build(&[b"ro", b"roam"]);
        let (replacement, old) = remove(&node, b"roam", true).unwrap();
        assert_eq!(old.value, 1);
        let node = replacement.unwrap();
        assert_eq!(get(&node, b"ro").unwrap().value, 0);
        assert!(get(&node, b"roam").is_none());
    }

    // -----------------------------------------------------------------------
    // Structural sharing
    // -----------------------------------------------------------------------

    #[test]
    fn untouched_subtrees_are_shared() {
        let node = build(&[b"aa", b"ab", b"zz"]);
        let zz_before = Arc::clone(&node.edges[1].node);
        let (after, _) = insert(&node, 0, entry(b"ac", 9));
        // The 'z' subtree was not on the edit path: same allocation.
        assert!(Arc::ptr_eq(&zz_before, &after.edges[1].node));
    }
}
