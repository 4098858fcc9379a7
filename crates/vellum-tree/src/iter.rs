//! Lazy cursors over tree versions.
//!
//! A cursor owns `Arc` references into the node graph of the version it was
//! created from, so it stays valid regardless of what happens to the `Tree`
//! handle afterwards. Within one node the entry (shortest key) sorts before
//! every edge, and edges are kept in label order, so a plain depth-first walk
//! yields unsigned lexicographic byte order.

use std::sync::Arc;

use crate::node::{common_prefix_len, Entry, Node};

struct Frame<T> {
    node: Arc<Node<T>>,
    leaf_done: bool,
    next_edge: usize,
}

impl<T> Frame<T> {
    fn fresh(node: Arc<Node<T>>) -> Self {
        Frame {
            node,
            leaf_done: false,
            next_edge: 0,
        }
    }
}

/// Ascending cursor. Exhausted cursors keep returning `None`.
pub struct Iter<T> {
    stack: Vec<Frame<T>>,
}

impl<T> Iter<T> {
    pub(crate) fn new(root: Arc<Node<T>>) -> Self {
        Iter {
            stack: vec![Frame::fresh(root)],
        }
    }

    pub(crate) fn none() -> Self {
        Iter { stack: Vec::new() }
    }

    /// Build a cursor positioned at the smallest key `>= bound`.
    ///
    /// Walks the bound down the tree, recording for each node on the path
    /// which of its edges are still ahead of the bound; everything behind is
    /// never pushed at all.
    pub(crate) fn lower_bound(root: Arc<Node<T>>, bound: &[u8]) -> Self {
        let mut stack = Vec::new();
        let mut node = root;
        let mut search = bound;
        loop {
            let common = common_prefix_len(&node.prefix, search);
            if common == search.len() {
                // Bound exhausted inside (or exactly at) this node's prefix:
                // the whole subtree sorts at or after the bound.
                stack.push(Frame::fresh(node));
                break;
            }
            if common < node.prefix.len() {
                if node.prefix[common] > search[common] {
                    // Diverged upward: the whole subtree sorts after the bound.
                    stack.push(Frame::fresh(node));
                }
                // Diverged downward: the whole subtree sorts before the bound.
                break;
            }
            // Prefix fully matched and bound bytes remain. This node's own
            // entry is a strict prefix of the bound, so it sorts before it.
            let rest = &search[node.prefix.len()..];
            match node.edge_index(rest[0]) {
                Ok(pos) => {
                    let child = Arc::clone(&node.edges[pos].node);
                    stack.push(Frame {
                        node,
                        leaf_done: true,
                        next_edge: pos + 1,
                    });
                    node = child;
                    search = rest;
                }
                Err(pos) => {
                    stack.push(Frame {
                        node,
                        leaf_done: true,
                        next_edge: pos,
                    });
                    break;
                }
            }
        }
        Iter { stack }
    }
}

impl<T> Iterator for Iter<T> {
    type Item = Arc<Entry<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            if !frame.leaf_done {
                frame.leaf_done = true;
                if let Some(entry) = frame.node.leaf.clone() {
                    return Some(entry);
                }
            }
            if frame.next_edge < frame.node.edges.len() {
                let child = Arc::clone(&frame.node.edges[frame.next_edge].node);
                frame.next_edge += 1;
                self.stack.push(Frame::fresh(child));
                continue;
            }
            self.stack.pop();
        }
    }
}

struct RevFrame<T> {
    node: Arc<Node<T>>,
    // Counts down; edges at and above this position are already consumed.
    next_edge: usize,
    leaf_done: bool,
}

impl<T> RevFrame<T> {
    fn fresh(node: Arc<Node<T>>) -> Self {
        let edges = node.edges.len();
        RevFrame {
            node,
            next_edge: edges,
            leaf_done: false,
        }
    }
}

/// Descending cursor: the exact mirror of [`Iter`].
pub struct RevIter<T> {
    stack: Vec<RevFrame<T>>,
}

impl<T> RevIter<T> {
    pub(crate) fn new(root: Arc<Node<T>>) -> Self {
        RevIter {
            stack: vec![RevFrame::fresh(root)],
        }
    }

    pub(crate) fn none() -> Self {
        RevIter { stack: Vec::new() }
    }
}

impl<T> Iterator for RevIter<T> {
    type Item = Arc<Entry<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            if frame.next_edge > 0 {
                frame.next_edge -= 1;
                let child = Arc::clone(&frame.node.edges[frame.next_edge].node);
                self.stack.push(RevFrame::fresh(child));
                continue;
            }
            if !frame.leaf_done {
                frame.leaf_done = true;
                if let Some(entry) = frame.node.leaf.clone() {
                    return Some(entry);
                }
            }
            self.stack.pop();
        }
    }
}
