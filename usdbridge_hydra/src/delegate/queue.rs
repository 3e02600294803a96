// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::collections::{BTreeMap, VecDeque};

use usdbridge_core::dag::NodeHandle;
use usdbridge_core::usd::PrimPath;

/// A pending adapter (re)creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recreation {
    /// The node to build an adapter for.
    pub node: NodeHandle,
    /// The path of the adapter it replaces, if any.
    pub stale: Option<PrimPath>,
}

/// Adapter creations deferred to the next idle tick.
///
/// Each node has at most one pending entry. Entries drain in the order
/// their node was first requested; later requests only fill in a missing
/// stale path.
#[derive(Clone, Debug, Default)]
pub struct RecreateQueue {
    order: VecDeque<NodeHandle>,
    pending: BTreeMap<NodeHandle, Option<PrimPath>>,
}

impl RecreateQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a creation for `node`. Returns `false` if one was already
    /// pending.
    pub fn request(&mut self, node: NodeHandle, stale: Option<PrimPath>) -> bool {
        if let Some(existing) = self.pending.get_mut(&node) {
            if existing.is_none() {
                *existing = stale;
            }
            return false;
        }
        self.pending.insert(node, stale);
        self.order.push_back(node);
        true
    }

    /// Takes the oldest request.
    pub fn pop(&mut self) -> Option<Recreation> {
        let node = self.order.pop_front()?;
        let stale = self.pending.remove(&node).flatten();
        Some(Recreation { node, stale })
    }

    /// Whether `node` has a pending request.
    #[must_use]
    pub fn contains(&self, node: NodeHandle) -> bool {
        self.pending.contains_key(&node)
    }

    /// Number of pending requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Drops every request.
    pub fn clear(&mut self) {
        self.order.clear();
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use usdbridge_core::dag::{DagStore, NodeType};

    fn nodes(n: usize) -> (DagStore, alloc::vec::Vec<NodeHandle>) {
        let mut store = DagStore::new();
        let handles = (0..n)
            .map(|i| {
                store
                    .create_node(&alloc::format!("n{i}"), NodeType::Transform, None)
                    .unwrap()
            })
            .collect();
        (store, handles)
    }

    #[test]
    fn repeated_requests_coalesce_in_first_request_order() {
        let (_store, n) = nodes(3);
        let mut queue = RecreateQueue::new();
        assert!(queue.request(n[1], None));
        assert!(queue.request(n[0], None));
        assert!(!queue.request(n[1], None));
        assert!(queue.request(n[2], None));
        assert_eq!(queue.len(), 3);

        let drained: alloc::vec::Vec<_> = core::iter::from_fn(|| queue.pop())
            .map(|r| r.node)
            .collect();
        assert_eq!(drained, [n[1], n[0], n[2]]);
        assert!(queue.is_empty());
    }

    #[test]
    fn later_request_fills_in_the_stale_path() {
        let (_store, n) = nodes(1);
        let old = PrimPath::new("/D/old").unwrap();
        let mut queue = RecreateQueue::new();
        queue.request(n[0], None);
        queue.request(n[0], Some(old.clone()));
        queue.request(n[0], Some(PrimPath::new("/D/newer").unwrap()));
        assert_eq!(
            queue.pop(),
            Some(Recreation {
                node: n[0],
                stale: Some(old),
            })
        );
    }

    #[test]
    fn clear_forgets_everything() {
        let (_store, n) = nodes(2);
        let mut queue = RecreateQueue::new();
        queue.request(n[0], None);
        queue.request(n[1], None);
        queue.clear();
        assert!(!queue.contains(n[0]));
        assert_eq!(queue.pop(), None);
    }
}
