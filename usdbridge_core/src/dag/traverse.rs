// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::id::{INVALID, NodeHandle};
use super::store::DagStore;

/// Iterates the direct children of a node, in insertion order.
///
/// Created by [`DagStore::children`].
#[derive(Debug)]
pub struct Children<'a> {
    store: &'a DagStore,
    next: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(store: &'a DagStore, first: u32) -> Self {
        Self { store, next: first }
    }
}

impl Iterator for Children<'_> {
    type Item = NodeHandle;

    fn next(&mut self) -> Option<NodeHandle> {
        (self.next != INVALID).then(|| {
            let idx = self.next;
            self.next = self.store.next_sibling[idx as usize];
            self.store.handle_at(idx)
        })
    }
}
