// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node and native-callback identity types.

use alloc::string::String;
use core::fmt;

use super::node::{AttrValue, NodeType};
use super::store::DagStore;
use super::traverse::Children;
use crate::transform::Matrix4d;

/// Sentinel value indicating "no node" in index fields.
pub(crate) const INVALID: u32 = u32::MAX;

/// A weak handle to a node in a [`DagStore`](super::DagStore).
///
/// The handle holds a slot index and a generation counter. It never keeps the
/// node alive: once the node is purged the slot's generation moves on and the
/// handle stops resolving. Every access goes through
/// [`resolve`](Self::resolve) or one of the checked
/// queries, so a stale handle yields `None` instead of touching another node.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeHandle {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl NodeHandle {
    /// A handle that never resolves.
    pub const NULL: Self = Self {
        idx: INVALID,
        generation: 0,
    };

    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Returns `true` for [`NodeHandle::NULL`].
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.idx == INVALID
    }

    /// Whether the node still occupies its slot in `store` (it may be
    /// soft-deleted).
    #[must_use]
    pub fn is_alive(self, store: &DagStore) -> bool {
        store.is_alive(self)
    }

    /// Whether the node is alive and not deleted.
    #[must_use]
    pub fn is_valid(self, store: &DagStore) -> bool {
        store.is_valid(self)
    }

    /// Upgrades to a borrowed view, or `None` if the node is not valid.
    #[must_use]
    pub fn resolve(self, store: &DagStore) -> Option<NodeRef<'_>> {
        store.is_valid(self).then_some(NodeRef { store, node: self })
    }
}

impl Default for NodeHandle {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "NodeHandle(null)")
        } else {
            write!(f, "NodeHandle({}@gen{})", self.idx, self.generation)
        }
    }
}

/// Identifies a native notification callback registered on a
/// [`DagStore`](super::DagStore).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NativeCallbackId(pub u64);

impl NativeCallbackId {
    /// "Not registered". Holders reset their ids to this after removal.
    pub const INVALID: Self = Self(0);

    /// Returns `true` unless this is [`NativeCallbackId::INVALID`].
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Debug for NativeCallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeCallbackId({})", self.0)
    }
}

/// A validated, borrowed view of a node.
///
/// Obtained from [`NodeHandle::resolve`]. While it is held the store cannot be
/// mutated, so the node cannot go away underneath it.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    store: &'a DagStore,
    node: NodeHandle,
}

impl<'a> NodeRef<'a> {
    fn slot(&self) -> usize {
        self.node.idx as usize
    }

    /// The handle this view was resolved from.
    #[must_use]
    pub fn handle(&self) -> NodeHandle {
        self.node
    }

    /// The node's name.
    #[must_use]
    pub fn name(&self) -> &'a str {
        &self.store.name[self.slot()]
    }

    /// The node's type.
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        self.store.node_type[self.slot()]
    }

    /// The parent, if any.
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        let p = self.store.parent[self.slot()];
        (p != INVALID).then(|| self.store.handle_at(p))
    }

    /// Direct children.
    #[must_use]
    pub fn children(&self) -> Children<'a> {
        Children::new(self.store, self.store.first_child[self.slot()])
    }

    /// The full DAG path.
    #[must_use]
    pub fn full_path(&self) -> String {
        self.store.full_path(self.node).unwrap_or_default()
    }

    /// The local transform.
    #[must_use]
    pub fn local_transform(&self) -> Matrix4d {
        self.store.local_transform[self.slot()]
    }

    /// The world transform.
    #[must_use]
    pub fn world_transform(&self) -> Matrix4d {
        self.store.world_transform(self.node).unwrap_or_default()
    }

    /// Whether the node and all its ancestors are visible.
    #[must_use]
    pub fn is_visible_in_hierarchy(&self) -> bool {
        self.store.is_visible_in_hierarchy(self.node).unwrap_or(false)
    }

    /// Reads an attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&'a AttrValue> {
        self.store.attributes[self.slot()].get(name)
    }

    /// Every attribute, in name order.
    pub fn attributes(&self) -> impl Iterator<Item = (&'a str, &'a AttrValue)> + 'a {
        self.store.attributes[self.slot()]
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("node", &self.node)
            .field("name", &self.name())
            .field("type", &self.node_type())
            .finish()
    }
}
