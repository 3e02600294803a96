// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

use usdbridge_core::dag::{DagError, DagStore, NativeCallbackId, NodeHandle, NotificationKind};
use usdbridge_core::usd::{PrimPath, TypeName};

use crate::dirty::DirtyBits;
use crate::index::{IndexError, PrimFamily, RenderIndex};

/// Where an adapter is in its lifecycle.
///
/// ```text
///   Uncreated ──populate──► Populated ◄──sync── DirtyPending
///       ▲                     │   └──mark_dirty──►  │
///       │                     ▼                     ▼
///       └──reset── Removed ◄──remove_prim───────────┘
/// ```
///
/// A hierarchy change takes a populated adapter straight back to
/// `Uncreated` through [`AdapterBase::invalidate`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AdapterState {
    /// Not in the render index.
    #[default]
    Uncreated,
    /// In the render index with nothing pending.
    Populated,
    /// In the render index with dirty bits the renderer has not pulled yet.
    DirtyPending,
    /// Explicitly removed from the render index.
    Removed,
}

impl AdapterState {
    /// Whether the prim is currently in the render index.
    #[must_use]
    pub const fn is_populated(self) -> bool {
        matches!(self, Self::Populated | Self::DirtyPending)
    }
}

/// State shared by every adapter: the prim it publishes, the host node it
/// reads, and the native callbacks it owns.
#[derive(Debug)]
pub struct AdapterBase {
    path: PrimPath,
    node: NodeHandle,
    callbacks: Vec<NativeCallbackId>,
    state: AdapterState,
}

impl AdapterBase {
    /// Creates an uncreated adapter for `node` published at `path`.
    #[must_use]
    pub fn new(path: PrimPath, node: NodeHandle) -> Self {
        Self {
            path,
            node,
            callbacks: Vec::new(),
            state: AdapterState::Uncreated,
        }
    }

    /// The prim path.
    #[must_use]
    pub fn path(&self) -> &PrimPath {
        &self.path
    }

    /// The host node. Resolve before use.
    #[must_use]
    pub fn node(&self) -> NodeHandle {
        self.node
    }

    /// The lifecycle state.
    #[must_use]
    pub fn state(&self) -> AdapterState {
        self.state
    }

    /// The native callbacks this adapter owns.
    #[must_use]
    pub fn callbacks(&self) -> &[NativeCallbackId] {
        &self.callbacks
    }

    /// Registers a native callback on `node` and takes ownership of its id.
    ///
    /// # Errors
    ///
    /// Propagates the host's refusal.
    pub fn add_callback(
        &mut self,
        store: &mut DagStore,
        node: NodeHandle,
        kind: NotificationKind,
    ) -> Result<NativeCallbackId, DagError> {
        let id = store.add_callback(node, kind)?;
        self.callbacks.push(id);
        Ok(id)
    }

    /// Removes every owned native callback. Safe to call more than once;
    /// later calls find nothing left to remove. Returns how many were
    /// removed.
    pub fn remove_callbacks(&mut self, store: &mut DagStore) -> usize {
        let mut removed = 0;
        for id in self.callbacks.drain(..) {
            if id.is_valid() && store.remove_callback(id) {
                removed += 1;
            }
        }
        removed
    }

    /// Inserts the prim into `index`. Does nothing if already populated.
    ///
    /// # Errors
    ///
    /// Propagates the index's refusal; the state is left unchanged.
    pub fn populate(
        &mut self,
        family: PrimFamily,
        type_name: &TypeName,
        index: &mut dyn RenderIndex,
    ) -> Result<(), IndexError> {
        if self.state.is_populated() {
            return Ok(());
        }
        index.insert_prim(family, type_name, &self.path)?;
        self.state = AdapterState::Populated;
        tracing::debug!(path = %self.path, %type_name, "prim populated");
        Ok(())
    }

    /// Removes the prim from `index`. Returns `false` if it was not
    /// populated.
    pub fn remove_prim(&mut self, family: PrimFamily, index: &mut dyn RenderIndex) -> bool {
        if !self.state.is_populated() {
            return false;
        }
        if let Err(err) = index.remove_prim(family, &self.path) {
            tracing::warn!(path = %self.path, %err, "render index lost track of prim");
        }
        self.state = AdapterState::Removed;
        tracing::debug!(path = %self.path, "prim removed");
        true
    }

    /// Marks dirty bits on the prim. Ignored unless populated.
    pub fn mark_dirty(&mut self, index: &mut dyn RenderIndex, bits: DirtyBits) -> bool {
        if !self.state.is_populated() {
            tracing::trace!(path = %self.path, state = ?self.state, "dirty bits dropped");
            return false;
        }
        index.mark_dirty(&self.path, bits);
        self.state = AdapterState::DirtyPending;
        true
    }

    /// Records that the renderer pulled the pending bits.
    pub fn mark_synced(&mut self) {
        if self.state == AdapterState::DirtyPending {
            self.state = AdapterState::Populated;
        }
    }

    /// Drops the adapter back to `Uncreated` after a hierarchy change:
    /// callbacks are removed and the prim leaves the index.
    pub fn invalidate(
        &mut self,
        family: PrimFamily,
        store: &mut DagStore,
        index: &mut dyn RenderIndex,
    ) {
        self.remove_callbacks(store);
        self.remove_prim(family, index);
        self.state = AdapterState::Uncreated;
    }

    /// Returns a removed adapter to `Uncreated` so it can populate again.
    pub fn reset(&mut self) {
        if self.state == AdapterState::Removed {
            self.state = AdapterState::Uncreated;
        }
    }
}

impl Drop for AdapterBase {
    fn drop(&mut self) {
        if !self.callbacks.is_empty() {
            tracing::warn!(
                path = %self.path,
                count = self.callbacks.len(),
                "adapter dropped while owning native callbacks"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dirty::RprimDirtyBits;
    use crate::index::ChangeTracker;
    use usdbridge_core::dag::NodeType;

    fn fixture() -> (DagStore, ChangeTracker, AdapterBase) {
        let mut store = DagStore::new();
        let node = store.create_node("pCube1", NodeType::Mesh, None).unwrap();
        let base = AdapterBase::new(PrimPath::new("/D/pCube1").unwrap(), node);
        (store, ChangeTracker::new(), base)
    }

    fn mesh() -> TypeName {
        TypeName::new("mesh")
    }

    #[test]
    fn lifecycle_walks_through_every_state() {
        let (mut store, mut index, mut base) = fixture();
        assert_eq!(base.state(), AdapterState::Uncreated);

        base.populate(PrimFamily::Rprim, &mesh(), &mut index).unwrap();
        assert_eq!(base.state(), AdapterState::Populated);

        assert!(base.mark_dirty(
            &mut index,
            DirtyBits::Rprim(RprimDirtyBits::DIRTY_TRANSFORM)
        ));
        assert_eq!(base.state(), AdapterState::DirtyPending);

        base.mark_synced();
        assert_eq!(base.state(), AdapterState::Populated);

        assert!(base.remove_prim(PrimFamily::Rprim, &mut index));
        assert_eq!(base.state(), AdapterState::Removed);
        assert!(!index.contains(base.path()));

        base.reset();
        assert_eq!(base.state(), AdapterState::Uncreated);
        base.remove_callbacks(&mut store);
    }

    #[test]
    fn marks_before_populate_are_dropped() {
        let (_, mut index, mut base) = fixture();
        assert!(!base.mark_dirty(
            &mut index,
            DirtyBits::Rprim(RprimDirtyBits::DIRTY_POINTS)
        ));
        assert_eq!(base.state(), AdapterState::Uncreated);
        assert!(index.notices().is_empty());
    }

    #[test]
    fn populate_twice_inserts_once() {
        let (_, mut index, mut base) = fixture();
        base.populate(PrimFamily::Rprim, &mesh(), &mut index).unwrap();
        base.populate(PrimFamily::Rprim, &mesh(), &mut index).unwrap();
        assert_eq!(index.rprim_count(), 1);
        assert_eq!(index.notices().len(), 1);
    }

    #[test]
    fn callback_removal_is_idempotent() {
        let (mut store, _, mut base) = fixture();
        let node = base.node();
        base.add_callback(&mut store, node, NotificationKind::NodeRemoved)
            .unwrap();
        base.add_callback(&mut store, node, NotificationKind::NameChanged)
            .unwrap();
        assert_eq!(store.callback_count(), 2);

        assert_eq!(base.remove_callbacks(&mut store), 2);
        assert_eq!(base.remove_callbacks(&mut store), 0);
        assert_eq!(store.callback_count(), 0);
        assert!(base.callbacks().is_empty());
    }

    #[test]
    fn invalidate_clears_callbacks_and_prim() {
        let (mut store, mut index, mut base) = fixture();
        let node = base.node();
        base.add_callback(&mut store, node, NotificationKind::ParentAdded)
            .unwrap();
        base.populate(PrimFamily::Rprim, &mesh(), &mut index).unwrap();

        base.invalidate(PrimFamily::Rprim, &mut store, &mut index);
        assert_eq!(base.state(), AdapterState::Uncreated);
        assert_eq!(store.callback_count(), 0);
        assert!(!index.contains(base.path()));
    }
}
