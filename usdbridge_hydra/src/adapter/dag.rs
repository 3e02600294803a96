// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use usdbridge_core::dag::{DagError, DagStore, NodeHandle, Notification, NotificationKind};
use usdbridge_core::transform::Matrix4d;
use usdbridge_core::usd::{PrimPath, TypeName};

use super::base::AdapterBase;
use super::{Adapter, Reaction};
use crate::dirty::{DirtyBits, RprimDirtyBits};
use crate::index::{PrimFamily, RenderIndex};

/// Notifications registered on the adapted node itself.
const NODE_KINDS: [NotificationKind; 4] = [
    NotificationKind::WorldMatrixModified,
    NotificationKind::VisibilityChanged,
    NotificationKind::NodeDirty,
    NotificationKind::NodeRemoved,
];

/// Notifications registered on the node and every ancestor.
const HIERARCHY_KINDS: [NotificationKind; 3] = [
    NotificationKind::ParentAdded,
    NotificationKind::ParentRemoved,
    NotificationKind::NameChanged,
];

/// What a host notification means for a DAG-backed prim.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DagChange {
    Transform,
    Visibility,
    Attributes,
    Hierarchy,
    Removed,
    Ignored,
}

/// Adapts a DAG shape (a mesh) into a renderable prim.
///
/// The world transform is cached as two shutter samples and the hierarchy
/// visibility as one flag; both are recomputed only when read after a
/// notification invalidated them.
#[derive(Debug)]
pub struct DagAdapter {
    base: AdapterBase,
    samples: [Matrix4d; 2],
    samples_valid: bool,
    visible: bool,
    visibility_dirty: bool,
}

impl DagAdapter {
    /// Creates an uncreated adapter for `node`.
    #[must_use]
    pub fn new(path: PrimPath, node: NodeHandle) -> Self {
        Self {
            base: AdapterBase::new(path, node),
            samples: [Matrix4d::IDENTITY; 2],
            samples_valid: false,
            visible: true,
            visibility_dirty: true,
        }
    }

    /// The world transform at shutter open.
    ///
    /// Falls back to the last cached value when the node no longer resolves;
    /// `None` if nothing was ever cached.
    pub fn transform(&mut self, store: &DagStore) -> Option<Matrix4d> {
        self.refresh_samples(store).then_some(self.samples[0])
    }

    /// The world transform sampled at shutter open and, with `motion`,
    /// shutter close. Sample times are `0.0` and `1.0`.
    pub fn transform_samples(&mut self, store: &DagStore, motion: bool) -> Option<&[Matrix4d]> {
        if !self.refresh_samples(store) {
            return None;
        }
        Some(if motion {
            &self.samples[..]
        } else {
            &self.samples[..1]
        })
    }

    /// Whether the node and all its ancestors are visible.
    pub fn is_visible(&mut self, store: &DagStore) -> Option<bool> {
        if self.visibility_dirty {
            let visible = store.is_visible_in_hierarchy(self.base.node())?;
            self.visible = visible;
            self.visibility_dirty = false;
        }
        Some(self.visible)
    }

    fn refresh_samples(&mut self, store: &DagStore) -> bool {
        if self.samples_valid {
            return true;
        }
        let node = self.base.node();
        let (Some(open), Some(close)) = (
            store.world_transform(node),
            store.world_transform_next(node),
        ) else {
            return false;
        };
        self.samples = [open, close];
        self.samples_valid = true;
        true
    }

    /// Interprets `note` and invalidates the matching cache.
    pub(crate) fn classify(&mut self, note: &Notification, store: &DagStore) -> DagChange {
        if note.kind == NotificationKind::NodeRemoved {
            return if note.node == self.base.node() {
                DagChange::Removed
            } else {
                DagChange::Ignored
            };
        }
        if !self.base.node().is_valid(store) {
            tracing::trace!(path = %self.base.path(), kind = ?note.kind, "node gone; ignoring");
            return DagChange::Ignored;
        }
        match note.kind {
            NotificationKind::WorldMatrixModified => {
                self.samples_valid = false;
                DagChange::Transform
            }
            NotificationKind::VisibilityChanged => {
                self.visibility_dirty = true;
                DagChange::Visibility
            }
            NotificationKind::NodeDirty | NotificationKind::AttributeChanged => {
                DagChange::Attributes
            }
            NotificationKind::ParentAdded
            | NotificationKind::ParentRemoved
            | NotificationKind::NameChanged => DagChange::Hierarchy,
            NotificationKind::NodeAdded | NotificationKind::NodeRemoved => DagChange::Ignored,
        }
    }

    /// Registers node and ancestor-chain callbacks.
    pub(crate) fn register(&mut self, store: &mut DagStore) -> Result<(), DagError> {
        let node = self.base.node();
        for kind in NODE_KINDS {
            self.base.add_callback(store, node, kind)?;
        }
        let mut cursor = Some(node);
        while let Some(n) = cursor {
            for kind in HIERARCHY_KINDS {
                self.base.add_callback(store, n, kind)?;
            }
            cursor = store.parent(n);
        }
        Ok(())
    }
}

impl Adapter for DagAdapter {
    fn base(&self) -> &AdapterBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut AdapterBase {
        &mut self.base
    }

    fn family(&self) -> PrimFamily {
        PrimFamily::Rprim
    }

    fn type_name(&self) -> TypeName {
        TypeName::new("mesh")
    }

    fn create_callbacks(&mut self, store: &mut DagStore) -> Result<(), DagError> {
        self.register(store)
    }

    fn handle(
        &mut self,
        note: &Notification,
        store: &DagStore,
        index: &mut dyn RenderIndex,
    ) -> Reaction {
        let bits = match self.classify(note, store) {
            DagChange::Transform => RprimDirtyBits::DIRTY_TRANSFORM,
            DagChange::Visibility => RprimDirtyBits::DIRTY_VISIBILITY,
            DagChange::Attributes => RprimDirtyBits::GEOMETRY,
            DagChange::Hierarchy => return Reaction::Recreate,
            DagChange::Removed => return Reaction::Remove,
            DagChange::Ignored => return Reaction::None,
        };
        self.base.mark_dirty(index, DirtyBits::Rprim(bits));
        Reaction::Dirtied
    }

    fn as_dag_mut(&mut self) -> Option<&mut DagAdapter> {
        Some(self)
    }
}
