// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Native change notifications.
//!
//! Clients register interest in one kind of change on one node (or, for
//! [`NodeAdded`](NotificationKind::NodeAdded) and
//! [`NodeRemoved`](NotificationKind::NodeRemoved), on the whole graph) and get
//! back a [`NativeCallbackId`]. The store never calls back into clients.
//! Instead, [`DagStore::flush_notifications`] returns everything that fired
//! since the previous flush, and the client routes each [`Notification`] by
//! its id. A client can therefore mutate the graph while handling
//! notifications without re-entering the store.
//!
//! Structural notices (parent, name, add/remove, attribute writes) are
//! reported in mutation order. Inherited changes are collected from the dirty
//! channels afterwards: one [`WorldMatrixModified`] or [`VisibilityChanged`]
//! per affected node per flush, however many times its ancestors changed.
//!
//! [`WorldMatrixModified`]: NotificationKind::WorldMatrixModified
//! [`VisibilityChanged`]: NotificationKind::VisibilityChanged

use alloc::string::String;
use alloc::vec::Vec;

use super::error::DagError;
use super::id::{NativeCallbackId, NodeHandle};
use super::store::DagStore;
use crate::dirty;

/// The kind of change a native callback listens for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// The node's world matrix changed (its own or an ancestor's transform,
    /// or its ancestry).
    WorldMatrixModified,
    /// The node's visibility in the hierarchy may have changed.
    VisibilityChanged,
    /// Some attribute on the node was written. Coalesced per flush.
    NodeDirty,
    /// A named attribute on the node was written.
    AttributeChanged,
    /// The node was attached to a parent.
    ParentAdded,
    /// The node was detached from its parent.
    ParentRemoved,
    /// The node was renamed.
    NameChanged,
    /// A node was created or restored. Graph-wide only.
    NodeAdded,
    /// The node was deleted.
    NodeRemoved,
}

impl NotificationKind {
    /// Whether this kind may be registered graph-wide.
    #[must_use]
    pub const fn is_global(self) -> bool {
        matches!(self, Self::NodeAdded | Self::NodeRemoved)
    }

    /// Whether this kind may be registered on a single node.
    #[must_use]
    pub const fn is_node_scoped(self) -> bool {
        !matches!(self, Self::NodeAdded)
    }
}

/// One delivered notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    /// The callback this notification is for.
    pub callback: NativeCallbackId,
    /// The node that changed. May already be stale or deleted by the time the
    /// notification is handled; resolve before use.
    pub node: NodeHandle,
    /// What happened.
    pub kind: NotificationKind,
    /// The attribute name, for [`NotificationKind::AttributeChanged`].
    pub attribute: Option<String>,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Listener {
    pub(crate) node: Option<NodeHandle>,
    pub(crate) kind: NotificationKind,
}

impl DagStore {
    /// Registers a callback for `kind` changes on `node`.
    ///
    /// # Errors
    ///
    /// Fails if `node` does not resolve, or `kind` is graph-wide only.
    pub fn add_callback(
        &mut self,
        node: NodeHandle,
        kind: NotificationKind,
    ) -> Result<NativeCallbackId, DagError> {
        self.check(node)?;
        if !kind.is_node_scoped() {
            return Err(DagError::WrongScope(kind));
        }
        Ok(self.insert_listener(Listener {
            node: Some(node),
            kind,
        }))
    }

    /// Registers a graph-wide callback for `kind`.
    ///
    /// # Errors
    ///
    /// Fails if `kind` is not one of the graph-wide kinds.
    pub fn add_global_callback(
        &mut self,
        kind: NotificationKind,
    ) -> Result<NativeCallbackId, DagError> {
        if !kind.is_global() {
            return Err(DagError::WrongScope(kind));
        }
        Ok(self.insert_listener(Listener { node: None, kind }))
    }

    /// Removes a callback. Returns `false` if it was not registered, which
    /// includes [`NativeCallbackId::INVALID`] and ids removed before.
    pub fn remove_callback(&mut self, id: NativeCallbackId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    /// Whether `id` is currently registered.
    #[must_use]
    pub fn has_callback(&self, id: NativeCallbackId) -> bool {
        self.listeners.contains_key(&id)
    }

    /// Number of registered callbacks.
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.listeners.len()
    }

    /// Collects every notification raised since the previous flush.
    pub fn flush_notifications(&mut self) -> Vec<Notification> {
        let mut out = core::mem::take(&mut self.pending);

        let moved: Vec<u32> = self
            .dirty
            .drain(dirty::TRANSFORM)
            .affected()
            .deterministic()
            .run()
            .collect();
        self.collect_for(&moved, NotificationKind::WorldMatrixModified, &mut out);

        let shown: Vec<u32> = self
            .dirty
            .drain(dirty::VISIBILITY)
            .affected()
            .deterministic()
            .run()
            .collect();
        self.collect_for(&shown, NotificationKind::VisibilityChanged, &mut out);

        let touched: Vec<u32> = self
            .dirty
            .drain(dirty::NODE)
            .deterministic()
            .run()
            .collect();
        self.collect_for(&touched, NotificationKind::NodeDirty, &mut out);

        out
    }

    fn insert_listener(&mut self, listener: Listener) -> NativeCallbackId {
        self.next_listener += 1;
        let id = NativeCallbackId(self.next_listener);
        self.listeners.insert(id, listener);
        id
    }

    /// Queues a structural notice for `idx` to node listeners and, for
    /// graph-wide kinds, to global listeners.
    pub(crate) fn notify(&mut self, idx: u32, kind: NotificationKind, attribute: Option<&str>) {
        let node = self.handle_at(idx);
        for (&id, listener) in &self.listeners {
            if listener.kind != kind {
                continue;
            }
            let hit = match listener.node {
                Some(target) => target == node,
                None => true,
            };
            if hit {
                self.pending.push(Notification {
                    callback: id,
                    node,
                    kind,
                    attribute: attribute.map(String::from),
                });
            }
        }
    }

    fn collect_for(&self, keys: &[u32], kind: NotificationKind, out: &mut Vec<Notification>) {
        for &idx in keys {
            if idx >= self.len || self.deleted[idx as usize] {
                continue;
            }
            let node = self.handle_at(idx);
            for (&id, listener) in &self.listeners {
                if listener.kind == kind && listener.node == Some(node) {
                    out.push(Notification {
                        callback: id,
                        node,
                        kind,
                        attribute: None,
                    });
                }
            }
        }
    }
}
