// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation, topology, and property management.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::error::DagError;
use super::id::{INVALID, NativeCallbackId, NodeHandle};
use super::node::{AttrValue, NodeType};
use super::notify::{Listener, Notification, NotificationKind};
use super::traverse::Children;
use crate::dirty;
use crate::transform::Matrix4d;

/// The host scene graph: named nodes, a DAG hierarchy of transforms and
/// shapes, and free-standing dependency nodes.
///
/// Nodes are addressed by [`NodeHandle`]. Each node occupies a slot in
/// parallel arrays; purged slots are recycled through a free list and their
/// generation is bumped so old handles stop resolving.
///
/// A node deleted by an undoable [`DagModifier`](super::DagModifier) is only
/// soft-deleted: its handle stays *alive* (the slot is not reused) but it is
/// no longer *valid*. It is purged by [`flush_undo_queue`](Self::flush_undo_queue).
#[derive(Debug)]
pub struct DagStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Identity --
    pub(crate) name: Vec<String>,
    pub(crate) node_type: Vec<NodeType>,
    names: BTreeMap<String, u32>,

    // -- Properties --
    pub(crate) local_transform: Vec<Matrix4d>,
    pub(crate) next_transform: Vec<Option<Matrix4d>>,
    pub(crate) visible: Vec<bool>,
    pub(crate) attributes: Vec<BTreeMap<String, AttrValue>>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) deleted: Vec<bool>,
    occupied: Vec<bool>,
    free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Notifications --
    pub(crate) listeners: BTreeMap<NativeCallbackId, Listener>,
    pub(crate) next_listener: u64,
    pub(crate) pending: Vec<Notification>,
}

impl Default for DagStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DagStore {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            name: Vec::new(),
            node_type: Vec::new(),
            names: BTreeMap::new(),
            local_transform: Vec::new(),
            next_transform: Vec::new(),
            visible: Vec::new(),
            attributes: Vec::new(),
            generation: Vec::new(),
            deleted: Vec::new(),
            occupied: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            listeners: BTreeMap::new(),
            next_listener: 0,
            pending: Vec::new(),
        }
    }

    // -- Allocation --

    /// Creates a node and returns its handle.
    ///
    /// The path separator `|` is replaced by `_`. If `name` is taken,
    /// trailing digits are replaced by the smallest
    /// counter that makes it unique (`pCube1` becomes `pCube2`). The node
    /// starts visible with an identity transform. Graph-wide
    /// [`NodeAdded`](NotificationKind::NodeAdded) listeners are notified.
    ///
    /// # Errors
    ///
    /// Fails if `parent` does not resolve, or if either end of a requested
    /// parenting is not a DAG node.
    pub fn create_node(
        &mut self,
        name: &str,
        node_type: NodeType,
        parent: Option<NodeHandle>,
    ) -> Result<NodeHandle, DagError> {
        let parent_idx = match parent {
            Some(p) => {
                let idx = self.check(p)?;
                if !node_type.is_dag() || !self.node_type[idx as usize].is_dag() {
                    return Err(DagError::NotDag(p));
                }
                idx
            }
            None => INVALID,
        };

        let name = self.unique_name(name);
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.name[i].clone_from(&name);
            self.node_type[i] = node_type;
            self.local_transform[i] = Matrix4d::IDENTITY;
            self.next_transform[i] = None;
            self.visible[i] = true;
            self.attributes[i].clear();
            self.deleted[i] = false;
            self.occupied[i] = true;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.name.push(name.clone());
            self.node_type.push(node_type);
            self.local_transform.push(Matrix4d::IDENTITY);
            self.next_transform.push(None);
            self.visible.push(true);
            self.attributes.push(BTreeMap::new());
            self.generation.push(0);
            self.deleted.push(false);
            self.occupied.push(true);
            idx
        };
        self.names.insert(name, idx);

        if parent_idx != INVALID {
            self.link(idx, parent_idx);
        }
        self.notify(idx, NotificationKind::NodeAdded, None);
        tracing::trace!(node = %self.name[idx as usize], ty = %node_type, "node created");
        Ok(self.handle_at(idx))
    }

    /// Whether `node` still occupies its slot. True for soft-deleted nodes.
    #[must_use]
    pub fn is_alive(&self, node: NodeHandle) -> bool {
        node.idx < self.len && self.generation[node.idx as usize] == node.generation
    }

    /// Whether `node` is alive and not deleted.
    #[must_use]
    pub fn is_valid(&self, node: NodeHandle) -> bool {
        self.is_alive(node) && !self.deleted[node.idx as usize]
    }

    /// Number of valid nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        (0..self.len)
            .filter(|&i| self.slot_in_use(i) && !self.deleted[i as usize])
            .count()
    }

    /// Purges every soft-deleted node. Handles to them stop being alive.
    pub fn flush_undo_queue(&mut self) {
        let doomed: Vec<u32> = (0..self.len)
            .filter(|&i| self.slot_in_use(i) && self.deleted[i as usize])
            .collect();
        for idx in doomed {
            self.purge(idx);
        }
    }

    // -- Lookup --

    /// Finds a valid node by name, or by full DAG path (`|group1|pCube1`).
    #[must_use]
    pub fn lookup(&self, name_or_path: &str) -> Option<NodeHandle> {
        let leaf = name_or_path.rsplit('|').next()?;
        let &idx = self.names.get(leaf)?;
        let node = self.handle_at(idx);
        if !self.is_valid(node) {
            return None;
        }
        if name_or_path.starts_with('|') && self.full_path(node)? != name_or_path {
            return None;
        }
        Some(node)
    }

    /// Iterates every valid node in slot order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        (0..self.len)
            .filter(|&i| self.slot_in_use(i) && !self.deleted[i as usize])
            .map(|i| self.handle_at(i))
    }

    /// Valid DAG nodes without a parent, in slot order.
    #[must_use]
    pub fn roots(&self) -> Vec<NodeHandle> {
        self.nodes()
            .filter(|&n| {
                self.node_type[n.idx as usize].is_dag() && self.parent[n.idx as usize] == INVALID
            })
            .collect()
    }

    /// The DAG subtree under `node` in depth-first pre-order, `node` first.
    /// Empty if `node` is not valid.
    #[must_use]
    pub fn descendants(&self, node: NodeHandle) -> Vec<NodeHandle> {
        let mut out = Vec::new();
        if self.is_valid(node) {
            self.collect_subtree(node.idx, &mut out);
        }
        out.into_iter().map(|i| self.handle_at(i)).collect()
    }

    // -- Queries (None for handles that are not valid) --

    /// The node's name.
    #[must_use]
    pub fn name(&self, node: NodeHandle) -> Option<&str> {
        self.is_valid(node).then(|| self.name[node.idx as usize].as_str())
    }

    /// The node's type.
    #[must_use]
    pub fn node_type(&self, node: NodeHandle) -> Option<NodeType> {
        self.is_valid(node).then(|| self.node_type[node.idx as usize])
    }

    /// Whether the node lives in the DAG hierarchy.
    #[must_use]
    pub fn is_dag(&self, node: NodeHandle) -> Option<bool> {
        self.node_type(node).map(NodeType::is_dag)
    }

    /// Number of direct children. Zero for invalid handles.
    #[must_use]
    pub fn child_count(&self, node: NodeHandle) -> usize {
        self.children(node).count()
    }

    /// The node's parent, if it has one.
    #[must_use]
    pub fn parent(&self, node: NodeHandle) -> Option<NodeHandle> {
        if !self.is_valid(node) {
            return None;
        }
        let p = self.parent[node.idx as usize];
        (p != INVALID).then(|| self.handle_at(p))
    }

    /// Iterates the node's direct children. Empty for invalid handles.
    #[must_use]
    pub fn children(&self, node: NodeHandle) -> Children<'_> {
        let first = if self.is_valid(node) {
            self.first_child[node.idx as usize]
        } else {
            INVALID
        };
        Children::new(self, first)
    }

    /// The full DAG path, `|` separated. Dependency nodes yield their name.
    #[must_use]
    pub fn full_path(&self, node: NodeHandle) -> Option<String> {
        if !self.is_valid(node) {
            return None;
        }
        if !self.node_type[node.idx as usize].is_dag() {
            return Some(self.name[node.idx as usize].clone());
        }
        let mut path = String::new();
        for idx in self.ancestry(node.idx).into_iter().rev() {
            path.push('|');
            path.push_str(&self.name[idx as usize]);
        }
        Some(path)
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: NodeHandle, node: NodeHandle) -> bool {
        self.is_valid(ancestor)
            && self.is_valid(node)
            && self.ancestry(node.idx).contains(&ancestor.idx)
    }

    /// The node's local transform.
    #[must_use]
    pub fn local_transform(&self, node: NodeHandle) -> Option<Matrix4d> {
        self.is_valid(node)
            .then(|| self.local_transform[node.idx as usize])
    }

    /// The node's world transform: its local transform followed by every
    /// ancestor's.
    #[must_use]
    pub fn world_transform(&self, node: NodeHandle) -> Option<Matrix4d> {
        self.is_valid(node)
            .then(|| self.accumulate(node.idx, |i| self.local_transform[i as usize]))
    }

    /// The world transform at the next motion sample. Nodes without an
    /// explicit next sample contribute their current local transform.
    #[must_use]
    pub fn world_transform_next(&self, node: NodeHandle) -> Option<Matrix4d> {
        self.is_valid(node).then(|| {
            self.accumulate(node.idx, |i| {
                self.next_transform[i as usize].unwrap_or(self.local_transform[i as usize])
            })
        })
    }

    /// The node's own visibility flag.
    #[must_use]
    pub fn is_visible(&self, node: NodeHandle) -> Option<bool> {
        self.is_valid(node).then(|| self.visible[node.idx as usize])
    }

    /// Whether the node and every ancestor are visible.
    #[must_use]
    pub fn is_visible_in_hierarchy(&self, node: NodeHandle) -> Option<bool> {
        self.is_valid(node).then(|| {
            self.ancestry(node.idx)
                .iter()
                .all(|&i| self.visible[i as usize])
        })
    }

    /// Reads an attribute.
    #[must_use]
    pub fn attribute(&self, node: NodeHandle, name: &str) -> Option<&AttrValue> {
        if !self.is_valid(node) {
            return None;
        }
        self.attributes[node.idx as usize].get(name)
    }

    // -- Mutation (marks dirty) --

    /// Sets the local transform. Marks the node and its descendants.
    ///
    /// # Errors
    ///
    /// Fails if `node` is not valid.
    pub fn set_local_transform(
        &mut self,
        node: NodeHandle,
        transform: Matrix4d,
    ) -> Result<(), DagError> {
        let idx = self.check(node)?;
        self.local_transform[idx as usize] = transform;
        self.dirty.mark_with(idx, dirty::TRANSFORM, &EagerPolicy);
        Ok(())
    }

    /// Sets or clears the transform at the next motion sample.
    ///
    /// # Errors
    ///
    /// Fails if `node` is not valid.
    pub fn set_next_transform(
        &mut self,
        node: NodeHandle,
        transform: Option<Matrix4d>,
    ) -> Result<(), DagError> {
        let idx = self.check(node)?;
        self.next_transform[idx as usize] = transform;
        self.dirty.mark_with(idx, dirty::TRANSFORM, &EagerPolicy);
        Ok(())
    }

    /// Sets the visibility flag. Marks the node and its descendants.
    ///
    /// # Errors
    ///
    /// Fails if `node` is not valid.
    pub fn set_visible(&mut self, node: NodeHandle, visible: bool) -> Result<(), DagError> {
        let idx = self.check(node)?;
        if self.visible[idx as usize] != visible {
            self.visible[idx as usize] = visible;
            self.dirty.mark_with(idx, dirty::VISIBILITY, &EagerPolicy);
        }
        Ok(())
    }

    /// Writes an attribute.
    ///
    /// # Errors
    ///
    /// Fails if `node` is not valid.
    pub fn set_attribute(
        &mut self,
        node: NodeHandle,
        name: &str,
        value: AttrValue,
    ) -> Result<(), DagError> {
        let idx = self.check(node)?;
        self.attributes[idx as usize].insert(String::from(name), value);
        self.dirty.mark(idx, dirty::NODE);
        self.notify(idx, NotificationKind::AttributeChanged, Some(name));
        Ok(())
    }

    // -- Commands applied by `DagModifier` --

    /// Renames a node, uniquifying the name. Returns the name actually used.
    pub(crate) fn rename_node(&mut self, idx: u32, requested: &str) -> String {
        let old = core::mem::take(&mut self.name[idx as usize]);
        self.names.remove(&old);
        let name = self.unique_name(requested);
        self.names.insert(name.clone(), idx);
        self.name[idx as usize].clone_from(&name);
        self.notify(idx, NotificationKind::NameChanged, None);
        name
    }

    /// Moves `idx` under `parent` (or to the top level for [`INVALID`]).
    /// Returns the previous parent.
    pub(crate) fn reparent_node(&mut self, idx: u32, parent: u32) -> u32 {
        let old = self.parent[idx as usize];
        if old == parent {
            return old;
        }
        if old != INVALID {
            self.unlink(idx);
        }
        if parent != INVALID {
            self.link(idx, parent);
        } else {
            self.mark_inherited(idx);
        }
        old
    }

    /// Soft-deletes the subtree under `idx`. Returns the detached parent.
    pub(crate) fn soft_delete(&mut self, idx: u32) -> u32 {
        let old = self.parent[idx as usize];
        if old != INVALID {
            self.unlink(idx);
        }
        let mut subtree = Vec::new();
        self.collect_subtree(idx, &mut subtree);
        for &i in &subtree {
            self.deleted[i as usize] = true;
            self.notify(i, NotificationKind::NodeRemoved, None);
        }
        old
    }

    /// Reverses [`soft_delete`](Self::soft_delete).
    pub(crate) fn restore(&mut self, idx: u32, parent: u32) {
        let mut subtree = Vec::new();
        self.collect_subtree(idx, &mut subtree);
        for &i in &subtree {
            self.deleted[i as usize] = false;
            self.notify(i, NotificationKind::NodeAdded, None);
        }
        if parent != INVALID {
            self.link(idx, parent);
        }
    }

    /// Frees the slots of the subtree under `idx`.
    pub(crate) fn purge(&mut self, idx: u32) {
        if !self.slot_in_use(idx) {
            return;
        }
        if self.parent[idx as usize] != INVALID {
            self.unlink(idx);
        }
        let mut subtree = Vec::new();
        self.collect_subtree(idx, &mut subtree);
        for &i in subtree.iter().rev() {
            let slot = i as usize;
            self.dirty.remove_key(i);
            let name = core::mem::take(&mut self.name[slot]);
            if self.names.get(&name) == Some(&i) {
                self.names.remove(&name);
            }
            self.parent[slot] = INVALID;
            self.first_child[slot] = INVALID;
            self.next_sibling[slot] = INVALID;
            self.prev_sibling[slot] = INVALID;
            self.attributes[slot].clear();
            self.generation[slot] += 1;
            self.occupied[slot] = false;
            self.free_list.push(i);
        }
    }

    // -- Internals --

    /// Resolves a handle to a slot index, or explains why it does not.
    pub(crate) fn check(&self, node: NodeHandle) -> Result<u32, DagError> {
        if !self.is_alive(node) {
            return Err(DagError::Stale(node));
        }
        if self.deleted[node.idx as usize] {
            return Err(DagError::Deleted(node));
        }
        Ok(node.idx)
    }

    pub(crate) fn handle_at(&self, idx: u32) -> NodeHandle {
        NodeHandle {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    pub(crate) fn has_children(&self, idx: u32) -> bool {
        self.first_child[idx as usize] != INVALID
    }

    /// `idx` followed by its ancestors up to the root.
    pub(crate) fn ancestry(&self, idx: u32) -> Vec<u32> {
        let mut chain = Vec::new();
        let mut cur = idx;
        while cur != INVALID {
            chain.push(cur);
            cur = self.parent[cur as usize];
        }
        chain
    }

    fn slot_in_use(&self, idx: u32) -> bool {
        self.occupied[idx as usize]
    }

    fn accumulate(&self, idx: u32, local: impl Fn(u32) -> Matrix4d) -> Matrix4d {
        self.ancestry(idx)
            .into_iter()
            .fold(Matrix4d::IDENTITY, |world, i| world * local(i))
    }

    fn collect_subtree(&self, idx: u32, out: &mut Vec<u32>) {
        out.push(idx);
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            self.collect_subtree(child, out);
            child = self.next_sibling[child as usize];
        }
    }

    fn unique_name(&self, requested: &str) -> String {
        let requested = requested.replace('|', "_");
        if !requested.is_empty() && !self.names.contains_key(&requested) {
            return requested;
        }
        let stem = requested.trim_end_matches(|c: char| c.is_ascii_digit());
        let stem = if stem.is_empty() { "node" } else { stem };
        let mut n = 1_u32;
        loop {
            let candidate = format!("{stem}{n}");
            if !self.names.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Appends `c` as the last child of `p` and marks its subtree.
    fn link(&mut self, c: u32, p: u32) {
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;
        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }
        let _ = self.dirty.add_dependency(c, p, dirty::TRANSFORM);
        let _ = self.dirty.add_dependency(c, p, dirty::VISIBILITY);
        self.mark_inherited(c);
        self.notify(c, NotificationKind::ParentAdded, None);
    }

    fn unlink(&mut self, c: u32) {
        let p = self.parent[c as usize];
        let prev = self.prev_sibling[c as usize];
        let next = self.next_sibling[c as usize];
        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            self.first_child[p as usize] = next;
        }
        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }
        self.parent[c as usize] = INVALID;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;
        self.dirty.remove_dependency(c, p, dirty::TRANSFORM);
        self.dirty.remove_dependency(c, p, dirty::VISIBILITY);
        self.notify(c, NotificationKind::ParentRemoved, None);
    }

    fn mark_inherited(&mut self, idx: u32) {
        self.dirty.mark_with(idx, dirty::TRANSFORM, &EagerPolicy);
        self.dirty.mark_with(idx, dirty::VISIBILITY, &EagerPolicy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(store: &mut DagStore) -> (NodeHandle, NodeHandle) {
        let xf = store.create_node("pCube1", NodeType::Transform, None).unwrap();
        let shape = store
            .create_node("pCubeShape1", NodeType::Mesh, Some(xf))
            .unwrap();
        (xf, shape)
    }

    #[test]
    fn create_and_query() {
        let mut store = DagStore::new();
        let (xf, shape) = cube(&mut store);
        assert_eq!(store.name(shape), Some("pCubeShape1"));
        assert_eq!(store.parent(shape), Some(xf));
        assert_eq!(store.children(xf).collect::<Vec<_>>(), [shape]);
        assert_eq!(store.full_path(shape).as_deref(), Some("|pCube1|pCubeShape1"));
        assert_eq!(store.roots(), [xf]);
        assert_eq!(store.node_count(), 2);
    }

    #[test]
    fn resolve_upgrades_only_valid_handles() {
        let mut store = DagStore::new();
        let (xf, shape) = cube(&mut store);
        let view = shape.resolve(&store).unwrap();
        assert_eq!(view.name(), "pCubeShape1");
        assert_eq!(view.parent(), Some(xf));
        assert_eq!(view.node_type(), NodeType::Mesh);

        store.soft_delete(shape.idx);
        assert!(shape.is_alive(&store));
        assert!(!shape.is_valid(&store));
        assert!(shape.resolve(&store).is_none());
        assert!(NodeHandle::NULL.resolve(&store).is_none());
    }

    #[test]
    fn names_are_uniquified() {
        let mut store = DagStore::new();
        let a = store.create_node("pCube1", NodeType::Transform, None).unwrap();
        let b = store.create_node("pCube1", NodeType::Transform, None).unwrap();
        let c = store.create_node("pCube", NodeType::Transform, None).unwrap();
        assert_eq!(store.name(a), Some("pCube1"));
        assert_eq!(store.name(b), Some("pCube2"));
        assert_eq!(store.name(c), Some("pCube"));
        assert_eq!(store.lookup("pCube2"), Some(b));
    }

    #[test]
    fn lookup_by_path() {
        let mut store = DagStore::new();
        let (_, shape) = cube(&mut store);
        assert_eq!(store.lookup("|pCube1|pCubeShape1"), Some(shape));
        assert_eq!(store.lookup("|pCubeShape1"), None);
        assert_eq!(store.lookup("nothing"), None);
    }

    #[test]
    fn dependency_nodes_cannot_be_parented() {
        let mut store = DagStore::new();
        let (xf, _) = cube(&mut store);
        let sg = store.create_node("initialShadingGroup", NodeType::ShadingEngine, None);
        assert!(sg.is_ok());
        assert_eq!(
            store.create_node("blinn1", NodeType::Shader, Some(xf)),
            Err(DagError::NotDag(xf))
        );
        assert!(store.roots().iter().all(|&r| store.node_type(r) == Some(NodeType::Transform)));
    }

    #[test]
    fn world_transform_accumulates_ancestors() {
        let mut store = DagStore::new();
        let (xf, shape) = cube(&mut store);
        store
            .set_local_transform(xf, Matrix4d::from_translation(10.0, 0.0, 0.0))
            .unwrap();
        store
            .set_local_transform(shape, Matrix4d::from_translation(0.0, 5.0, 0.0))
            .unwrap();
        assert_eq!(
            store.world_transform(shape).unwrap().translation(),
            [10.0, 5.0, 0.0]
        );

        store
            .set_next_transform(xf, Some(Matrix4d::from_translation(12.0, 0.0, 0.0)))
            .unwrap();
        assert_eq!(
            store.world_transform_next(shape).unwrap().translation(),
            [12.0, 5.0, 0.0]
        );
    }

    #[test]
    fn visibility_is_inherited() {
        let mut store = DagStore::new();
        let (xf, shape) = cube(&mut store);
        assert_eq!(store.is_visible_in_hierarchy(shape), Some(true));
        store.set_visible(xf, false).unwrap();
        assert_eq!(store.is_visible(shape), Some(true));
        assert_eq!(store.is_visible_in_hierarchy(shape), Some(false));
    }

    #[test]
    fn purged_handles_go_stale_and_slots_recycle() {
        let mut store = DagStore::new();
        let (xf, shape) = cube(&mut store);
        store.soft_delete(xf.idx);
        assert!(store.is_alive(shape));
        assert!(!store.is_valid(shape));
        assert_eq!(store.name(shape), None);
        assert_eq!(store.check(xf), Err(DagError::Deleted(xf)));

        store.flush_undo_queue();
        assert!(!store.is_alive(xf));
        assert_eq!(store.check(xf), Err(DagError::Stale(xf)));
        assert_eq!(store.lookup("pCube1"), None);

        let again = store.create_node("pCube1", NodeType::Transform, None).unwrap();
        assert_ne!(again, xf);
        assert!(!store.is_alive(xf));
        assert_eq!(store.name(again), Some("pCube1"));
    }

    #[test]
    fn separator_in_names_is_replaced() {
        let mut store = DagStore::new();
        let b = store.create_node("b", NodeType::Transform, None).unwrap();
        let ab = store.create_node("a|b", NodeType::Transform, None).unwrap();
        assert_eq!(store.name(ab), Some("a_b"));
        assert_eq!(store.lookup("a_b"), Some(ab));
        assert_eq!(store.lookup("b"), Some(b));

        store.rename_node(b.idx, "|x|y");
        assert_eq!(store.name(b), Some("_x_y"));
        assert_eq!(store.full_path(b).as_deref(), Some("|_x_y"));
    }

    #[test]
    fn freed_slots_are_not_listed() {
        let mut store = DagStore::new();
        let (xf, _) = cube(&mut store);
        let other = store.create_node("group1", NodeType::Transform, None).unwrap();
        store.purge(xf.idx);
        assert_eq!(store.nodes().collect::<Vec<_>>(), [other]);
        let reused = store.create_node("pSphere1", NodeType::Transform, None).unwrap();
        assert_eq!(reused.idx, xf.idx);
        assert_eq!(store.nodes().count(), 2);
    }

    #[test]
    fn reparent_to_top_level() {
        let mut store = DagStore::new();
        let (xf, shape) = cube(&mut store);
        let old = store.reparent_node(shape.idx, INVALID);
        assert_eq!(old, xf.idx);
        assert_eq!(store.parent(shape), None);
        assert_eq!(store.children(xf).count(), 0);
        assert_eq!(store.full_path(shape).as_deref(), Some("|pCubeShape1"));
    }
}
