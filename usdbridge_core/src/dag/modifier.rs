// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transactional batches of structural graph commands.

use alloc::string::String;
use alloc::vec::Vec;

use super::error::DagError;
use super::id::{INVALID, NodeHandle};
use super::store::DagStore;

#[derive(Clone, Debug)]
enum Op {
    Rename { node: NodeHandle, name: String },
    Reparent { node: NodeHandle, parent: Option<NodeHandle> },
    Delete(NodeHandle),
    DeleteHierarchy(NodeHandle),
}

#[derive(Clone, Debug)]
enum Undo {
    Renamed { node: NodeHandle, old: String },
    Reparented { node: NodeHandle, old: NodeHandle },
    Deleted { node: NodeHandle, parent: NodeHandle },
}

/// A batch of rename, reparent, and delete commands committed together.
///
/// Commands are recorded first and applied by [`do_it`](Self::do_it). Each
/// command is checked against the graph as left by the commands before it, so
/// a batch may first move a node under a fresh root and then delete that
/// root's hierarchy. If any command fails, the ones already applied are rolled
/// back and the graph is left as it was.
///
/// Deleted nodes stay soft-deleted while an undoable modifier may still need
/// them; a plain modifier purges them as soon as the batch succeeds.
#[derive(Debug, Default)]
pub struct DagModifier {
    ops: Vec<Op>,
    undo: Vec<Undo>,
    undoable: bool,
}

impl DagModifier {
    /// A modifier that purges deleted nodes on commit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A modifier that keeps deleted nodes for [`undo_it`](Self::undo_it).
    #[must_use]
    pub fn undoable() -> Self {
        Self {
            undoable: true,
            ..Self::default()
        }
    }

    /// Renames `node`. The new name is uniquified on commit.
    pub fn rename_node(&mut self, node: NodeHandle, name: &str) -> &mut Self {
        self.ops.push(Op::Rename {
            node,
            name: String::from(name),
        });
        self
    }

    /// Moves `node` under `parent`, or to the top level for `None`.
    pub fn reparent_node(&mut self, node: NodeHandle, parent: Option<NodeHandle>) -> &mut Self {
        self.ops.push(Op::Reparent { node, parent });
        self
    }

    /// Deletes `node`, which must have no children at commit time.
    pub fn delete_node(&mut self, node: NodeHandle) -> &mut Self {
        self.ops.push(Op::Delete(node));
        self
    }

    /// Deletes `root` and everything under it. `root` must have no parent at
    /// commit time.
    pub fn delete_hierarchy(&mut self, root: NodeHandle) -> &mut Self {
        self.ops.push(Op::DeleteHierarchy(root));
        self
    }

    /// Number of recorded, uncommitted commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether no commands are waiting for [`do_it`](Self::do_it).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Applies every recorded command.
    ///
    /// # Errors
    ///
    /// Returns the first failing command's error after rolling back the rest
    /// of the batch.
    pub fn do_it(&mut self, store: &mut DagStore) -> Result<(), DagError> {
        let ops = core::mem::take(&mut self.ops);
        let mark = self.undo.len();
        for op in &ops {
            if let Err(err) = self.apply(store, op) {
                tracing::error!(%err, ?op, "graph modifier rolled back");
                let applied = self.undo.split_off(mark);
                for record in applied.into_iter().rev() {
                    let _ = revert(store, record);
                }
                return Err(err);
            }
        }
        tracing::debug!(commands = ops.len(), "graph modifier committed");
        if !self.undoable {
            for record in self.undo.drain(..) {
                if let Undo::Deleted { node, .. } = record {
                    store.purge(node.idx);
                }
            }
        }
        Ok(())
    }

    /// Reverts everything committed so far, newest first.
    ///
    /// # Errors
    ///
    /// Fails with [`DagError::Stale`] if a node needed for the revert was
    /// purged in the meantime. Records before the failing one stay reverted.
    pub fn undo_it(&mut self, store: &mut DagStore) -> Result<(), DagError> {
        while let Some(record) = self.undo.pop() {
            revert(store, record)?;
        }
        Ok(())
    }

    fn apply(&mut self, store: &mut DagStore, op: &Op) -> Result<(), DagError> {
        match op {
            Op::Rename { node, name } => {
                let idx = store.check(*node)?;
                let old = store.name[idx as usize].clone();
                store.rename_node(idx, name);
                self.undo.push(Undo::Renamed { node: *node, old });
            }
            Op::Reparent { node, parent } => {
                let idx = store.check(*node)?;
                if !store.node_type[idx as usize].is_dag() {
                    return Err(DagError::NotDag(*node));
                }
                let parent_idx = match *parent {
                    Some(p) => {
                        let p_idx = store.check(p)?;
                        if !store.node_type[p_idx as usize].is_dag() {
                            return Err(DagError::NotDag(p));
                        }
                        if store.ancestry(p_idx).contains(&idx) {
                            return Err(DagError::Cycle {
                                child: *node,
                                parent: p,
                            });
                        }
                        p_idx
                    }
                    None => INVALID,
                };
                let old = store.reparent_node(idx, parent_idx);
                self.undo.push(Undo::Reparented {
                    node: *node,
                    old: handle_or_null(store, old),
                });
            }
            Op::Delete(node) => {
                let idx = store.check(*node)?;
                if store.has_children(idx) {
                    return Err(DagError::HasChildren(*node));
                }
                let parent = store.soft_delete(idx);
                self.undo.push(Undo::Deleted {
                    node: *node,
                    parent: handle_or_null(store, parent),
                });
            }
            Op::DeleteHierarchy(root) => {
                let idx = store.check(*root)?;
                if store.parent[idx as usize] != INVALID {
                    return Err(DagError::NotRoot(*root));
                }
                store.soft_delete(idx);
                self.undo.push(Undo::Deleted {
                    node: *root,
                    parent: NodeHandle::NULL,
                });
            }
        }
        Ok(())
    }
}

fn handle_or_null(store: &DagStore, idx: u32) -> NodeHandle {
    if idx == INVALID {
        NodeHandle::NULL
    } else {
        store.handle_at(idx)
    }
}

fn parent_idx(store: &DagStore, parent: NodeHandle) -> Result<u32, DagError> {
    if parent.is_null() {
        Ok(INVALID)
    } else {
        store.check(parent)
    }
}

fn revert(store: &mut DagStore, record: Undo) -> Result<(), DagError> {
    match record {
        Undo::Renamed { node, old } => {
            let idx = store.check(node)?;
            store.rename_node(idx, &old);
        }
        Undo::Reparented { node, old } => {
            let idx = store.check(node)?;
            let p = parent_idx(store, old)?;
            store.reparent_node(idx, p);
        }
        Undo::Deleted { node, parent } => {
            if !store.is_alive(node) {
                return Err(DagError::Stale(node));
            }
            let p = parent_idx(store, parent)?;
            store.restore(node.idx, p);
        }
    }
    Ok(())
}
