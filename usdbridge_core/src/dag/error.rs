// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use thiserror::Error;

use super::id::NodeHandle;
use super::notify::NotificationKind;

/// Failure of a host graph command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum DagError {
    /// The handle no longer resolves to a node.
    #[error("stale node handle {0:?}")]
    Stale(NodeHandle),

    /// The node exists but has been deleted (it is only kept for undo).
    #[error("node {0:?} has been deleted")]
    Deleted(NodeHandle),

    /// Plain deletion requires a node without children.
    #[error("node {0:?} still has children")]
    HasChildren(NodeHandle),

    /// Hierarchy deletion requires a node without a parent.
    #[error("node {0:?} is not a hierarchy root")]
    NotRoot(NodeHandle),

    /// The operation needs a DAG node.
    #[error("node {0:?} is not a DAG node")]
    NotDag(NodeHandle),

    /// The reparent would make a node its own ancestor.
    #[error("parenting {child:?} under {parent:?} would create a cycle")]
    Cycle {
        /// The node being moved.
        child: NodeHandle,
        /// The requested parent.
        parent: NodeHandle,
    },

    /// The notification kind cannot be registered this way.
    #[error("{0:?} callbacks cannot be registered on this scope")]
    WrongScope(NotificationKind),
}
