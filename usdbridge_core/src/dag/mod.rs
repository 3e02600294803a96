// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The host scene graph.
//!
//! A [`DagStore`] holds named nodes. Transforms and shapes form the DAG
//! hierarchy; shading engines, shaders, and other dependency nodes stand
//! alone. Each node has:
//!
//! - An identity ([`NodeHandle`]): a weak generational handle. Holding one
//!   never keeps the node alive. [`NodeHandle::resolve`] upgrades it to a
//!   borrowed [`NodeRef`] only while the node is valid.
//! - Topology: parent, first-child, and sibling links.
//! - Properties: a local transform plus an optional next motion sample, a
//!   visibility flag, and named [`AttrValue`] attributes.
//!
//! Property setters apply immediately. Structural commands (rename, reparent,
//! delete) are batched in a [`DagModifier`] and committed together.
//!
//! # Notifications
//!
//! Clients subscribe per node and per [`NotificationKind`] and drain what
//! fired with [`DagStore::flush_notifications`]. Inherited changes travel
//! along the dirty channels in [`dirty`](crate::dirty), so moving a group
//! notifies every descendant's world-matrix listeners.

mod error;
mod id;
mod modifier;
mod node;
mod notify;
mod store;
mod traverse;

pub use error::DagError;
pub use id::{NativeCallbackId, NodeHandle, NodeRef};
pub use modifier::DagModifier;
pub use node::{AttrValue, LightKind, NodeType};
pub use notify::{Notification, NotificationKind};
pub use store::DagStore;
pub use traverse::Children;
