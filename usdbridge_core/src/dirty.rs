// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channels for the host graph.
//!
//! [`DagStore`](crate::dag::DagStore) tracks pending change notifications with
//! [`understory_dirty`]. Each channel is an independent category of change.
//!
//! - **Inherited** ([`TRANSFORM`], [`VISIBILITY`]): marked with
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) along child-to-parent
//!   dependency edges. Moving or hiding a transform dirties every descendant's
//!   world matrix or effective visibility, so every descendant's listeners
//!   hear about it.
//! - **Local** ([`NODE`]): any attribute write on a node. Only that node is
//!   reported, and repeated writes coalesce into one notification per flush.
//!
//! [`DagStore::flush_notifications`](crate::dag::DagStore::flush_notifications)
//! drains every channel.

use understory_dirty::Channel;

/// Local or inherited transform changed.
pub const TRANSFORM: Channel = Channel::new(0);

/// Local or inherited visibility changed.
pub const VISIBILITY: Channel = Channel::new(1);

/// Some attribute on the node was written.
pub const NODE: Channel = Channel::new(2);
