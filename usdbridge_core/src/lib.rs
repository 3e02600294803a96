// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Identity, dispatch, and synchronization core for a host-to-USD bridge.
//!
//! `usdbridge_core` keeps a host scene graph and a USD stage in step. It is
//! `no_std` compatible (with `alloc`) and single-threaded: every operation
//! runs on the host's main thread and none of it blocks.
//!
//! # Architecture
//!
//! ```text
//!   host edit ──► DagStore (dirty channels, queued notices)
//!                     │
//!                     ▼
//!               flush_notifications() ──► Vec<Notification> ──► adapters
//!
//!   EventScheduler ──► EventDispatcher ──► Callback (weight order)
//!
//!   ProxyShape ──► Stage + TranslatorContext (prim path ──► node handles)
//! ```
//!
//! **[`event`]**: Named events with priority-ordered callbacks. Callback ids
//! embed their event id so removal and lookup route straight to the owning
//! dispatcher.
//!
//! **[`dag`]**: The host graph: generational weak [`NodeHandle`]s,
//! transactional [`DagModifier`] batches with undo, and pull-based native
//! change notifications.
//!
//! **[`dirty`]**: The `understory_dirty` channels the host graph uses to
//! coalesce and propagate change notifications.
//!
//! **[`usd`]**: Prim paths, type names, and the [`Stage`] trait.
//!
//! **[`translator`]**: The prim-to-node table of a proxy shape, with
//! teardown and persistence.
//!
//! **[`transform`]**: Row-major 4×4 matrices.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//!
//! [`NodeHandle`]: dag::NodeHandle
//! [`DagModifier`]: dag::DagModifier
//! [`Stage`]: usd::Stage

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod dag;
pub mod dirty;
pub mod event;
pub mod transform;
pub mod translator;
pub mod usd;
