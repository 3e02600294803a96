// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hydra-side adapters for `usdbridge_core` host scenes.
//!
//! Each supported host node gets an [adapter](adapter::Adapter) that
//! publishes one prim into a [`RenderIndex`](index::RenderIndex), listens to
//! the node's native notifications, and turns them into dirty bits. The
//! [`SceneDelegate`](delegate::SceneDelegate) owns the adapters, routes
//! notifications to them, and rebuilds adapters whose place in the
//! hierarchy changed on the next idle tick.
//!
//! ```text
//!   DagStore ──flush_notifications──► SceneDelegate ──route──► Adapter
//!                                         │                      │
//!                                    RecreateQueue          mark_*_dirty
//!                                         │                      ▼
//!                                      on_idle ─────────► RenderIndex
//! ```
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod adapter;
pub mod config;
pub mod delegate;
pub mod dirty;
pub mod index;
