// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracking which host nodes back which prims.
//!
//! A [`TranslatorContext`] belongs to one [`ProxyShape`]. Translators record
//! the nodes they create for a prim with
//! [`register_item`](TranslatorContext::register_item) and
//! [`insert_item`](TranslatorContext::insert_item). The context is consulted
//! to find those nodes again, pruned when prims vanish from the stage, used
//! to delete the nodes when a prim is torn down, and saved with the scene as
//! a string attribute on the proxy node.

mod context;
mod error;
mod persist;
mod proxy;

pub use context::{
    ContextConfig, HandleHealth, PrimLookup, StaleHandle, TranslatorContext, TypeFilter,
};
pub use error::ContextError;
pub use proxy::{CONTEXT_ATTRIBUTE, ProxyShape};
