// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::String;

use crate::dag::{AttrValue, DagStore, NodeHandle};
use crate::usd::Stage;

use super::context::TranslatorContext;
use super::error::ContextError;

/// Attribute on the proxy node that holds the saved context.
pub const CONTEXT_ATTRIBUTE: &str = "serializedTrCtx";

/// A host node presenting a USD stage, together with the context that maps
/// the stage's prims to the host nodes made from them.
#[derive(Debug)]
pub struct ProxyShape<S> {
    node: NodeHandle,
    stage: S,
    context: TranslatorContext,
}

impl<S: Stage> ProxyShape<S> {
    /// Binds `stage` to the proxy `node`.
    pub fn new(node: NodeHandle, stage: S, context: TranslatorContext) -> Self {
        Self {
            node,
            stage,
            context,
        }
    }

    /// The proxy's host node.
    #[must_use]
    pub fn node(&self) -> NodeHandle {
        self.node
    }

    /// The stage the proxy presents.
    #[must_use]
    pub fn usd_stage(&self) -> &S {
        &self.stage
    }

    /// Mutable access to the stage, for edits that the context then catches
    /// up with through [`update_prim_types`](Self::update_prim_types).
    pub fn usd_stage_mut(&mut self) -> &mut S {
        &mut self.stage
    }

    /// The translator context.
    #[must_use]
    pub fn context(&self) -> &TranslatorContext {
        &self.context
    }

    /// Mutable access to the translator context.
    pub fn context_mut(&mut self) -> &mut TranslatorContext {
        &mut self.context
    }

    /// Prunes context entries whose prims left the stage. Returns how many
    /// were dropped.
    pub fn update_prim_types(&mut self) -> usize {
        self.context.update_prim_types(&self.stage)
    }

    /// Writes the serialised context into [`CONTEXT_ATTRIBUTE`].
    ///
    /// # Errors
    ///
    /// Fails if the proxy node is not valid or encoding fails.
    pub fn save(&self, store: &mut DagStore) -> Result<(), ContextError> {
        if !self.node.is_valid(store) {
            return Err(ContextError::InvalidProxy);
        }
        let text = self.context.serialise(store)?;
        store.set_attribute(self.node, CONTEXT_ATTRIBUTE, AttrValue::Text(text))?;
        Ok(())
    }

    /// Restores the context from [`CONTEXT_ATTRIBUTE`]. A missing attribute
    /// loads an empty context. Returns the number of entries loaded.
    ///
    /// # Errors
    ///
    /// Fails if the proxy node is not valid or the saved text is malformed.
    pub fn load(&mut self, store: &DagStore) -> Result<usize, ContextError> {
        let view = self.node.resolve(store).ok_or(ContextError::InvalidProxy)?;
        let text = view
            .attribute(CONTEXT_ATTRIBUTE)
            .and_then(AttrValue::as_text)
            .map_or_else(String::new, String::from);
        self.context.deserialise(&text, store)
    }
}
