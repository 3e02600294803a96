// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-prim adapters between host nodes and the render index.
//!
//! An adapter owns the native callbacks it registers and the prim it
//! publishes. Host notifications reach it through
//! [`Adapter::handle`], which marks dirty bits directly and tells the
//! caller whether anything structural must happen next as a [`Reaction`].
//! Handlers never dereference a node whose handle no longer resolves.

mod base;
mod dag;
mod light;
mod material;

use alloc::string::String;
use core::fmt;

use usdbridge_core::dag::{DagError, DagStore, Notification};
use usdbridge_core::usd::{InvalidPrimPath, PrimPath, TypeName};

pub use base::{AdapterBase, AdapterState};
pub use dag::DagAdapter;
pub use light::LightAdapter;
pub use material::{MaterialAdapter, MaterialNetwork, SURFACE_SHADER, ShaderNode};

use crate::index::{IndexError, PrimFamily, RenderIndex};

/// What the owner of an adapter must do after a notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Reaction {
    /// Nothing happened.
    None,
    /// Dirty bits were marked.
    Dirtied,
    /// The node is gone; tear the adapter down.
    Remove,
    /// The node's place in the hierarchy changed; rebuild the adapter on
    /// the next idle tick.
    Recreate,
}

/// A translator from one host node to one render index prim.
pub trait Adapter: fmt::Debug {
    /// Shared adapter state.
    fn base(&self) -> &AdapterBase;

    /// Shared adapter state, mutably.
    fn base_mut(&mut self) -> &mut AdapterBase;

    /// The render index table this adapter publishes into.
    fn family(&self) -> PrimFamily;

    /// The prim type.
    fn type_name(&self) -> TypeName;

    /// Registers every native callback this adapter needs.
    ///
    /// # Errors
    ///
    /// Propagates the host's refusal. Callbacks registered before the
    /// failure stay owned by the adapter.
    fn create_callbacks(&mut self, store: &mut DagStore) -> Result<(), DagError>;

    /// Reacts to one of this adapter's notifications.
    fn handle(
        &mut self,
        note: &Notification,
        store: &DagStore,
        index: &mut dyn RenderIndex,
    ) -> Reaction;

    /// Transform and visibility access for DAG-backed adapters.
    fn as_dag_mut(&mut self) -> Option<&mut DagAdapter> {
        None
    }

    /// Network access for material adapters.
    fn as_material_mut(&mut self) -> Option<&mut MaterialAdapter> {
        None
    }

    /// The prim path.
    fn path(&self) -> &PrimPath {
        self.base().path()
    }

    /// Inserts the prim into `index`.
    ///
    /// # Errors
    ///
    /// Propagates the index's refusal.
    fn populate(&mut self, index: &mut dyn RenderIndex) -> Result<(), IndexError> {
        let family = self.family();
        let type_name = self.type_name();
        self.base_mut().populate(family, &type_name, index)
    }

    /// Removes the prim from `index`.
    fn remove_prim(&mut self, index: &mut dyn RenderIndex) -> bool {
        let family = self.family();
        self.base_mut().remove_prim(family, index)
    }

    /// Removes every owned native callback. Idempotent.
    fn remove_callbacks(&mut self, store: &mut DagStore) -> usize {
        self.base_mut().remove_callbacks(store)
    }

    /// Callbacks and prim both go; the adapter returns to `Uncreated`.
    fn invalidate(&mut self, store: &mut DagStore, index: &mut dyn RenderIndex) {
        let family = self.family();
        self.base_mut().invalidate(family, store, index);
    }
}

/// The prim path of a DAG node: `root` followed by the node's DAG path
/// elements. Characters not allowed in prim names become `_`.
///
/// # Errors
///
/// Fails if the DAG path has no elements.
pub fn dag_prim_path(root: &PrimPath, dag_path: &str) -> Result<PrimPath, InvalidPrimPath> {
    let mut path = root.clone();
    let mut any = false;
    for element in dag_path.split('|').filter(|e| !e.is_empty()) {
        path = path.append_child(&sanitize(element))?;
        any = true;
    }
    if any {
        Ok(path)
    } else {
        Err(InvalidPrimPath(String::from(dag_path)))
    }
}

/// The prim path of a material for the shading engine named `name`.
///
/// # Errors
///
/// Fails if `name` is empty.
pub fn material_prim_path(root: &PrimPath, name: &str) -> Result<PrimPath, InvalidPrimPath> {
    root.append_child("_materials")?.append_child(&sanitize(name))
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dag_paths_map_under_the_root() {
        let root = PrimPath::new("/HdMayaDelegate").unwrap();
        assert_eq!(
            dag_prim_path(&root, "|group1|pCube1|pCube1Shape")
                .unwrap()
                .as_str(),
            "/HdMayaDelegate/group1/pCube1/pCube1Shape"
        );
        assert_eq!(
            dag_prim_path(&root, "|ns:rig|ns:body").unwrap().as_str(),
            "/HdMayaDelegate/ns_rig/ns_body"
        );
        assert!(dag_prim_path(&root, "|").is_err());
    }

    #[test]
    fn materials_live_in_their_own_scope() {
        let root = PrimPath::new("/HdMayaDelegate").unwrap();
        assert_eq!(
            material_prim_path(&root, "lambert1SG").unwrap().as_str(),
            "/HdMayaDelegate/_materials/lambert1SG"
        );
        assert!(material_prim_path(&root, "").is_err());
    }
}
