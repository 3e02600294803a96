// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::String;
use alloc::vec::Vec;

use usdbridge_core::dag::{
    AttrValue, DagError, DagStore, NodeHandle, NodeType, Notification, NotificationKind,
};
use usdbridge_core::usd::{PrimPath, TypeName};

use super::base::AdapterBase;
use super::{Adapter, Reaction};
use crate::dirty::{DirtyBits, MaterialDirtyBits};
use crate::index::{PrimFamily, RenderIndex};

/// The shading engine attribute naming its surface shader.
pub const SURFACE_SHADER: &str = "surfaceShader";

/// One shader of a material network and its input values.
#[derive(Clone, Debug, PartialEq)]
pub struct ShaderNode {
    /// Host name of the shader node.
    pub name: String,
    /// Input values in name order.
    pub params: Vec<(String, AttrValue)>,
}

/// The shader network a material publishes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialNetwork {
    /// The surface shader, if the shading engine has a valid one.
    pub surface: Option<ShaderNode>,
}

/// Adapts a shading engine into a material state prim.
///
/// The network is built lazily from the shading engine's surface shader
/// connection and dropped whenever either node changes.
#[derive(Debug)]
pub struct MaterialAdapter {
    base: AdapterBase,
    shader: Option<NodeHandle>,
    network: Option<MaterialNetwork>,
}

impl MaterialAdapter {
    /// Creates an uncreated adapter for the shading engine `node`.
    #[must_use]
    pub fn new(path: PrimPath, node: NodeHandle) -> Self {
        Self {
            base: AdapterBase::new(path, node),
            shader: None,
            network: None,
        }
    }

    /// The shader network, rebuilt if a change invalidated it.
    pub fn network(&mut self, store: &DagStore) -> &MaterialNetwork {
        let node = self.base.node();
        self.network.get_or_insert_with(|| {
            tracing::trace!(engine = %node_label(store, node), "building material network");
            MaterialNetwork {
                surface: surface_shader(store, node).and_then(|shader| {
                    let view = shader.resolve(store)?;
                    Some(ShaderNode {
                        name: String::from(view.name()),
                        params: view
                            .attributes()
                            .map(|(k, v)| (String::from(k), v.clone()))
                            .collect(),
                    })
                }),
            }
        })
    }

    /// Whether a network is cached.
    #[must_use]
    pub fn is_network_cached(&self) -> bool {
        self.network.is_some()
    }

    fn invalidate_network(&mut self, index: &mut dyn RenderIndex) -> Reaction {
        self.network = None;
        self.base
            .mark_dirty(index, DirtyBits::Sprim(MaterialDirtyBits::ALL_DIRTY.into()));
        Reaction::Dirtied
    }
}

fn surface_shader(store: &DagStore, engine: NodeHandle) -> Option<NodeHandle> {
    let AttrValue::Connection(name) = store.attribute(engine, SURFACE_SHADER)? else {
        return None;
    };
    let shader = store.lookup(name)?;
    (store.node_type(shader) == Some(NodeType::Shader)).then_some(shader)
}

fn node_label(store: &DagStore, node: NodeHandle) -> &str {
    store.name(node).unwrap_or("<gone>")
}

impl Adapter for MaterialAdapter {
    fn base(&self) -> &AdapterBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut AdapterBase {
        &mut self.base
    }

    fn family(&self) -> PrimFamily {
        PrimFamily::Sprim
    }

    fn type_name(&self) -> TypeName {
        TypeName::new("material")
    }

    fn create_callbacks(&mut self, store: &mut DagStore) -> Result<(), DagError> {
        let engine = self.base.node();
        for kind in [
            NotificationKind::AttributeChanged,
            NotificationKind::NameChanged,
            NotificationKind::NodeRemoved,
        ] {
            self.base.add_callback(store, engine, kind)?;
        }
        self.shader = surface_shader(store, engine);
        if let Some(shader) = self.shader {
            for kind in [
                NotificationKind::NodeDirty,
                NotificationKind::NameChanged,
                NotificationKind::NodeRemoved,
            ] {
                self.base.add_callback(store, shader, kind)?;
            }
        }
        Ok(())
    }

    fn handle(
        &mut self,
        note: &Notification,
        store: &DagStore,
        index: &mut dyn RenderIndex,
    ) -> Reaction {
        let engine = self.base.node();
        if note.node == engine {
            return match note.kind {
                NotificationKind::NodeRemoved => Reaction::Remove,
                _ if !engine.is_valid(store) => Reaction::None,
                // The path is derived from the name.
                NotificationKind::NameChanged => Reaction::Recreate,
                // A new connection needs callbacks on the new shader.
                NotificationKind::AttributeChanged
                    if note.attribute.as_deref() == Some(SURFACE_SHADER) =>
                {
                    Reaction::Recreate
                }
                NotificationKind::AttributeChanged => self.invalidate_network(index),
                _ => Reaction::None,
            };
        }
        if Some(note.node) != self.shader {
            return Reaction::None;
        }
        match note.kind {
            NotificationKind::NodeRemoved => Reaction::Recreate,
            NotificationKind::NodeDirty | NotificationKind::NameChanged
                if note.node.is_valid(store) =>
            {
                self.invalidate_network(index)
            }
            _ => Reaction::None,
        }
    }

    fn as_material_mut(&mut self) -> Option<&mut MaterialAdapter> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::AdapterState;
    use crate::index::ChangeTracker;
    use usdbridge_core::dag::DagModifier;

    struct Fixture {
        store: DagStore,
        index: ChangeTracker,
        shader: NodeHandle,
        material: MaterialAdapter,
    }

    fn fixture() -> Fixture {
        let mut store = DagStore::new();
        let shader = store.create_node("lambert2", NodeType::Shader, None).unwrap();
        store
            .set_attribute(shader, "color", AttrValue::Color([0.5, 0.5, 0.5]))
            .unwrap();
        let engine = store
            .create_node("lambert2SG", NodeType::ShadingEngine, None)
            .unwrap();
        store
            .set_attribute(
                engine,
                SURFACE_SHADER,
                AttrValue::Connection(String::from("lambert2")),
            )
            .unwrap();
        let mut material =
            MaterialAdapter::new(PrimPath::new("/D/_materials/lambert2SG").unwrap(), engine);
        let mut index = ChangeTracker::new();
        material.create_callbacks(&mut store).unwrap();
        material.populate(&mut index).unwrap();
        let _ = index.take_dirty(material.path());
        let _ = store.flush_notifications();
        Fixture {
            store,
            index,
            shader,
            material,
        }
    }

    fn deliver(f: &mut Fixture) -> Vec<Reaction> {
        f.store
            .flush_notifications()
            .iter()
            .map(|n| f.material.handle(n, &f.store, &mut f.index))
            .collect()
    }

    #[test]
    fn network_reads_the_connected_shader() {
        let mut f = fixture();
        let network = f.material.network(&f.store).clone();
        let surface = network.surface.unwrap();
        assert_eq!(surface.name, "lambert2");
        assert_eq!(
            surface.params,
            [(String::from("color"), AttrValue::Color([0.5, 0.5, 0.5]))]
        );
        assert_eq!(f.material.base().callbacks().len(), 6);
        f.material.remove_callbacks(&mut f.store);
    }

    #[test]
    fn shader_edit_invalidates_the_network() {
        let mut f = fixture();
        let _ = f.material.network(&f.store);
        assert!(f.material.is_network_cached());

        f.store
            .set_attribute(f.shader, "color", AttrValue::Color([1.0, 0.0, 0.0]))
            .unwrap();
        assert_eq!(deliver(&mut f), [Reaction::Dirtied]);
        assert!(!f.material.is_network_cached());
        assert_eq!(f.material.base().state(), AdapterState::DirtyPending);
        assert_eq!(
            f.index.take_dirty(f.material.path()),
            Some(DirtyBits::Sprim(MaterialDirtyBits::ALL_DIRTY.into()))
        );

        let surface = f.material.network(&f.store).surface.clone().unwrap();
        assert_eq!(surface.params[0].1, AttrValue::Color([1.0, 0.0, 0.0]));
        f.material.remove_callbacks(&mut f.store);
    }

    #[test]
    fn reconnecting_the_surface_requests_recreation() {
        let mut f = fixture();
        let engine = f.material.base().node();
        f.store
            .set_attribute(
                engine,
                SURFACE_SHADER,
                AttrValue::Connection(String::from("blinn1")),
            )
            .unwrap();
        assert_eq!(deliver(&mut f), [Reaction::Recreate]);
        f.material.remove_callbacks(&mut f.store);
    }

    #[test]
    fn engine_rename_and_removal() {
        let mut f = fixture();
        let engine = f.material.base().node();
        let mut m = DagModifier::undoable();
        m.rename_node(engine, "skinSG");
        m.do_it(&mut f.store).unwrap();
        assert_eq!(deliver(&mut f), [Reaction::Recreate]);

        let mut m = DagModifier::undoable();
        m.delete_node(engine);
        m.do_it(&mut f.store).unwrap();
        assert_eq!(deliver(&mut f), [Reaction::Remove]);
        f.material.remove_callbacks(&mut f.store);
    }

    #[test]
    fn missing_shader_yields_an_empty_network() {
        let mut store = DagStore::new();
        let engine = store
            .create_node("emptySG", NodeType::ShadingEngine, None)
            .unwrap();
        let mut material = MaterialAdapter::new(PrimPath::new("/D/m").unwrap(), engine);
        material.create_callbacks(&mut store).unwrap();
        assert_eq!(material.base().callbacks().len(), 3);
        assert_eq!(material.network(&store), &MaterialNetwork::default());
        material.remove_callbacks(&mut store);
    }
}
