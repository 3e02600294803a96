// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use usdbridge_core::dag::{AttrValue, DagError, DagStore, LightKind, NodeHandle, Notification};
use usdbridge_core::usd::{PrimPath, TypeName};

use super::base::AdapterBase;
use super::dag::{DagAdapter, DagChange};
use super::{Adapter, Reaction};
use crate::dirty::{DirtyBits, SprimDirtyBits};
use crate::index::{PrimFamily, RenderIndex};

/// Adapts a light shape into a state prim.
///
/// Transform and visibility tracking are those of [`DagAdapter`]; attribute
/// edits invalidate the light parameters.
#[derive(Debug)]
pub struct LightAdapter {
    dag: DagAdapter,
    kind: LightKind,
}

impl LightAdapter {
    /// Creates an uncreated adapter for the light `node`.
    #[must_use]
    pub fn new(path: PrimPath, node: NodeHandle, kind: LightKind) -> Self {
        Self {
            dag: DagAdapter::new(path, node),
            kind,
        }
    }

    /// The host light kind.
    #[must_use]
    pub fn kind(&self) -> LightKind {
        self.kind
    }

    /// Reads a light parameter from the host node.
    #[must_use]
    pub fn param<'a>(&self, store: &'a DagStore, name: &str) -> Option<&'a AttrValue> {
        store.attribute(self.dag.base().node(), name)
    }
}

impl Adapter for LightAdapter {
    fn base(&self) -> &AdapterBase {
        self.dag.base()
    }

    fn base_mut(&mut self) -> &mut AdapterBase {
        self.dag.base_mut()
    }

    fn family(&self) -> PrimFamily {
        PrimFamily::Sprim
    }

    fn type_name(&self) -> TypeName {
        TypeName::new(match self.kind {
            LightKind::Point | LightKind::Spot => "sphereLight",
            LightKind::Directional => "distantLight",
            LightKind::Area => "rectLight",
        })
    }

    fn create_callbacks(&mut self, store: &mut DagStore) -> Result<(), DagError> {
        self.dag.register(store)
    }

    fn handle(
        &mut self,
        note: &Notification,
        store: &DagStore,
        index: &mut dyn RenderIndex,
    ) -> Reaction {
        let bits = match self.dag.classify(note, store) {
            DagChange::Transform => SprimDirtyBits::DIRTY_TRANSFORM,
            DagChange::Visibility => SprimDirtyBits::DIRTY_PARAMS,
            DagChange::Attributes => SprimDirtyBits::DIRTY_PARAMS | SprimDirtyBits::DIRTY_SHADOW_PARAMS,
            DagChange::Hierarchy => return Reaction::Recreate,
            DagChange::Removed => return Reaction::Remove,
            DagChange::Ignored => return Reaction::None,
        };
        self.base_mut().mark_dirty(index, DirtyBits::Sprim(bits));
        Reaction::Dirtied
    }

    fn as_dag_mut(&mut self) -> Option<&mut DagAdapter> {
        Some(&mut self.dag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ChangeTracker;
    use usdbridge_core::dag::NodeType;

    #[test]
    fn light_edits_map_to_sprim_bits() {
        let mut store = DagStore::new();
        let xf = store
            .create_node("keyLight", NodeType::Transform, None)
            .unwrap();
        let shape = store
            .create_node("keyLightShape", NodeType::Light(LightKind::Spot), Some(xf))
            .unwrap();
        let mut light = LightAdapter::new(
            PrimPath::new("/D/keyLight/keyLightShape").unwrap(),
            shape,
            LightKind::Spot,
        );
        let mut index = ChangeTracker::new();
        light.create_callbacks(&mut store).unwrap();
        light.populate(&mut index).unwrap();
        assert_eq!(index.type_name(light.path()), Some(&TypeName::new("sphereLight")));
        let _ = index.take_dirty(light.path());
        let _ = store.flush_notifications();

        store
            .set_attribute(shape, "intensity", AttrValue::Float(2.5))
            .unwrap();
        for note in store.flush_notifications() {
            assert_eq!(light.handle(&note, &store, &mut index), Reaction::Dirtied);
        }
        assert_eq!(
            index.take_dirty(light.path()),
            Some(DirtyBits::Sprim(
                SprimDirtyBits::DIRTY_PARAMS | SprimDirtyBits::DIRTY_SHADOW_PARAMS
            ))
        );
        assert_eq!(
            light.param(&store, "intensity").and_then(AttrValue::as_float),
            Some(2.5)
        );

        store.set_visible(xf, false).unwrap();
        for note in store.flush_notifications() {
            let _ = light.handle(&note, &store, &mut index);
        }
        assert_eq!(
            index.take_dirty(light.path()),
            Some(DirtyBits::Sprim(SprimDirtyBits::DIRTY_PARAMS))
        );
        light.remove_callbacks(&mut store);
    }

    #[test]
    fn type_name_follows_light_kind() {
        let node = NodeHandle::NULL;
        let path = PrimPath::new("/D/l").unwrap();
        let name = |kind| LightAdapter::new(path.clone(), node, kind).type_name();
        assert_eq!(name(LightKind::Point).as_str(), "sphereLight");
        assert_eq!(name(LightKind::Directional).as_str(), "distantLight");
        assert_eq!(name(LightKind::Area).as_str(), "rectLight");
    }
}
