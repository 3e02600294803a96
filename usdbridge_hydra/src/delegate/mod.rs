// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scene delegate: owns every adapter and drives their lifecycle.
//!
//! A frame of host integration looks like this:
//!
//! ```rust,ignore
//! fn on_host_idle(delegate: &mut SceneDelegate, store: &mut DagStore, index: &mut ChangeTracker) {
//!     // Route native notifications; adapters mark bits or ask to go.
//!     delegate.process_notifications(store, index);
//!
//!     // Rebuild adapters whose hierarchy changed, a bounded number per tick.
//!     delegate.on_idle(store, index);
//!
//!     // The renderer pulls dirty bits and queries what it needs.
//!     for (path, bits) in delegate.sync(index) {
//!         let xf = delegate.transform(&path, store);
//!     }
//! }
//! ```

mod queue;

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use thiserror::Error;
use usdbridge_core::dag::{
    DagError, DagStore, NativeCallbackId, NodeHandle, NodeType, NotificationKind,
};
use usdbridge_core::transform::Matrix4d;
use usdbridge_core::usd::{InvalidPrimPath, PrimPath};

pub use queue::{RecreateQueue, Recreation};

use crate::adapter::{
    Adapter, DagAdapter, LightAdapter, MaterialAdapter, MaterialNetwork, Reaction,
    dag_prim_path, material_prim_path,
};
use crate::config::DelegateConfig;
use crate::dirty::DirtyBits;
use crate::index::{IndexError, RenderIndex};

/// Reasons the delegate could not build an adapter.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DelegateError {
    /// The host refused a callback registration.
    #[error(transparent)]
    Native(#[from] DagError),
    /// The render index refused an insertion.
    #[error(transparent)]
    Index(#[from] IndexError),
    /// A node or root name did not form a valid prim path.
    #[error(transparent)]
    Path(#[from] InvalidPrimPath),
}

/// Owns the adapters for one host scene and routes its notifications.
#[derive(Debug)]
pub struct SceneDelegate {
    config: DelegateConfig,
    root: PrimPath,
    adapters: BTreeMap<PrimPath, Box<dyn Adapter>>,
    routes: BTreeMap<NativeCallbackId, PrimPath>,
    node_added: NativeCallbackId,
    queue: RecreateQueue,
}

impl SceneDelegate {
    /// Creates an empty delegate.
    ///
    /// # Errors
    ///
    /// Fails if `config.root` is not an absolute prim path.
    pub fn new(config: DelegateConfig) -> Result<Self, InvalidPrimPath> {
        Ok(Self {
            config,
            root: PrimPath::new(config.root)?,
            adapters: BTreeMap::new(),
            routes: BTreeMap::new(),
            node_added: NativeCallbackId::INVALID,
            queue: RecreateQueue::new(),
        })
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> DelegateConfig {
        self.config
    }

    /// The prim every adapter publishes under.
    #[must_use]
    pub fn root(&self) -> &PrimPath {
        &self.root
    }

    /// Number of adapters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Whether there are no adapters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// The adapter at `path`.
    #[must_use]
    pub fn adapter(&self, path: &PrimPath) -> Option<&dyn Adapter> {
        self.adapters.get(path).map(|a| &**a)
    }

    /// Every adapter path, in path order.
    pub fn prim_paths(&self) -> impl Iterator<Item = &PrimPath> {
        self.adapters.keys()
    }

    /// Number of creations waiting for an idle tick.
    #[must_use]
    pub fn pending_recreations(&self) -> usize {
        self.queue.len()
    }

    // -- Lifecycle --

    /// Builds adapters for every supported node in `store` and listens for
    /// new nodes. Returns the number of adapters created.
    ///
    /// # Errors
    ///
    /// Stops at the first adapter that cannot be built.
    pub fn populate(
        &mut self,
        store: &mut DagStore,
        index: &mut dyn RenderIndex,
    ) -> Result<usize, DelegateError> {
        if !self.node_added.is_valid() {
            self.node_added = store.add_global_callback(NotificationKind::NodeAdded)?;
        }
        let nodes: Vec<NodeHandle> = store.nodes().collect();
        let mut created = 0;
        for node in nodes {
            if self.insert_node(node, store, index)?.is_some() {
                created += 1;
            }
        }
        tracing::debug!(created, root = %self.root, "delegate populated");
        Ok(created)
    }

    /// Builds an adapter for `node` if its type is translated and no adapter
    /// exists at its path yet. Returns the new prim path.
    ///
    /// # Errors
    ///
    /// Fails if callbacks cannot be registered or the index refuses the
    /// prim. Nothing is left behind on failure.
    pub fn insert_node(
        &mut self,
        node: NodeHandle,
        store: &mut DagStore,
        index: &mut dyn RenderIndex,
    ) -> Result<Option<PrimPath>, DelegateError> {
        let Some(mut adapter) = self.build_adapter(node, store)? else {
            return Ok(None);
        };
        let path = adapter.path().clone();
        if self.adapters.contains_key(&path) {
            return Ok(None);
        }
        let result = adapter
            .create_callbacks(store)
            .map_err(DelegateError::from)
            .and_then(|()| adapter.populate(index).map_err(DelegateError::from));
        if let Err(err) = result {
            tracing::error!(%path, %err, "failed to create adapter");
            adapter.remove_callbacks(store);
            return Err(err);
        }
        for &id in adapter.base().callbacks() {
            self.routes.insert(id, path.clone());
        }
        tracing::debug!(%path, ty = %adapter.type_name(), "adapter created");
        self.adapters.insert(path.clone(), adapter);
        Ok(Some(path))
    }

    fn build_adapter(
        &self,
        node: NodeHandle,
        store: &DagStore,
    ) -> Result<Option<Box<dyn Adapter>>, InvalidPrimPath> {
        let Some(view) = node.resolve(store) else {
            return Ok(None);
        };
        let adapter: Box<dyn Adapter> = match view.node_type() {
            NodeType::Mesh => Box::new(DagAdapter::new(
                dag_prim_path(&self.root, &view.full_path())?,
                node,
            )),
            NodeType::Light(kind) if self.config.lights => Box::new(LightAdapter::new(
                dag_prim_path(&self.root, &view.full_path())?,
                node,
                kind,
            )),
            NodeType::ShadingEngine if self.config.materials => Box::new(MaterialAdapter::new(
                material_prim_path(&self.root, view.name())?,
                node,
            )),
            _ => return Ok(None),
        };
        Ok(Some(adapter))
    }

    /// Tears down the adapter at `path`: callbacks removed, prim removed.
    /// Returns `false` if there was none.
    pub fn remove_adapter(
        &mut self,
        path: &PrimPath,
        store: &mut DagStore,
        index: &mut dyn RenderIndex,
    ) -> bool {
        let Some(mut adapter) = self.adapters.remove(path) else {
            return false;
        };
        adapter.remove_callbacks(store);
        adapter.remove_prim(index);
        self.forget_routes(path);
        tracing::debug!(%path, "adapter removed");
        true
    }

    /// Tears down every adapter and stops listening for new nodes.
    pub fn clear(&mut self, store: &mut DagStore, index: &mut dyn RenderIndex) {
        for (_, mut adapter) in core::mem::take(&mut self.adapters) {
            adapter.remove_callbacks(store);
            adapter.remove_prim(index);
        }
        self.routes.clear();
        self.queue.clear();
        if self.node_added.is_valid() {
            store.remove_callback(self.node_added);
            self.node_added = NativeCallbackId::INVALID;
        }
    }

    fn forget_routes(&mut self, path: &PrimPath) {
        self.routes.retain(|_, p| p != path);
    }

    // -- Notifications --

    /// Delivers every pending host notification to its adapter and applies
    /// the resulting reactions. Returns the number of notifications an
    /// adapter handled.
    ///
    /// Notifications whose callback was removed earlier in the same batch
    /// are dropped.
    pub fn process_notifications(
        &mut self,
        store: &mut DagStore,
        index: &mut dyn RenderIndex,
    ) -> usize {
        let mut handled = 0;
        for note in store.flush_notifications() {
            if note.callback == self.node_added {
                self.queue.request(note.node, None);
                continue;
            }
            let Some(path) = self.routes.get(&note.callback).cloned() else {
                tracing::trace!(callback = ?note.callback, kind = ?note.kind, "dropping unrouted notification");
                continue;
            };
            let Some(adapter) = self.adapters.get_mut(&path) else {
                continue;
            };
            handled += 1;
            match adapter.handle(&note, store, index) {
                Reaction::None | Reaction::Dirtied => {}
                Reaction::Remove => {
                    self.remove_adapter(&path, store, index);
                }
                Reaction::Recreate => {
                    adapter.invalidate(store, index);
                    let node = adapter.base().node();
                    self.forget_routes(&path);
                    tracing::debug!(%path, "adapter scheduled for recreation");
                    self.queue.request(node, Some(path));
                }
            }
        }
        handled
    }

    /// Runs deferred adapter creations, at most
    /// [`max_recreations_per_idle`](DelegateConfig::max_recreations_per_idle)
    /// of them. Returns how many requests were processed.
    pub fn on_idle(&mut self, store: &mut DagStore, index: &mut dyn RenderIndex) -> usize {
        let mut processed = 0;
        while processed < self.config.max_recreations_per_idle {
            let Some(Recreation { node, stale }) = self.queue.pop() else {
                break;
            };
            processed += 1;
            if let Some(stale) = stale {
                self.remove_adapter(&stale, store, index);
            }
            match self.insert_node(node, store, index) {
                Ok(Some(path)) => tracing::debug!(%path, "adapter recreated"),
                Ok(None) => {}
                Err(err) => tracing::warn!(?node, %err, "adapter recreation failed"),
            }
        }
        processed
    }

    /// Pulls the pending dirty bits of every populated adapter out of
    /// `index` and marks the adapters synced. Returns the prims that had
    /// bits set.
    pub fn sync(&mut self, index: &mut dyn RenderIndex) -> Vec<(PrimPath, DirtyBits)> {
        let mut out = Vec::new();
        for (path, adapter) in &mut self.adapters {
            if !adapter.base().state().is_populated() {
                continue;
            }
            if let Some(bits) = index.take_dirty(path)
                && !bits.is_empty()
            {
                out.push((path.clone(), bits));
            }
            adapter.base_mut().mark_synced();
        }
        out
    }

    // -- Queries --

    /// The world transform of the prim at `path`.
    pub fn transform(&mut self, path: &PrimPath, store: &DagStore) -> Option<Matrix4d> {
        self.adapters.get_mut(path)?.as_dag_mut()?.transform(store)
    }

    /// The world transform samples of the prim at `path`: one, or two with
    /// motion samples enabled.
    pub fn transform_samples(&mut self, path: &PrimPath, store: &DagStore) -> Option<&[Matrix4d]> {
        let motion = self.config.motion_samples;
        self.adapters
            .get_mut(path)?
            .as_dag_mut()?
            .transform_samples(store, motion)
    }

    /// Whether the prim at `path` is visible.
    pub fn is_visible(&mut self, path: &PrimPath, store: &DagStore) -> Option<bool> {
        self.adapters.get_mut(path)?.as_dag_mut()?.is_visible(store)
    }

    /// The material network of the prim at `path`.
    pub fn material_network(
        &mut self,
        path: &PrimPath,
        store: &DagStore,
    ) -> Option<&MaterialNetwork> {
        Some(
            self.adapters
                .get_mut(path)?
                .as_material_mut()?
                .network(store),
        )
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::*;
    use crate::adapter::AdapterState;
    use crate::dirty::RprimDirtyBits;
    use crate::index::ChangeTracker;
    use usdbridge_core::dag::{AttrValue, LightKind};

    fn p(s: &str) -> PrimPath {
        PrimPath::new(s).unwrap()
    }

    struct Scene {
        store: DagStore,
        index: ChangeTracker,
        delegate: SceneDelegate,
        xf: NodeHandle,
    }

    fn scene(config: DelegateConfig) -> Scene {
        let mut store = DagStore::new();
        let xf = store
            .create_node("pCube1", NodeType::Transform, None)
            .unwrap();
        store
            .create_node("pCube1Shape", NodeType::Mesh, Some(xf))
            .unwrap();
        let lxf = store
            .create_node("key", NodeType::Transform, None)
            .unwrap();
        store
            .create_node("keyShape", NodeType::Light(LightKind::Point), Some(lxf))
            .unwrap();
        let sg = store
            .create_node("lambert1SG", NodeType::ShadingEngine, None)
            .unwrap();
        store
            .set_attribute(sg, "surfaceShader", AttrValue::Connection(String::from("none")))
            .unwrap();
        let _ = store.flush_notifications();

        let mut index = ChangeTracker::new();
        let mut delegate = SceneDelegate::new(config).unwrap();
        delegate.populate(&mut store, &mut index).unwrap();
        Scene {
            store,
            index,
            delegate,
            xf,
        }
    }

    #[test]
    fn populate_translates_supported_nodes() {
        let s = scene(DelegateConfig::viewport());
        let paths: Vec<&str> = s.delegate.prim_paths().map(PrimPath::as_str).collect();
        assert_eq!(
            paths,
            [
                "/HdMayaDelegate/_materials/lambert1SG",
                "/HdMayaDelegate/key/keyShape",
                "/HdMayaDelegate/pCube1/pCube1Shape",
            ]
        );
        assert_eq!(s.index.rprim_count(), 1);
        assert_eq!(s.index.sprim_count(), 2);
    }

    #[test]
    fn preview_config_skips_lights_and_materials() {
        let s = scene(DelegateConfig::preview());
        assert_eq!(s.delegate.len(), 1);
        assert_eq!(s.index.sprim_count(), 0);
    }

    #[test]
    fn transform_edit_dirties_then_syncs() {
        let mut s = scene(DelegateConfig::viewport());
        let mesh = p("/HdMayaDelegate/pCube1/pCube1Shape");
        let _ = s.delegate.sync(&mut s.index);

        let moved = Matrix4d::from_translation(0.0, 1.0, 0.0);
        s.store.set_local_transform(s.xf, moved).unwrap();
        assert_eq!(s.delegate.process_notifications(&mut s.store, &mut s.index), 1);
        assert_eq!(
            s.delegate.adapter(&mesh).unwrap().base().state(),
            AdapterState::DirtyPending
        );

        let synced = s.delegate.sync(&mut s.index);
        assert_eq!(
            synced,
            [(mesh.clone(), DirtyBits::Rprim(RprimDirtyBits::DIRTY_TRANSFORM))]
        );
        assert_eq!(
            s.delegate.adapter(&mesh).unwrap().base().state(),
            AdapterState::Populated
        );
        assert_eq!(s.delegate.transform(&mesh, &s.store), Some(moved));
        assert_eq!(s.delegate.is_visible(&mesh, &s.store), Some(true));
        assert_eq!(
            s.delegate.transform_samples(&mesh, &s.store).map(<[_]>::len),
            Some(1)
        );
    }

    #[test]
    fn clear_removes_every_callback_once() {
        let mut s = scene(DelegateConfig::viewport());
        assert!(s.store.callback_count() > 0);
        s.delegate.clear(&mut s.store, &mut s.index);
        assert_eq!(s.store.callback_count(), 0);
        assert!(s.delegate.is_empty());
        assert_eq!(s.index.rprim_count() + s.index.sprim_count(), 0);
        s.delegate.clear(&mut s.store, &mut s.index);
    }

    #[test]
    fn material_queries_go_through_the_adapter() {
        let mut s = scene(DelegateConfig::viewport());
        let mat = p("/HdMayaDelegate/_materials/lambert1SG");
        assert_eq!(
            s.delegate.material_network(&mat, &s.store),
            Some(&MaterialNetwork::default())
        );
        let mesh = p("/HdMayaDelegate/pCube1/pCube1Shape");
        assert_eq!(s.delegate.material_network(&mesh, &s.store), None);
        assert_eq!(s.delegate.transform(&mat, &s.store), None);
        s.delegate.clear(&mut s.store, &mut s.index);
    }

    #[test]
    fn root_must_be_a_prim_path() {
        let config = DelegateConfig {
            root: "relative",
            ..DelegateConfig::viewport()
        };
        assert!(SceneDelegate::new(config).is_err());
    }
}
