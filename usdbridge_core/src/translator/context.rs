// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The prim-to-node table of one proxy shape.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;

use crate::dag::{DagError, DagModifier, DagStore, NodeHandle, NodeType};
use crate::usd::{Prim, PrimPath, Stage, TypeName};

use super::error::ContextError;

/// Tunables for a [`TranslatorContext`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContextConfig {
    /// Name requested for the temporary transform that nodes with children
    /// are moved under before their hierarchy is deleted.
    pub scratch_name: &'static str,
    /// Purge deleted nodes as part of [`TranslatorContext::remove_items`].
    /// When `false` they stay soft-deleted (alive but not valid) until the
    /// host flushes its undo queue.
    pub purge_deleted: bool,
}

impl ContextConfig {
    /// Immediate, non-undoable teardown.
    pub const IMMEDIATE: Self = Self {
        scratch_name: "usdbridgeScratch",
        purge_deleted: true,
    };

    /// Teardown that leaves deleted nodes to the host's undo queue.
    pub const UNDOABLE: Self = Self {
        scratch_name: "usdbridgeScratch",
        purge_deleted: false,
    };
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self::IMMEDIATE
    }
}

/// Which created node [`TranslatorContext::mobject`] should return.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TypeFilter {
    /// The first created node, or the primary node if none were recorded.
    #[default]
    Any,
    /// The first created node of exactly this type.
    Type(NodeType),
    /// The first created DAG node.
    Dag,
}

impl TypeFilter {
    fn matches(self, ty: NodeType) -> bool {
        match self {
            Self::Any => true,
            Self::Type(want) => ty == want,
            Self::Dag => ty.is_dag(),
        }
    }
}

/// How healthy a stored node handle is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleHealth {
    /// The node exists and is usable.
    Valid,
    /// The node was deleted but is kept for undo.
    Deleted,
    /// The node is gone.
    Dead,
}

impl HandleHealth {
    /// Classifies `node` against `store`.
    #[must_use]
    pub fn of(node: NodeHandle, store: &DagStore) -> Self {
        if node.is_valid(store) {
            Self::Valid
        } else if node.is_alive(store) {
            Self::Deleted
        } else {
            Self::Dead
        }
    }
}

/// A handle that [`TranslatorContext::validate`] found unusable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaleHandle {
    /// The entry holding the handle.
    pub path: PrimPath,
    /// The handle.
    pub node: NodeHandle,
    /// What is wrong with it.
    pub health: HandleHealth,
}

/// What the context knows about one translated prim.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrimLookup {
    pub(crate) type_name: TypeName,
    pub(crate) primary: NodeHandle,
    pub(crate) created: Vec<NodeHandle>,
}

impl PrimLookup {
    /// The prim's type name as last seen.
    #[must_use]
    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    /// The node that principally represents the prim.
    #[must_use]
    pub fn primary(&self) -> NodeHandle {
        self.primary
    }

    /// Every node created on the prim's behalf, in creation order. May
    /// contain repeats.
    #[must_use]
    pub fn created(&self) -> &[NodeHandle] {
        &self.created
    }
}

/// Maps prim paths to the host nodes that back them.
///
/// The context never owns nodes. It keeps weak handles and, on teardown,
/// commands their deletion through [`DagModifier`] batches.
#[derive(Clone, Debug, Default)]
pub struct TranslatorContext {
    pub(crate) entries: BTreeMap<PrimPath, PrimLookup>,
    config: ContextConfig,
}

impl TranslatorContext {
    /// An empty context with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty context.
    #[must_use]
    pub fn with_config(config: ContextConfig) -> Self {
        Self {
            entries: BTreeMap::new(),
            config,
        }
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> ContextConfig {
        self.config
    }

    // -- Registration --

    /// Records `primary` as the node backing `prim`, refreshing the cached
    /// type. Nodes already recorded as created are kept.
    pub fn register_item(&mut self, prim: &Prim, primary: NodeHandle) {
        let entry = self.entries.entry(prim.path().clone()).or_default();
        entry.type_name = prim.type_name().clone();
        entry.primary = primary;
        tracing::debug!(path = %prim.path(), ?primary, "prim registered");
    }

    /// Appends `node` to the nodes created for `prim`. No deduplication.
    pub fn insert_item(&mut self, prim: &Prim, node: NodeHandle) {
        let entry = self
            .entries
            .entry(prim.path().clone())
            .or_insert_with(|| PrimLookup {
                type_name: prim.type_name().clone(),
                ..PrimLookup::default()
            });
        entry.created.push(node);
    }

    // -- Lookup --

    /// The entry for `path`.
    #[must_use]
    pub fn entry(&self, path: &PrimPath) -> Option<&PrimLookup> {
        self.entries.get(path)
    }

    /// Whether `path` has an entry.
    #[must_use]
    pub fn has_entry(&self, path: &PrimPath) -> bool {
        self.entries.contains_key(path)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every entry path, in path order.
    pub fn paths(&self) -> impl Iterator<Item = &PrimPath> {
        self.entries.keys()
    }

    /// Finds a created node for `path`.
    ///
    /// With a type filter, deleted and dead handles are skipped since their
    /// type cannot be read. A handle that is returned but not valid is
    /// reported as a warning and still returned; the caller decides.
    #[must_use]
    pub fn mobject(
        &self,
        path: &PrimPath,
        filter: TypeFilter,
        store: &DagStore,
    ) -> Option<NodeHandle> {
        let entry = self.entries.get(path)?;
        let found = match filter {
            TypeFilter::Any => entry
                .created
                .first()
                .copied()
                .or((!entry.primary.is_null()).then_some(entry.primary)),
            _ => entry.created.iter().copied().find(|&n| {
                store
                    .node_type(n)
                    .is_some_and(|ty| filter.matches(ty))
            }),
        }?;
        warn_unhealthy(path, found, store);
        Some(found)
    }

    /// The primary node for `path`, normally its transform.
    #[must_use]
    pub fn transform(&self, path: &PrimPath, store: &DagStore) -> Option<NodeHandle> {
        let entry = self.entries.get(path)?;
        if entry.primary.is_null() {
            return None;
        }
        warn_unhealthy(path, entry.primary, store);
        Some(entry.primary)
    }

    /// Entry paths at or under `root`, descendants before ancestors.
    #[must_use]
    pub fn entries_under(&self, root: &PrimPath) -> Vec<PrimPath> {
        let mut paths: Vec<PrimPath> = self
            .entries
            .range(root.clone()..)
            .map(|(p, _)| p)
            .take_while(|p| p.as_str().starts_with(root.as_str()))
            .filter(|p| p.has_prefix(root))
            .cloned()
            .collect();
        paths.reverse();
        paths
    }

    /// Reports every stored handle that is not valid.
    #[must_use]
    pub fn validate(&self, store: &DagStore) -> Vec<StaleHandle> {
        let mut stale = Vec::new();
        for (path, entry) in &self.entries {
            let primary = (!entry.primary.is_null()).then_some(entry.primary);
            for node in primary.into_iter().chain(entry.created.iter().copied()) {
                let health = HandleHealth::of(node, store);
                if health != HandleHealth::Valid {
                    stale.push(StaleHandle {
                        path: path.clone(),
                        node,
                        health,
                    });
                }
            }
        }
        if !stale.is_empty() {
            tracing::warn!(count = stale.len(), "translator context holds stale handles");
        }
        stale
    }

    // -- Maintenance --

    /// Drops entries whose prim no longer exists on `stage` and refreshes
    /// the cached type of the rest. Returns how many were dropped.
    pub fn update_prim_types(&mut self, stage: &dyn Stage) -> usize {
        let before = self.entries.len();
        self.entries.retain(|path, entry| match stage.prim_at_path(path) {
            Some(prim) => {
                entry.type_name = prim.type_name().clone();
                true
            }
            None => {
                tracing::debug!(%path, "pruned entry for vanished prim");
                false
            }
        });
        before - self.entries.len()
    }

    /// Deletes every node created for `path` and erases its entry.
    ///
    /// Valid nodes are split three ways and each kind is committed as one
    /// batch: childless DAG nodes are deleted directly, dependency nodes
    /// next, and DAG nodes with children last, by moving them under a
    /// scratch transform and deleting its hierarchy. Deleted or dead handles
    /// are logged and skipped. The entry is erased even if a batch fails.
    ///
    /// Returns `Ok(false)` if there was no entry.
    ///
    /// # Errors
    ///
    /// Returns the first failed batch. Batches after it are not attempted.
    pub fn remove_items(
        &mut self,
        path: &PrimPath,
        store: &mut DagStore,
    ) -> Result<bool, ContextError> {
        let Some(entry) = self.entries.remove(path) else {
            return Ok(false);
        };

        let mut seen = BTreeSet::new();
        let mut leaves = Vec::new();
        let mut dependency = Vec::new();
        let mut parents = Vec::new();
        for &node in &entry.created {
            if !seen.insert(node) {
                continue;
            }
            let Some(view) = node.resolve(store) else {
                tracing::warn!(%path, ?node, health = ?HandleHealth::of(node, store), "skipping unusable node");
                continue;
            };
            if !view.node_type().is_dag() {
                dependency.push(node);
            } else if view.children().next().is_some() {
                parents.push(node);
            } else {
                leaves.push(node);
            }
        }

        self.commit(store, |m| {
            for &n in &leaves {
                m.delete_node(n);
            }
        })
        .and_then(|()| {
            self.commit(store, |m| {
                for &n in &dependency {
                    m.delete_node(n);
                }
            })
        })
        .and_then(|()| self.delete_hierarchies(store, &parents))
        .inspect_err(|err| tracing::error!(%path, %err, "failed to delete translated nodes"))?;

        tracing::debug!(%path, "entry removed");
        Ok(true)
    }

    /// Removes the entries for `paths` in order, continuing past failures.
    ///
    /// # Errors
    ///
    /// Returns the first failure after every path has been attempted.
    pub fn remove_entries(
        &mut self,
        paths: &[PrimPath],
        store: &mut DagStore,
    ) -> Result<(), ContextError> {
        let mut first = None;
        for path in paths {
            if let Err(err) = self.remove_items(path, store) {
                first.get_or_insert(err);
            }
        }
        first.map_or(Ok(()), Err)
    }

    /// Drops every entry without touching the host.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn commit(
        &self,
        store: &mut DagStore,
        record: impl FnOnce(&mut DagModifier),
    ) -> Result<(), ContextError> {
        let mut modifier = self.modifier();
        record(&mut modifier);
        if modifier.is_empty() {
            return Ok(());
        }
        modifier.do_it(store)?;
        Ok(())
    }

    fn delete_hierarchies(
        &self,
        store: &mut DagStore,
        parents: &[NodeHandle],
    ) -> Result<(), ContextError> {
        // Earlier batches may have taken some of these with them.
        let parents: Vec<NodeHandle> = parents
            .iter()
            .copied()
            .filter(|&n| n.is_valid(store))
            .collect();
        if parents.is_empty() {
            return Ok(());
        }
        let scratch = store.create_node(self.config.scratch_name, NodeType::Transform, None)?;
        let result = self.commit(store, |m| {
            for &n in &parents {
                m.reparent_node(n, Some(scratch));
            }
            m.delete_hierarchy(scratch);
        });
        if result.is_err() {
            // The batch error is the one reported.
            discard_scratch(store, scratch).ok();
        }
        result
    }

    fn modifier(&self) -> DagModifier {
        if self.config.purge_deleted {
            DagModifier::new()
        } else {
            DagModifier::undoable()
        }
    }
}

fn warn_unhealthy(path: &PrimPath, node: NodeHandle, store: &DagStore) {
    let health = HandleHealth::of(node, store);
    if health != HandleHealth::Valid {
        tracing::warn!(%path, ?node, ?health, "translated node handle is not valid");
    }
}

/// Deletes a scratch transform left behind by a failed batch.
fn discard_scratch(store: &mut DagStore, scratch: NodeHandle) -> Result<(), DagError> {
    let mut cleanup = DagModifier::new();
    cleanup.delete_node(scratch);
    cleanup.do_it(store).inspect_err(|err| {
        tracing::warn!(?scratch, %err, "scratch transform left in the host graph");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usd::MemoryStage;

    fn p(s: &str) -> PrimPath {
        PrimPath::new(s).unwrap()
    }

    struct Fixture {
        store: DagStore,
        stage: MemoryStage,
        ctx: TranslatorContext,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: DagStore::new(),
                stage: MemoryStage::new(),
                ctx: TranslatorContext::new(),
            }
        }

        /// Imports a mesh prim as transform + shape + shading engine.
        fn import_mesh(&mut self, path: &str, name: &str) -> [NodeHandle; 3] {
            let prim = self.stage.define_prim(&p(path), "Mesh");
            let xf = self.store.create_node(name, NodeType::Transform, None).unwrap();
            let shape = self
                .store
                .create_node(&alloc::format!("{name}Shape"), NodeType::Mesh, Some(xf))
                .unwrap();
            let sg = self
                .store
                .create_node(&alloc::format!("{name}SG"), NodeType::ShadingEngine, None)
                .unwrap();
            self.ctx.register_item(&prim, xf);
            for n in [xf, shape, sg] {
                self.ctx.insert_item(&prim, n);
            }
            [xf, shape, sg]
        }
    }

    #[test]
    fn register_keeps_created_nodes() {
        let mut f = Fixture::new();
        let [xf, shape, _] = f.import_mesh("/World/cube", "cube");
        let prim = f.stage.prim_at_path(&p("/World/cube")).unwrap();
        f.ctx.register_item(&prim, shape);

        let entry = f.ctx.entry(&p("/World/cube")).unwrap();
        assert_eq!(entry.primary(), shape);
        assert_eq!(entry.created().len(), 3);
        assert_eq!(entry.created()[0], xf);
        assert_eq!(entry.type_name().as_str(), "Mesh");
    }

    #[test]
    fn insert_does_not_deduplicate() {
        let mut f = Fixture::new();
        let [xf, ..] = f.import_mesh("/a", "a");
        let prim = f.stage.prim_at_path(&p("/a")).unwrap();
        f.ctx.insert_item(&prim, xf);
        assert_eq!(f.ctx.entry(&p("/a")).unwrap().created().len(), 4);
    }

    #[test]
    fn mobject_filters_by_type() {
        let mut f = Fixture::new();
        let [xf, shape, sg] = f.import_mesh("/a", "a");
        let path = p("/a");
        assert_eq!(f.ctx.mobject(&path, TypeFilter::Any, &f.store), Some(xf));
        assert_eq!(
            f.ctx.mobject(&path, TypeFilter::Type(NodeType::Mesh), &f.store),
            Some(shape)
        );
        assert_eq!(
            f.ctx
                .mobject(&path, TypeFilter::Type(NodeType::ShadingEngine), &f.store),
            Some(sg)
        );
        assert_eq!(
            f.ctx.mobject(&path, TypeFilter::Type(NodeType::Camera), &f.store),
            None
        );
        assert_eq!(f.ctx.mobject(&p("/b"), TypeFilter::Any, &f.store), None);
        assert_eq!(f.ctx.transform(&path, &f.store), Some(xf));
    }

    #[test]
    fn stale_handles_are_returned_but_reported() {
        let mut f = Fixture::new();
        let [xf, shape, _] = f.import_mesh("/a", "a");
        let mut m = DagModifier::new();
        m.delete_node(shape).delete_node(xf);
        m.do_it(&mut f.store).unwrap();

        assert_eq!(f.ctx.transform(&p("/a"), &f.store), Some(xf));
        let stale = f.ctx.validate(&f.store);
        assert_eq!(stale.len(), 3, "primary plus two created");
        assert!(stale.iter().all(|s| s.health == HandleHealth::Dead));
    }

    #[test]
    fn update_prim_types_prunes_and_refreshes() {
        let mut f = Fixture::new();
        f.import_mesh("/World/a", "a");
        f.import_mesh("/World/b", "b");
        f.stage.remove_prim(&p("/World/a"));
        f.stage.define_prim(&p("/World/b"), "Xform");

        assert_eq!(f.ctx.update_prim_types(&f.stage), 1);
        assert!(!f.ctx.has_entry(&p("/World/a")));
        assert_eq!(
            f.ctx.entry(&p("/World/b")).unwrap().type_name().as_str(),
            "Xform"
        );
    }

    #[test]
    fn remove_items_deletes_every_kind() {
        let mut f = Fixture::new();
        let nodes = f.import_mesh("/a", "a");
        let keep = f.import_mesh("/b", "b");

        assert_eq!(f.ctx.remove_items(&p("/a"), &mut f.store), Ok(true));
        assert!(!f.ctx.has_entry(&p("/a")));
        assert!(nodes.iter().all(|&n| !n.is_alive(&f.store)));
        assert!(keep.iter().all(|&n| n.is_valid(&f.store)));
        assert!(f.store.lookup("usdbridgeScratch").is_none());
        assert_eq!(f.ctx.remove_items(&p("/a"), &mut f.store), Ok(false));
    }

    #[test]
    fn remove_items_takes_foreign_children_with_the_hierarchy() {
        let mut f = Fixture::new();
        let [xf, ..] = f.import_mesh("/a", "a");
        let extra = f
            .store
            .create_node("userLocator", NodeType::Transform, Some(xf))
            .unwrap();
        f.ctx.remove_items(&p("/a"), &mut f.store).unwrap();
        assert!(!extra.is_alive(&f.store));
    }

    #[test]
    fn undoable_teardown_leaves_nodes_to_the_undo_queue() {
        let mut f = Fixture::new();
        f.ctx = TranslatorContext::with_config(ContextConfig::UNDOABLE);
        let nodes = f.import_mesh("/a", "a");
        f.ctx.remove_items(&p("/a"), &mut f.store).unwrap();
        assert!(nodes.iter().all(|&n| n.is_alive(&f.store) && !n.is_valid(&f.store)));
        f.store.flush_undo_queue();
        assert!(nodes.iter().all(|&n| !n.is_alive(&f.store)));
    }

    #[test]
    fn entries_under_lists_children_first() {
        let mut f = Fixture::new();
        f.import_mesh("/World", "w");
        f.import_mesh("/World/a", "a");
        f.import_mesh("/World/a/b", "b");
        f.import_mesh("/WorldX", "x");

        assert_eq!(
            f.ctx.entries_under(&p("/World")),
            [p("/World/a/b"), p("/World/a"), p("/World")]
        );
        assert_eq!(f.ctx.entries_under(&PrimPath::absolute_root()).len(), 4);

        let paths = f.ctx.entries_under(&p("/World/a"));
        f.ctx.remove_entries(&paths, &mut f.store).unwrap();
        assert_eq!(f.ctx.len(), 2);
    }

    #[test]
    fn discarding_scratch_reports_stale_nodes() {
        let mut store = DagStore::new();
        let scratch = store
            .create_node("usdbridgeScratch", NodeType::Transform, None)
            .unwrap();
        assert_eq!(discard_scratch(&mut store, scratch), Ok(()));
        assert!(!scratch.is_alive(&store));
        assert_eq!(
            discard_scratch(&mut store, scratch),
            Err(DagError::Stale(scratch))
        );
    }
}
