// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Translator context round trip, pruning, and teardown.

use std::collections::BTreeMap;

use proptest::prelude::*;
use usdbridge_core::dag::{DagStore, NodeHandle, NodeType};
use usdbridge_core::translator::{ProxyShape, TranslatorContext, TypeFilter};
use usdbridge_core::usd::{MemoryStage, PrimPath, Stage};

type Snapshot = BTreeMap<String, (String, Option<String>, Vec<String>)>;

fn snapshot(ctx: &TranslatorContext, store: &DagStore) -> Snapshot {
    ctx.paths()
        .map(|path| {
            let entry = ctx.entry(path).unwrap();
            let name = |n: NodeHandle| store.name(n).map(String::from);
            (
                path.to_string(),
                (
                    entry.type_name().to_string(),
                    name(entry.primary()),
                    entry.created().iter().filter_map(|&n| name(n)).collect(),
                ),
            )
        })
        .collect()
}

/// Translates `count` prims, each into a transform, a shape under it, and
/// `extra` shading nodes.
fn populate(
    store: &mut DagStore,
    stage: &mut MemoryStage,
    ctx: &mut TranslatorContext,
    count: usize,
    extra: usize,
) {
    for i in 0..count {
        let path = PrimPath::new(&format!("/World/prim{i}")).unwrap();
        let prim = stage.define_prim(&path, if i % 2 == 0 { "Mesh" } else { "Xform" });
        let xf = store
            .create_node(&format!("prim{i}"), NodeType::Transform, None)
            .unwrap();
        let shape = store
            .create_node(&format!("prim{i}Shape"), NodeType::Mesh, Some(xf))
            .unwrap();
        ctx.register_item(&prim, xf);
        ctx.insert_item(&prim, xf);
        ctx.insert_item(&prim, shape);
        for k in 0..extra {
            let sg = store
                .create_node(&format!("prim{i}SG{k}"), NodeType::ShadingEngine, None)
                .unwrap();
            ctx.insert_item(&prim, sg);
        }
    }
}

proptest! {
    #[test]
    fn serialise_round_trip(count in 0_usize..8, extra in 0_usize..4) {
        let mut store = DagStore::new();
        let mut stage = MemoryStage::new();
        let mut ctx = TranslatorContext::new();
        populate(&mut store, &mut stage, &mut ctx, count, extra);

        let text = ctx.serialise(&store).unwrap();
        let mut loaded = TranslatorContext::new();
        prop_assert_eq!(loaded.deserialise(&text, &store).unwrap(), count);
        prop_assert_eq!(snapshot(&loaded, &store), snapshot(&ctx, &store));
    }
}

#[test]
fn pruning_drops_entries_for_removed_prims() {
    let mut store = DagStore::new();
    let mut stage = MemoryStage::new();
    let mut ctx = TranslatorContext::new();
    populate(&mut store, &mut stage, &mut ctx, 3, 0);

    let gone = PrimPath::new("/World/prim1").unwrap();
    stage.remove_prim(&gone);
    assert!(!stage.has_prim(&gone));
    assert_eq!(ctx.update_prim_types(&stage), 1);
    assert!(!ctx.has_entry(&gone));
    assert_eq!(ctx.len(), 2);
}

#[test]
fn teardown_leaves_no_entry_and_no_alive_nodes() {
    let mut store = DagStore::new();
    let mut stage = MemoryStage::new();
    let mut ctx = TranslatorContext::new();
    populate(&mut store, &mut stage, &mut ctx, 2, 2);

    let path = PrimPath::new("/World/prim0").unwrap();
    let created: Vec<NodeHandle> = ctx.entry(&path).unwrap().created().to_vec();
    assert!(created.iter().any(|&n| store.child_count(n) > 0));
    assert!(created.iter().any(|&n| store.is_dag(n) == Some(false)));

    assert_eq!(ctx.remove_items(&path, &mut store), Ok(true));
    assert!(!ctx.has_entry(&path));
    assert!(created.iter().all(|&n| !n.is_alive(&store)));

    let other = PrimPath::new("/World/prim1").unwrap();
    let shape = ctx
        .mobject(&other, TypeFilter::Type(NodeType::Mesh), &store)
        .unwrap();
    assert!(shape.is_valid(&store));
}

#[test]
fn proxy_persists_across_reload() {
    let mut store = DagStore::new();
    let proxy_node = store
        .create_node("stageProxyShape", NodeType::Dependency, None)
        .unwrap();
    let mut proxy = ProxyShape::new(proxy_node, MemoryStage::new(), TranslatorContext::new());
    {
        let mut stage = proxy.usd_stage().clone();
        let mut ctx = TranslatorContext::new();
        populate(&mut store, &mut stage, &mut ctx, 4, 1);
        *proxy.usd_stage_mut() = stage;
        *proxy.context_mut() = ctx;
    }
    let before = snapshot(proxy.context(), &store);
    proxy.save(&mut store).unwrap();

    let mut reloaded = ProxyShape::new(
        proxy_node,
        proxy.usd_stage().clone(),
        TranslatorContext::new(),
    );
    assert_eq!(reloaded.load(&store).unwrap(), 4);
    assert_eq!(snapshot(reloaded.context(), &store), before);
}

#[test]
fn separator_in_node_names_survives_reload() {
    let mut store = DagStore::new();
    let mut stage = MemoryStage::new();
    let b = store.create_node("b", NodeType::Transform, None).unwrap();
    let ab = store.create_node("a|b", NodeType::Transform, None).unwrap();
    assert_ne!(store.name(ab), Some("a|b"));

    let path = PrimPath::new("/x").unwrap();
    let prim = stage.define_prim(&path, "Xform");
    let mut ctx = TranslatorContext::new();
    ctx.register_item(&prim, ab);

    let text = ctx.serialise(&store).unwrap();
    let mut loaded = TranslatorContext::new();
    assert_eq!(loaded.deserialise(&text, &store).unwrap(), 1);
    let primary = loaded.entry(&path).unwrap().primary();
    assert_eq!(primary, ab);
    assert_ne!(primary, b);
}
