// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coalescing and ordering of deferred adapter creation.

use proptest::prelude::*;
use usdbridge_core::dag::{DagStore, NodeHandle, NodeType};
use usdbridge_core::usd::PrimPath;
use usdbridge_hydra::delegate::RecreateQueue;

fn handles(n: usize) -> Vec<NodeHandle> {
    let mut store = DagStore::new();
    (0..n)
        .map(|i| {
            store
                .create_node(&format!("node{i}"), NodeType::Transform, None)
                .unwrap()
        })
        .collect()
}

proptest! {
    #[test]
    fn drains_each_node_once_in_first_request_order(
        requests in prop::collection::vec((0_usize..6, any::<bool>()), 0..40),
    ) {
        let nodes = handles(6);
        let mut queue = RecreateQueue::new();
        let mut expected: Vec<usize> = Vec::new();
        for &(i, stale) in &requests {
            let path = stale.then(|| PrimPath::new(&format!("/D/n{i}")).unwrap());
            let fresh = queue.request(nodes[i], path);
            prop_assert_eq!(fresh, !expected.contains(&i));
            if fresh {
                expected.push(i);
            }
        }
        prop_assert_eq!(queue.len(), expected.len());

        let mut drained = Vec::new();
        while let Some(r) = queue.pop() {
            let i = nodes.iter().position(|&n| n == r.node).unwrap();
            // A stale path survives if any request for the node carried one.
            let any_stale = requests.iter().any(|&(j, s)| j == i && s);
            prop_assert_eq!(r.stale.is_some(), any_stale);
            drained.push(i);
        }
        prop_assert_eq!(drained, expected);
        prop_assert!(queue.is_empty());
    }
}
