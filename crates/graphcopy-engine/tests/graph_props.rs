//! Random graph properties: single copy per original and termination

use graphcopy_engine::{CopyOperation, InitialOperation};
use graphcopy_model::{HistoryType, MemoryStore, ObjectRef, ObjectStore, TypeKind, Value};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

struct Graph {
    store: MemoryStore,
    nodes: Vec<ObjectRef>,
    children: Vec<Vec<usize>>,
    peers: Vec<Option<usize>>,
}

fn build_graph(count: usize, edges: &[(usize, usize)], peers: &[(usize, usize)]) -> Graph {
    let mut store = MemoryStore::new();
    let node = store
        .define("Node", TypeKind::Class)
        .property("label")
        .composition("children")
        .reference("peer", HistoryType::Historic)
        .build()
        .unwrap();

    let nodes: Vec<ObjectRef> = (0..count)
        .map(|i| {
            store
                .create_with(node, [("label", Value::Int(i as i64))])
                .unwrap()
        })
        .collect();

    let mut children = vec![Vec::new(); count];
    for &(from, to) in edges {
        if from < count && to < count {
            children[from].push(to);
        }
    }
    let mut peer_of = vec![None; count];
    for &(from, to) in peers {
        if from < count && to < count {
            peer_of[from] = Some(to);
        }
    }

    for i in 0..count {
        let list = Value::object_list(children[i].iter().map(|&c| nodes[c]));
        store.set(nodes[i], "children", list).unwrap();
        if let Some(p) = peer_of[i] {
            store.set(nodes[i], "peer", Value::Object(nodes[p])).unwrap();
        }
    }

    Graph {
        store,
        nodes,
        children,
        peers: peer_of,
    }
}

fn reachable(children: &[Vec<usize>], root: usize) -> HashSet<usize> {
    let mut seen = HashSet::from([root]);
    let mut stack = vec![root];
    while let Some(next) = stack.pop() {
        for &child in &children[next] {
            if seen.insert(child) {
                stack.push(child);
            }
        }
    }
    seen
}

proptest! {
    #[test]
    fn prop_each_reachable_original_copied_once(
        count in 1..12usize,
        edges in proptest::collection::vec((0..12usize, 0..12usize), 0..30),
        peers in proptest::collection::vec((0..12usize, 0..12usize), 0..12)
    ) {
        let Graph { mut store, nodes, children, peers } = build_graph(count, &edges, &peers);
        let owned = reachable(&children, 0);

        let (root_copy, copies, allocated) = {
            let mut op = InitialOperation::new(&mut store);
            let root_copy = op.copy(nodes[0]).unwrap();
            let copies: HashMap<ObjectRef, ObjectRef> =
                op.copies().map(|e| (e.original, e.copy)).collect();
            (root_copy, copies, op.stats().allocated)
        };

        prop_assert_eq!(allocated, owned.len());
        prop_assert_eq!(copies.len(), owned.len());
        prop_assert_eq!(copies.get(&nodes[0]), Some(&root_copy));
        prop_assert_eq!(store.open_preloads(), 0);

        let distinct: HashSet<_> = copies.values().collect();
        prop_assert_eq!(distinct.len(), copies.len());

        for (i, original) in nodes.iter().enumerate() {
            let Some(&copy) = copies.get(original) else {
                prop_assert!(!owned.contains(&i));
                continue;
            };
            prop_assert!(owned.contains(&i));
            prop_assert!(!nodes.contains(&copy));
            prop_assert_eq!(store.get(copy, "label").unwrap(), Value::Int(i as i64));

            let expected: Vec<ObjectRef> = children[i].iter().map(|&c| copies[&nodes[c]]).collect();
            prop_assert_eq!(store.get(copy, "children").unwrap().objects(), expected);

            let expected_peer = match peers[i] {
                Some(p) => Value::Object(copies.get(&nodes[p]).copied().unwrap_or(nodes[p])),
                None => Value::Null,
            };
            prop_assert_eq!(store.get(copy, "peer").unwrap(), expected_peer);
        }
    }
}

#[test]
fn test_self_composition() {
    let Graph {
        mut store, nodes, ..
    } = build_graph(1, &[(0, 0)], &[(0, 0)]);

    let copy = {
        let mut op = InitialOperation::new(&mut store);
        op.copy(nodes[0]).unwrap()
    };

    assert_eq!(store.get(copy, "children").unwrap().objects(), vec![copy]);
    assert_eq!(store.get(copy, "peer").unwrap(), Value::Object(copy));
}
