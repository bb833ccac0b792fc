// Property-based checks over random forests. Parents are always inserted
// before their children, and identifiers are shuffled so they say nothing
// about insertion order.
// PROPTEST_CASES overrides the default of 128 cases.

use std::collections::{BTreeSet, HashMap};

use proptest::prelude::*;
use proptest::sample::Index;
use transaction_forest::{
    Strategy as ServiceStrategy, Transaction, TransactionId, TransactionService, parse::Amount,
};

const KINDS: [&str; 4] = ["cars", "shopping", "food", "rent"];

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|cases| cases.parse().ok())
            .unwrap_or(128),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

#[derive(Clone, Debug)]
struct Node {
    // picks one of the transactions inserted before this one
    parent: Option<Index>,
    cents: u32,
    kind: usize,
}

fn arb_node() -> impl Strategy<Value = Node> {
    (
        prop::option::weighted(0.8, any::<Index>()),
        0u32..1_000_000,
        0..KINDS.len(),
    )
        .prop_map(|(parent, cents, kind)| Node { parent, cents, kind })
}

// Insert order is the order of the returned vec.
fn arb_forest() -> impl Strategy<Value = Vec<(TransactionId, Transaction)>> {
    (1usize..64)
        .prop_flat_map(|len| {
            let ids = (0..len as TransactionId).map(|n| n * 7 + 3).collect::<Vec<_>>();
            (
                Just(ids).prop_shuffle(),
                prop::collection::vec(arb_node(), len),
            )
        })
        .prop_map(|(ids, nodes)| {
            ids.iter()
                .zip(nodes)
                .enumerate()
                .map(|(position, (&id, node))| {
                    let parent_id = node
                        .parent
                        .filter(|_| position > 0)
                        .map(|index| ids[index.index(position)]);
                    let amount = Amount::new(f64::from(node.cents) / 100.0)
                        .expect("cents are finite and non-negative");
                    (id, Transaction::new(amount, KINDS[node.kind], parent_id))
                })
                .collect()
        })
}

fn both() -> [Box<dyn TransactionService + Send + Sync>; 2] {
    [
        ServiceStrategy::ReadOptimized.build(),
        ServiceStrategy::WriteOptimized.build(),
    ]
}

fn ids_of_kind(forest: &[(TransactionId, Transaction)], kind: &str) -> BTreeSet<TransactionId> {
    forest
        .iter()
        .filter(|(_, transaction)| transaction.has_type(kind))
        .map(|(id, _)| *id)
        .collect()
}

proptest! {
    #![proptest_config(config())]

    #[test]
    fn strategies_agree_after_every_insert(forest in arb_forest()) {
        let [read, write] = both();
        let parents = forest
            .iter()
            .map(|(id, transaction)| (*id, transaction.parent_id))
            .collect::<HashMap<_, _>>();
        // running sums, each amount added to every ancestor as it arrives
        let mut expected = HashMap::new();

        for (inserted, (id, transaction)) in forest.iter().enumerate() {
            prop_assert_eq!(read.add(*id, transaction.clone()), Ok(()));
            prop_assert_eq!(write.add(*id, transaction.clone()), Ok(()));

            expected.insert(*id, transaction.amount);
            let mut ancestor = transaction.parent_id;
            while let Some(ancestor_id) = ancestor {
                if let Some(sum) = expected.get_mut(&ancestor_id) {
                    *sum += transaction.amount;
                }
                ancestor = parents.get(&ancestor_id).copied().flatten();
            }

            for (seen, _) in &forest[..=inserted] {
                let sum = read.subtree_sum(*seen);
                prop_assert_eq!(sum, write.subtree_sum(*seen), "id {}", seen);
                prop_assert_eq!(sum, Ok(expected[seen]), "id {}", seen);
            }
        }
    }

    #[test]
    fn ids_by_type_matches_inserted_types(forest in arb_forest()) {
        let [read, write] = both();
        for (id, transaction) in &forest {
            prop_assert_eq!(read.add(*id, transaction.clone()), Ok(()));
            prop_assert_eq!(write.add(*id, transaction.clone()), Ok(()));
        }

        for kind in KINDS {
            let expected = ids_of_kind(&forest, kind);
            prop_assert_eq!(read.ids_by_type(kind), expected.clone());
            prop_assert_eq!(write.ids_by_type(kind), expected);
        }
        prop_assert!(read.ids_by_type("unused").is_empty());
        prop_assert!(write.ids_by_type("unused").is_empty());
    }

    #[test]
    fn ids_by_type_ignores_insertion_order(forest in arb_forest()) {
        // Breadth-first by depth is another valid order: parents still come first
        let mut depth: HashMap<TransactionId, usize> = HashMap::new();
        for (id, transaction) in &forest {
            let own = transaction
                .parent_id
                .and_then(|parent_id| depth.get(&parent_id).copied())
                .map_or(0, |parent_depth| parent_depth + 1);
            depth.insert(*id, own);
        }
        let mut reordered = forest.clone();
        reordered.sort_by_key(|(id, _)| depth[id]);

        let [original_read, original_write] = both();
        let [reordered_read, reordered_write] = both();
        for ((id, transaction), (other_id, other)) in forest.iter().zip(&reordered) {
            prop_assert_eq!(original_read.add(*id, transaction.clone()), Ok(()));
            prop_assert_eq!(original_write.add(*id, transaction.clone()), Ok(()));
            prop_assert_eq!(reordered_read.add(*other_id, other.clone()), Ok(()));
            prop_assert_eq!(reordered_write.add(*other_id, other.clone()), Ok(()));
        }

        for kind in KINDS {
            let expected = original_read.ids_by_type(kind);
            prop_assert_eq!(original_write.ids_by_type(kind), expected.clone());
            prop_assert_eq!(reordered_read.ids_by_type(kind), expected.clone());
            prop_assert_eq!(reordered_write.ids_by_type(kind), expected);
        }
    }
}
