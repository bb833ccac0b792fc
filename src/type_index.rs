use std::collections::{BTreeSet, HashMap};

use log::debug;
use parking_lot::RwLock;

use crate::TransactionId;

// Secondary index: type tag -> identifiers. Independent of the store's lock;
// each `record` is atomic on its own.
#[derive(Debug, Default)]
pub struct TypeIndex {
    ids_by_type: RwLock<HashMap<String, BTreeSet<TransactionId>>>,
}

impl TypeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, kind: &str, id: TransactionId) {
        debug!("[Transaction {id}] Indexing under type {kind:?}");

        let mut ids_by_type = self.ids_by_type.write();
        match ids_by_type.get_mut(kind) {
            Some(ids) => {
                ids.insert(id);
            }
            None => {
                ids_by_type.insert(kind.to_owned(), BTreeSet::from([id]));
            }
        }
    }

    // Never-seen types are an empty set, not an error
    pub fn ids_of_type(&self, kind: &str) -> BTreeSet<TransactionId> {
        self.ids_by_type
            .read()
            .get(kind)
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod type_index_tests {
    use googletest::prelude::*;

    use super::*;

    #[gtest]
    fn unknown_type_is_empty() {
        let index = TypeIndex::new();

        expect_that!(index.ids_of_type("type").is_empty(), is_true());
    }

    #[gtest]
    fn single_id_per_type() {
        let index = TypeIndex::new();
        index.record("type", 3);

        assert_eq!(index.ids_of_type("type"), BTreeSet::from([3]));
    }

    #[gtest]
    fn multiple_ids_per_type() {
        let index = TypeIndex::new();
        index.record("type", 4);
        index.record("type", 3);

        assert_eq!(index.ids_of_type("type"), BTreeSet::from([3, 4]));
    }

    #[gtest]
    fn repeated_pair_is_not_duplicated() {
        let index = TypeIndex::new();
        index.record("type", 3);
        index.record("type", 3);

        expect_that!(index.ids_of_type("type").len(), eq(1));
    }

    #[gtest]
    fn types_do_not_leak_into_each_other() {
        let index = TypeIndex::new();
        index.record("cars", 10);
        index.record("shopping", 11);

        assert_eq!(index.ids_of_type("cars"), BTreeSet::from([10]));
        assert_eq!(index.ids_of_type("shopping"), BTreeSet::from([11]));
        expect_that!(index.ids_of_type("Cars").is_empty(), is_true());
    }
}
