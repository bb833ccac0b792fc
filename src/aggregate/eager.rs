use std::collections::HashMap;

use log::{debug, error};
use parking_lot::Mutex;

use super::{AggregateMissing, SubtreeSum};
use crate::{Forest, Transaction, TransactionId, TransactionStore, parse::Amount};

// Read-optimized: a running subtree sum per transaction, pushed up to every
// ancestor on insert. O(depth) per write, O(1) per read.
//
// Running sums only ever grow: there is no update or delete.
#[derive(Debug, Default)]
pub struct EagerSums {
    // One lock for the whole propagation, so readers never see a chain that
    // is only partially updated.
    sums: Mutex<HashMap<TransactionId, Amount>>,
}

impl EagerSums {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SubtreeSum for EagerSums {
    fn on_insert(
        &self,
        forest: &Forest,
        id: TransactionId,
        transaction: &Transaction,
    ) -> Result<(), AggregateMissing> {
        let ancestors = forest.ancestors_of(transaction).collect::<Vec<_>>();
        let mut sums = self.sums.lock();

        // Check the whole chain before touching any of it
        if let Some(&missing) = ancestors
            .iter()
            .find(|ancestor| !sums.contains_key(ancestor))
        {
            let err = AggregateMissing(missing);
            error!("{}", err);
            return Err(err);
        }

        debug!(
            "[Transaction {id}] Propagating {} to {} ancestor(s)",
            transaction.amount,
            ancestors.len()
        );
        sums.insert(id, transaction.amount);
        for ancestor in ancestors {
            if let Some(sum) = sums.get_mut(&ancestor) {
                *sum += transaction.amount;
            }
        }

        Ok(())
    }

    fn sum_of(&self, _store: &TransactionStore, id: TransactionId) -> Option<Amount> {
        self.sums.lock().get(&id).copied()
    }
}
