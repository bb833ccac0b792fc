use super::{AggregateMissing, SubtreeSum};
use crate::{Forest, Transaction, TransactionId, TransactionStore, parse::Amount};

// Write-optimized: keeps no state at all and walks the subtree on every read.
// O(1) extra per write, O(s log s) per read for a subtree of s transactions.
#[derive(Clone, Copy, Debug, Default)]
pub struct LazySums;

impl LazySums {
    // Depth-first with an explicit work-list; parent chains can be arbitrarily
    // deep and recursion would blow the stack long before the heap runs out.
    //
    // Descendants are added in commit order, starting from the node's own
    // amount. That is the order a running sum sees them in, so both give the
    // same f64 result.
    pub fn subtree_sum(forest: &Forest, id: TransactionId) -> Option<Amount> {
        let own = forest.get(id)?.amount;
        let mut descendants = vec![];
        let mut pending = forest.child_ids(id).collect::<Vec<_>>();

        while let Some(next) = pending.pop() {
            let entry = forest.sequence_of(next).zip(forest.get(next));
            if let Some((sequence, transaction)) = entry {
                descendants.push((sequence, transaction.amount));
            }
            pending.extend(forest.child_ids(next));
        }

        descendants.sort_unstable_by_key(|&(sequence, _)| sequence);
        Some(descendants.into_iter().fold(own, |total, (_, amount)| total + amount))
    }
}

impl SubtreeSum for LazySums {
    fn on_insert(
        &self,
        _forest: &Forest,
        _id: TransactionId,
        _transaction: &Transaction,
    ) -> Result<(), AggregateMissing> {
        Ok(())
    }

    // Holds the read guard for the whole walk so a concurrent insert can't
    // show up halfway through.
    fn sum_of(&self, store: &TransactionStore, id: TransactionId) -> Option<Amount> {
        let forest = store.read();
        Self::subtree_sum(&forest, id)
    }
}
