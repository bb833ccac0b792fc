pub mod eager;
pub mod lazy;

use std::fmt::Display;

pub use eager::EagerSums;
pub use lazy::LazySums;

use crate::{Forest, Transaction, TransactionId, TransactionStore, parse::Amount};

// An ancestor that should already carry a running sum doesn't. Only the eager
// strategy can produce this, and only if a child somehow got committed ahead
// of its parent's own `on_insert`.
#[derive(Copy, Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub struct AggregateMissing(pub TransactionId);

impl Display for AggregateMissing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "[Transaction {}] Ancestor has no running sum",
            self.0
        ))
    }
}

// Maintains (or derives) subtree sums: amount(id) plus the amounts of every
// transaction reachable below it through child links.
pub trait SubtreeSum {
    // Called under the store's write guard, after validation and before
    // `transaction` is committed to `forest`.
    fn on_insert(
        &self,
        forest: &Forest,
        id: TransactionId,
        transaction: &Transaction,
    ) -> Result<(), AggregateMissing>;

    // None if `id` was never inserted
    fn sum_of(&self, store: &TransactionStore, id: TransactionId) -> Option<Amount>;
}
