use std::collections::BTreeSet;

use log::debug;

use super::{ServiceError, TransactionService};
use crate::{
    Transaction, TransactionId, TransactionStore, TypeIndex,
    aggregate::{EagerSums, SubtreeSum},
    parse::Amount,
};

// Does the work on write: keeps a type index and running subtree sums next
// to the store, so every read is a lookup.
#[derive(Debug, Default)]
pub struct ReadOptimizedService {
    store: TransactionStore,
    types: TypeIndex,
    sums: EagerSums,
}

impl TransactionService for ReadOptimizedService {
    fn add(&self, id: TransactionId, transaction: Transaction) -> Result<(), ServiceError> {
        let kind = transaction.kind.clone();

        // Propagation runs under the store's write guard, so a child can never
        // be committed before its parent has a running sum.
        self.store
            .insert_with(id, transaction, |forest, id, transaction| {
                self.sums
                    .on_insert(forest, id, transaction)
                    .map_err(ServiceError::from)
            })?;
        self.types.record(&kind, id);

        debug!("[Transaction {id}] Added");
        Ok(())
    }

    fn get(&self, id: TransactionId) -> Result<Transaction, ServiceError> {
        self.store.lookup(id).ok_or(ServiceError::NotFound(id))
    }

    fn ids_by_type(&self, kind: &str) -> BTreeSet<TransactionId> {
        self.types.ids_of_type(kind)
    }

    fn subtree_sum(&self, id: TransactionId) -> Result<Amount, ServiceError> {
        self.sums
            .sum_of(&self.store, id)
            .ok_or(ServiceError::NotFound(id))
    }
}
