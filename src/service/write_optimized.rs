use std::collections::BTreeSet;

use log::debug;

use super::{ServiceError, TransactionService};
use crate::{
    Transaction, TransactionId, TransactionStore,
    aggregate::{LazySums, SubtreeSum},
    parse::Amount,
};

// Writes only touch the store. Type lookups scan every transaction and sums
// walk the subtree, both on each call.
#[derive(Debug, Default)]
pub struct WriteOptimizedService {
    store: TransactionStore,
    sums: LazySums,
}

impl WriteOptimizedService {
    pub fn with_store(store: TransactionStore) -> Self {
        Self {
            store,
            sums: LazySums,
        }
    }
}

impl TransactionService for WriteOptimizedService {
    fn add(&self, id: TransactionId, transaction: Transaction) -> Result<(), ServiceError> {
        self.store.insert(id, transaction)?;

        debug!("[Transaction {id}] Added");
        Ok(())
    }

    fn get(&self, id: TransactionId) -> Result<Transaction, ServiceError> {
        self.store.lookup(id).ok_or(ServiceError::NotFound(id))
    }

    fn ids_by_type(&self, kind: &str) -> BTreeSet<TransactionId> {
        self.store
            .read()
            .iter()
            .filter(|(_, transaction)| transaction.has_type(kind))
            .map(|(id, _)| id)
            .collect()
    }

    fn subtree_sum(&self, id: TransactionId) -> Result<Amount, ServiceError> {
        self.sums
            .sum_of(&self.store, id)
            .ok_or(ServiceError::NotFound(id))
    }
}
