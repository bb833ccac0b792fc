use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;

use log::{debug, warn};
use parking_lot::{RwLock, RwLockReadGuard};

use crate::{Transaction, TransactionId};

#[derive(Copy, Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    DuplicateIdentifier(TransactionId),
    UnknownParent(TransactionId),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::DuplicateIdentifier(id) => {
                f.write_fmt(format_args!("The identifier: {id} is already used"))
            }
            StoreError::UnknownParent(parent_id) => f.write_fmt(format_args!(
                "There is not transaction with id: {parent_id} to be referenced as parent"
            )),
        }
    }
}

// Every transaction ever inserted, plus a parent -> children index derived
// from the parent links. The children index is never a source of truth: it
// is only written by `insert`, in the same step as the transaction itself.
//
// No cycles: a parent has to be present before its children, and nothing is
// ever removed or re-linked.
#[derive(Debug, Default)]
pub struct Forest {
    transactions: HashMap<TransactionId, Transaction>,
    children: HashMap<TransactionId, BTreeSet<TransactionId>>,
    // Position of each transaction in commit order, starting at 0. Summing a
    // subtree in this order repeats the exact f64 additions of a running sum.
    sequence: HashMap<TransactionId, usize>,
}

impl Forest {
    pub fn get(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.get(&id)
    }

    pub fn contains(&self, id: TransactionId) -> bool {
        self.transactions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn sequence_of(&self, id: TransactionId) -> Option<usize> {
        self.sequence.get(&id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TransactionId, &Transaction)> {
        self.transactions.iter().map(|(&id, transaction)| (id, transaction))
    }

    pub fn child_ids(&self, id: TransactionId) -> impl Iterator<Item = TransactionId> {
        self.children.get(&id).into_iter().flatten().copied()
    }

    pub fn children_of(&self, id: TransactionId) -> HashMap<TransactionId, Transaction> {
        self.child_ids(id)
            .filter_map(|child_id| self.get(child_id).map(|child| (child_id, child.clone())))
            .collect()
    }

    // Walks the parent chain of `transaction`, nearest first. The
    // transaction itself does not need to be in the forest yet.
    pub fn ancestors_of<'a>(&'a self, transaction: &Transaction) -> Ancestors<'a> {
        Ancestors {
            forest: self,
            next: transaction.parent_id,
        }
    }

    fn validate(&self, id: TransactionId, transaction: &Transaction) -> Result<(), StoreError> {
        if self.contains(id) {
            return Err(StoreError::DuplicateIdentifier(id));
        }

        if let Some(parent_id) = transaction.parent_id {
            debug!("[Transaction {id}] Validating parent {parent_id}");
            if !self.contains(parent_id) {
                return Err(StoreError::UnknownParent(parent_id));
            }
        }

        Ok(())
    }

    fn commit(&mut self, id: TransactionId, transaction: Transaction) {
        if let Some(parent_id) = transaction.parent_id {
            self.children.entry(parent_id).or_default().insert(id);
        }
        // append-only, so the current size is the next free position
        self.sequence.insert(id, self.transactions.len());
        self.transactions.insert(id, transaction);
    }
}

pub struct Ancestors<'a> {
    forest: &'a Forest,
    next: Option<TransactionId>,
}

impl Iterator for Ancestors<'_> {
    type Item = TransactionId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self
            .forest
            .get(current)
            .and_then(|transaction| transaction.parent_id);
        Some(current)
    }
}

// Append-only, thread-safe owner of the forest. Validation and mutation of
// an insert happen under a single write guard, so readers see either all of
// an insert (transaction + child link) or none of it.
#[derive(Debug, Default)]
pub struct TransactionStore {
    forest: RwLock<Forest>,
}

impl TransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: TransactionId, transaction: Transaction) -> Result<(), StoreError> {
        self.insert_with(id, transaction, |_, _, _| Ok::<(), StoreError>(()))
    }

    // Like `insert`, but runs `before_commit` after validation and before the
    // transaction becomes visible, still under the write guard. If the hook
    // fails nothing is recorded. The hook must not call back into the store.
    pub fn insert_with<F, E>(
        &self,
        id: TransactionId,
        transaction: Transaction,
        before_commit: F,
    ) -> Result<(), E>
    where
        F: FnOnce(&Forest, TransactionId, &Transaction) -> Result<(), E>,
        E: From<StoreError>,
    {
        let mut forest = self.forest.write();

        if let Err(err) = forest.validate(id, &transaction) {
            warn!("{}", err);
            return Err(err.into());
        }
        before_commit(&*forest, id, &transaction)?;

        debug!("[Transaction {id}] Inserting {:?}", transaction);
        forest.commit(id, transaction);
        Ok(())
    }

    pub fn lookup(&self, id: TransactionId) -> Option<Transaction> {
        self.forest.read().get(id).cloned()
    }

    pub fn children_of(&self, id: TransactionId) -> HashMap<TransactionId, Transaction> {
        self.forest.read().children_of(id)
    }

    // Owned snapshot of every entry. Scans that only need to look use `read`
    // and skip the copy.
    pub fn all(&self) -> HashMap<TransactionId, Transaction> {
        self.forest.read().transactions.clone()
    }

    pub fn len(&self) -> usize {
        self.forest.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.forest.read().is_empty()
    }

    // Consistent view for multi-step reads (e.g. a subtree walk). Inserts
    // block until the guard is dropped.
    pub fn read(&self) -> RwLockReadGuard<'_, Forest> {
        self.forest.read()
    }
}
