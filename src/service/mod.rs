pub mod read_optimized;
pub mod write_optimized;

use std::{collections::BTreeSet, fmt::Display, str::FromStr};

pub use read_optimized::ReadOptimizedService;
pub use write_optimized::WriteOptimizedService;

use crate::{
    Transaction, TransactionId, aggregate::AggregateMissing, parse::Amount, store::StoreError,
};

#[derive(Copy, Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum ServiceError {
    DuplicateIdentifier(TransactionId),
    UnknownParent(TransactionId),
    NotFound(TransactionId),
    // Internal fault, never the caller's doing
    AggregateMissing(TransactionId),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::DuplicateIdentifier(id) => f.write_fmt(format_args!(
                "The transaction is invalid because the identifier: {id} is already used"
            )),
            ServiceError::UnknownParent(parent_id) => f.write_fmt(format_args!(
                "The transaction is invalid because there is not transaction with id: {parent_id} to be referenced as parent"
            )),
            ServiceError::NotFound(id) => {
                f.write_fmt(format_args!("There is no transaction with id: {id}"))
            }
            ServiceError::AggregateMissing(id) => f.write_fmt(format_args!(
                "[Transaction {id}] Internal error: ancestor has no running sum"
            )),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateIdentifier(id) => ServiceError::DuplicateIdentifier(id),
            StoreError::UnknownParent(parent_id) => ServiceError::UnknownParent(parent_id),
        }
    }
}

impl From<AggregateMissing> for ServiceError {
    fn from(AggregateMissing(id): AggregateMissing) -> Self {
        ServiceError::AggregateMissing(id)
    }
}

// The four operations callers get. Implementations are internally
// synchronized, so a single instance can be shared between threads.
pub trait TransactionService {
    fn add(&self, id: TransactionId, transaction: Transaction) -> Result<(), ServiceError>;
    fn get(&self, id: TransactionId) -> Result<Transaction, ServiceError>;
    fn ids_by_type(&self, kind: &str) -> BTreeSet<TransactionId>;
    fn subtree_sum(&self, id: TransactionId) -> Result<Amount, ServiceError>;
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Strategy {
    // Eager sums + type index
    ReadOptimized,
    // Everything computed on read
    #[default]
    WriteOptimized,
}

impl Strategy {
    pub fn build(self) -> Box<dyn TransactionService + Send + Sync> {
        match self {
            Strategy::ReadOptimized => Box::new(ReadOptimizedService::default()),
            Strategy::WriteOptimized => Box::new(WriteOptimizedService::default()),
        }
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::ReadOptimized => f.write_str("read-optimized"),
            Strategy::WriteOptimized => f.write_str("write-optimized"),
        }
    }
}

#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub struct UnknownStrategy(pub String);

impl Display for UnknownStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "Unknown strategy {:?}, expected one of: read, write",
            self.0
        ))
    }
}

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read" | "read-optimized" | "eager" => Ok(Strategy::ReadOptimized),
            "write" | "write-optimized" | "lazy" => Ok(Strategy::WriteOptimized),
            _ => Err(UnknownStrategy(s.to_owned())),
        }
    }
}
