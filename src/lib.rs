pub mod aggregate;
pub mod parse;
pub mod replay;
pub mod service;
pub mod store;
pub mod type_index;

use parse::Amount;
use serde::{Deserialize, Serialize};

pub use service::{ServiceError, Strategy, TransactionService};
pub use store::{Forest, StoreError, TransactionStore};
pub use type_index::TypeIndex;

pub type TransactionId = u64;

// Immutable once inserted. The store owns the authoritative copy and hands
// out clones; the parent link is only ever followed through the store.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Transaction {
    pub amount: Amount,
    #[serde(rename = "type", deserialize_with = "parse::deserialize_kind")]
    pub kind: String,
    #[serde(default)]
    pub parent_id: Option<TransactionId>,
}

impl Transaction {
    pub fn new(amount: Amount, kind: impl Into<String>, parent_id: Option<TransactionId>) -> Self {
        Self {
            amount,
            kind: kind.into(),
            parent_id,
        }
    }

    pub fn root(amount: Amount, kind: impl Into<String>) -> Self {
        Self::new(amount, kind, None)
    }

    pub fn has_type(&self, kind: &str) -> bool {
        self.kind == kind
    }

    pub fn is_child_of(&self, parent_id: TransactionId) -> bool {
        self.parent_id == Some(parent_id)
    }
}
