//! Decoded block contents kept around for the commit path, so identities are
//! extracted once per block instead of once per consumer.

use serde::{Deserialize, Serialize};

/// Validation outcome of one transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxValidationCode {
    #[default]
    Valid,
    EndorsementPolicyFailure,
    MvccReadConflict,
    BadCreatorSignature,
    DuplicateTxId,
    /// Any other rejection, by wire code
    Other(i32),
}

impl TxValidationCode {
    pub fn is_valid(self) -> bool {
        self == TxValidationCode::Valid
    }
}

/// One transaction of a [`BlockCache`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionCache {
    pub index_in_block: u16,
    pub tx_id: String,
    /// Serialized identity of the submitting client
    pub creator: Vec<u8>,
    /// Serialized identities of the endorsers, in endorsement order
    pub endorsers: Vec<Vec<u8>>,
    pub validation_code: TxValidationCode,
}

impl TransactionCache {
    pub fn new(index_in_block: u16, tx_id: impl Into<String>) -> Self {
        Self {
            index_in_block,
            tx_id: tx_id.into(),
            ..Self::default()
        }
    }

    pub fn with_creator(mut self, creator: impl Into<Vec<u8>>) -> Self {
        self.creator = creator.into();
        self
    }

    pub fn with_endorser(mut self, endorser: impl Into<Vec<u8>>) -> Self {
        self.endorsers.push(endorser.into());
        self
    }

    pub fn with_validation_code(mut self, code: TxValidationCode) -> Self {
        self.validation_code = code;
        self
    }
}

/// A decoded block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockCache {
    pub number: u64,
    pub transactions: Vec<TransactionCache>,
}

impl BlockCache {
    pub fn new(number: u64) -> Self {
        Self {
            number,
            transactions: Vec::new(),
        }
    }

    pub fn push(&mut self, transaction: TransactionCache) {
        self.transactions.push(transaction);
    }

    /// Transactions that passed validation.
    pub fn valid_transactions(&self) -> impl Iterator<Item = &TransactionCache> {
        self.transactions
            .iter()
            .filter(|tx| tx.validation_code.is_valid())
    }
}
