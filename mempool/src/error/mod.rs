// Copyright (c) 2022 RBB S.r.l
// opensource@mintlayer.org
// SPDX-License-Identifier: MIT
// Licensed under the MIT License;
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://github.com/mintlayer/mintlayer-core/blob/master/LICENSE
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod ban_score;

use thiserror::Error;

use common::{
    chain::{OutPoint, Transaction},
    primitives::{Amount, Id},
};

use crate::tx_origin::LocalTxOrigin;

pub use ban_score::{MempoolBanScore, RejectCategory};

/// Error reported by the external script interpreter. Opaque to the mempool;
/// only the flag set it failed under matters for classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ScriptError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Validity(#[from] TxValidationError),

    #[error(transparent)]
    Policy(#[from] MempoolPolicyError),

    #[error("Orphan pool error: {0}")]
    Orphan(#[from] OrphanPoolError),

    #[error("Internal mempool error: {0}")]
    Internal(String),
}

impl From<MempoolConflictError> for Error {
    fn from(e: MempoolConflictError) -> Self {
        Error::Policy(e.into())
    }
}

/// Rejections decided against chain state or the structure of the transaction
/// itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxValidationError {
    #[error("Transaction has no inputs")]
    NoInputs,

    #[error("Transaction has no outputs")]
    NoOutputs,

    #[error("Transaction size {size} exceeds the maximum standard size {max}")]
    ExceedsMaxStandardTxSize { size: usize, max: usize },

    #[error("Transaction has duplicate inputs")]
    DuplicateInputs,

    #[error("Transaction inputs are not in canonical order")]
    NonCanonicalInputOrdering,

    #[error("Coinbase transactions cannot enter the mempool")]
    CoinbaseNotAllowed,

    #[error("Transaction output value out of range")]
    OutputValueOutOfRange,

    #[error("Sum of input values overflows")]
    InputValuesOverflow,

    #[error("Sum of output values overflows")]
    OutputValuesOverflow,

    #[error("Total input value is below total output value")]
    InputsBelowOutputs,

    #[error("Transaction {tx_id} references missing output {outpoint:?}")]
    MissingInputs {
        tx_id: Id<Transaction>,
        outpoint: OutPoint,
    },

    #[error("Transaction is already in the mempool")]
    AlreadyInMempool,

    #[error("Transaction is already in the orphan pool")]
    AlreadyInOrphanPool,

    #[error("Transaction is already confirmed")]
    AlreadyConfirmed,

    #[error("Input {input_index} spends an immature coinbase output")]
    PrematureCoinbaseSpend { input_index: usize },

    #[error("Script for input {input_index} failed mandatory verification: {error}")]
    ScriptConsensusFailure {
        input_index: usize,
        error: ScriptError,
    },
}

/// Rejections under node policy; the transaction may well be valid by
/// consensus.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MempoolPolicyError {
    #[error(transparent)]
    Conflict(#[from] MempoolConflictError),

    #[error("Mempool is full")]
    MempoolFull,

    #[error("Transaction does not pay sufficient fees to be relayed (tx_fee: {tx_fee}, min_relay_fee: {min_relay_fee})")]
    InsufficientFeesToRelay {
        tx_fee: Amount,
        min_relay_fee: Amount,
    },

    #[error("Rolling fee threshold not met (fee is {tx_fee}, minimum {minimum_fee})")]
    RollingFeeThresholdNotMet { minimum_fee: Amount, tx_fee: Amount },

    #[error("Output {index} is dust (value {value} below {threshold})")]
    DustOutput {
        index: usize,
        value: Amount,
        threshold: Amount,
    },

    #[error("Transaction has {count} sigops, above the limit of {max}")]
    TooManySigops { count: u64, max: u64 },

    #[error("Transaction is not final")]
    NonFinal,

    #[error("Transaction would have {count} in-mempool ancestors, above the limit of {max}")]
    TooManyAncestors { count: usize, max: usize },

    #[error("Package size with ancestors {size} exceeds the limit of {max}")]
    AncestorSizeExceeded { size: usize, max: usize },

    #[error("An ancestor would have {count} in-mempool descendants, above the limit of {max}")]
    TooManyDescendants { count: usize, max: usize },

    #[error("An ancestor's package size with descendants {size} exceeds the limit of {max}")]
    DescendantSizeExceeded { size: usize, max: usize },

    #[error("Script for input {input_index} failed standard verification: {error}")]
    ScriptPolicyFailure {
        input_index: usize,
        error: ScriptError,
    },

    #[error("Fee computation overflow")]
    FeeOverflow,

    #[error("Overflow while updating ancestor fees")]
    AncestorFeeUpdateOverflow,

    #[error("Transaction is a descendant of an expired transaction")]
    DescendantOfExpiredTransaction,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MempoolConflictError {
    #[error("Transaction double-spends outputs claimed by {} in-pool transaction(s)", .conflicts.len())]
    SpendsSpentOutpoint { conflicts: Vec<Id<Transaction>> },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrphanPoolError {
    #[error("Transaction of size {0} too large for the orphan pool (max {1})")]
    TooLarge(usize, usize),

    #[error("Orphan pool full")]
    Full,

    #[error("Conflicts with an in-pool transaction")]
    MempoolConflict,

    #[error("Orphans not supported for transactions originating at {0}")]
    NotSupportedForLocalOrigin(LocalTxOrigin),
}
