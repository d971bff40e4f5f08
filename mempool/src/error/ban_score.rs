// Copyright (c) 2023 RBB S.r.l
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

use super::{Error, MempoolConflictError, MempoolPolicyError, OrphanPoolError, TxValidationError};

/// The closed classification of rejections, driving peer-misbehavior scoring
/// and relay decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectCategory {
    /// Transaction is invalid by consensus; the sender misbehaved
    Invalid,

    /// Violates node policy only; no fault assumed
    Policy,

    /// Inputs not currently resolvable; candidate for the orphan pool
    Missing,

    /// Double-spends an in-pool transaction; reported neutrally
    Conflict,

    /// Already known, either pooled or confirmed
    Duplicate,

    /// An internal invariant failed; surfaced to the operator, not the peer
    Internal,
}

/// Ban score for transaction errors
pub trait MempoolBanScore {
    fn mempool_ban_score(&self) -> u32;
}

impl Error {
    pub fn category(&self) -> RejectCategory {
        match self {
            Error::Validity(err) => err.category(),
            Error::Policy(err) => err.category(),
            // Orphan errors may be race / out of sync conditions, allowed
            Error::Orphan(err) => err.category(),
            Error::Internal(_) => RejectCategory::Internal,
        }
    }
}

impl MempoolBanScore for Error {
    fn mempool_ban_score(&self) -> u32 {
        match self.category() {
            RejectCategory::Invalid => 100,
            RejectCategory::Policy
            | RejectCategory::Missing
            | RejectCategory::Conflict
            | RejectCategory::Duplicate
            | RejectCategory::Internal => 0,
        }
    }
}

impl TxValidationError {
    fn category(&self) -> RejectCategory {
        match self {
            // Basic transaction integrity checks failed, ban peer
            TxValidationError::NoInputs
            | TxValidationError::NoOutputs
            | TxValidationError::ExceedsMaxStandardTxSize { .. }
            | TxValidationError::DuplicateInputs
            | TxValidationError::NonCanonicalInputOrdering
            | TxValidationError::CoinbaseNotAllowed
            | TxValidationError::OutputValueOutOfRange
            | TxValidationError::InputValuesOverflow
            | TxValidationError::OutputValuesOverflow
            | TxValidationError::InputsBelowOutputs
            | TxValidationError::PrematureCoinbaseSpend { .. }
            | TxValidationError::ScriptConsensusFailure { .. } => RejectCategory::Invalid,

            // Routed to the orphan pool, the peer may know parents we don't
            TxValidationError::MissingInputs { .. } => RejectCategory::Missing,

            TxValidationError::AlreadyInMempool
            | TxValidationError::AlreadyInOrphanPool
            | TxValidationError::AlreadyConfirmed => RejectCategory::Duplicate,
        }
    }
}

impl MempoolPolicyError {
    fn category(&self) -> RejectCategory {
        match self {
            MempoolPolicyError::Conflict(err) => err.category(),

            // The peer cannot know our policy state; none of these are punished
            MempoolPolicyError::MempoolFull
            | MempoolPolicyError::InsufficientFeesToRelay { .. }
            | MempoolPolicyError::RollingFeeThresholdNotMet { .. }
            | MempoolPolicyError::DustOutput { .. }
            | MempoolPolicyError::TooManySigops { .. }
            | MempoolPolicyError::NonFinal
            | MempoolPolicyError::TooManyAncestors { .. }
            | MempoolPolicyError::AncestorSizeExceeded { .. }
            | MempoolPolicyError::TooManyDescendants { .. }
            | MempoolPolicyError::DescendantSizeExceeded { .. }
            | MempoolPolicyError::ScriptPolicyFailure { .. }
            | MempoolPolicyError::FeeOverflow
            | MempoolPolicyError::AncestorFeeUpdateOverflow
            | MempoolPolicyError::DescendantOfExpiredTransaction => RejectCategory::Policy,
        }
    }
}

impl MempoolConflictError {
    fn category(&self) -> RejectCategory {
        match self {
            MempoolConflictError::SpendsSpentOutpoint { .. } => RejectCategory::Conflict,
        }
    }
}

impl OrphanPoolError {
    fn category(&self) -> RejectCategory {
        match self {
            OrphanPoolError::TooLarge(..)
            | OrphanPoolError::Full
            | OrphanPoolError::MempoolConflict
            | OrphanPoolError::NotSupportedForLocalOrigin(_) => RejectCategory::Policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_errors_score_100() {
        let err: Error = TxValidationError::NoInputs.into();
        assert_eq!(err.category(), RejectCategory::Invalid);
        assert_eq!(err.mempool_ban_score(), 100);
    }

    #[test]
    fn missing_inputs_not_punished() {
        let err: Error = TxValidationError::MissingInputs {
            tx_id: common::primitives::Id::zero(),
            outpoint: common::chain::OutPoint::null(),
        }
        .into();
        assert_eq!(err.category(), RejectCategory::Missing);
        assert_eq!(err.mempool_ban_score(), 0);
    }

    #[test]
    fn conflicts_reported_neutrally() {
        let err: Error = MempoolConflictError::SpendsSpentOutpoint {
            conflicts: vec![common::primitives::Id::zero()],
        }
        .into();
        assert_eq!(err.category(), RejectCategory::Conflict);
        assert_eq!(err.mempool_ban_score(), 0);
    }
}
