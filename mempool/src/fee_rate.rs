// Copyright (c) 2021-2022 RBB S.r.l
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

use std::num::NonZeroUsize;

use common::primitives::Amount;

use crate::error::MempoolPolicyError;

/// Fee rate in satoshi per 1000 bytes, integer arithmetic throughout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FeeRate {
    amount_per_kb: Amount,
}

impl FeeRate {
    pub const fn new(amount_per_kb: Amount) -> Self {
        Self { amount_per_kb }
    }

    pub fn from_total_tx_fee(
        total_tx_fee: Amount,
        tx_size: NonZeroUsize,
    ) -> Result<Self, MempoolPolicyError> {
        let tx_size =
            i64::try_from(usize::from(tx_size)).map_err(|_| MempoolPolicyError::FeeOverflow)?;
        let amount_per_kb = ((total_tx_fee * 1000).ok_or(MempoolPolicyError::FeeOverflow)?
            / tx_size)
            .expect("tx_size is non-zero");
        Ok(Self { amount_per_kb })
    }

    /// Fee required for a transaction of the given size, rounded up
    pub fn compute_fee(&self, size: usize) -> Result<Amount, MempoolPolicyError> {
        let size = i64::try_from(size).map_err(|_| MempoolPolicyError::FeeOverflow)?;
        let fee = (self.amount_per_kb * size).ok_or(MempoolPolicyError::FeeOverflow)?;
        // +999 for the ceiling
        let fee = ((fee + Amount::from_atoms(999)).ok_or(MempoolPolicyError::FeeOverflow)? / 1000)
            .expect("division by non-zero");
        Ok(fee)
    }

    pub const fn atoms_per_kb(&self) -> i64 {
        self.amount_per_kb.into_atoms()
    }
}

impl std::ops::Add for FeeRate {
    type Output = Option<Self>;

    fn add(self, other: Self) -> Self::Output {
        (self.amount_per_kb + other.amount_per_kb).map(|amount_per_kb| FeeRate { amount_per_kb })
    }
}
