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

use common::{chain::Transaction, primitives::Amount};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxAccumulatorError {
    #[error("Fee accumulation overflow")]
    FeeAccumulationOverflow,
}

/// Consumer of the mining-order iteration, e.g. a block template builder.
/// Transactions arrive parents-first.
pub trait TransactionAccumulator {
    /// Add a transaction to the accumulator and its fee to the total
    fn add_tx(&mut self, tx: Transaction, tx_fee: Amount) -> Result<(), TxAccumulatorError>;

    fn done(&self) -> bool;

    fn transactions(&self) -> &Vec<Transaction>;

    fn total_fees(&self) -> Amount;
}

/// Accumulates transactions until a target total size is reached
pub struct DefaultTxAccumulator {
    txs: Vec<Transaction>,
    total_size: usize,
    target_size: usize,
    total_fees: Amount,
    done: bool,
}

impl DefaultTxAccumulator {
    pub fn new(target_size: usize) -> Self {
        Self {
            txs: Vec::new(),
            total_size: 0,
            target_size,
            total_fees: Amount::ZERO,
            done: false,
        }
    }

    pub fn total_size(&self) -> usize {
        self.total_size
    }
}

impl TransactionAccumulator for DefaultTxAccumulator {
    fn add_tx(&mut self, tx: Transaction, tx_fee: Amount) -> Result<(), TxAccumulatorError> {
        let tx_size = tx.encoded_size();
        if self.total_size + tx_size <= self.target_size {
            self.total_fees =
                (self.total_fees + tx_fee).ok_or(TxAccumulatorError::FeeAccumulationOverflow)?;
            self.total_size += tx_size;
            self.txs.push(tx);
        } else {
            self.done = true
        }
        Ok(())
    }

    fn done(&self) -> bool {
        self.done
    }

    fn transactions(&self) -> &Vec<Transaction> {
        &self.txs
    }

    fn total_fees(&self) -> Amount {
        self.total_fees
    }
}
