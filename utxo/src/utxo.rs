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

use common::{chain::TxOutput, primitives::BlockHeight};

use crate::Error;

/// Determines whether the utxo belongs to the blockchain or to the mempool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtxoSource {
    /// Height at which the containing tx was included in the active chain
    Blockchain(BlockHeight),
    Mempool,
}

impl UtxoSource {
    pub fn is_mempool(&self) -> bool {
        match self {
            UtxoSource::Blockchain(_) => false,
            UtxoSource::Mempool => true,
        }
    }

    pub fn blockchain_height(&self) -> Result<BlockHeight, Error> {
        match self {
            UtxoSource::Blockchain(h) => Ok(*h),
            UtxoSource::Mempool => Err(Error::NoBlockchainHeightFound),
        }
    }
}

/// The unspent transaction output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utxo {
    output: TxOutput,
    is_coinbase: bool,
    source: UtxoSource,
}

impl Utxo {
    pub fn new(output: TxOutput, is_coinbase: bool, source: UtxoSource) -> Self {
        Self {
            output,
            is_coinbase,
            source,
        }
    }

    pub fn new_for_blockchain(output: TxOutput, is_coinbase: bool, height: BlockHeight) -> Self {
        Self {
            output,
            is_coinbase,
            source: UtxoSource::Blockchain(height),
        }
    }

    pub fn new_for_mempool(output: TxOutput) -> Self {
        Self {
            output,
            is_coinbase: false,
            source: UtxoSource::Mempool,
        }
    }

    pub fn is_coinbase(&self) -> bool {
        self.is_coinbase
    }

    pub fn source(&self) -> &UtxoSource {
        &self.source
    }

    pub fn output(&self) -> &TxOutput {
        &self.output
    }

    pub fn into_output(self) -> TxOutput {
        self.output
    }
}
