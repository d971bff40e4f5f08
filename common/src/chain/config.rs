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

use crate::chain::script::ScriptFlags;
use crate::primitives::{Amount, BlockHeight};

/// Total money supply cap, in satoshi
pub const MAX_MONEY: Amount = Amount::from_atoms(21_000_000 * 100_000_000);

/// Number of confirmations before a coinbase output may be spent
pub const COINBASE_MATURITY: i64 = 100;

/// Chain-level consensus and standardness parameters.
///
/// Upgrade activation heights are parameters rather than constants so tests
/// and alternative networks can move them around.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    coinbase_maturity: i64,
    max_standard_tx_size: usize,
    max_tx_sigops: u64,
    canonical_input_ordering_height: BlockHeight,
    accurate_sigops_height: BlockHeight,
}

impl ChainConfig {
    pub fn coinbase_maturity(&self) -> i64 {
        self.coinbase_maturity
    }

    pub fn max_standard_tx_size(&self) -> usize {
        self.max_standard_tx_size
    }

    pub fn max_tx_sigops(&self) -> u64 {
        self.max_tx_sigops
    }

    /// Whether inputs must be sorted lexicographically by previous outpoint at
    /// the given evaluation height
    pub fn enforce_canonical_input_ordering(&self, height: BlockHeight) -> bool {
        height >= self.canonical_input_ordering_height
    }

    /// Whether multisig sigops are counted accurately at the given height
    pub fn sigops_counting_accurate(&self, height: BlockHeight) -> bool {
        height >= self.accurate_sigops_height
    }

    /// Flags whose failure indicates a consensus-invalid transaction
    pub fn mandatory_script_flags(&self, _height: BlockHeight) -> ScriptFlags {
        ScriptFlags::VERIFY_P2SH
            | ScriptFlags::VERIFY_STRICTENC
            | ScriptFlags::VERIFY_LOW_S
            | ScriptFlags::VERIFY_SIGHASH_FORKID
    }

    /// Flags applied on first verification; failure under these but success
    /// under the mandatory set is a policy rejection only
    pub fn standard_script_flags(&self, height: BlockHeight) -> ScriptFlags {
        self.mandatory_script_flags(height)
            | ScriptFlags::VERIFY_DERSIG
            | ScriptFlags::VERIFY_NULLDUMMY
            | ScriptFlags::VERIFY_MINIMALDATA
            | ScriptFlags::VERIFY_DISCOURAGE_UPGRADABLE_NOPS
            | ScriptFlags::VERIFY_CLEANSTACK
            | ScriptFlags::VERIFY_CHECKLOCKTIMEVERIFY
            | ScriptFlags::VERIFY_CHECKSEQUENCEVERIFY
    }

    #[must_use]
    pub fn with_coinbase_maturity(mut self, maturity: i64) -> Self {
        self.coinbase_maturity = maturity;
        self
    }

    #[must_use]
    pub fn with_canonical_input_ordering_height(mut self, height: BlockHeight) -> Self {
        self.canonical_input_ordering_height = height;
        self
    }

    #[must_use]
    pub fn with_accurate_sigops_height(mut self, height: BlockHeight) -> Self {
        self.accurate_sigops_height = height;
        self
    }
}

pub fn create_mainnet() -> ChainConfig {
    ChainConfig {
        coinbase_maturity: COINBASE_MATURITY,
        max_standard_tx_size: 100_000,
        max_tx_sigops: 20_000,
        // Both activated by the Nov 2018 upgrade
        canonical_input_ordering_height: BlockHeight::new(556_767),
        accurate_sigops_height: BlockHeight::new(556_767),
    }
}

/// A configuration with all upgrades active from genesis, for tests
pub fn create_unit_test_config() -> ChainConfig {
    ChainConfig {
        coinbase_maturity: COINBASE_MATURITY,
        max_standard_tx_size: 100_000,
        max_tx_sigops: 20_000,
        canonical_input_ordering_height: BlockHeight::zero(),
        accurate_sigops_height: BlockHeight::zero(),
    }
}
