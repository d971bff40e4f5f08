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

use std::time::Duration;

use common::primitives::Amount;

use crate::fee_rate::FeeRate;

pub(crate) type Time = Duration;

pub const DEFAULT_MAX_MEMPOOL_SIZE_BYTES: usize = 300_000_000;
pub const DEFAULT_MEMPOOL_EXPIRY: Duration = Duration::from_secs(336 * 60 * 60);
pub const DEFAULT_MIN_RELAY_FEE_RATE: FeeRate = FeeRate::new(Amount::from_atoms(1000));
pub const DEFAULT_INCREMENTAL_RELAY_FEE_RATE: FeeRate = FeeRate::new(Amount::from_atoms(1000));
pub const DEFAULT_ORPHAN_POOL_CAPACITY: usize = 100;
pub const DEFAULT_ORPHAN_EXPIRY: Duration = Duration::from_secs(1200);
pub const DEFAULT_MAX_ORPHANS_PER_PEER: usize = DEFAULT_ORPHAN_POOL_CAPACITY;
pub const DEFAULT_ANCESTOR_LIMIT_COUNT: usize = 50;
pub const DEFAULT_ANCESTOR_LIMIT_SIZE: usize = 101_000;
pub const DEFAULT_DESCENDANT_LIMIT_COUNT: usize = 50;
pub const DEFAULT_DESCENDANT_LIMIT_SIZE: usize = 101_000;

/// Orphans above this size are not cached at all
pub const MAX_ORPHAN_TX_SIZE: usize = 100_000;

/// Base dust amount for standard outputs, scaled by the relay fee rate
pub(crate) const DUST_THRESHOLD_BASE: i64 = 546;

pub(crate) const ROLLING_FEE_BASE_HALFLIFE: Duration = Duration::from_secs(60 * 60 * 12);
pub(crate) const ROLLING_FEE_DECAY_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MempoolMaxSize(usize);

impl MempoolMaxSize {
    pub const fn from_bytes(bytes: usize) -> Self {
        MempoolMaxSize(bytes)
    }

    pub const fn as_bytes(self) -> usize {
        self.0
    }
}

impl Default for MempoolMaxSize {
    fn default() -> Self {
        Self::from_bytes(DEFAULT_MAX_MEMPOOL_SIZE_BYTES)
    }
}

/// Mempool policy knobs. Constructed once at node start; tests tweak the
/// builders.
#[derive(Debug, Clone)]
pub struct MempoolConfig {
    max_size: MempoolMaxSize,
    max_tx_age: Duration,
    min_relay_fee_rate: FeeRate,
    incremental_relay_fee_rate: FeeRate,
    orphan_pool_capacity: usize,
    orphan_expiry: Duration,
    max_orphans_per_peer: usize,
    ancestor_limit_count: usize,
    ancestor_limit_size: usize,
    descendant_limit_count: usize,
    descendant_limit_size: usize,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        MempoolConfig {
            max_size: MempoolMaxSize::default(),
            max_tx_age: DEFAULT_MEMPOOL_EXPIRY,
            min_relay_fee_rate: DEFAULT_MIN_RELAY_FEE_RATE,
            incremental_relay_fee_rate: DEFAULT_INCREMENTAL_RELAY_FEE_RATE,
            orphan_pool_capacity: DEFAULT_ORPHAN_POOL_CAPACITY,
            orphan_expiry: DEFAULT_ORPHAN_EXPIRY,
            max_orphans_per_peer: DEFAULT_MAX_ORPHANS_PER_PEER,
            ancestor_limit_count: DEFAULT_ANCESTOR_LIMIT_COUNT,
            ancestor_limit_size: DEFAULT_ANCESTOR_LIMIT_SIZE,
            descendant_limit_count: DEFAULT_DESCENDANT_LIMIT_COUNT,
            descendant_limit_size: DEFAULT_DESCENDANT_LIMIT_SIZE,
        }
    }
}

impl MempoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_size(&self) -> MempoolMaxSize {
        self.max_size
    }

    pub fn max_tx_age(&self) -> Duration {
        self.max_tx_age
    }

    pub fn min_relay_fee_rate(&self) -> FeeRate {
        self.min_relay_fee_rate
    }

    pub fn incremental_relay_fee_rate(&self) -> FeeRate {
        self.incremental_relay_fee_rate
    }

    pub fn orphan_pool_capacity(&self) -> usize {
        self.orphan_pool_capacity
    }

    pub fn orphan_expiry(&self) -> Duration {
        self.orphan_expiry
    }

    pub fn max_orphans_per_peer(&self) -> usize {
        self.max_orphans_per_peer
    }

    pub fn ancestor_limit_count(&self) -> usize {
        self.ancestor_limit_count
    }

    pub fn ancestor_limit_size(&self) -> usize {
        self.ancestor_limit_size
    }

    pub fn descendant_limit_count(&self) -> usize {
        self.descendant_limit_count
    }

    pub fn descendant_limit_size(&self) -> usize {
        self.descendant_limit_size
    }

    pub(crate) fn set_max_size(&mut self, max_size: MempoolMaxSize) {
        self.max_size = max_size;
    }

    #[must_use]
    pub fn with_max_size(mut self, max_size: MempoolMaxSize) -> Self {
        self.max_size = max_size;
        self
    }

    #[must_use]
    pub fn with_max_tx_age(mut self, max_tx_age: Duration) -> Self {
        self.max_tx_age = max_tx_age;
        self
    }

    #[must_use]
    pub fn with_min_relay_fee_rate(mut self, rate: FeeRate) -> Self {
        self.min_relay_fee_rate = rate;
        self
    }

    #[must_use]
    pub fn with_orphan_pool_capacity(mut self, capacity: usize) -> Self {
        self.orphan_pool_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_orphan_expiry(mut self, expiry: Duration) -> Self {
        self.orphan_expiry = expiry;
        self
    }

    #[must_use]
    pub fn with_max_orphans_per_peer(mut self, max: usize) -> Self {
        self.max_orphans_per_peer = max;
        self
    }

    #[must_use]
    pub fn with_ancestor_limit_count(mut self, count: usize) -> Self {
        self.ancestor_limit_count = count;
        self
    }

    #[must_use]
    pub fn with_ancestor_limit_size(mut self, size: usize) -> Self {
        self.ancestor_limit_size = size;
        self
    }

    #[must_use]
    pub fn with_descendant_limit_count(mut self, count: usize) -> Self {
        self.descendant_limit_count = count;
        self
    }

    #[must_use]
    pub fn with_descendant_limit_size(mut self, size: usize) -> Self {
        self.descendant_limit_size = size;
        self
    }
}
