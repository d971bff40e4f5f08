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

use std::collections::{BTreeMap, BTreeSet};

use common::chain::{OutPoint, Transaction};
use common::primitives::Id;
use logging::log;
use rand::Rng;
use utils::ensure;

use super::entry::TxEntry;
use crate::{
    config::{MempoolConfig, Time},
    error::OrphanPoolError,
    tx_origin::TxOrigin,
};

/// Upper bound on the orphan pool size regardless of configuration
pub const ORPHAN_POOL_SIZE_HARD_LIMIT: usize = 5_000;

/// Position of a transaction in the orphan arena. Ids are not stable across
/// removals: the arena swap-removes and re-maps the moved entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct InternalId(usize);

impl InternalId {
    pub const ZERO: InternalId = InternalId(0);
    pub const MAX: InternalId = InternalId(usize::MAX);

    fn new(value: usize) -> Self {
        InternalId(value)
    }

    fn get(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Default)]
struct TxOrphanPoolMaps {
    by_tx_id: BTreeMap<Id<Transaction>, InternalId>,
    by_insertion_time: BTreeSet<(Time, InternalId)>,
    by_outpoint: BTreeSet<(OutPoint, InternalId)>,
    by_origin: BTreeSet<(TxOrigin, InternalId)>,
}

impl TxOrphanPoolMaps {
    fn insert(&mut self, iid: InternalId, entry: &TxEntry) {
        self.by_tx_id.insert(*entry.tx_id(), iid);
        self.by_insertion_time.insert((entry.creation_time(), iid));
        for outpoint in entry.requires() {
            self.by_outpoint.insert((outpoint, iid));
        }
        self.by_origin.insert((entry.origin(), iid));
    }

    fn remove(&mut self, iid: InternalId, entry: &TxEntry) {
        self.by_tx_id.remove(entry.tx_id());
        self.by_insertion_time.remove(&(entry.creation_time(), iid));
        for outpoint in entry.requires() {
            self.by_outpoint.remove(&(outpoint, iid));
        }
        self.by_origin.remove(&(entry.origin(), iid));
    }
}

/// Transactions whose parents are currently unknown, indexed by the outpoints
/// they are waiting for. Scripts are never validated here; the pool only
/// caches bytes until a missing parent shows up.
///
/// Capacity eviction picks a victim uniformly at random (seeded from txid
/// hashing via the pool's RNG) so an attacker cannot predict which orphan a
/// flood will push out.
#[derive(Debug, Default)]
pub struct TxOrphanPool {
    transactions: Vec<TxEntry>,
    maps: TxOrphanPoolMaps,
}

impl TxOrphanPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn contains(&self, tx_id: &Id<Transaction>) -> bool {
        self.maps.by_tx_id.contains_key(tx_id)
    }

    pub fn get(&self, tx_id: &Id<Transaction>) -> Option<&TxEntry> {
        self.maps.by_tx_id.get(tx_id).map(|iid| self.get_at(*iid))
    }

    fn get_at(&self, iid: InternalId) -> &TxEntry {
        &self.transactions[iid.get()]
    }

    pub fn insert(&mut self, entry: TxEntry) -> Result<(), OrphanPoolError> {
        ensure!(
            self.len() < ORPHAN_POOL_SIZE_HARD_LIMIT,
            OrphanPoolError::Full
        );
        if self.contains(entry.tx_id()) {
            return Ok(());
        }

        let iid = InternalId::new(self.transactions.len());
        self.maps.insert(iid, &entry);
        self.transactions.push(entry);
        Ok(())
    }

    pub fn remove(&mut self, tx_id: Id<Transaction>) -> Option<TxEntry> {
        let iid = self.maps.by_tx_id.get(&tx_id).copied()?;
        Some(self.remove_at(iid))
    }

    fn remove_at(&mut self, iid: InternalId) -> TxEntry {
        let entry = self.transactions.swap_remove(iid.get());
        self.maps.remove(iid, &entry);

        // The entry previously at the end took over iid's slot; re-map it
        if iid.get() < self.transactions.len() {
            let old_iid = InternalId::new(self.transactions.len());
            let moved = &self.transactions[iid.get()];
            self.maps.remove(old_iid, moved);
            self.maps.insert(iid, moved);
        }
        entry
    }

    /// Orphans waiting on any of the given outpoints
    pub fn ready_children_of(
        &self,
        provides: impl Iterator<Item = OutPoint>,
    ) -> Vec<Id<Transaction>> {
        let ids: BTreeSet<Id<Transaction>> = provides
            .flat_map(|outpoint| {
                self.maps
                    .by_outpoint
                    .range((outpoint, InternalId::ZERO)..=(outpoint, InternalId::MAX))
                    .map(|(_, iid)| *self.get_at(*iid).tx_id())
            })
            .collect();
        ids.into_iter().collect()
    }

    /// Orphans that double-spend any input of the given transaction
    pub fn conflicting_with(&self, tx: &Transaction) -> Vec<Id<Transaction>> {
        let ids: BTreeSet<Id<Transaction>> = tx
            .inputs()
            .iter()
            .flat_map(|input| {
                let outpoint = *input.outpoint();
                self.maps
                    .by_outpoint
                    .range((outpoint, InternalId::ZERO)..=(outpoint, InternalId::MAX))
                    .map(|(_, iid)| *self.get_at(*iid).tx_id())
            })
            .collect();
        ids.into_iter().collect()
    }

    /// Drop entries past their expiration. Returns the number removed.
    pub fn expire(&mut self, now: Time, expiry: Time) -> usize {
        let mut removed = 0;
        loop {
            let front = self.maps.by_insertion_time.first().copied();
            let (time, iid) = match front {
                Some(front) => front,
                None => break,
            };
            if time + expiry > now {
                break;
            }
            let entry = self.remove_at(iid);
            log::trace!("Expired orphan {}", entry.tx_id());
            removed += 1;
        }
        removed
    }

    /// Evict one entry chosen uniformly at random
    pub fn evict_random(&mut self, rng: &mut impl Rng) -> Option<Id<Transaction>> {
        if self.transactions.is_empty() {
            return None;
        }
        let victim = InternalId::new(rng.gen_range(0..self.transactions.len()));
        let entry = self.remove_at(victim);
        log::debug!("Orphan pool full, evicted {}", entry.tx_id());
        Some(*entry.tx_id())
    }

    /// Evict the least recently inserted orphans of one origin until it is
    /// under its cap
    fn enforce_origin_limit(&mut self, origin: TxOrigin, max: usize) {
        loop {
            let iids: Vec<InternalId> = self
                .maps
                .by_origin
                .range((origin, InternalId::ZERO)..=(origin, InternalId::MAX))
                .map(|(_, iid)| *iid)
                .collect();
            if iids.is_empty() || iids.len() < max {
                break;
            }
            let oldest = iids
                .into_iter()
                .min_by_key(|iid| self.get_at(*iid).creation_time())
                .expect("non-empty by the check above");
            let entry = self.remove_at(oldest);
            log::debug!("Orphan cap for {origin} reached, evicted {}", entry.tx_id());
        }
    }

    /// Insert an entry, first enforcing expiry, the per-peer cap and the total
    /// capacity.
    pub fn insert_and_enforce_limits(
        &mut self,
        entry: TxEntry,
        now: Time,
        config: &MempoolConfig,
        rng: &mut impl Rng,
    ) -> Result<(), OrphanPoolError> {
        self.expire(now, config.orphan_expiry());
        if let TxOrigin::Peer(_) = entry.origin() {
            self.enforce_origin_limit(entry.origin(), config.max_orphans_per_peer());
        }
        while self.len() >= config.orphan_pool_capacity() {
            if self.evict_random(rng).is_none() {
                break;
            }
        }
        self.insert(entry)
    }

    /// Bulk removal, used on peer disconnect. Returns the number removed.
    pub fn remove_by_origin(&mut self, origin: TxOrigin) -> usize {
        let mut removed = 0;
        loop {
            let next = self
                .maps
                .by_origin
                .range((origin, InternalId::ZERO)..=(origin, InternalId::MAX))
                .next()
                .copied();
            let (_, iid) = match next {
                Some(next) => next,
                None => break,
            };
            self.remove_at(iid);
            removed += 1;
        }
        removed
    }
}

#[cfg(test)]
mod test;
