// Copyright (c) 2022-2023 RBB S.r.l
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

use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    num::NonZeroUsize,
    sync::Arc,
};

use parking_lot::RwLock;
use rand::{rngs::StdRng, SeedableRng};

use common::{
    chain::{ChainConfig, OutPoint, Transaction},
    primitives::{Amount, Id},
    time_getter::TimeGetter,
};
use logging::log;
use utils::{ensure, eventhandler::EventsController, tap_error_log::LogError};
use utxo::Utxo;

pub use self::{
    entry::{TxEntry, TxEntryWithFee},
    memory_usage_estimator::{MemoryUsageEstimator, StoreMemoryUsageEstimator},
    orphans::TxOrphanPool,
    store::{MempoolRemovalReason, MempoolStore, TxMempoolEntry},
    tx_verifier::{NoopScriptVerifier, ScriptVerifier},
};

use self::{rolling_fee_rate::RollingFeeRate, tx_verifier::MempoolUtxoView};
use crate::{
    chain_view::ChainView,
    config::{MempoolConfig, MempoolMaxSize, Time, MAX_ORPHAN_TX_SIZE, ROLLING_FEE_BASE_HALFLIFE, ROLLING_FEE_DECAY_INTERVAL},
    error::{Error, MempoolConflictError, MempoolPolicyError, OrphanPoolError, TxValidationError},
    event::MempoolEvent,
    fee_rate::FeeRate,
    tx_accumulator::TransactionAccumulator,
    tx_origin::{PeerId, TxOrigin},
};

pub mod entry;
pub mod memory_usage_estimator;
pub mod orphans;
mod reorg;
mod rolling_fee_rate;
pub mod store;
pub mod tx_verifier;

#[cfg(test)]
mod tests;

/// Where an accepted transaction ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    InMempool,
    InOrphanPool,
}

/// A candidate that passed the non-script pipeline stages
pub(crate) struct ValidatedTransaction {
    pub(crate) entry: TxEntryWithFee,
    pub(crate) spent_utxos: Vec<Utxo>,
}

/// Result of the non-script pipeline stages
pub(crate) enum PolicyOutcome {
    Valid(ValidatedTransaction),
    Orphan { entry: TxEntry },
}

pub struct Mempool<C, S, M> {
    chain_config: Arc<ChainConfig>,
    config: MempoolConfig,
    store: MempoolStore,
    rolling_fee_rate: RwLock<RollingFeeRate>,
    chain_view: C,
    script_verifier: Arc<S>,
    clock: TimeGetter,
    memory_usage_estimator: M,
    orphans: TxOrphanPool,
    orphan_rng: StdRng,
    fee_deltas: BTreeMap<Id<Transaction>, Amount>,
    events_controller: EventsController<MempoolEvent>,
}

impl<C, S, M> std::fmt::Debug for Mempool<C, S, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.store)
    }
}

fn saturating_add(a: Amount, b: Amount) -> Amount {
    Amount::from_atoms(a.into_atoms().saturating_add(b.into_atoms()))
}

// Construction and queries
impl<C, S, M> Mempool<C, S, M> {
    pub fn new(
        chain_config: Arc<ChainConfig>,
        config: MempoolConfig,
        chain_view: C,
        script_verifier: Arc<S>,
        clock: TimeGetter,
        memory_usage_estimator: M,
    ) -> Self {
        log::trace!("Creating mempool object");
        Self {
            chain_config,
            config,
            store: MempoolStore::new(),
            rolling_fee_rate: RwLock::new(RollingFeeRate::new(clock.get_time())),
            chain_view,
            script_verifier,
            clock,
            memory_usage_estimator,
            orphans: TxOrphanPool::new(),
            orphan_rng: StdRng::from_entropy(),
            fee_deltas: BTreeMap::new(),
            events_controller: EventsController::new(),
        }
    }

    pub fn chain_config(&self) -> &ChainConfig {
        &self.chain_config
    }

    pub fn config(&self) -> &MempoolConfig {
        &self.config
    }

    pub fn clock(&self) -> &TimeGetter {
        &self.clock
    }

    pub(crate) fn script_verifier(&self) -> &Arc<S> {
        &self.script_verifier
    }

    pub fn contains_transaction(&self, tx_id: &Id<Transaction>) -> bool {
        self.store.contains(tx_id)
    }

    pub fn transaction(&self, tx_id: &Id<Transaction>) -> Option<&Transaction> {
        self.store.get_entry(tx_id).map(TxMempoolEntry::transaction)
    }

    pub fn entry(&self, tx_id: &Id<Transaction>) -> Option<&TxMempoolEntry> {
        self.store.get_entry(tx_id)
    }

    pub fn contains_orphan_transaction(&self, tx_id: &Id<Transaction>) -> bool {
        self.orphans.contains(tx_id)
    }

    pub fn orphan_transaction(&self, tx_id: &Id<Transaction>) -> Option<&Transaction> {
        self.orphans.get(tx_id).map(TxEntry::transaction)
    }

    /// Known either as pooled or as an orphan
    pub fn have_transaction(&self, tx_id: &Id<Transaction>) -> bool {
        self.contains_transaction(tx_id) || self.contains_orphan_transaction(tx_id)
    }

    /// The pooled transaction spending the given outpoint, if any
    pub fn spent_by(&self, outpoint: &OutPoint) -> Option<Id<Transaction>> {
        self.store.find_conflicting_tx(outpoint)
    }

    pub fn transaction_count(&self) -> usize {
        self.store.len()
    }

    pub fn orphan_count(&self) -> usize {
        self.orphans.len()
    }

    /// All pooled transactions, highest descendant package score first
    pub fn get_all(&self) -> Vec<Transaction> {
        self.store
            .ids_by_descendant_score_desc()
            .into_iter()
            .map(|id| self.store.get_entry(&id).expect("indexed entry").transaction().clone())
            .collect()
    }

    pub fn subscribe_to_events(&mut self, handler: Arc<dyn Fn(MempoolEvent) + Send + Sync>) {
        self.events_controller.subscribe_to_events(handler)
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &MempoolStore {
        &self.store
    }
}

// Rolling fee
impl<C, S, M: MemoryUsageEstimator> Mempool<C, S, M> {
    pub fn memory_usage(&self) -> usize {
        self.memory_usage_estimator.estimate_memory_usage(&self.store)
    }

    fn rolling_fee_halflife(&self) -> Time {
        let mem_usage = self.memory_usage();
        if mem_usage < self.config.max_size().as_bytes() / 4 {
            ROLLING_FEE_BASE_HALFLIFE / 4
        } else if mem_usage < self.config.max_size().as_bytes() / 2 {
            ROLLING_FEE_BASE_HALFLIFE / 2
        } else {
            ROLLING_FEE_BASE_HALFLIFE
        }
    }

    fn update_min_fee_rate(&self, rate: FeeRate) {
        let mut rolling_fee_rate = self.rolling_fee_rate.write();
        rolling_fee_rate.set_rolling_minimum_fee_rate(rate);
        rolling_fee_rate.set_block_since_last_rolling_fee_bump(false);
    }

    pub(crate) fn get_update_min_fee_rate(&self) -> FeeRate {
        let rolling_fee_rate = *self.rolling_fee_rate.read();
        if !rolling_fee_rate.block_since_last_rolling_fee_bump()
            || rolling_fee_rate.rolling_minimum_fee_rate() == FeeRate::new(Amount::from_atoms(0))
        {
            return rolling_fee_rate.rolling_minimum_fee_rate();
        } else if self.clock.get_time()
            > rolling_fee_rate.last_rolling_fee_update() + ROLLING_FEE_DECAY_INTERVAL
        {
            self.decay_rolling_fee_rate();
            log::debug!(
                "rolling fee rate after decay: {:?}",
                self.rolling_fee_rate.read(),
            );

            let incremental = self.config.incremental_relay_fee_rate();
            let threshold = FeeRate::new(Amount::from_atoms(incremental.atoms_per_kb() / 2));
            if self.rolling_fee_rate.read().rolling_minimum_fee_rate() < threshold {
                log::trace!("rolling fee rate dropped below half of the incremental relay fee, zeroing");
                self.drop_rolling_fee();
                return self.rolling_fee_rate.read().rolling_minimum_fee_rate();
            }
        }

        std::cmp::max(
            self.rolling_fee_rate.read().rolling_minimum_fee_rate(),
            self.config.incremental_relay_fee_rate(),
        )
    }

    fn drop_rolling_fee(&self) {
        self.rolling_fee_rate.write().set_rolling_minimum_fee_rate(FeeRate::new(Amount::from_atoms(0)))
    }

    fn decay_rolling_fee_rate(&self) {
        let halflife = self.rolling_fee_halflife();
        let time = self.clock.get_time();
        let mut rolling_fee_rate = self.rolling_fee_rate.write();
        *rolling_fee_rate = rolling_fee_rate.decay_fee(halflife, time);
    }

    #[cfg(test)]
    pub(crate) fn rolling_minimum_fee_rate(&self) -> FeeRate {
        self.rolling_fee_rate.read().rolling_minimum_fee_rate()
    }
}

// Transaction validation
impl<C: ChainView, S: ScriptVerifier, M: MemoryUsageEstimator> Mempool<C, S, M> {
    /// Pipeline stages 1-9: everything except script verification
    pub(crate) fn validate_transaction_policy(
        &self,
        entry: &TxEntry,
    ) -> Result<PolicyOutcome, Error> {
        let tip_height = self.chain_view.tip_height();
        let evaluation_height = tip_height.next_height();

        tx_verifier::check_structure(&self.chain_config, entry, evaluation_height)?;

        ensure!(
            !self.store.contains(entry.tx_id()),
            TxValidationError::AlreadyInMempool
        );
        ensure!(
            !self.orphans.contains(entry.tx_id()),
            TxValidationError::AlreadyInOrphanPool
        );
        let confirmed = entry.provides().any(|outpoint| self.chain_view.utxo(&outpoint).is_some());
        ensure!(!confirmed, TxValidationError::AlreadyConfirmed);

        let tx = entry.transaction();
        let view = MempoolUtxoView::new(&self.chain_view, &self.store);
        let resolved = match tx_verifier::resolve_inputs(
            view,
            tx,
            tip_height,
            self.chain_config.coinbase_maturity(),
        ) {
            Ok(resolved) => resolved,
            Err(err @ TxValidationError::MissingInputs { .. }) => {
                log::debug!("Transaction {}: {err}", entry.tx_id());
                self.check_orphan_pool_policy(entry)?;
                return Ok(PolicyOutcome::Orphan {
                    entry: entry.clone(),
                });
            }
            Err(err) => return Err(err.into()),
        };

        let conflicts: Vec<_> =
            entry.requires().filter_map(|op| self.store.find_conflicting_tx(&op)).collect();
        ensure!(
            conflicts.is_empty(),
            Error::from(MempoolConflictError::SpendsSpentOutpoint { conflicts })
        );

        let fee_delta = self.fee_deltas.get(entry.tx_id()).copied().unwrap_or(Amount::ZERO);
        let modified_fee = saturating_add(resolved.fee, fee_delta);
        self.pays_minimum_relay_fees(entry, modified_fee)?;
        self.pays_minimum_mempool_fee(entry, modified_fee)?;
        self.check_no_dust_outputs(tx)?;

        let accurate = self.chain_config.sigops_counting_accurate(evaluation_height);
        let sigops = tx_verifier::count_sigops(tx, &resolved.spent_utxos, accurate);
        ensure!(
            sigops <= self.chain_config.max_tx_sigops(),
            MempoolPolicyError::TooManySigops {
                count: sigops,
                max: self.chain_config.max_tx_sigops(),
            }
        );

        ensure!(
            tx.is_final_at(evaluation_height, self.chain_view.median_time_past()),
            MempoolPolicyError::NonFinal
        );

        // Simulate the insertion to catch package limit breaches early
        let parents = self.store.direct_parents_of(tx);
        self.store.collect_ancestors_checked(&parents, entry.size(), &self.config)?;

        Ok(PolicyOutcome::Valid(ValidatedTransaction {
            entry: TxEntryWithFee::new(entry.clone(), resolved.fee, sigops, tip_height),
            spent_utxos: resolved.spent_utxos,
        }))
    }

    fn pays_minimum_relay_fees(
        &self,
        entry: &TxEntry,
        tx_fee: Amount,
    ) -> Result<(), MempoolPolicyError> {
        let min_relay_fee = self.config.min_relay_fee_rate().compute_fee(entry.size())?;
        log::debug!("tx_fee: {tx_fee:?}, min_relay_fee: {min_relay_fee:?}");
        ensure!(
            tx_fee >= min_relay_fee,
            MempoolPolicyError::InsufficientFeesToRelay {
                tx_fee,
                min_relay_fee,
            }
        );
        Ok(())
    }

    fn pays_minimum_mempool_fee(
        &self,
        entry: &TxEntry,
        tx_fee: Amount,
    ) -> Result<(), MempoolPolicyError> {
        let minimum_fee = self.get_update_min_fee_rate().compute_fee(entry.size())?;
        log::debug!("pays_minimum_mempool_fee tx_fee = {tx_fee:?}, minimum_fee = {minimum_fee:?}");
        ensure!(
            tx_fee >= minimum_fee,
            MempoolPolicyError::RollingFeeThresholdNotMet {
                minimum_fee,
                tx_fee,
            }
        );
        Ok(())
    }

    fn check_no_dust_outputs(&self, tx: &Transaction) -> Result<(), MempoolPolicyError> {
        let threshold = self.dust_threshold();
        for (index, output) in tx.outputs().iter().enumerate() {
            if output.script_pubkey().is_unspendable() {
                continue;
            }
            ensure!(
                output.value() >= threshold,
                MempoolPolicyError::DustOutput {
                    index,
                    value: output.value(),
                    threshold,
                }
            );
        }
        Ok(())
    }

    fn dust_threshold(&self) -> Amount {
        let rate = self.config.min_relay_fee_rate().atoms_per_kb();
        Amount::from_atoms(crate::config::DUST_THRESHOLD_BASE.saturating_mul(rate) / 1000)
    }

    fn check_orphan_pool_policy(&self, entry: &TxEntry) -> Result<(), OrphanPoolError> {
        ensure!(
            entry.size() <= MAX_ORPHAN_TX_SIZE,
            OrphanPoolError::TooLarge(entry.size(), MAX_ORPHAN_TX_SIZE)
        );
        if let TxOrigin::Local(origin) = entry.origin() {
            return Err(OrphanPoolError::NotSupportedForLocalOrigin(origin));
        }
        ensure!(
            entry.requires().all(|op| self.store.find_conflicting_tx(&op).is_none()),
            OrphanPoolError::MempoolConflict
        );
        Ok(())
    }
}

// Transaction finalization
impl<C: ChainView, S: ScriptVerifier, M: MemoryUsageEstimator> Mempool<C, S, M> {
    pub fn accept_transaction(
        &mut self,
        tx: Transaction,
        origin: TxOrigin,
    ) -> Result<TxStatus, Error> {
        let creation_time = self.clock.get_time();
        self.add_transaction_and_descendants(TxEntry::new(tx, creation_time, origin))
    }

    /// Add the given entry, then drive orphan resolution for any children the
    /// new transaction completes.
    pub(crate) fn add_transaction_and_descendants(
        &mut self,
        entry: TxEntry,
    ) -> Result<TxStatus, Error> {
        let tx_id = *entry.tx_id();
        let status = self.add_transaction_entry(entry)?;
        if status == TxStatus::InMempool {
            self.process_ready_orphans(tx_id);
        }
        Ok(status)
    }

    fn add_transaction_entry(&mut self, entry: TxEntry) -> Result<TxStatus, Error> {
        log::debug!("Adding transaction {}", entry.tx_id());

        match self.validate_transaction_policy(&entry).log_err_pfx("Transaction rejected")? {
            PolicyOutcome::Valid(validated) => {
                let evaluation_height = validated.entry.entry_height().next_height();
                tx_verifier::verify_scripts(
                    self.script_verifier.as_ref(),
                    &self.chain_config,
                    validated.entry.transaction(),
                    &validated.spent_utxos,
                    evaluation_height,
                )?;
                self.commit_validated(validated.entry)
            }
            PolicyOutcome::Orphan { entry } => {
                let now = self.clock.get_time();
                self.orphans.insert_and_enforce_limits(
                    entry,
                    now,
                    &self.config,
                    &mut self.orphan_rng,
                )?;
                Ok(TxStatus::InOrphanPool)
            }
        }
    }

    /// Commit a candidate whose scripts were verified outside the lock. The
    /// policy stages are re-run since the pool may have moved in between.
    pub(crate) fn commit_snapshot_validated(&mut self, entry: TxEntry) -> Result<TxStatus, Error> {
        let tx_id = *entry.tx_id();
        let status = match self.validate_transaction_policy(&entry)? {
            PolicyOutcome::Valid(validated) => self.commit_validated(validated.entry)?,
            PolicyOutcome::Orphan { entry } => {
                let now = self.clock.get_time();
                self.orphans.insert_and_enforce_limits(
                    entry,
                    now,
                    &self.config,
                    &mut self.orphan_rng,
                )?;
                TxStatus::InOrphanPool
            }
        };
        if status == TxStatus::InMempool {
            self.process_ready_orphans(tx_id);
        }
        Ok(status)
    }

    fn commit_validated(&mut self, entry: TxEntryWithFee) -> Result<TxStatus, Error> {
        let tx_id = *entry.tx_id();
        let fee_delta = self.fee_deltas.get(&tx_id).copied().unwrap_or(Amount::ZERO);

        // Make room before insertion; this may raise the dynamic floor, in
        // which case the candidate has to clear the new bar as well
        self.make_room_for(entry.tx_entry().size())?;
        let modified_fee = saturating_add(entry.fee(), fee_delta);
        self.pays_minimum_mempool_fee(entry.tx_entry(), modified_fee)?;

        // Eviction may have taken one of the candidate's own parents with it
        let inputs_available = entry.transaction().inputs().iter().all(|input| {
            self.store.unconfirmed_utxo(input.outpoint()).is_some()
                || self.chain_view.utxo(input.outpoint()).is_some()
        });
        ensure!(inputs_available, MempoolPolicyError::MempoolFull);

        self.store.add_transaction(entry, fee_delta, &self.config)?;

        self.remove_expired_transactions();
        ensure!(
            self.store.contains(&tx_id),
            MempoolPolicyError::DescendantOfExpiredTransaction
        );
        self.limit_mempool_size()?;
        ensure!(self.store.contains(&tx_id), MempoolPolicyError::MempoolFull);

        // Orphans double-spending inputs of the committed tx are now dead
        let doomed = {
            let committed = self.store.get_entry(&tx_id).expect("just added");
            self.orphans.conflicting_with(committed.transaction())
        };
        for orphan_id in doomed {
            log::debug!("Erasing orphan {orphan_id} double-spending a pooled input");
            self.orphans.remove(orphan_id);
        }

        #[cfg(debug_assertions)]
        self.store.assert_valid();

        self.events_controller.broadcast(MempoolEvent::TransactionAccepted { tx_id });
        Ok(TxStatus::InMempool)
    }

    /// Re-drive the accept pipeline for orphans waiting on the given
    /// transaction; promotions cascade until the ready set is exhausted.
    fn process_ready_orphans(&mut self, tx_id: Id<Transaction>) {
        let mut work_queue: VecDeque<Id<Transaction>> = match self.store.get_entry(&tx_id) {
            Some(entry) => self.orphans.ready_children_of(entry.tx_entry().provides()).into(),
            None => return,
        };

        while let Some(orphan_id) = work_queue.pop_front() {
            let orphan = match self.orphans.remove(orphan_id) {
                Some(orphan) => orphan,
                None => continue,
            };

            match self.add_transaction_entry(orphan) {
                Ok(TxStatus::InMempool) => {
                    log::debug!("Orphan tx {orphan_id} promoted to mempool");
                    let ready = match self.store.get_entry(&orphan_id) {
                        Some(promoted) => {
                            self.orphans.ready_children_of(promoted.tx_entry().provides())
                        }
                        None => Vec::new(),
                    };
                    work_queue.extend(ready);
                }
                Ok(TxStatus::InOrphanPool) => {
                    log::debug!("Orphan tx {orphan_id} stays in the orphan pool");
                }
                Err(err) => {
                    log::info!("Orphan transaction {orphan_id} no longer validates: {err}");
                }
            }
        }
    }

    /// Evict whole packages, lowest ancestor score first, until the incoming
    /// size fits. The dynamic floor is raised above the best evicted rate.
    fn make_room_for(&mut self, incoming_size: usize) -> Result<(), MempoolPolicyError> {
        let mut removed_fees = Vec::new();
        while !self.store.is_empty()
            && self.memory_usage() + incoming_size > self.config.max_size().as_bytes()
        {
            removed_fees.push(self.evict_lowest_package()?);
        }
        self.bump_rolling_fee(&removed_fees)
    }

    fn trim(&mut self) -> Result<Vec<FeeRate>, MempoolPolicyError> {
        let mut removed_fees = Vec::new();
        while !self.store.is_empty() && self.memory_usage() > self.config.max_size().as_bytes() {
            removed_fees.push(self.evict_lowest_package()?);
        }
        Ok(removed_fees)
    }

    fn evict_lowest_package(&mut self) -> Result<FeeRate, MempoolPolicyError> {
        let removed_id = self.store.lowest_ancestor_score_tx().expect("pool not empty");
        let removed = self.store.get_entry(&removed_id).expect("indexed entry");
        log::debug!(
            "Mempool trim: evicting tx {} with ancestor score {:?} and size {}",
            removed_id,
            removed.ancestor_score(),
            removed.size(),
        );
        let rate = FeeRate::from_total_tx_fee(
            removed.ancestor_fees(),
            NonZeroUsize::new(removed.ancestor_size()).expect("entries have non-zero size"),
        )?;
        self.store.drop_tx_and_descendants(&removed_id, MempoolRemovalReason::SizeLimit);
        Ok(rate)
    }

    fn bump_rolling_fee(&self, removed_fees: &[FeeRate]) -> Result<(), MempoolPolicyError> {
        if let Some(max_removed) = removed_fees.iter().max() {
            let new_minimum_fee_rate = (*max_removed + self.config.incremental_relay_fee_rate())
                .ok_or(MempoolPolicyError::FeeOverflow)?;
            if new_minimum_fee_rate > self.rolling_fee_rate.read().rolling_minimum_fee_rate() {
                self.update_min_fee_rate(new_minimum_fee_rate);
            }
        }
        Ok(())
    }

    fn limit_mempool_size(&mut self) -> Result<(), MempoolPolicyError> {
        let removed_fees = self.trim()?;
        self.bump_rolling_fee(&removed_fees)
    }

    fn remove_expired_transactions(&mut self) {
        let now = self.clock.get_time();
        let expired = self.store.expired_ids(now, self.config.max_tx_age());
        for tx_id in expired {
            if self.store.contains(&tx_id) {
                log::trace!("Evicting expired tx {tx_id}");
                self.store.drop_tx_and_descendants(&tx_id, MempoolRemovalReason::Expiry);
            }
        }
    }

    pub fn set_max_size(&mut self, max_size: MempoolMaxSize) -> Result<(), Error> {
        if max_size > self.config.max_size() {
            self.drop_rolling_fee();
        }
        self.config.set_max_size(max_size);
        self.limit_mempool_size().map_err(Error::from)
    }

    /// Operator override for transaction priority; applies to pooled entries
    /// immediately and to the transaction at acceptance otherwise.
    pub fn set_fee_delta(&mut self, tx_id: Id<Transaction>, delta: Amount) {
        log::debug!("Setting fee delta of {tx_id} to {delta:?}");
        if delta == Amount::ZERO {
            self.fee_deltas.remove(&tx_id);
        } else {
            self.fee_deltas.insert(tx_id, delta);
        }
        self.store.update_fee_delta(&tx_id, delta);
        #[cfg(debug_assertions)]
        self.store.assert_valid();
    }

    /// Drop all orphans received from a disconnecting peer
    pub fn peer_disconnected(&mut self, peer: PeerId) {
        let removed = self.orphans.remove_by_origin(TxOrigin::Peer(peer));
        log::debug!("Peer {peer} disconnected, dropped {removed} orphan(s)");
    }
}

// Mining order
impl<C, S, M> Mempool<C, S, M> {
    /// Entries such that all in-pool parents of an entry precede it and,
    /// among eligible entries, higher descendant package score goes first.
    pub fn mining_order(&self) -> Vec<&TxMempoolEntry> {
        let mut emitted: BTreeSet<Id<Transaction>> = BTreeSet::new();
        let mut result = Vec::with_capacity(self.store.len());

        for tx_id in self.store.ids_by_descendant_score_desc() {
            if emitted.contains(&tx_id) {
                continue;
            }
            let entry = self.store.get_entry(&tx_id).expect("indexed entry");
            let mut chain: Vec<_> = entry
                .unconfirmed_ancestors(&self.store)
                .into_iter()
                .filter(|id| !emitted.contains(id))
                .collect();
            chain.sort_by_key(|id| {
                self.store.get_entry(id).expect("ancestor entry").ancestor_count()
            });

            for id in chain.into_iter().chain(std::iter::once(tx_id)) {
                if emitted.insert(id) {
                    result.push(self.store.get_entry(&id).expect("entry exists"));
                }
            }
        }
        result
    }

    /// Feed the accumulator in mining order until it reports it is done
    pub fn collect_txs(
        &self,
        mut tx_accumulator: Box<dyn TransactionAccumulator>,
    ) -> Box<dyn TransactionAccumulator> {
        for entry in self.mining_order() {
            if tx_accumulator.done() {
                break;
            }
            match tx_accumulator.add_tx(entry.transaction().clone(), entry.fee()) {
                Ok(()) => (),
                Err(err) => {
                    log::error!(
                        "Failed to add transaction {} to the accumulator: {err}",
                        entry.tx_id(),
                    );
                    break;
                }
            }
        }
        tx_accumulator
    }
}
