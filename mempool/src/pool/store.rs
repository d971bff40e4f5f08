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

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use common::{
    chain::{OutPoint, Transaction},
    primitives::{Amount, BlockHeight, Id},
};
use logging::log;
use utils::ensure;
use utxo::Utxo;

use super::entry::{TxEntry, TxEntryWithFee};
use crate::{
    config::{MempoolConfig, Time},
    error::{MempoolConflictError, MempoolPolicyError},
};

pub type Ancestors = BTreeSet<Id<Transaction>>;
pub type Descendants = BTreeSet<Id<Transaction>>;

/// Why an entry leaves the pool; descendants are cascaded for every reason
/// except [MempoolRemovalReason::Block], where they stay valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MempoolRemovalReason {
    Block,
    Expiry,
    SizeLimit,
    Conflict,
    Reorg,
}

/// Package fee rate over the entry plus its in-pool ancestors. Integer
/// arithmetic; ordering ties are broken by the (time, txid) index keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AncestorScore(i128);

/// Package fee rate over the entry plus its in-pool descendants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DescendantScore(i128);

fn fee_rate_score(fees: Amount, size: usize) -> i128 {
    (fees.into_atoms() as i128 * 1_000_000) / (size as i128)
}

fn saturating_add(a: Amount, b: Amount) -> Amount {
    Amount::from_atoms(a.into_atoms().saturating_add(b.into_atoms()))
}

/// The canonical in-memory record for a pooled transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxMempoolEntry {
    entry: TxEntry,
    fee: Amount,
    fee_delta: Amount,
    sigops: u64,
    entry_height: BlockHeight,
    parents: BTreeSet<Id<Transaction>>,
    children: BTreeSet<Id<Transaction>>,
    count_with_ancestors: usize,
    size_with_ancestors: usize,
    fees_with_ancestors: Amount,
    sigops_with_ancestors: u64,
    count_with_descendants: usize,
    size_with_descendants: usize,
    fees_with_descendants: Amount,
    sigops_with_descendants: u64,
}

impl TxMempoolEntry {
    fn new(tx: TxEntryWithFee, fee_delta: Amount, parents: BTreeSet<Id<Transaction>>) -> Self {
        let fee = tx.fee();
        let sigops = tx.sigops();
        let entry_height = tx.entry_height();
        let entry = tx.into_tx_entry();
        let size = entry.size();
        let modified_fee = saturating_add(fee, fee_delta);
        Self {
            entry,
            fee,
            fee_delta,
            sigops,
            entry_height,
            parents,
            children: BTreeSet::new(),
            count_with_ancestors: 1,
            size_with_ancestors: size,
            fees_with_ancestors: modified_fee,
            sigops_with_ancestors: sigops,
            count_with_descendants: 1,
            size_with_descendants: size,
            fees_with_descendants: modified_fee,
            sigops_with_descendants: sigops,
        }
    }

    pub fn tx_entry(&self) -> &TxEntry {
        &self.entry
    }

    pub fn into_tx_entry(self) -> TxEntry {
        self.entry
    }

    pub fn transaction(&self) -> &Transaction {
        self.entry.transaction()
    }

    pub fn tx_id(&self) -> &Id<Transaction> {
        self.entry.tx_id()
    }

    pub fn size(&self) -> usize {
        self.entry.size()
    }

    pub fn creation_time(&self) -> Time {
        self.entry.creation_time()
    }

    pub fn fee(&self) -> Amount {
        self.fee
    }

    pub fn fee_delta(&self) -> Amount {
        self.fee_delta
    }

    /// Fee with the operator override applied
    pub fn modified_fee(&self) -> Amount {
        saturating_add(self.fee, self.fee_delta)
    }

    pub fn sigops(&self) -> u64 {
        self.sigops
    }

    pub fn entry_height(&self) -> BlockHeight {
        self.entry_height
    }

    pub fn parents(&self) -> &BTreeSet<Id<Transaction>> {
        &self.parents
    }

    pub fn children(&self) -> &BTreeSet<Id<Transaction>> {
        &self.children
    }

    pub fn ancestor_count(&self) -> usize {
        self.count_with_ancestors
    }

    pub fn ancestor_size(&self) -> usize {
        self.size_with_ancestors
    }

    pub fn ancestor_fees(&self) -> Amount {
        self.fees_with_ancestors
    }

    pub fn ancestor_sigops(&self) -> u64 {
        self.sigops_with_ancestors
    }

    pub fn descendant_count(&self) -> usize {
        self.count_with_descendants
    }

    pub fn descendant_size(&self) -> usize {
        self.size_with_descendants
    }

    pub fn descendant_fees(&self) -> Amount {
        self.fees_with_descendants
    }

    pub fn descendant_sigops(&self) -> u64 {
        self.sigops_with_descendants
    }

    pub fn ancestor_score(&self) -> AncestorScore {
        AncestorScore(fee_rate_score(self.fees_with_ancestors, self.size_with_ancestors))
    }

    pub fn descendant_score(&self) -> DescendantScore {
        DescendantScore(fee_rate_score(self.fees_with_descendants, self.size_with_descendants))
    }

    pub fn unconfirmed_ancestors(&self, store: &MempoolStore) -> Ancestors {
        let mut visited = BTreeSet::new();
        self.unconfirmed_ancestors_inner(&mut visited, store);
        visited
    }

    fn unconfirmed_ancestors_inner(&self, visited: &mut Ancestors, store: &MempoolStore) {
        for parent in self.parents.iter() {
            if visited.insert(*parent) {
                store
                    .get_entry(parent)
                    .expect("parent entry")
                    .unconfirmed_ancestors_inner(visited, store);
            }
        }
    }

    pub fn unconfirmed_descendants(&self, store: &MempoolStore) -> Descendants {
        let mut visited = BTreeSet::new();
        self.unconfirmed_descendants_inner(&mut visited, store);
        visited
    }

    fn unconfirmed_descendants_inner(&self, visited: &mut Descendants, store: &MempoolStore) {
        for child in self.children.iter() {
            if visited.insert(*child) {
                store
                    .get_entry(child)
                    .expect("child entry")
                    .unconfirmed_descendants_inner(visited, store);
            }
        }
    }
}

/// The multi-indexed mempool container.
///
/// Primary index by txid; secondary sorted indices by ancestor package fee
/// rate (eviction picks the bottom) and descendant package fee rate (mining
/// iterates the top); creation-time index for expiry; spent-outpoint map for
/// conflict detection.
#[derive(Debug, Default)]
pub struct MempoolStore {
    pub(crate) txs_by_id: BTreeMap<Id<Transaction>, TxMempoolEntry>,
    txs_by_ancestor_score: BTreeMap<AncestorScore, BTreeSet<(Time, Id<Transaction>)>>,
    txs_by_descendant_score: BTreeMap<DescendantScore, BTreeSet<(Time, Id<Transaction>)>>,
    txs_by_creation_time: BTreeMap<Time, BTreeSet<Id<Transaction>>>,
    spender_txs: BTreeMap<OutPoint, Id<Transaction>>,
    total_size: usize,
}

impl MempoolStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.txs_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txs_by_id.is_empty()
    }

    pub fn total_size(&self) -> usize {
        self.total_size
    }

    pub fn contains(&self, tx_id: &Id<Transaction>) -> bool {
        self.txs_by_id.contains_key(tx_id)
    }

    pub fn get_entry(&self, tx_id: &Id<Transaction>) -> Option<&TxMempoolEntry> {
        self.txs_by_id.get(tx_id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &TxMempoolEntry> {
        self.txs_by_id.values()
    }

    /// The pooled transaction spending the given outpoint, if any
    pub fn find_conflicting_tx(&self, outpoint: &OutPoint) -> Option<Id<Transaction>> {
        self.spender_txs.get(outpoint).copied()
    }

    /// An output created by a pooled transaction, wrapped as a mempool utxo
    pub fn unconfirmed_utxo(&self, outpoint: &OutPoint) -> Option<Utxo> {
        self.txs_by_id
            .get(&outpoint.tx_id())
            .and_then(|entry| entry.transaction().outputs().get(outpoint.output_index() as usize))
            .filter(|output| !output.script_pubkey().is_unspendable())
            .map(|output| Utxo::new_for_mempool(output.clone()))
    }

    /// Ids of pooled transactions directly referenced by the inputs of `tx`
    pub fn direct_parents_of(&self, tx: &Transaction) -> BTreeSet<Id<Transaction>> {
        tx.inputs()
            .iter()
            .map(|input| input.outpoint().tx_id())
            .filter(|id| self.txs_by_id.contains_key(id))
            .collect()
    }

    /// Walk the ancestor closure of a candidate with the given direct parents,
    /// aborting as soon as a package limit is breached. Also previews the
    /// descendant-side limits of every ancestor.
    pub fn collect_ancestors_checked(
        &self,
        parents: &BTreeSet<Id<Transaction>>,
        candidate_size: usize,
        config: &MempoolConfig,
    ) -> Result<Ancestors, MempoolPolicyError> {
        let mut ancestors = Ancestors::new();
        let mut package_size = candidate_size;
        let mut queue: VecDeque<Id<Transaction>> = parents.iter().copied().collect();

        ensure!(
            candidate_size <= config.ancestor_limit_size(),
            MempoolPolicyError::AncestorSizeExceeded {
                size: candidate_size,
                max: config.ancestor_limit_size(),
            }
        );

        while let Some(id) = queue.pop_front() {
            if !ancestors.insert(id) {
                continue;
            }
            let entry = self.txs_by_id.get(&id).expect("ancestor entry");
            package_size += entry.size();

            ensure!(
                ancestors.len() + 1 <= config.ancestor_limit_count(),
                MempoolPolicyError::TooManyAncestors {
                    count: ancestors.len() + 1,
                    max: config.ancestor_limit_count(),
                }
            );
            ensure!(
                package_size <= config.ancestor_limit_size(),
                MempoolPolicyError::AncestorSizeExceeded {
                    size: package_size,
                    max: config.ancestor_limit_size(),
                }
            );

            queue.extend(entry.parents.iter().copied());
        }

        for id in &ancestors {
            let entry = self.txs_by_id.get(id).expect("ancestor entry");
            ensure!(
                entry.count_with_descendants + 1 <= config.descendant_limit_count(),
                MempoolPolicyError::TooManyDescendants {
                    count: entry.count_with_descendants + 1,
                    max: config.descendant_limit_count(),
                }
            );
            ensure!(
                entry.size_with_descendants + candidate_size <= config.descendant_limit_size(),
                MempoolPolicyError::DescendantSizeExceeded {
                    size: entry.size_with_descendants + candidate_size,
                    max: config.descendant_limit_size(),
                }
            );
        }

        Ok(ancestors)
    }

    pub fn add_transaction(
        &mut self,
        tx: TxEntryWithFee,
        fee_delta: Amount,
        config: &MempoolConfig,
    ) -> Result<(), MempoolPolicyError> {
        let conflicts: Vec<_> =
            tx.tx_entry().requires().filter_map(|op| self.find_conflicting_tx(&op)).collect();
        ensure!(
            conflicts.is_empty(),
            MempoolPolicyError::Conflict(MempoolConflictError::SpendsSpentOutpoint { conflicts })
        );

        let parents = self.direct_parents_of(tx.transaction());
        let ancestors = self.collect_ancestors_checked(&parents, tx.tx_entry().size(), config)?;

        let mut entry = TxMempoolEntry::new(tx, fee_delta, parents);
        for ancestor_id in &ancestors {
            let ancestor = self.txs_by_id.get(ancestor_id).expect("ancestor entry");
            entry.count_with_ancestors += 1;
            entry.size_with_ancestors += ancestor.size();
            entry.fees_with_ancestors = (entry.fees_with_ancestors + ancestor.modified_fee())
                .ok_or(MempoolPolicyError::AncestorFeeUpdateOverflow)?;
            entry.sigops_with_ancestors += ancestor.sigops;
        }

        let tx_id = *entry.tx_id();
        let creation_time = entry.creation_time();
        let spent_outpoints: Vec<OutPoint> = entry.entry.requires().collect();

        for parent in entry.parents.iter().copied().collect::<Vec<_>>() {
            self.txs_by_id.get_mut(&parent).expect("parent entry").children.insert(tx_id);
        }

        let (entry_size, entry_fee, entry_sigops) =
            (entry.size(), entry.modified_fee(), entry.sigops);
        for ancestor_id in &ancestors {
            let (old_score, time) = {
                let ancestor = self.txs_by_id.get(ancestor_id).expect("ancestor entry");
                (ancestor.descendant_score(), ancestor.creation_time())
            };
            self.descendant_index_remove(old_score, time, *ancestor_id);

            let ancestor = self.txs_by_id.get_mut(ancestor_id).expect("ancestor entry");
            ancestor.count_with_descendants += 1;
            ancestor.size_with_descendants += entry_size;
            ancestor.fees_with_descendants =
                saturating_add(ancestor.fees_with_descendants, entry_fee);
            ancestor.sigops_with_descendants += entry_sigops;
            let new_score = ancestor.descendant_score();
            self.descendant_index_insert(new_score, time, *ancestor_id);
        }

        for outpoint in spent_outpoints {
            self.spender_txs.insert(outpoint, tx_id);
        }
        self.txs_by_creation_time.entry(creation_time).or_default().insert(tx_id);
        self.ancestor_index_insert(entry.ancestor_score(), creation_time, tx_id);
        self.descendant_index_insert(entry.descendant_score(), creation_time, tx_id);
        self.total_size += entry.size();
        self.txs_by_id.insert(tx_id, entry);

        Ok(())
    }

    /// Remove one entry, leaving its relatives consistent. Descendants of the
    /// removed entry survive; their aggregates are recomputed since their
    /// ancestor closure may have changed connectivity.
    pub fn remove_tx(
        &mut self,
        tx_id: &Id<Transaction>,
        reason: MempoolRemovalReason,
    ) -> Option<TxEntry> {
        log::debug!("remove_tx: {tx_id} ({reason:?})");
        self.remove_single(tx_id).map(TxMempoolEntry::into_tx_entry)
    }

    /// Remove the entry and its whole descendant subtree. The returned list is
    /// in topological order, parents before children.
    pub fn drop_tx_and_descendants(
        &mut self,
        tx_id: &Id<Transaction>,
        reason: MempoolRemovalReason,
    ) -> Vec<TxEntry> {
        let entry = match self.txs_by_id.get(tx_id) {
            Some(entry) => entry.clone(),
            None => return Vec::new(),
        };
        let descendants = entry.unconfirmed_descendants(self);
        log::trace!(
            "Dropping tx {} which has {} descendants ({:?})",
            tx_id,
            descendants.len(),
            reason
        );

        let mut order: Vec<Id<Transaction>> =
            std::iter::once(*tx_id).chain(descendants.into_iter()).collect();
        order.sort_by_key(|id| {
            self.txs_by_id.get(id).map_or(0, |entry| entry.count_with_ancestors)
        });

        // Children go first so that each removal is a leaf removal
        let mut removed: Vec<TxEntry> = order
            .iter()
            .rev()
            .filter_map(|id| self.remove_single(id))
            .map(TxMempoolEntry::into_tx_entry)
            .collect();
        removed.reverse();
        removed
    }

    fn remove_single(&mut self, tx_id: &Id<Transaction>) -> Option<TxMempoolEntry> {
        let entry = self.txs_by_id.get(tx_id)?.clone();
        let ancestors = entry.unconfirmed_ancestors(self);
        let descendants = entry.unconfirmed_descendants(self);

        for parent in &entry.parents {
            if let Some(parent) = self.txs_by_id.get_mut(parent) {
                parent.children.remove(tx_id);
            }
        }
        for child in &entry.children {
            if let Some(child) = self.txs_by_id.get_mut(child) {
                child.parents.remove(tx_id);
            }
        }

        self.ancestor_index_remove(entry.ancestor_score(), entry.creation_time(), *tx_id);
        self.descendant_index_remove(entry.descendant_score(), entry.creation_time(), *tx_id);
        if let Some(set) = self.txs_by_creation_time.get_mut(&entry.creation_time()) {
            set.remove(tx_id);
            if set.is_empty() {
                self.txs_by_creation_time.remove(&entry.creation_time());
            }
        }
        for outpoint in entry.entry.requires() {
            if self.spender_txs.get(&outpoint) == Some(tx_id) {
                self.spender_txs.remove(&outpoint);
            }
        }
        self.total_size -= entry.size();
        self.txs_by_id.remove(tx_id);

        for relative in ancestors.iter().chain(descendants.iter()) {
            self.recompute_aggregates(relative);
        }
        Some(entry)
    }

    /// Recompute both aggregate sides of one entry from its current closure
    /// and refresh its positions in the score indices.
    fn recompute_aggregates(&mut self, tx_id: &Id<Transaction>) {
        let entry = match self.txs_by_id.get(tx_id) {
            Some(entry) => entry.clone(),
            None => return,
        };
        let ancestors = entry.unconfirmed_ancestors(self);
        let descendants = entry.unconfirmed_descendants(self);

        let mut count_a = 1;
        let mut size_a = entry.size();
        let mut fees_a = entry.modified_fee();
        let mut sigops_a = entry.sigops;
        for id in &ancestors {
            let ancestor = self.txs_by_id.get(id).expect("ancestor entry");
            count_a += 1;
            size_a += ancestor.size();
            fees_a = saturating_add(fees_a, ancestor.modified_fee());
            sigops_a += ancestor.sigops;
        }

        let mut count_d = 1;
        let mut size_d = entry.size();
        let mut fees_d = entry.modified_fee();
        let mut sigops_d = entry.sigops;
        for id in &descendants {
            let descendant = self.txs_by_id.get(id).expect("descendant entry");
            count_d += 1;
            size_d += descendant.size();
            fees_d = saturating_add(fees_d, descendant.modified_fee());
            sigops_d += descendant.sigops;
        }

        let time = entry.creation_time();
        self.ancestor_index_remove(entry.ancestor_score(), time, *tx_id);
        self.descendant_index_remove(entry.descendant_score(), time, *tx_id);

        let entry = self.txs_by_id.get_mut(tx_id).expect("entry exists");
        entry.count_with_ancestors = count_a;
        entry.size_with_ancestors = size_a;
        entry.fees_with_ancestors = fees_a;
        entry.sigops_with_ancestors = sigops_a;
        entry.count_with_descendants = count_d;
        entry.size_with_descendants = size_d;
        entry.fees_with_descendants = fees_d;
        entry.sigops_with_descendants = sigops_d;
        let ancestor_score = entry.ancestor_score();
        let descendant_score = entry.descendant_score();

        self.ancestor_index_insert(ancestor_score, time, *tx_id);
        self.descendant_index_insert(descendant_score, time, *tx_id);
    }

    /// Set the operator fee override for an entry and ripple the change
    /// through all affected aggregates.
    pub fn update_fee_delta(&mut self, tx_id: &Id<Transaction>, delta: Amount) {
        let entry = match self.txs_by_id.get(tx_id) {
            Some(entry) => entry.clone(),
            None => return,
        };
        let ancestors = entry.unconfirmed_ancestors(self);
        let descendants = entry.unconfirmed_descendants(self);

        self.txs_by_id.get_mut(tx_id).expect("entry exists").fee_delta = delta;

        for relative in
            std::iter::once(tx_id).chain(ancestors.iter()).chain(descendants.iter())
        {
            self.recompute_aggregates(relative);
        }
    }

    /// Ids whose age exceeds `max_age`, oldest first
    pub fn expired_ids(&self, now: Time, max_age: Time) -> Vec<Id<Transaction>> {
        self.txs_by_creation_time
            .iter()
            .take_while(|(time, _)| now.saturating_sub(*(*time)) > max_age)
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect()
    }

    /// The eviction candidate: lowest ancestor score, oldest first among ties
    pub fn lowest_ancestor_score_tx(&self) -> Option<Id<Transaction>> {
        self.txs_by_ancestor_score
            .values()
            .next()
            .and_then(|set| set.iter().next())
            .map(|(_, id)| *id)
    }

    /// Ids in mining preference order: highest descendant score first, older
    /// entries first among ties
    pub fn ids_by_descendant_score_desc(&self) -> Vec<Id<Transaction>> {
        self.txs_by_descendant_score
            .values()
            .rev()
            .flat_map(|set| set.iter().map(|(_, id)| *id))
            .collect()
    }

    fn ancestor_index_remove(&mut self, score: AncestorScore, time: Time, id: Id<Transaction>) {
        if let Some(set) = self.txs_by_ancestor_score.get_mut(&score) {
            set.remove(&(time, id));
            if set.is_empty() {
                self.txs_by_ancestor_score.remove(&score);
            }
        }
    }

    fn ancestor_index_insert(&mut self, score: AncestorScore, time: Time, id: Id<Transaction>) {
        self.txs_by_ancestor_score.entry(score).or_default().insert((time, id));
    }

    fn descendant_index_remove(&mut self, score: DescendantScore, time: Time, id: Id<Transaction>) {
        if let Some(set) = self.txs_by_descendant_score.get_mut(&score) {
            set.remove(&(time, id));
            if set.is_empty() {
                self.txs_by_descendant_score.remove(&score);
            }
        }
    }

    fn descendant_index_insert(
        &mut self,
        score: DescendantScore,
        time: Time,
        id: Id<Transaction>,
    ) {
        self.txs_by_descendant_score.entry(score).or_default().insert((time, id));
    }

    /// Full consistency check of the container invariants. Used by tests and
    /// debug builds after mutations; the cost is linear in pool size times
    /// graph depth.
    pub fn assert_valid(&self) {
        let mut total_size = 0;
        let mut expected_spends: BTreeMap<OutPoint, Id<Transaction>> = BTreeMap::new();

        for (id, entry) in &self.txs_by_id {
            assert_eq!(entry.tx_id(), id, "primary index key mismatch");
            total_size += entry.size();

            for parent in &entry.parents {
                let parent_entry = self.txs_by_id.get(parent).expect("parent exists");
                assert!(
                    parent_entry.children.contains(id),
                    "parent/child link asymmetric"
                );
                assert!(
                    entry.entry.requires().any(|op| op.tx_id() == *parent),
                    "parent not referenced by any input"
                );
            }
            for child in &entry.children {
                let child_entry = self.txs_by_id.get(child).expect("child exists");
                assert!(child_entry.parents.contains(id), "child/parent link asymmetric");
            }

            for outpoint in entry.entry.requires() {
                assert!(
                    expected_spends.insert(outpoint, *id).is_none(),
                    "two pooled transactions spend the same outpoint"
                );
            }

            let ancestors = entry.unconfirmed_ancestors(self);
            assert!(!ancestors.contains(id), "cycle in the ancestor graph");
            let descendants = entry.unconfirmed_descendants(self);
            assert!(!descendants.contains(id), "cycle in the descendant graph");

            let mut count_a = 1;
            let mut size_a = entry.size();
            let mut fees_a = entry.modified_fee();
            let mut sigops_a = entry.sigops;
            for ancestor_id in &ancestors {
                let ancestor = self.txs_by_id.get(ancestor_id).expect("ancestor exists");
                count_a += 1;
                size_a += ancestor.size();
                fees_a = saturating_add(fees_a, ancestor.modified_fee());
                sigops_a += ancestor.sigops;
            }
            assert_eq!(entry.count_with_ancestors, count_a, "ancestor count drift");
            assert_eq!(entry.size_with_ancestors, size_a, "ancestor size drift");
            assert_eq!(entry.fees_with_ancestors, fees_a, "ancestor fees drift");
            assert_eq!(entry.sigops_with_ancestors, sigops_a, "ancestor sigops drift");

            let mut count_d = 1;
            let mut size_d = entry.size();
            let mut fees_d = entry.modified_fee();
            let mut sigops_d = entry.sigops;
            for descendant_id in &descendants {
                let descendant = self.txs_by_id.get(descendant_id).expect("descendant exists");
                count_d += 1;
                size_d += descendant.size();
                fees_d = saturating_add(fees_d, descendant.modified_fee());
                sigops_d += descendant.sigops;
            }
            assert_eq!(entry.count_with_descendants, count_d, "descendant count drift");
            assert_eq!(entry.size_with_descendants, size_d, "descendant size drift");
            assert_eq!(entry.fees_with_descendants, fees_d, "descendant fees drift");
            assert_eq!(
                entry.sigops_with_descendants, sigops_d,
                "descendant sigops drift"
            );
        }

        assert_eq!(total_size, self.total_size, "total size drift");
        assert_eq!(expected_spends, self.spender_txs, "spent-output map drift");

        let mut indexed = 0;
        for (score, set) in &self.txs_by_ancestor_score {
            assert!(!set.is_empty(), "empty ancestor score bucket");
            for (time, id) in set {
                indexed += 1;
                let entry = self.txs_by_id.get(id).expect("indexed entry exists");
                assert_eq!(*score, entry.ancestor_score(), "stale ancestor score index");
                assert_eq!(*time, entry.creation_time(), "stale time in ancestor index");
            }
        }
        assert_eq!(indexed, self.len(), "ancestor index entry count");

        let mut indexed = 0;
        for (score, set) in &self.txs_by_descendant_score {
            assert!(!set.is_empty(), "empty descendant score bucket");
            for (time, id) in set {
                indexed += 1;
                let entry = self.txs_by_id.get(id).expect("indexed entry exists");
                assert_eq!(*score, entry.descendant_score(), "stale descendant score index");
                assert_eq!(*time, entry.creation_time(), "stale time in descendant index");
            }
        }
        assert_eq!(indexed, self.len(), "descendant index entry count");

        let timed: usize = self.txs_by_creation_time.values().map(BTreeSet::len).sum();
        assert_eq!(timed, self.len(), "creation time index entry count");
    }
}
