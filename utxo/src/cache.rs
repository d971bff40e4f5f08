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

use std::collections::BTreeMap;

use common::{
    chain::{OutPoint, Transaction},
    primitives::Idable,
};

use crate::{
    utxo_entry::{IsDirty, IsFresh, UtxoEntry},
    Error, Utxo, UtxoSource, UtxosView,
};
use crate::view::FlushableUtxoView;

/// The mutations collected by a [UtxosCache], ready to be applied to its
/// parent with [crate::flush_to_base].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumedUtxoCache {
    pub(crate) container: BTreeMap<OutPoint, UtxoEntry>,
}

/// An overlay cache stacked on a parent [UtxosView].
///
/// Reads fall through to the parent; spends and additions are recorded as
/// fresh/dirty entries so the whole overlay can be applied atomically or
/// simply dropped. Not thread-safe: one overlay serves one validation attempt.
pub struct UtxosCache<P> {
    parent: P,
    utxos: BTreeMap<OutPoint, UtxoEntry>,
}

impl<P: UtxosView> UtxosCache<P> {
    pub fn new(parent: P) -> Self {
        UtxosCache {
            parent,
            utxos: BTreeMap::new(),
        }
    }

    /// Returns a UtxoEntry, given the outpoint. Parent hits are memoized in
    /// the overlay as clean entries.
    fn fetch_utxo_entry(&mut self, outpoint: &OutPoint) -> Option<UtxoEntry> {
        if let Some(entry) = self.utxos.get(outpoint) {
            return Some(entry.clone());
        }

        let entry = self
            .parent
            .utxo(outpoint)
            .map(|utxo| UtxoEntry::new(Some(utxo), IsFresh::No, IsDirty::No));
        if let Some(entry) = &entry {
            self.utxos.insert(*outpoint, entry.clone());
        }
        entry
    }

    /// Insert a utxo. Overwriting an existing unspent utxo is an error unless
    /// `possible_overwrite` says the caller expects it (e.g. re-connecting a
    /// coinbase that was pruned).
    pub fn add_utxo(
        &mut self,
        outpoint: &OutPoint,
        utxo: Utxo,
        possible_overwrite: bool,
    ) -> Result<(), Error> {
        let is_fresh = match self.utxos.get(outpoint) {
            None => {
                if possible_overwrite {
                    false
                } else {
                    if self.parent.has_utxo(outpoint) {
                        return Err(Error::OverwritingUtxo);
                    }
                    true
                }
            }
            Some(entry) => {
                if possible_overwrite {
                    false
                } else {
                    if !entry.is_spent() {
                        return Err(Error::OverwritingUtxo);
                    }
                    // Spent within this overlay; re-adding keeps the original freshness
                    entry.is_fresh()
                }
            }
        };

        self.utxos.insert(
            *outpoint,
            UtxoEntry::new(Some(utxo), IsFresh::from(is_fresh), IsDirty::Yes),
        );
        Ok(())
    }

    /// Tombstone the utxo and hand it to the caller
    pub fn spend_utxo(&mut self, outpoint: &OutPoint) -> Result<Utxo, Error> {
        let entry = self
            .fetch_utxo_entry(outpoint)
            .ok_or(Error::NoUtxoFound(*outpoint))?;
        let utxo = entry.utxo().cloned().ok_or(Error::UtxoAlreadySpent(*outpoint))?;

        if entry.is_fresh() {
            // The parent never saw this utxo; the spend cancels the creation
            self.utxos.remove(outpoint);
        } else {
            self.utxos
                .insert(*outpoint, UtxoEntry::new(None, IsFresh::No, IsDirty::Yes));
        }
        Ok(utxo)
    }

    /// Spend the inputs of a transaction and add its outputs
    pub fn connect_transaction(
        &mut self,
        tx: &Transaction,
        source: UtxoSource,
    ) -> Result<(), Error> {
        if !tx.is_coinbase() {
            for input in tx.inputs() {
                self.spend_utxo(input.outpoint())?;
            }
        }

        let tx_id = tx.get_id();
        for (index, output) in tx.outputs().iter().enumerate() {
            if output.script_pubkey().is_unspendable() {
                continue;
            }
            let outpoint = OutPoint::new(tx_id, index as u32);
            let utxo = Utxo::new(output.clone(), tx.is_coinbase(), source.clone());
            // Coinbases may overwrite (duplicate coinbase txids exist in history)
            self.add_utxo(&outpoint, utxo, tx.is_coinbase())?;
        }
        Ok(())
    }

    pub fn consume(self) -> ConsumedUtxoCache {
        ConsumedUtxoCache {
            container: self.utxos,
        }
    }
}

impl<P: UtxosView> UtxosView for UtxosCache<P> {
    fn utxo(&self, outpoint: &OutPoint) -> Option<Utxo> {
        match self.utxos.get(outpoint) {
            Some(entry) => entry.utxo().cloned(),
            None => self.parent.utxo(outpoint),
        }
    }

    fn has_utxo(&self, outpoint: &OutPoint) -> bool {
        self.utxo(outpoint).is_some()
    }
}

impl<P: UtxosView> FlushableUtxoView for UtxosCache<P> {
    fn batch_write(&mut self, utxos: ConsumedUtxoCache) -> Result<(), Error> {
        for (outpoint, entry) in utxos.container {
            if !entry.is_dirty() {
                continue;
            }
            match self.utxos.get(&outpoint) {
                None => {
                    // A fresh tombstone never escaped the child; nothing to record
                    if !(entry.is_fresh() && entry.is_spent()) {
                        let new = UtxoEntry::new(
                            entry.utxo().cloned(),
                            IsFresh::from(entry.is_fresh()),
                            IsDirty::Yes,
                        );
                        self.utxos.insert(outpoint, new);
                    }
                }
                Some(ours) => {
                    if entry.is_fresh() && !ours.is_spent() {
                        return Err(Error::FreshUtxoAlreadyExists);
                    }
                    if ours.is_fresh() && entry.is_spent() {
                        self.utxos.remove(&outpoint);
                    } else {
                        let new = UtxoEntry::new(
                            entry.utxo().cloned(),
                            IsFresh::from(ours.is_fresh()),
                            IsDirty::Yes,
                        );
                        self.utxos.insert(outpoint, new);
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{flush_to_base, UtxosDBInMemoryImpl};
    use common::{
        chain::{Script, TxInput, TxOutput},
        primitives::{Amount, BlockHeight, Id, H256},
    };

    fn outpoint(byte: u8, index: u32) -> OutPoint {
        OutPoint::new(Id::new(H256([byte; 32])), index)
    }

    fn utxo_at(height: i32, value: i64) -> Utxo {
        Utxo::new_for_blockchain(
            TxOutput::new(Amount::from_atoms(value), Script::new(vec![0xac])),
            false,
            BlockHeight::new(height),
        )
    }

    fn base_with(entries: &[(OutPoint, Utxo)]) -> UtxosDBInMemoryImpl {
        let mut db = UtxosDBInMemoryImpl::new();
        for (outpoint, utxo) in entries {
            db.insert_unchecked(*outpoint, utxo.clone());
        }
        db
    }

    #[test]
    fn read_through_to_parent() {
        let op = outpoint(1, 0);
        let db = base_with(&[(op, utxo_at(5, 1000))]);
        let cache = UtxosCache::new(&db);
        assert_eq!(cache.utxo(&op), Some(utxo_at(5, 1000)));
        assert!(!cache.has_utxo(&outpoint(2, 0)));
    }

    #[test]
    fn spend_tombstones_the_coin() {
        let op = outpoint(1, 0);
        let db = base_with(&[(op, utxo_at(5, 1000))]);
        let mut cache = UtxosCache::new(&db);

        assert_eq!(cache.spend_utxo(&op), Ok(utxo_at(5, 1000)));
        // Spent in the overlay even though the parent still has it
        assert_eq!(cache.utxo(&op), None);
        assert_eq!(cache.spend_utxo(&op), Err(Error::UtxoAlreadySpent(op)));
        // The parent is untouched until a flush
        assert!(db.has_utxo(&op));
    }

    #[test]
    fn overwrite_unspent_is_an_error() {
        let op = outpoint(1, 0);
        let db = base_with(&[(op, utxo_at(5, 1000))]);
        let mut cache = UtxosCache::new(&db);

        assert_eq!(
            cache.add_utxo(&op, utxo_at(6, 2000), false),
            Err(Error::OverwritingUtxo)
        );
        assert_eq!(cache.add_utxo(&op, utxo_at(6, 2000), true), Ok(()));
        assert_eq!(cache.utxo(&op), Some(utxo_at(6, 2000)));
    }

    #[test]
    fn spending_a_fresh_utxo_cancels_it() {
        let db = base_with(&[]);
        let mut cache = UtxosCache::new(&db);
        let op = outpoint(9, 0);

        cache.add_utxo(&op, utxo_at(7, 500), false).unwrap();
        cache.spend_utxo(&op).unwrap();

        // Nothing should reach the base on flush
        let mut base = base_with(&[]);
        flush_to_base(cache, &mut base).unwrap();
        assert!(!base.has_utxo(&op));
    }

    #[test]
    fn flush_applies_spends_and_additions() {
        let spent_op = outpoint(1, 0);
        let mut base = base_with(&[(spent_op, utxo_at(5, 1000))]);

        let added_op = outpoint(2, 0);
        let parent = base_with(&[(spent_op, utxo_at(5, 1000))]);
        let mut cache = UtxosCache::new(&parent);
        cache.spend_utxo(&spent_op).unwrap();
        cache.add_utxo(&added_op, utxo_at(6, 700), false).unwrap();

        base.batch_write(cache.consume()).unwrap();
        assert!(!base.has_utxo(&spent_op));
        assert_eq!(base.utxo(&added_op), Some(utxo_at(6, 700)));
    }

    #[test]
    fn connect_transaction_spends_and_creates() {
        let op = outpoint(1, 0);
        let db = base_with(&[(op, utxo_at(5, 1000))]);
        let mut cache = UtxosCache::new(&db);

        let tx = Transaction::new(
            1,
            vec![TxInput::new(op, Script::new(vec![]), 0xffff_ffff)],
            vec![
                TxOutput::new(Amount::from_atoms(400), Script::new(vec![0xac])),
                TxOutput::new(
                    Amount::from_atoms(500),
                    Script::new(vec![common::chain::script::OP_RETURN]),
                ),
            ],
            0,
        );
        cache.connect_transaction(&tx, UtxoSource::Mempool).unwrap();

        assert!(!cache.has_utxo(&op));
        assert!(cache.has_utxo(&OutPoint::new(tx.get_id(), 0)));
        // OP_RETURN outputs never enter the utxo set
        assert!(!cache.has_utxo(&OutPoint::new(tx.get_id(), 1)));
    }
}
