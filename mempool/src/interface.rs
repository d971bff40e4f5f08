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

//! The concurrent front of the mempool: one reader-writer lock around the
//! pool. Readers (relay inventory, template construction, RPC queries) share
//! access; mutations take the writer lock for a bounded critical section.
//! Script verification runs against a snapshot outside any lock and the
//! commit stage re-checks the policy stages under the writer lock.

use std::sync::Arc;

use parking_lot::RwLock;

use common::{
    chain::{Block, OutPoint, Transaction},
    primitives::{Amount, Id},
};

use crate::{
    chain_view::ChainView,
    error::Error,
    event::MempoolEvent,
    pool::{
        entry::TxEntry, memory_usage_estimator::MemoryUsageEstimator,
        tx_verifier::{self, ScriptVerifier},
        Mempool, PolicyOutcome, TxStatus,
    },
    tx_origin::TxOrigin,
};

pub struct MempoolHandle<C, S, M> {
    pool: Arc<RwLock<Mempool<C, S, M>>>,
}

impl<C, S, M> Clone for MempoolHandle<C, S, M> {
    fn clone(&self) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
        }
    }
}

impl<C, S, M> MempoolHandle<C, S, M>
where
    C: ChainView,
    S: ScriptVerifier,
    M: MemoryUsageEstimator,
{
    pub fn new(mempool: Mempool<C, S, M>) -> Self {
        Self {
            pool: Arc::new(RwLock::new(mempool)),
        }
    }

    /// Run the accept pipeline for a candidate transaction.
    ///
    /// The policy stages run against a snapshot under the reader lock and the
    /// expensive script verification happens with no lock held at all. The
    /// commit re-validates under the writer lock, so a candidate invalidated
    /// by a concurrent mutation fails there instead of corrupting the pool.
    pub fn accept(&self, tx: Transaction, origin: TxOrigin) -> Result<TxStatus, Error> {
        let (entry, validated, chain_config, verifier) = {
            let pool = self.pool.read();
            let entry = TxEntry::new(tx, pool.clock().get_time(), origin);
            let outcome = pool.validate_transaction_policy(&entry)?;
            let validated = match outcome {
                PolicyOutcome::Valid(validated) => Some(validated),
                PolicyOutcome::Orphan { .. } => None,
            };
            let chain_config = Arc::new(pool.chain_config().clone());
            let verifier = Arc::clone(pool.script_verifier());
            (entry, validated, chain_config, verifier)
        };

        if let Some(validated) = validated {
            let evaluation_height = validated.entry.entry_height().next_height();
            tx_verifier::verify_scripts(
                verifier.as_ref(),
                &chain_config,
                validated.entry.transaction(),
                &validated.spent_utxos,
                evaluation_height,
            )?;
        }

        self.pool.write().commit_snapshot_validated(entry)
    }

    pub fn has(&self, tx_id: &Id<Transaction>) -> bool {
        self.pool.read().contains_transaction(tx_id)
    }

    pub fn get(&self, tx_id: &Id<Transaction>) -> Option<Transaction> {
        self.pool.read().transaction(tx_id).cloned()
    }

    pub fn has_orphan(&self, tx_id: &Id<Transaction>) -> bool {
        self.pool.read().contains_orphan_transaction(tx_id)
    }

    pub fn spent_by(&self, outpoint: &OutPoint) -> Option<Id<Transaction>> {
        self.pool.read().spent_by(outpoint)
    }

    pub fn memory_usage(&self) -> usize {
        self.pool.read().memory_usage()
    }

    /// A consistent snapshot in mining order; safe to consume with no lock
    /// held.
    pub fn iter_mining_order(&self) -> impl Iterator<Item = (Transaction, Amount)> {
        let snapshot: Vec<_> = self
            .pool
            .read()
            .mining_order()
            .into_iter()
            .map(|entry| (entry.transaction().clone(), entry.fee()))
            .collect();
        snapshot.into_iter()
    }

    pub fn set_fee_delta(&self, tx_id: Id<Transaction>, delta: Amount) {
        self.pool.write().set_fee_delta(tx_id, delta)
    }

    pub fn on_block_connected(&self, block: &Block) {
        self.pool.write().on_block_connected(block)
    }

    pub fn on_block_disconnected(&self, block: &Block) {
        self.pool.write().on_block_disconnected(block)
    }

    pub fn peer_disconnected(&self, peer: crate::tx_origin::PeerId) {
        self.pool.write().peer_disconnected(peer)
    }

    pub fn subscribe_to_events(&self, handler: Arc<dyn Fn(MempoolEvent) + Send + Sync>) {
        self.pool.write().subscribe_to_events(handler)
    }
}
