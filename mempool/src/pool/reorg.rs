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

//! Keeping the mempool consistent across tip changes: block connect removes
//! confirmed transactions and cascades their conflicts, block disconnect
//! re-drives disconnected transactions through the accept pipeline.

use common::{
    chain::{Block, OutPoint},
    primitives::{Id, Idable},
};
use logging::log;

use super::{
    entry::TxEntry, memory_usage_estimator::MemoryUsageEstimator, store::MempoolRemovalReason,
    tx_verifier::ScriptVerifier, Mempool,
};
use crate::{
    chain_view::ChainView,
    event::MempoolEvent,
    tx_origin::{LocalTxOrigin, TxOrigin},
};

impl<C: ChainView, S: ScriptVerifier, M: MemoryUsageEstimator> Mempool<C, S, M> {
    /// A block extended the chain the mempool validates against. Confirmed
    /// transactions leave the pool without cascading (their descendants stay
    /// valid); anything double-spending a confirmed input is evicted with its
    /// descendants. Newly created outputs may complete waiting orphans.
    pub fn on_block_connected(&mut self, block: &Block) {
        self.rolling_fee_rate.write().set_block_since_last_rolling_fee_bump(true);

        for tx in block.transactions().iter().filter(|tx| !tx.is_coinbase()) {
            let tx_id = tx.get_id();

            if self.store.contains(&tx_id) {
                self.store.remove_tx(&tx_id, MempoolRemovalReason::Block);
            }
            self.orphans.remove(tx_id);

            for input in tx.inputs() {
                if let Some(conflict_id) = self.store.find_conflicting_tx(input.outpoint()) {
                    log::debug!(
                        "Mempool tx {conflict_id} conflicts with confirmed tx {tx_id}, evicting"
                    );
                    self.store.drop_tx_and_descendants(&conflict_id, MempoolRemovalReason::Conflict);
                }
            }
            for orphan_id in self.orphans.conflicting_with(tx) {
                log::debug!("Orphan {orphan_id} conflicts with confirmed tx {tx_id}, erasing");
                self.orphans.remove(orphan_id);
            }

            let provides =
                (0..tx.outputs().len()).map(|index| OutPoint::new(tx_id, index as u32));
            for orphan_id in self.orphans.ready_children_of(provides) {
                if let Some(orphan) = self.orphans.remove(orphan_id) {
                    if let Err(err) = self.add_transaction_and_descendants(orphan) {
                        log::debug!("Orphan {orphan_id} not promoted after block connect: {err}");
                    }
                }
            }
        }

        self.remove_non_final_transactions();

        #[cfg(debug_assertions)]
        self.store.assert_valid();

        self.events_controller.broadcast(MempoolEvent::NewTip {
            block_id: block.get_id(),
            height: self.chain_view.tip_height(),
        });
    }

    /// The tip moved back past this block. Its transactions are offered to
    /// the accept pipeline against the new tip; whatever fails simply ceases
    /// to exist in this node's view.
    pub fn on_block_disconnected(&mut self, block: &Block) {
        self.rolling_fee_rate.write().set_block_since_last_rolling_fee_bump(true);

        let now = self.clock.get_time();
        for tx in block.transactions().iter().filter(|tx| !tx.is_coinbase()) {
            let tx_id = tx.get_id();
            let entry = TxEntry::new(tx.clone(), now, TxOrigin::Local(LocalTxOrigin::PastBlock));
            if let Err(err) = self.add_transaction_and_descendants(entry) {
                log::debug!("Disconnected transaction {tx_id} no longer validates: {err}");
            }
        }

        self.remove_non_final_transactions();

        #[cfg(debug_assertions)]
        self.store.assert_valid();

        self.events_controller.broadcast(MempoolEvent::NewTip {
            block_id: block.header().prev_block(),
            height: self.chain_view.tip_height(),
        });
    }

    /// Locktimes are re-evaluated against the current tip; entries that
    /// regressed to non-final are dropped with their descendants.
    pub fn remove_non_final_transactions(&mut self) {
        let evaluation_height = self.chain_view.tip_height().next_height();
        let median_time_past = self.chain_view.median_time_past();

        let non_final: Vec<Id<_>> = self
            .store
            .entries()
            .filter(|entry| !entry.transaction().is_final_at(evaluation_height, median_time_past))
            .map(|entry| *entry.tx_id())
            .collect();

        for tx_id in non_final {
            if self.store.contains(&tx_id) {
                log::debug!("Transaction {tx_id} became non-final after the tip moved, evicting");
                self.store.drop_tx_and_descendants(&tx_id, MempoolRemovalReason::Reorg);
            }
        }
    }
}
