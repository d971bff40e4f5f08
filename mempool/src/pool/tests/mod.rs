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
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use parking_lot::RwLock;

use common::{
    chain::{
        config::create_unit_test_config,
        transaction::SEQUENCE_FINAL,
        Block, BlockHeader, OutPoint, Script, Transaction, TxInput, TxOutput,
    },
    primitives::{Amount, BlockHeight, Id, Idable, H256},
};
use test_utils::mock_time_getter::mocked_time_getter_seconds;
use utxo::Utxo;

use super::*;
use crate::{
    error::{MempoolPolicyError, OrphanPoolError, TxValidationError},
    tx_origin::{LocalTxOrigin, PeerId},
};

mod basic;
mod eviction;

#[derive(Debug, Default)]
struct ChainStateData {
    utxos: BTreeMap<OutPoint, Utxo>,
    tip_height: BlockHeight,
    median_time_past: i64,
}

/// Canned chain state shared between a test and the mempool under test
#[derive(Clone, Default)]
pub struct ChainStateMock(Arc<RwLock<ChainStateData>>);

impl ChainStateMock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_tip_height(&self, height: i32) {
        self.0.write().tip_height = BlockHeight::new(height);
    }

    pub fn set_median_time_past(&self, time: i64) {
        self.0.write().median_time_past = time;
    }

    pub fn add_utxo(&self, outpoint: OutPoint, utxo: Utxo) {
        self.0.write().utxos.insert(outpoint, utxo);
    }

    pub fn remove_utxo(&self, outpoint: &OutPoint) {
        self.0.write().utxos.remove(outpoint);
    }

    /// Apply a block's spends and new outputs and advance the tip
    pub fn connect_block(&self, block: &Block) {
        let mut data = self.0.write();
        let new_height = BlockHeight::new(data.tip_height.into_int() + 1);
        data.tip_height = new_height;
        for tx in block.transactions() {
            if !tx.is_coinbase() {
                for input in tx.inputs() {
                    data.utxos.remove(input.outpoint());
                }
            }
            let tx_id = tx.get_id();
            for (index, output) in tx.outputs().iter().enumerate() {
                data.utxos.insert(
                    OutPoint::new(tx_id, index as u32),
                    Utxo::new_for_blockchain(output.clone(), tx.is_coinbase(), new_height),
                );
            }
        }
    }
}

impl crate::chain_view::ChainView for ChainStateMock {
    fn tip_height(&self) -> BlockHeight {
        self.0.read().tip_height
    }

    fn median_time_past(&self) -> i64 {
        self.0.read().median_time_past
    }

    fn utxo(&self, outpoint: &OutPoint) -> Option<Utxo> {
        self.0.read().utxos.get(outpoint).cloned()
    }
}

pub type TestMempool = Mempool<ChainStateMock, NoopScriptVerifier, StoreMemoryUsageEstimator>;

pub const START_TIME_SECS: u64 = 1_600_000_000;

pub fn setup_with_config(config: MempoolConfig) -> (TestMempool, ChainStateMock, Arc<AtomicU64>) {
    let chain_config = Arc::new(create_unit_test_config());
    let time = Arc::new(AtomicU64::new(START_TIME_SECS));
    let clock = mocked_time_getter_seconds(Arc::clone(&time));
    let chain = ChainStateMock::new();
    chain.set_tip_height(200);
    let mempool = Mempool::new(
        chain_config,
        config,
        chain.clone(),
        Arc::new(NoopScriptVerifier),
        clock,
        StoreMemoryUsageEstimator,
    );
    (mempool, chain, time)
}

pub fn setup() -> (TestMempool, ChainStateMock, Arc<AtomicU64>) {
    setup_with_config(MempoolConfig::new())
}

pub fn advance_time(time: &Arc<AtomicU64>, secs: u64) {
    time.fetch_add(secs, Ordering::SeqCst);
}

pub fn peer(id: u64) -> TxOrigin {
    TxOrigin::Peer(PeerId::from_u64(id))
}

/// Seed the chain state with a spendable (non-coinbase) output
pub fn confirm_utxo(chain: &ChainStateMock, value: i64, height: i32, unique: u8) -> OutPoint {
    let outpoint = OutPoint::new(Id::new(H256([unique; 32])), 0);
    chain.add_utxo(
        outpoint,
        Utxo::new_for_blockchain(
            TxOutput::new(Amount::from_atoms(value), Script::new(vec![0xac])),
            false,
            BlockHeight::new(height),
        ),
    );
    outpoint
}

/// Seed the chain state with a coinbase output at the given height
pub fn confirm_coinbase_utxo(
    chain: &ChainStateMock,
    value: i64,
    height: i32,
    unique: u8,
) -> OutPoint {
    let outpoint = OutPoint::new(Id::new(H256([unique; 32])), 0);
    chain.add_utxo(
        outpoint,
        Utxo::new_for_blockchain(
            TxOutput::new(Amount::from_atoms(value), Script::new(vec![0xac])),
            true,
            BlockHeight::new(height),
        ),
    );
    outpoint
}

/// Build a transaction spending the given outpoints. Inputs are sorted so the
/// canonical ordering check passes.
pub fn tx_spending(outpoints: &[OutPoint], output_values: &[i64]) -> Transaction {
    tx_spending_with_locktime(outpoints, output_values, 0, SEQUENCE_FINAL)
}

pub fn tx_spending_with_locktime(
    outpoints: &[OutPoint],
    output_values: &[i64],
    lock_time: u32,
    sequence: u32,
) -> Transaction {
    let mut sorted = outpoints.to_vec();
    sorted.sort();
    let inputs = sorted
        .into_iter()
        .map(|outpoint| TxInput::new(outpoint, Script::new(Vec::new()), sequence))
        .collect();
    let outputs = output_values
        .iter()
        .map(|value| TxOutput::new(Amount::from_atoms(*value), Script::new(vec![0xac])))
        .collect();
    Transaction::new(1, inputs, outputs, lock_time)
}

/// A chain of single-input single-output transactions rooted at `root`,
/// paying `fee` at each link
pub fn make_tx_chain(root: OutPoint, root_value: i64, fee: i64, length: usize) -> Vec<Transaction> {
    let mut txs = Vec::with_capacity(length);
    let mut outpoint = root;
    let mut value = root_value;
    for _ in 0..length {
        value -= fee;
        let tx = tx_spending(&[outpoint], &[value]);
        outpoint = OutPoint::new(tx.get_id(), 0);
        txs.push(tx);
    }
    txs
}

/// A block containing the given transactions, preceded by a dummy coinbase
pub fn make_block(chain: &ChainStateMock, txs: Vec<Transaction>) -> Block {
    let coinbase = Transaction::new(
        1,
        vec![TxInput::new(
            OutPoint::null(),
            Script::new(vec![(chain.tip_height().into_int() + 1) as u8]),
            SEQUENCE_FINAL,
        )],
        vec![TxOutput::new(Amount::from_atoms(5_000_000_000), Script::new(vec![0xac]))],
        0,
    );
    let mut transactions = vec![coinbase];
    transactions.extend(txs);
    let header = BlockHeader::new(1, Id::zero(), H256::zero(), 0, 0, 0);
    Block::new(header, transactions)
}
