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

use super::*;
use crate::{error::Error, FeeRate};

/// The single-input single-output shape produced by [tx_spending]
const TX_SIZE: usize = 61;

fn tx_with_fee_rate(chain: &ChainStateMock, sat_per_byte: i64, unique: u8) -> Transaction {
    let value = 10_000_000;
    let root = confirm_utxo(chain, value, 1, unique);
    let fee = sat_per_byte * TX_SIZE as i64;
    tx_spending(&[root], &[value - fee])
}

/// With room for only three transactions, a fourth below the raised floor is
/// rejected and the floor reflects the best evicted package rate plus the
/// incremental relay fee.
#[test]
fn eviction_raises_the_dynamic_floor() {
    let config = MempoolConfig::new().with_max_size(MempoolMaxSize::from_bytes(200));
    let (mut mempool, chain, _time) = setup_with_config(config);

    let tx_a = tx_with_fee_rate(&chain, 10, 1);
    let tx_b = tx_with_fee_rate(&chain, 20, 2);
    let tx_c = tx_with_fee_rate(&chain, 30, 3);
    let tx_d = tx_with_fee_rate(&chain, 5, 4);
    let id_a = tx_a.get_id();

    assert_eq!(tx_a.encoded_size(), TX_SIZE);

    mempool.accept_transaction(tx_a, peer(1)).unwrap();
    mempool.accept_transaction(tx_b.clone(), peer(1)).unwrap();
    mempool.accept_transaction(tx_c.clone(), peer(1)).unwrap();
    assert_eq!(mempool.transaction_count(), 3);

    let res = mempool.accept_transaction(tx_d, peer(1));
    assert!(matches!(
        res,
        Err(Error::Policy(MempoolPolicyError::RollingFeeThresholdNotMet { .. }))
    ));

    // The lowest-rate package (A at 10 sat/B) was evicted to make room and
    // the floor moved to 10 + 1 sat/B
    assert!(!mempool.contains_transaction(&id_a));
    assert!(mempool.contains_transaction(&tx_b.get_id()));
    assert!(mempool.contains_transaction(&tx_c.get_id()));
    assert_eq!(
        mempool.rolling_minimum_fee_rate(),
        FeeRate::new(Amount::from_atoms(11_000))
    );
    mempool.store().assert_valid();
}

/// Trimming never leaves a survivor with a lower ancestor score than any
/// removed entry.
#[test]
fn trim_removes_lowest_scores_first() {
    let (mut mempool, chain, _time) = setup();

    let tx_low = tx_with_fee_rate(&chain, 10, 1);
    let tx_mid = tx_with_fee_rate(&chain, 20, 2);
    let tx_high = tx_with_fee_rate(&chain, 30, 3);
    mempool.accept_transaction(tx_low.clone(), peer(1)).unwrap();
    mempool.accept_transaction(tx_mid.clone(), peer(1)).unwrap();
    mempool.accept_transaction(tx_high.clone(), peer(1)).unwrap();

    mempool.set_max_size(MempoolMaxSize::from_bytes(100)).unwrap();

    assert!(mempool.memory_usage() <= 100);
    assert!(!mempool.contains_transaction(&tx_low.get_id()));
    assert!(!mempool.contains_transaction(&tx_mid.get_id()));
    assert!(mempool.contains_transaction(&tx_high.get_id()));
    mempool.store().assert_valid();
}

/// Eviction removes the whole descendant subtree of the chosen package root.
#[test]
fn eviction_cascades_to_descendants() {
    let (mut mempool, chain, _time) = setup();

    // A cheap parent with an expensive child, and one mid-rate standalone
    let root = confirm_utxo(&chain, 10_000_000, 1, 1);
    let parent = tx_spending(&[root], &[10_000_000 - TX_SIZE as i64]);
    let child = tx_spending(
        &[OutPoint::new(parent.get_id(), 0)],
        &[9_000_000],
    );
    let standalone = tx_with_fee_rate(&chain, 500, 2);

    mempool.accept_transaction(parent.clone(), peer(1)).unwrap();
    mempool.accept_transaction(child.clone(), peer(1)).unwrap();
    mempool.accept_transaction(standalone.clone(), peer(1)).unwrap();

    // Room for a single transaction: the (parent, child) package has the
    // lowest ancestor score at its root, so both go
    mempool.set_max_size(MempoolMaxSize::from_bytes(TX_SIZE)).unwrap();

    assert!(!mempool.contains_transaction(&parent.get_id()));
    assert!(!mempool.contains_transaction(&child.get_id()));
    assert!(mempool.contains_transaction(&standalone.get_id()));
    mempool.store().assert_valid();
}

#[test]
fn expired_transactions_age_out() {
    let (mut mempool, chain, time) = setup();

    let stale = tx_with_fee_rate(&chain, 10, 1);
    let stale_id = stale.get_id();
    mempool.accept_transaction(stale, peer(1)).unwrap();

    // Past the 336 hour expiry; the next commit sweeps old entries
    advance_time(&time, 336 * 60 * 60 + 10);

    let fresh = tx_with_fee_rate(&chain, 10, 2);
    let fresh_id = fresh.get_id();
    mempool.accept_transaction(fresh, peer(1)).unwrap();

    assert!(!mempool.contains_transaction(&stale_id));
    assert!(mempool.contains_transaction(&fresh_id));
    mempool.store().assert_valid();
}

#[test]
fn descendant_of_expired_transaction_rejected() {
    let (mut mempool, chain, time) = setup();
    let root = confirm_utxo(&chain, 10_000_000, 1, 1);

    let parent = tx_spending(&[root], &[9_990_000]);
    let parent_id = parent.get_id();
    mempool.accept_transaction(parent, peer(1)).unwrap();

    advance_time(&time, 336 * 60 * 60 + 10);

    let child = tx_spending(&[OutPoint::new(parent_id, 0)], &[9_980_000]);
    assert_eq!(
        mempool.accept_transaction(child, peer(1)),
        Err(Error::Policy(MempoolPolicyError::DescendantOfExpiredTransaction))
    );
    assert_eq!(mempool.transaction_count(), 0);
    mempool.store().assert_valid();
}

/// After a block the floor decays exponentially, letting previously rejected
/// fee rates back in.
#[test]
fn rolling_floor_decays_after_a_block() {
    let config = MempoolConfig::new().with_max_size(MempoolMaxSize::from_bytes(200));
    let (mut mempool, chain, time) = setup_with_config(config);

    for (rate, unique) in [(10, 1), (20, 2), (30, 3)] {
        mempool.accept_transaction(tx_with_fee_rate(&chain, rate, unique), peer(1)).unwrap();
    }
    // Push one over the limit to trigger eviction and raise the floor
    let _ = mempool.accept_transaction(tx_with_fee_rate(&chain, 5, 4), peer(1));
    assert_eq!(
        mempool.rolling_minimum_fee_rate(),
        FeeRate::new(Amount::from_atoms(11_000))
    );

    // A connected block arms the decay; a day is two half-lives
    let block = make_block(&chain, Vec::new());
    chain.connect_block(&block);
    mempool.on_block_connected(&block);
    advance_time(&time, 24 * 60 * 60);

    let decayed = mempool.get_update_min_fee_rate();
    assert!(
        decayed < FeeRate::new(Amount::from_atoms(11_000)),
        "floor should have decayed, got {decayed:?}"
    );
}
