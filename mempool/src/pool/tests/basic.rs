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

use rstest::rstest;
use test_utils::random::{make_seedable_rng, rand::Rng, Seed};

use super::*;
use crate::{
    dump::{load_mempool, save_mempool},
    error::{Error, MempoolBanScore, RejectCategory},
    MempoolHandle,
};

#[test]
fn accept_single_transaction() {
    let (mut mempool, chain, _time) = setup();
    let root = confirm_utxo(&chain, 1_000_000, 1, 1);

    let tx = tx_spending(&[root], &[990_000]);
    let tx_id = tx.get_id();

    assert_eq!(
        mempool.accept_transaction(tx, peer(1)),
        Ok(TxStatus::InMempool)
    );
    assert!(mempool.contains_transaction(&tx_id));
    assert!(mempool.have_transaction(&tx_id));
    assert!(!mempool.contains_orphan_transaction(&tx_id));
    assert_eq!(mempool.spent_by(&root), Some(tx_id));
    mempool.store().assert_valid();
}

#[test]
fn duplicate_returns_already_known() {
    let (mut mempool, chain, _time) = setup();
    let root = confirm_utxo(&chain, 1_000_000, 1, 1);

    let tx = tx_spending(&[root], &[990_000]);
    assert_eq!(
        mempool.accept_transaction(tx.clone(), peer(1)),
        Ok(TxStatus::InMempool)
    );
    let count = mempool.transaction_count();

    let res = mempool.accept_transaction(tx, peer(2));
    assert_eq!(
        res,
        Err(Error::Validity(TxValidationError::AlreadyInMempool))
    );
    assert_eq!(res.unwrap_err().category(), RejectCategory::Duplicate);
    assert_eq!(mempool.transaction_count(), count);
    mempool.store().assert_valid();
}

#[test]
fn insufficient_relay_fee() {
    let (mut mempool, chain, _time) = setup();
    let root = confirm_utxo(&chain, 1_000_000, 1, 1);

    // Fee of 10 satoshi on a ~61 byte transaction is below 1000 sat/kB
    let tx = tx_spending(&[root], &[999_990]);
    let res = mempool.accept_transaction(tx, peer(1));
    assert!(matches!(
        res,
        Err(Error::Policy(MempoolPolicyError::InsufficientFeesToRelay { .. }))
    ));
    assert_eq!(res.unwrap_err().mempool_ban_score(), 0);
}

#[test]
fn dust_output_rejected() {
    let (mut mempool, chain, _time) = setup();
    let root = confirm_utxo(&chain, 1_000_000, 1, 1);

    let tx = tx_spending(&[root], &[400]);
    let res = mempool.accept_transaction(tx, peer(1));
    assert!(matches!(
        res,
        Err(Error::Policy(MempoolPolicyError::DustOutput { .. }))
    ));
}

#[test]
fn structurally_invalid_transactions_are_bannable() {
    let (mut mempool, _chain, _time) = setup();

    let no_inputs = Transaction::new(
        1,
        Vec::new(),
        vec![TxOutput::new(Amount::from_atoms(1000), Script::new(vec![0xac]))],
        0,
    );
    let err = mempool.accept_transaction(no_inputs, peer(1)).unwrap_err();
    assert_eq!(err, Error::Validity(TxValidationError::NoInputs));
    assert_eq!(err.category(), RejectCategory::Invalid);
    assert_eq!(err.mempool_ban_score(), 100);
}

#[test]
fn duplicate_inputs_rejected() {
    let (mut mempool, chain, _time) = setup();
    let root = confirm_utxo(&chain, 1_000_000, 1, 1);

    let tx = tx_spending(&[root, root], &[990_000]);
    assert_eq!(
        mempool.accept_transaction(tx, peer(1)),
        Err(Error::Validity(TxValidationError::DuplicateInputs))
    );
}

#[test]
fn premature_coinbase_spend() {
    let (mut mempool, chain, _time) = setup();

    // Tip is at 200; a coinbase from height 150 has only 50 confirmations
    let young = confirm_coinbase_utxo(&chain, 1_000_000, 150, 1);
    let tx = tx_spending(&[young], &[990_000]);
    let err = mempool.accept_transaction(tx, peer(1)).unwrap_err();
    assert!(matches!(
        err,
        Error::Validity(TxValidationError::PrematureCoinbaseSpend { input_index: 0 })
    ));
    assert_eq!(err.category(), RejectCategory::Invalid);

    // A coinbase from height 100 is mature
    let mature = confirm_coinbase_utxo(&chain, 1_000_000, 100, 2);
    let tx = tx_spending(&[mature], &[990_000]);
    assert_eq!(
        mempool.accept_transaction(tx, peer(1)),
        Ok(TxStatus::InMempool)
    );
}

#[test]
fn non_final_transaction_rejected() {
    let (mut mempool, chain, _time) = setup();
    let root = confirm_utxo(&chain, 1_000_000, 1, 1);

    // Locktime in the future, sequence numbers do not opt out
    let tx = tx_spending_with_locktime(&[root], &[990_000], 300, 0);
    assert_eq!(
        mempool.accept_transaction(tx, peer(1)),
        Err(Error::Policy(MempoolPolicyError::NonFinal))
    );
}

#[test]
fn already_confirmed_rejected() {
    let (mut mempool, chain, _time) = setup();
    let root = confirm_utxo(&chain, 1_000_000, 1, 1);

    let tx = tx_spending(&[root], &[990_000]);
    // Pretend one of the transaction's outputs is already in the chain utxo set
    chain.add_utxo(
        OutPoint::new(tx.get_id(), 0),
        Utxo::new_for_blockchain(
            TxOutput::new(Amount::from_atoms(990_000), Script::new(vec![0xac])),
            false,
            BlockHeight::new(2),
        ),
    );
    assert_eq!(
        mempool.accept_transaction(tx, peer(1)),
        Err(Error::Validity(TxValidationError::AlreadyConfirmed))
    );
}

#[test]
fn sigop_limit_enforced() {
    let (mut mempool, chain, _time) = setup();
    let root = confirm_utxo(&chain, 1_000_000, 1, 1);

    let heavy_script = Script::new(vec![common::chain::script::OP_CHECKSIG; 20_001]);
    let tx = Transaction::new(
        1,
        vec![TxInput::new(root, Script::new(Vec::new()), SEQUENCE_FINAL)],
        vec![TxOutput::new(Amount::from_atoms(900_000), heavy_script)],
        0,
    );
    let res = mempool.accept_transaction(tx, peer(1));
    assert!(matches!(
        res,
        Err(Error::Policy(MempoolPolicyError::TooManySigops { .. }))
    ));
}

#[test]
fn check_spend_tracks_the_chain() {
    let (mut mempool, chain, _time) = setup();
    let root = confirm_utxo(&chain, 10_000_000, 1, 1);

    let txs = make_tx_chain(root, 10_000_000, 2000, 5);
    for tx in &txs {
        assert_eq!(
            mempool.accept_transaction(tx.clone(), peer(1)),
            Ok(TxStatus::InMempool)
        );
    }

    assert_eq!(mempool.spent_by(&root), Some(txs[0].get_id()));
    for pair in txs.windows(2) {
        let outpoint = OutPoint::new(pair[0].get_id(), 0);
        assert_eq!(mempool.spent_by(&outpoint), Some(pair[1].get_id()));
    }
    let last = OutPoint::new(txs.last().unwrap().get_id(), 0);
    assert_eq!(mempool.spent_by(&last), None);
}

#[test]
fn accept_then_confirm_restores_initial_state() {
    let (mut mempool, chain, _time) = setup();
    let root = confirm_utxo(&chain, 1_000_000, 1, 1);

    let tx = tx_spending(&[root], &[990_000]);
    assert_eq!(
        mempool.accept_transaction(tx.clone(), peer(1)),
        Ok(TxStatus::InMempool)
    );

    let block = make_block(&chain, vec![tx]);
    chain.connect_block(&block);
    mempool.on_block_connected(&block);

    assert_eq!(mempool.transaction_count(), 0);
    assert_eq!(mempool.orphan_count(), 0);
    assert_eq!(mempool.spent_by(&root), None);
    mempool.store().assert_valid();
}

#[test]
fn fee_delta_reorders_mining() {
    let (mut mempool, chain, _time) = setup();
    let root_a = confirm_utxo(&chain, 1_000_000, 1, 1);
    let root_b = confirm_utxo(&chain, 1_000_000, 1, 2);

    let tx_a = tx_spending(&[root_a], &[990_000]);
    let tx_b = tx_spending(&[root_b], &[995_000]);
    let id_a = tx_a.get_id();
    let id_b = tx_b.get_id();

    mempool.accept_transaction(tx_a, peer(1)).unwrap();
    mempool.accept_transaction(tx_b, peer(1)).unwrap();

    // A pays more; it leads the mining order
    let order: Vec<_> = mempool.mining_order().iter().map(|e| *e.tx_id()).collect();
    assert_eq!(order, vec![id_a, id_b]);

    // A prioritization delta flips the order
    mempool.set_fee_delta(id_b, Amount::from_atoms(50_000));
    let order: Vec<_> = mempool.mining_order().iter().map(|e| *e.tx_id()).collect();
    assert_eq!(order, vec![id_b, id_a]);

    assert_eq!(
        mempool.entry(&id_b).unwrap().fee_delta(),
        Amount::from_atoms(50_000)
    );
    mempool.store().assert_valid();
}

#[test]
fn fee_delta_applies_at_acceptance() {
    let (mut mempool, chain, _time) = setup();
    let root = confirm_utxo(&chain, 1_000_000, 1, 1);

    // Fee alone is below the relay floor; the delta set in advance saves it
    let tx = tx_spending(&[root], &[999_990]);
    let tx_id = tx.get_id();
    mempool.set_fee_delta(tx_id, Amount::from_atoms(10_000));

    assert_eq!(
        mempool.accept_transaction(tx, peer(1)),
        Ok(TxStatus::InMempool)
    );
    assert_eq!(
        mempool.entry(&tx_id).unwrap().fee_delta(),
        Amount::from_atoms(10_000)
    );
}

#[test]
fn dump_and_reload() {
    let (mut mempool, chain, _time) = setup();
    let root = confirm_utxo(&chain, 10_000_000, 1, 1);

    let txs = make_tx_chain(root, 10_000_000, 2000, 2);
    let child_id = txs[1].get_id();
    for tx in &txs {
        mempool.accept_transaction(tx.clone(), peer(1)).unwrap();
    }
    mempool.set_fee_delta(child_id, Amount::from_atoms(777));

    let mut dump = Vec::new();
    save_mempool(&mempool, &mut dump).unwrap();

    let (mut reloaded, chain2, _time2) = setup();
    confirm_utxo(&chain2, 10_000_000, 1, 1);
    let accepted = load_mempool(&mut reloaded, &mut dump.as_slice()).unwrap();

    assert_eq!(accepted, 2);
    assert_eq!(reloaded.transaction_count(), 2);
    assert_eq!(
        reloaded.entry(&child_id).unwrap().fee_delta(),
        Amount::from_atoms(777)
    );
    reloaded.store().assert_valid();
}

#[test]
fn handle_concurrent_interface() {
    let (mempool, chain, _time) = setup();
    let root = confirm_utxo(&chain, 1_000_000, 1, 1);
    let handle = MempoolHandle::new(mempool);

    let tx = tx_spending(&[root], &[990_000]);
    let tx_id = tx.get_id();

    assert_eq!(handle.accept(tx, peer(1)), Ok(TxStatus::InMempool));
    assert!(handle.has(&tx_id));
    assert!(!handle.has_orphan(&tx_id));
    assert_eq!(handle.spent_by(&root), Some(tx_id));

    let mining: Vec<_> = handle.iter_mining_order().collect();
    assert_eq!(mining.len(), 1);
    assert_eq!(mining[0].0.get_id(), tx_id);
}

#[rstest]
#[trace]
#[case(Seed::from_entropy())]
fn random_dag_maintains_invariants(#[case] seed: Seed) {
    let mut rng = make_seedable_rng(seed);
    let (mut mempool, chain, time) = setup();

    let mut available: Vec<(OutPoint, i64)> = (0..5)
        .map(|i| {
            let value = 50_000_000;
            (confirm_utxo(&chain, value, 1, 10 + i), value)
        })
        .collect();

    for _ in 0..60 {
        match rng.gen_range(0..10) {
            // Mostly: submit a transaction spending random available outputs
            0..=6 => {
                if available.is_empty() {
                    continue;
                }
                let n_inputs = rng.gen_range(1..=2.min(available.len()));
                let mut inputs = Vec::new();
                let mut in_value = 0;
                for _ in 0..n_inputs {
                    let (outpoint, value) =
                        available.swap_remove(rng.gen_range(0..available.len()));
                    inputs.push(outpoint);
                    in_value += value;
                }
                let fee = 5000;
                let n_outputs = rng.gen_range(1..=2);
                let out_value = (in_value - fee) / n_outputs as i64;
                let outputs = vec![out_value; n_outputs];

                let tx = tx_spending(&inputs, &outputs);
                let tx_id = tx.get_id();
                if mempool.accept_transaction(tx, peer(1)) == Ok(TxStatus::InMempool) {
                    for index in 0..n_outputs {
                        available.push((OutPoint::new(tx_id, index as u32), out_value));
                    }
                }
            }

            // Occasionally: squeeze the pool and restore the limit
            7 => {
                let _ = mempool.set_max_size(MempoolMaxSize::from_bytes(200));
                let _ = mempool.set_max_size(MempoolMaxSize::default());
            }

            // Occasionally: let some time pass
            8..=9 => advance_time(&time, rng.gen_range(1..3600)),

            i => panic!("out of range: {i}"),
        }

        mempool.store().assert_valid();
    }
}
