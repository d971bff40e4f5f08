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

use super::*;
use common::{
    chain::{transaction::SEQUENCE_FINAL, Script, Transaction, TxInput, TxOutput},
    primitives::{Amount, H256},
};
use rstest::rstest;
use test_utils::random::{make_seedable_rng, rand::Rng, Seed};

use crate::tx_origin::{LocalTxOrigin, PeerId};

fn check_integrity(orphans: &TxOrphanPool) {
    let len = orphans.len();
    assert!(len <= ORPHAN_POOL_SIZE_HARD_LIMIT);
    assert_eq!(len, orphans.transactions.len());
    assert_eq!(len, orphans.maps.by_tx_id.len());
    assert_eq!(len, orphans.maps.by_insertion_time.len());
    assert_eq!(len, orphans.maps.by_origin.len());

    orphans.maps.by_tx_id.iter().for_each(|(tx_id, iid)| {
        assert_eq!(
            orphans.get_at(*iid).tx_id(),
            tx_id,
            "Entry {iid:?} tx ID inconsistent",
        );
    });
    orphans.maps.by_insertion_time.iter().for_each(|(time, iid)| {
        assert_eq!(
            orphans.get_at(*iid).creation_time(),
            *time,
            "Entry {iid:?} insertion time inconsistent",
        );
    });
    orphans.maps.by_outpoint.iter().for_each(|(outpoint, iid)| {
        let found = orphans.get_at(*iid).requires().any(|op| op == *outpoint);
        assert!(found, "Entry {iid:?} outpoint missing");
    });
    orphans.maps.by_origin.iter().for_each(|(origin, iid)| {
        assert_eq!(
            orphans.get_at(*iid).origin(),
            *origin,
            "Entry {iid:?} origin inconsistent",
        );
    });
}

fn random_peer_origin(rng: &mut impl Rng) -> TxOrigin {
    TxOrigin::Peer(PeerId::from_u64(rng.gen_range(0u64..20)))
}

fn random_tx_entry(rng: &mut impl Rng) -> TxEntry {
    let n_inputs = rng.gen_range(1..=10);
    let inputs: Vec<_> = (0..n_inputs)
        .map(|_| {
            let source = Id::new(H256(rng.gen()));
            let index = rng.gen_range(0..=400);
            TxInput::new(OutPoint::new(source, index), Script::new(Vec::new()), SEQUENCE_FINAL)
        })
        .collect();
    let outputs = vec![TxOutput::new(
        Amount::from_atoms(rng.gen_range(1_000..1_000_000)),
        Script::new(vec![0xac]),
    )];

    let transaction = Transaction::new(1, inputs, outputs, 0);
    let insertion_time = Time::from_secs(rng.gen_range(0..1_000_000));

    let origin = match rng.gen_range(0..4) {
        0 | 1 | 2 => random_peer_origin(rng),
        3 => TxOrigin::Local(LocalTxOrigin::Wallet),
        _ => panic!("out of range"),
    };

    TxEntry::new(transaction, insertion_time, origin)
}

#[rstest]
#[trace]
#[case(Seed::from_entropy())]
fn insert_and_delete(#[case] seed: Seed) {
    let mut rng = make_seedable_rng(seed);
    let mut orphans = TxOrphanPool::new();

    let entry = random_tx_entry(&mut rng);
    let tx_id = *entry.tx_id();
    let n_deps = BTreeSet::from_iter(entry.requires()).len();

    assert_eq!(orphans.insert(entry), Ok(()));

    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans.maps.by_tx_id.keys().collect::<Vec<_>>(), vec![&tx_id]);
    assert_eq!(orphans.maps.by_outpoint.len(), n_deps);
    assert_eq!(orphans.maps.by_insertion_time.len(), 1);
    check_integrity(&orphans);

    assert!(orphans.remove(tx_id).is_some());

    assert!(orphans.transactions.is_empty());
    assert!(orphans.maps.by_tx_id.is_empty());
    assert!(orphans.maps.by_insertion_time.is_empty());
    assert!(orphans.maps.by_outpoint.is_empty());
    check_integrity(&orphans);
}

#[rstest]
#[trace]
#[case(Seed::from_entropy())]
fn capacity_reached(#[case] seed: Seed) {
    let mut rng = make_seedable_rng(seed);
    let mut orphans = TxOrphanPool::new();
    let config = MempoolConfig::new();
    let time = Time::from_secs(0);

    let entries: Vec<_> =
        (0..config.orphan_pool_capacity()).map(|_| random_tx_entry(&mut rng)).collect();
    for entry in entries {
        assert_eq!(
            orphans.insert_and_enforce_limits(entry, time, &config, &mut rng),
            Ok(())
        );
    }

    assert_eq!(orphans.len(), config.orphan_pool_capacity());
    check_integrity(&orphans);

    let extra: Vec<_> =
        (0..rng.gen_range(1..100)).map(|_| random_tx_entry(&mut rng)).collect();
    for entry in extra {
        let _ = orphans.insert_and_enforce_limits(entry, time, &config, &mut rng);
        assert_eq!(orphans.len(), config.orphan_pool_capacity());
    }
    check_integrity(&orphans);
}

#[rstest]
#[trace]
#[case(Seed::from_entropy())]
fn per_origin_limit_evicts_least_recent(#[case] seed: Seed) {
    let mut rng = make_seedable_rng(seed);
    let mut orphans = TxOrphanPool::new();
    let config = MempoolConfig::new().with_max_orphans_per_peer(2);
    let origin = TxOrigin::Peer(PeerId::from_u64(7));

    let mut entries: Vec<TxEntry> = (0..3)
        .map(|i| {
            let entry = random_tx_entry(&mut rng);
            let tx = entry.transaction().clone();
            TxEntry::new(tx, Time::from_secs(100 + i), origin)
        })
        .collect();
    let first_id = *entries[0].tx_id();

    for entry in entries.drain(..) {
        let time = entry.creation_time();
        orphans.insert_and_enforce_limits(entry, time, &config, &mut rng).unwrap();
    }

    assert_eq!(orphans.len(), 2);
    assert!(!orphans.contains(&first_id), "oldest orphan should be evicted");
    check_integrity(&orphans);
}

#[rstest]
#[trace]
#[case(Seed::from_entropy())]
fn expiration(#[case] seed: Seed) {
    let mut rng = make_seedable_rng(seed);
    let mut orphans = TxOrphanPool::new();
    let expiry = Time::from_secs(1200);

    let old = {
        let entry = random_tx_entry(&mut rng);
        TxEntry::new(entry.transaction().clone(), Time::from_secs(0), entry.origin())
    };
    let fresh = {
        let entry = random_tx_entry(&mut rng);
        TxEntry::new(entry.transaction().clone(), Time::from_secs(1100), entry.origin())
    };
    let old_id = *old.tx_id();
    let fresh_id = *fresh.tx_id();

    orphans.insert(old).unwrap();
    orphans.insert(fresh).unwrap();

    assert_eq!(orphans.expire(Time::from_secs(1500), expiry), 1);
    assert!(!orphans.contains(&old_id));
    assert!(orphans.contains(&fresh_id));
    check_integrity(&orphans);
}

#[rstest]
#[trace]
#[case(Seed::from_entropy())]
fn simulation(#[case] seed: Seed) {
    let mut rng = make_seedable_rng(seed);
    let mut orphans = TxOrphanPool::new();
    check_integrity(&orphans);

    for _ in 0..300 {
        let len_before = orphans.len();
        match rng.gen_range(0..=5) {
            // Insert a random tx
            0..=1 => {
                let entry = random_tx_entry(&mut rng);
                assert_eq!(orphans.insert(entry.clone()), Ok(()), "Insertion of {entry:?} failed");
                assert_eq!(orphans.len(), len_before + 1);
            }

            // Delete an existing tx
            2 => {
                if orphans.transactions.is_empty() {
                    continue;
                }
                let i = rng.gen_range(0..orphans.transactions.len());
                let id = *orphans.transactions[i].tx_id();
                assert!(orphans.remove(id).is_some(), "Removal of {id:?} failed");
                assert_eq!(orphans.len(), len_before - 1);
            }

            // Delete a non-existing tx
            3 => {
                let id: Id<Transaction> = Id::new(H256(rng.gen::<[u8; 32]>()));
                assert!(orphans.remove(id).is_none());
                assert_eq!(orphans.len(), len_before);
            }

            // Evict a random entry
            4 => {
                let evicted = orphans.evict_random(&mut rng);
                assert_eq!(evicted.is_some(), len_before > 0);
            }

            // Delete all txs by origin
            5 => {
                let origin = match rng.gen_range(0..=4) {
                    0..=3 => random_peer_origin(&mut rng),
                    4 => TxOrigin::Local(LocalTxOrigin::Wallet),
                    _ => panic!("out of range"),
                };
                orphans.remove_by_origin(origin);
                let count = orphans
                    .maps
                    .by_origin
                    .range((origin, InternalId::ZERO)..=(origin, InternalId::MAX))
                    .count();
                assert_eq!(count, 0, "Removing txs by origin {origin:?} failed");
            }

            i => panic!("Out of range: {i}"),
        }

        check_integrity(&orphans);
    }
}
