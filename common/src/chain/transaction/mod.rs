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

use crate::chain::script::Script;
use crate::primitives::{Amount, BlockHeight, Id, Idable, H256};

pub mod encode;

pub use encode::TxDecodeError;

/// Sequence number that exempts an input from locktime enforcement
pub const SEQUENCE_FINAL: u32 = 0xffff_ffff;

/// Locktime values below this are block heights, the rest are unix timestamps
pub const LOCKTIME_THRESHOLD: u32 = 500_000_000;

/// Reference to a transaction output by (txid, output index)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OutPoint {
    tx_id: Id<Transaction>,
    index: u32,
}

impl OutPoint {
    pub const fn new(tx_id: Id<Transaction>, index: u32) -> Self {
        OutPoint { tx_id, index }
    }

    /// The outpoint used by coinbase inputs: all-zero txid, u32::MAX index
    pub const fn null() -> Self {
        OutPoint {
            tx_id: Id::zero(),
            index: u32::MAX,
        }
    }

    pub fn is_null(&self) -> bool {
        self.tx_id.to_hash().is_zero() && self.index == u32::MAX
    }

    pub fn tx_id(&self) -> Id<Transaction> {
        self.tx_id
    }

    pub fn output_index(&self) -> u32 {
        self.index
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxInput {
    outpoint: OutPoint,
    script_sig: Script,
    sequence: u32,
}

impl TxInput {
    pub fn new(outpoint: OutPoint, script_sig: Script, sequence: u32) -> Self {
        TxInput {
            outpoint,
            script_sig,
            sequence,
        }
    }

    pub fn outpoint(&self) -> &OutPoint {
        &self.outpoint
    }

    pub fn script_sig(&self) -> &Script {
        &self.script_sig
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxOutput {
    value: Amount,
    script_pubkey: Script,
}

impl TxOutput {
    pub fn new(value: Amount, script_pubkey: Script) -> Self {
        TxOutput {
            value,
            script_pubkey,
        }
    }

    pub fn value(&self) -> Amount {
        self.value
    }

    pub fn script_pubkey(&self) -> &Script {
        &self.script_pubkey
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Transaction {
    version: i32,
    inputs: Vec<TxInput>,
    outputs: Vec<TxOutput>,
    lock_time: u32,
}

impl Transaction {
    pub fn new(version: i32, inputs: Vec<TxInput>, outputs: Vec<TxOutput>, lock_time: u32) -> Self {
        Transaction {
            version,
            inputs,
            outputs,
            lock_time,
        }
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn inputs(&self) -> &[TxInput] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TxOutput] {
        &self.outputs
    }

    pub fn lock_time(&self) -> u32 {
        self.lock_time
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].outpoint().is_null()
    }

    pub fn total_output_value(&self) -> Option<Amount> {
        self.outputs.iter().map(|o| o.value()).sum::<Option<Amount>>()
    }

    /// Size of the canonical serialization in bytes
    pub fn encoded_size(&self) -> usize {
        encode::transaction_encoded_size(self)
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_size());
        encode::serialize_transaction(self, &mut buf);
        buf
    }

    pub fn deserialize(buf: &[u8]) -> Result<(Self, usize), TxDecodeError> {
        encode::decode_transaction(buf)
    }

    /// Locktime evaluation against a candidate block at `height` with the given
    /// median-time-past. The caller passes the height the transaction would be
    /// confirmed at (current tip + 1).
    pub fn is_final_at(&self, height: BlockHeight, median_time_past: i64) -> bool {
        if self.lock_time == 0 {
            return true;
        }
        let cutoff = if self.lock_time < LOCKTIME_THRESHOLD {
            height.into_int() as i64
        } else {
            median_time_past
        };
        if (self.lock_time as i64) < cutoff {
            return true;
        }
        self.inputs.iter().all(|input| input.sequence() == SEQUENCE_FINAL)
    }
}

impl Idable for Transaction {
    type Tag = Transaction;

    fn get_id(&self) -> Id<Transaction> {
        Id::new(H256::double_sha256(&self.serialize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tx() -> Transaction {
        let input = TxInput::new(
            OutPoint::new(Id::new(H256([7; 32])), 3),
            Script::new(vec![0x51]),
            SEQUENCE_FINAL,
        );
        let output = TxOutput::new(Amount::from_atoms(50_000), Script::new(vec![0x76, 0xa9]));
        Transaction::new(1, vec![input], vec![output], 0)
    }

    #[test]
    fn encoded_size_matches_serialization() {
        let tx = sample_tx();
        assert_eq!(tx.encoded_size(), tx.serialize().len());
    }

    #[test]
    fn serialization_round_trip() {
        let tx = sample_tx();
        let bytes = tx.serialize();
        let (decoded, consumed) = Transaction::deserialize(&bytes).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(decoded, tx);
        assert_eq!(decoded.get_id(), tx.get_id());
    }

    #[test]
    fn coinbase_detection() {
        let coinbase = Transaction::new(
            1,
            vec![TxInput::new(OutPoint::null(), Script::new(vec![0x01, 0x02]), SEQUENCE_FINAL)],
            vec![TxOutput::new(Amount::from_atoms(5_000_000_000), Script::new(vec![]))],
            0,
        );
        assert!(coinbase.is_coinbase());
        assert!(!sample_tx().is_coinbase());
    }

    #[test]
    fn finality_by_height_and_time() {
        let mk = |lock_time, sequence| {
            let input = TxInput::new(
                OutPoint::new(Id::new(H256([1; 32])), 0),
                Script::new(vec![]),
                sequence,
            );
            let output = TxOutput::new(Amount::from_atoms(1), Script::new(vec![]));
            Transaction::new(1, vec![input], vec![output], lock_time)
        };

        // No locktime is always final
        assert!(mk(0, 0).is_final_at(BlockHeight::new(100), 0));

        // Height locktime: final strictly below the cutoff
        assert!(mk(99, 0).is_final_at(BlockHeight::new(100), 0));
        assert!(!mk(100, 0).is_final_at(BlockHeight::new(100), 0));

        // Final sequence numbers disable the locktime
        assert!(mk(100, SEQUENCE_FINAL).is_final_at(BlockHeight::new(100), 0));

        // Time locktime compares against median time past
        let t = LOCKTIME_THRESHOLD + 1000;
        assert!(mk(t, 0).is_final_at(BlockHeight::new(1), t as i64 + 1));
        assert!(!mk(t, 0).is_final_at(BlockHeight::new(1), t as i64));
    }
}
