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

use std::num::NonZeroUsize;

use common::{
    chain::{OutPoint, Transaction},
    primitives::{Amount, BlockHeight, Id, Idable},
};

use crate::{config::Time, tx_origin::TxOrigin};

/// A transaction together with its reception metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxEntry {
    tx_id: Id<Transaction>,
    transaction: Transaction,
    creation_time: Time,
    encoded_size: NonZeroUsize,
    origin: TxOrigin,
}

impl TxEntry {
    pub fn new(transaction: Transaction, creation_time: Time, origin: TxOrigin) -> Self {
        let tx_id = transaction.get_id();
        let encoded_size =
            NonZeroUsize::new(transaction.encoded_size()).expect("Encoded tx size is non-zero");
        Self {
            tx_id,
            transaction,
            creation_time,
            encoded_size,
            origin,
        }
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn into_transaction(self) -> Transaction {
        self.transaction
    }

    /// When was the entry created, e.g. when it was received from a peer
    pub fn creation_time(&self) -> Time {
        self.creation_time
    }

    pub fn tx_id(&self) -> &Id<Transaction> {
        &self.tx_id
    }

    pub fn size(&self) -> usize {
        self.encoded_size.get()
    }

    /// Where we got this transaction
    pub fn origin(&self) -> TxOrigin {
        self.origin
    }

    /// Outpoints this entry's inputs reference
    pub fn requires(&self) -> impl Iterator<Item = OutPoint> + '_ {
        self.transaction.inputs().iter().map(|input| *input.outpoint())
    }

    /// Outpoints this entry's outputs create
    pub fn provides(&self) -> impl Iterator<Item = OutPoint> + '_ {
        let tx_id = self.tx_id;
        (0..self.transaction.outputs().len()).map(move |i| OutPoint::new(tx_id, i as u32))
    }
}

/// A [TxEntry] that passed validation, together with the facts validation
/// established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxEntryWithFee {
    entry: TxEntry,
    fee: Amount,
    sigops: u64,
    entry_height: BlockHeight,
}

impl TxEntryWithFee {
    pub fn new(entry: TxEntry, fee: Amount, sigops: u64, entry_height: BlockHeight) -> Self {
        Self {
            entry,
            fee,
            sigops,
            entry_height,
        }
    }

    pub fn tx_id(&self) -> &Id<Transaction> {
        self.entry.tx_id()
    }

    pub fn tx_entry(&self) -> &TxEntry {
        &self.entry
    }

    pub fn transaction(&self) -> &Transaction {
        self.entry.transaction()
    }

    pub fn fee(&self) -> Amount {
        self.fee
    }

    pub fn sigops(&self) -> u64 {
        self.sigops
    }

    pub fn entry_height(&self) -> BlockHeight {
        self.entry_height
    }

    pub fn into_tx_entry(self) -> TxEntry {
        self.entry
    }
}
