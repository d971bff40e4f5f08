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

use common::chain::OutPoint;
use thiserror::Error;

mod cache;
mod in_memory;
mod utxo;
mod utxo_entry;
mod view;

pub use crate::{
    cache::{ConsumedUtxoCache, UtxosCache},
    in_memory::UtxosDBInMemoryImpl,
    utxo::{Utxo, UtxoSource},
    utxo_entry::{IsDirty, IsFresh, UtxoEntry},
    view::{flush_to_base, FlushableUtxoView, UtxosView},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Attempted to overwrite an existing unspent utxo")]
    OverwritingUtxo,

    #[error("No utxo found for outpoint {0:?}")]
    NoUtxoFound(OutPoint),

    #[error("Utxo for outpoint {0:?} was already spent")]
    UtxoAlreadySpent(OutPoint),

    #[error("Flushed a fresh utxo that the base view already contains")]
    FreshUtxoAlreadyExists,

    #[error("The utxo originates from the mempool, no blockchain height available")]
    NoBlockchainHeightFound,
}
