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

use crate::{ConsumedUtxoCache, Error, Utxo, UtxosCache};

pub trait UtxosView {
    /// Retrieve the utxo for the given outpoint, if it is unspent
    fn utxo(&self, outpoint: &OutPoint) -> Option<Utxo>;

    /// Check whether the outpoint is unspent
    fn has_utxo(&self, outpoint: &OutPoint) -> bool;
}

pub trait FlushableUtxoView {
    /// Performs bulk modification
    fn batch_write(&mut self, utxos: ConsumedUtxoCache) -> Result<(), Error>;
}

/// Flush the cache into the provided base view. This consumes the cache.
pub fn flush_to_base<T: FlushableUtxoView, P: UtxosView>(
    cache: UtxosCache<P>,
    base: &mut T,
) -> Result<(), Error> {
    base.batch_write(cache.consume())
}
