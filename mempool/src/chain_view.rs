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

use common::{chain::OutPoint, primitives::BlockHeight};
use utxo::Utxo;

/// Read access to the chain state the mempool validates against.
///
/// Implemented by the chainstate subsystem; tests substitute a stub returning
/// canned coins. The block-processing path mutates the underlying state and
/// must take its own lock before the mempool lock.
pub trait ChainView: Send + Sync {
    fn tip_height(&self) -> BlockHeight;

    /// Median of the last 11 block timestamps, for locktime evaluation
    fn median_time_past(&self) -> i64;

    fn utxo(&self, outpoint: &OutPoint) -> Option<Utxo>;
}
