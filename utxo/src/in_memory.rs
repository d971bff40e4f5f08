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

use std::collections::BTreeMap;

use common::chain::OutPoint;

use crate::{ConsumedUtxoCache, Error, FlushableUtxoView, Utxo, UtxosView};

/// A map-backed utxo store; the base layer in tests and tools.
#[derive(Debug, Clone, Default)]
pub struct UtxosDBInMemoryImpl {
    store: BTreeMap<OutPoint, Utxo>,
}

impl UtxosDBInMemoryImpl {
    pub fn new() -> Self {
        Self {
            store: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Insert without overwrite checks; used to seed test fixtures
    pub fn insert_unchecked(&mut self, outpoint: OutPoint, utxo: Utxo) {
        self.store.insert(outpoint, utxo);
    }

    pub fn remove(&mut self, outpoint: &OutPoint) -> Option<Utxo> {
        self.store.remove(outpoint)
    }
}

impl UtxosView for UtxosDBInMemoryImpl {
    fn utxo(&self, outpoint: &OutPoint) -> Option<Utxo> {
        self.store.get(outpoint).cloned()
    }

    fn has_utxo(&self, outpoint: &OutPoint) -> bool {
        self.store.contains_key(outpoint)
    }
}

impl UtxosView for &UtxosDBInMemoryImpl {
    fn utxo(&self, outpoint: &OutPoint) -> Option<Utxo> {
        <UtxosDBInMemoryImpl as UtxosView>::utxo(self, outpoint)
    }

    fn has_utxo(&self, outpoint: &OutPoint) -> bool {
        <UtxosDBInMemoryImpl as UtxosView>::has_utxo(self, outpoint)
    }
}

impl FlushableUtxoView for UtxosDBInMemoryImpl {
    fn batch_write(&mut self, utxos: ConsumedUtxoCache) -> Result<(), Error> {
        for (outpoint, entry) in utxos.container {
            if !entry.is_dirty() {
                continue;
            }
            match entry.take_utxo() {
                Some(utxo) => {
                    self.store.insert(outpoint, utxo);
                }
                None => {
                    self.store.remove(&outpoint);
                }
            }
        }
        Ok(())
    }
}
