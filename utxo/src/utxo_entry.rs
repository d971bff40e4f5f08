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

use crate::Utxo;

/// Whether this utxo entry was created within the containing cache layer, i.e.
/// the parent view has never seen it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsFresh {
    Yes,
    No,
}

impl From<bool> for IsFresh {
    fn from(v: bool) -> Self {
        if v {
            IsFresh::Yes
        } else {
            IsFresh::No
        }
    }
}

/// Whether this entry diverges from the parent view and must be written on
/// flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsDirty {
    Yes,
    No,
}

impl From<bool> for IsDirty {
    fn from(v: bool) -> Self {
        if v {
            IsDirty::Yes
        } else {
            IsDirty::No
        }
    }
}

/// A cache slot for one outpoint: either a live utxo or a spend tombstone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtxoEntry {
    utxo: Option<Utxo>,
    is_fresh: bool,
    is_dirty: bool,
}

impl UtxoEntry {
    pub fn new(utxo: Option<Utxo>, is_fresh: IsFresh, is_dirty: IsDirty) -> Self {
        UtxoEntry {
            utxo,
            is_fresh: matches!(is_fresh, IsFresh::Yes),
            is_dirty: matches!(is_dirty, IsDirty::Yes),
        }
    }

    pub fn utxo(&self) -> Option<&Utxo> {
        self.utxo.as_ref()
    }

    pub fn take_utxo(self) -> Option<Utxo> {
        self.utxo
    }

    pub fn is_spent(&self) -> bool {
        self.utxo.is_none()
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }
}
