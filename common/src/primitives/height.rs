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

use std::fmt;

/// Height of a block in the active chain. Genesis is at height zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BlockHeight(i32);

impl BlockHeight {
    pub const fn new(height: i32) -> Self {
        BlockHeight(height)
    }

    pub const fn zero() -> Self {
        BlockHeight(0)
    }

    pub const fn into_int(self) -> i32 {
        self.0
    }

    pub fn next_height(self) -> BlockHeight {
        BlockHeight(self.0.checked_add(1).expect("block height overflow"))
    }

    pub fn prev_height(self) -> Option<BlockHeight> {
        (self.0 > 0).then(|| BlockHeight(self.0 - 1))
    }

    /// Number of blocks from `other` up to `self` (negative if `other` is higher)
    pub fn distance_from(self, other: BlockHeight) -> i64 {
        self.0 as i64 - other.0 as i64
    }
}

impl fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
