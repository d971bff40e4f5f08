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

use std::fmt;

/// Identifier the networking layer assigns to a connected peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerId(u64);

impl PeerId {
    pub const fn from_u64(id: u64) -> Self {
        PeerId(id)
    }

    pub const fn into_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer{}", self.0)
    }
}

/// Where a transaction entering the mempool came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TxOrigin {
    /// Submitted by a peer over the network
    Peer(PeerId),

    /// Originates locally, implicitly trusted
    Local(LocalTxOrigin),
}

impl TxOrigin {
    pub fn peer_id(self) -> Option<PeerId> {
        match self {
            TxOrigin::Peer(id) => Some(id),
            TxOrigin::Local(_) => None,
        }
    }

    pub fn is_local(self) -> bool {
        matches!(self, TxOrigin::Local(_))
    }
}

impl fmt::Display for TxOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxOrigin::Peer(id) => write!(f, "{id}"),
            TxOrigin::Local(origin) => write!(f, "{origin}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LocalTxOrigin {
    /// Submitted by the local wallet
    Wallet,

    /// Replayed from a mempool dump file at startup
    MempoolDump,

    /// Re-inserted after its containing block was disconnected
    PastBlock,
}

impl fmt::Display for LocalTxOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalTxOrigin::Wallet => write!(f, "local wallet"),
            LocalTxOrigin::MempoolDump => write!(f, "mempool dump"),
            LocalTxOrigin::PastBlock => write!(f, "disconnected block"),
        }
    }
}
