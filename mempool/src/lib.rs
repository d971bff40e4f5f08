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

#![deny(clippy::clone_on_ref_ptr)]

pub mod chain_view;
pub mod config;
pub mod dump;
pub mod error;
mod event;
mod fee_rate;
mod interface;
pub mod pool;
pub mod tx_accumulator;
pub mod tx_origin;

pub use chain_view::ChainView;
pub use config::{MempoolConfig, MempoolMaxSize};
pub use event::MempoolEvent;
pub use fee_rate::FeeRate;
pub use interface::MempoolHandle;
pub use pool::{
    Mempool, MemoryUsageEstimator, NoopScriptVerifier, ScriptVerifier,
    StoreMemoryUsageEstimator, TxStatus,
};
pub use tx_origin::{LocalTxOrigin, PeerId, TxOrigin};

pub type Result<T> = core::result::Result<T, error::Error>;
