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

//! Optional mempool persistence. The format is a plain concatenation of
//! `(version: u32, count: u64, [entry_time: i64, fee_delta: i64, raw_tx]*,
//! xor_key: u64)`, all little-endian. Loading replays each entry through the
//! accept pipeline with its fee delta pre-applied; entries that no longer
//! validate are dropped silently.

use std::io::{self, Read, Write};
use std::time::Duration;

use common::{chain::Transaction, primitives::Amount};
use logging::log;

use crate::{
    chain_view::ChainView,
    pool::{
        entry::TxEntry, memory_usage_estimator::MemoryUsageEstimator,
        tx_verifier::ScriptVerifier, Mempool, TxStatus,
    },
    tx_origin::{LocalTxOrigin, TxOrigin},
};

pub const MEMPOOL_DUMP_VERSION: u32 = 1;

/// Write all pooled transactions, parents before children so that the load
/// replay resolves dependencies.
pub fn save_mempool<C, S, M, W: Write>(
    mempool: &Mempool<C, S, M>,
    writer: &mut W,
) -> io::Result<()> {
    let mut entries: Vec<_> = mempool.mining_order();
    entries.sort_by_key(|entry| entry.ancestor_count());

    writer.write_all(&MEMPOOL_DUMP_VERSION.to_le_bytes())?;
    writer.write_all(&(entries.len() as u64).to_le_bytes())?;

    for entry in &entries {
        let entry_time = entry.creation_time().as_secs() as i64;
        writer.write_all(&entry_time.to_le_bytes())?;
        writer.write_all(&entry.fee_delta().into_atoms().to_le_bytes())?;
        writer.write_all(&entry.transaction().serialize())?;
    }

    // Obfuscation key trailer; zero means the payload is stored as-is
    writer.write_all(&0u64.to_le_bytes())?;
    Ok(())
}

/// Replay a dump through the accept pipeline. Returns the number of
/// transactions that made it back into the pool.
pub fn load_mempool<C, S, M, R: Read>(
    mempool: &mut Mempool<C, S, M>,
    reader: &mut R,
) -> io::Result<usize>
where
    C: ChainView,
    S: ScriptVerifier,
    M: MemoryUsageEstimator,
{
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    let mut pos = 0;

    let version = read_u32(&buf, &mut pos)?;
    if version != MEMPOOL_DUMP_VERSION {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unsupported mempool dump version {version}"),
        ));
    }
    let count = read_u64(&buf, &mut pos)?;

    let mut accepted = 0;
    for _ in 0..count {
        let entry_time = read_i64(&buf, &mut pos)?;
        let fee_delta = Amount::from_atoms(read_i64(&buf, &mut pos)?);
        let (tx, consumed) = Transaction::deserialize(&buf[pos..])
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;
        pos += consumed;

        let tx_id = common::primitives::Idable::get_id(&tx);
        if fee_delta != Amount::ZERO {
            mempool.set_fee_delta(tx_id, fee_delta);
        }

        let entry = TxEntry::new(
            tx,
            Duration::from_secs(entry_time.max(0) as u64),
            TxOrigin::Local(LocalTxOrigin::MempoolDump),
        );
        match mempool.add_transaction_and_descendants(entry) {
            Ok(TxStatus::InMempool) => accepted += 1,
            Ok(TxStatus::InOrphanPool) => (),
            Err(err) => log::debug!("Dumped transaction {tx_id} no longer validates: {err}"),
        }
    }

    let _xor_key = read_u64(&buf, &mut pos)?;
    Ok(accepted)
}

fn read_array<const N: usize>(buf: &[u8], pos: &mut usize) -> io::Result<[u8; N]> {
    let end = pos
        .checked_add(N)
        .filter(|end| *end <= buf.len())
        .ok_or(io::ErrorKind::UnexpectedEof)?;
    let bytes = buf[*pos..end].try_into().expect("length checked");
    *pos = end;
    Ok(bytes)
}

fn read_u32(buf: &[u8], pos: &mut usize) -> io::Result<u32> {
    read_array::<4>(buf, pos).map(u32::from_le_bytes)
}

fn read_u64(buf: &[u8], pos: &mut usize) -> io::Result<u64> {
    read_array::<8>(buf, pos).map(u64::from_le_bytes)
}

fn read_i64(buf: &[u8], pos: &mut usize) -> io::Result<i64> {
    read_array::<8>(buf, pos).map(i64::from_le_bytes)
}
