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

//! Canonical transaction serialization: little-endian integers, compact-size
//! collection lengths. The transaction id is the double-SHA256 of exactly
//! these bytes, so the layout is consensus-critical.

use thiserror::Error;

use super::{OutPoint, Transaction, TxInput, TxOutput};
use crate::chain::script::Script;
use crate::primitives::{Amount, Id, H256};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxDecodeError {
    #[error("Unexpected end of input")]
    UnexpectedEnd,

    #[error("Compact size is not minimally encoded")]
    NonCanonicalCompactSize,

    #[error("Collection length {0} exceeds the remaining input")]
    OversizedCount(u64),
}

pub fn compact_size_len(value: u64) -> usize {
    match value {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

pub fn write_compact_size(buf: &mut Vec<u8>, value: u64) {
    match value {
        0..=0xfc => buf.push(value as u8),
        0xfd..=0xffff => {
            buf.push(0xfd);
            buf.extend_from_slice(&(value as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            buf.push(0xfe);
            buf.extend_from_slice(&(value as u32).to_le_bytes());
        }
        _ => {
            buf.push(0xff);
            buf.extend_from_slice(&value.to_le_bytes());
        }
    }
}

pub(crate) fn transaction_encoded_size(tx: &Transaction) -> usize {
    let mut n = 4 + 4; // version + lock_time
    n += compact_size_len(tx.inputs().len() as u64);
    for input in tx.inputs() {
        let script_len = input.script_sig().len();
        n += 36 + compact_size_len(script_len as u64) + script_len + 4;
    }
    n += compact_size_len(tx.outputs().len() as u64);
    for output in tx.outputs() {
        let script_len = output.script_pubkey().len();
        n += 8 + compact_size_len(script_len as u64) + script_len;
    }
    n
}

pub(crate) fn serialize_transaction(tx: &Transaction, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&tx.version().to_le_bytes());

    write_compact_size(buf, tx.inputs().len() as u64);
    for input in tx.inputs() {
        buf.extend_from_slice(input.outpoint().tx_id().to_hash().as_bytes());
        buf.extend_from_slice(&input.outpoint().output_index().to_le_bytes());
        write_compact_size(buf, input.script_sig().len() as u64);
        buf.extend_from_slice(input.script_sig().as_bytes());
        buf.extend_from_slice(&input.sequence().to_le_bytes());
    }

    write_compact_size(buf, tx.outputs().len() as u64);
    for output in tx.outputs() {
        buf.extend_from_slice(&output.value().into_atoms().to_le_bytes());
        write_compact_size(buf, output.script_pubkey().len() as u64);
        buf.extend_from_slice(output.script_pubkey().as_bytes());
    }

    buf.extend_from_slice(&tx.lock_time().to_le_bytes());
}

struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Decoder { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], TxDecodeError> {
        if self.remaining() < n {
            return Err(TxDecodeError::UnexpectedEnd);
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, TxDecodeError> {
        Ok(self.take(1)?[0])
    }

    fn read_u32_le(&mut self) -> Result<u32, TxDecodeError> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().expect("4 bytes")))
    }

    fn read_i32_le(&mut self) -> Result<i32, TxDecodeError> {
        Ok(i32::from_le_bytes(self.take(4)?.try_into().expect("4 bytes")))
    }

    fn read_i64_le(&mut self) -> Result<i64, TxDecodeError> {
        Ok(i64::from_le_bytes(self.take(8)?.try_into().expect("8 bytes")))
    }

    fn read_hash(&mut self) -> Result<H256, TxDecodeError> {
        Ok(H256(self.take(32)?.try_into().expect("32 bytes")))
    }

    fn read_compact_size(&mut self) -> Result<u64, TxDecodeError> {
        let first = self.read_u8()?;
        let value = match first {
            0..=0xfc => first as u64,
            0xfd => {
                let v = u16::from_le_bytes(self.take(2)?.try_into().expect("2 bytes")) as u64;
                if v < 0xfd {
                    return Err(TxDecodeError::NonCanonicalCompactSize);
                }
                v
            }
            0xfe => {
                let v = u32::from_le_bytes(self.take(4)?.try_into().expect("4 bytes")) as u64;
                if v < 0x1_0000 {
                    return Err(TxDecodeError::NonCanonicalCompactSize);
                }
                v
            }
            0xff => {
                let v = u64::from_le_bytes(self.take(8)?.try_into().expect("8 bytes"));
                if v < 0x1_0000_0000 {
                    return Err(TxDecodeError::NonCanonicalCompactSize);
                }
                v
            }
        };
        Ok(value)
    }

    /// Collection count, sanity-bounded so a bogus length cannot trigger a
    /// huge allocation.
    fn read_count(&mut self, min_elem_size: usize) -> Result<usize, TxDecodeError> {
        let count = self.read_compact_size()?;
        if count as usize > self.remaining() / min_elem_size.max(1) + 1 {
            return Err(TxDecodeError::OversizedCount(count));
        }
        Ok(count as usize)
    }

    fn read_script(&mut self) -> Result<Script, TxDecodeError> {
        let len = self.read_compact_size()?;
        if len > self.remaining() as u64 {
            return Err(TxDecodeError::UnexpectedEnd);
        }
        Ok(Script::new(self.take(len as usize)?.to_vec()))
    }
}

pub(crate) fn decode_transaction(buf: &[u8]) -> Result<(Transaction, usize), TxDecodeError> {
    let mut dec = Decoder::new(buf);

    let version = dec.read_i32_le()?;

    let input_count = dec.read_count(36 + 1 + 4)?;
    let mut inputs = Vec::with_capacity(input_count);
    for _ in 0..input_count {
        let tx_id = Id::new(dec.read_hash()?);
        let index = dec.read_u32_le()?;
        let script_sig = dec.read_script()?;
        let sequence = dec.read_u32_le()?;
        inputs.push(TxInput::new(OutPoint::new(tx_id, index), script_sig, sequence));
    }

    let output_count = dec.read_count(8 + 1)?;
    let mut outputs = Vec::with_capacity(output_count);
    for _ in 0..output_count {
        let value = Amount::from_atoms(dec.read_i64_le()?);
        let script_pubkey = dec.read_script()?;
        outputs.push(TxOutput::new(value, script_pubkey));
    }

    let lock_time = dec.read_u32_le()?;

    Ok((Transaction::new(version, inputs, outputs, lock_time), dec.pos))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_size_boundaries() {
        for v in [0u64, 0xfc, 0xfd, 0xffff, 0x1_0000, 0xffff_ffff, 0x1_0000_0000] {
            let mut buf = Vec::new();
            write_compact_size(&mut buf, v);
            assert_eq!(buf.len(), compact_size_len(v));
            let mut dec = Decoder::new(&buf);
            assert_eq!(dec.read_compact_size(), Ok(v));
        }
    }

    #[test]
    fn non_canonical_compact_size_rejected() {
        // 0xfd prefix encoding a value that fits in one byte
        let buf = [0xfd, 0x10, 0x00];
        let mut dec = Decoder::new(&buf);
        assert_eq!(
            dec.read_compact_size(),
            Err(TxDecodeError::NonCanonicalCompactSize)
        );
    }

    #[test]
    fn truncated_input_rejected() {
        let buf = [0x01, 0x00, 0x00];
        assert_eq!(
            decode_transaction(&buf),
            Err(TxDecodeError::UnexpectedEnd)
        );
    }
}
