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

pub const MAX_SCRIPT_SIZE: usize = 10_000;
pub const MAX_PUBKEYS_PER_MULTISIG: u64 = 20;

pub const OP_0: u8 = 0x00;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;
pub const OP_1NEGATE: u8 = 0x4f;
pub const OP_1: u8 = 0x51;
pub const OP_16: u8 = 0x60;
pub const OP_RETURN: u8 = 0x6a;
pub const OP_DUP: u8 = 0x76;
pub const OP_EQUAL: u8 = 0x87;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_CHECKSIGVERIFY: u8 = 0xad;
pub const OP_CHECKMULTISIG: u8 = 0xae;
pub const OP_CHECKMULTISIGVERIFY: u8 = 0xaf;

/// Serialized script bytes. The interpreter lives outside this crate; only the
/// structural inspection needed for policy (sigop counting, unspendability)
/// happens here.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Script(Vec<u8>);

impl Script {
    pub fn new(bytes: Vec<u8>) -> Self {
        Script(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_unspendable(&self) -> bool {
        self.0.first() == Some(&OP_RETURN) || self.0.len() > MAX_SCRIPT_SIZE
    }

    /// Count signature operations.
    ///
    /// With `accurate` counting, an `OP_CHECKMULTISIG` immediately preceded by
    /// a small-integer push counts that many keys; otherwise the conservative
    /// [MAX_PUBKEYS_PER_MULTISIG] is assumed. A malformed push terminates the
    /// walk, leaving the count over whatever parsed (the interpreter rejects
    /// such scripts anyway).
    pub fn count_sigops(&self, accurate: bool) -> u64 {
        let bytes = &self.0;
        let mut sigops = 0;
        let mut pos = 0;
        let mut last_opcode = 0xffu8;

        while pos < bytes.len() {
            let opcode = bytes[pos];
            pos += 1;

            let push_len = match opcode {
                0x01..=0x4b => opcode as usize,
                OP_PUSHDATA1 => {
                    if bytes.len() - pos < 1 {
                        break;
                    }
                    let len = bytes[pos] as usize;
                    pos += 1;
                    len
                }
                OP_PUSHDATA2 => {
                    if bytes.len() - pos < 2 {
                        break;
                    }
                    let len = u16::from_le_bytes([bytes[pos], bytes[pos + 1]]) as usize;
                    pos += 2;
                    len
                }
                OP_PUSHDATA4 => {
                    if bytes.len() - pos < 4 {
                        break;
                    }
                    let len = u32::from_le_bytes([
                        bytes[pos],
                        bytes[pos + 1],
                        bytes[pos + 2],
                        bytes[pos + 3],
                    ]) as usize;
                    pos += 4;
                    len
                }
                _ => 0,
            };

            if push_len > 0 {
                if bytes.len() - pos < push_len {
                    break;
                }
                pos += push_len;
            }

            match opcode {
                OP_CHECKSIG | OP_CHECKSIGVERIFY => sigops += 1,
                OP_CHECKMULTISIG | OP_CHECKMULTISIGVERIFY => {
                    sigops += if accurate && (OP_1..=OP_16).contains(&last_opcode) {
                        (last_opcode - OP_1 + 1) as u64
                    } else {
                        MAX_PUBKEYS_PER_MULTISIG
                    }
                }
                _ => (),
            }

            last_opcode = opcode;
        }

        sigops
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", hex::encode(&self.0))
    }
}

/// Script interpreter verification flag set. The concrete semantics of each
/// bit belong to the external interpreter; this crate only selects which set
/// applies at a given height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScriptFlags(u32);

impl ScriptFlags {
    pub const NONE: ScriptFlags = ScriptFlags(0);
    pub const VERIFY_P2SH: ScriptFlags = ScriptFlags(1 << 0);
    pub const VERIFY_STRICTENC: ScriptFlags = ScriptFlags(1 << 1);
    pub const VERIFY_DERSIG: ScriptFlags = ScriptFlags(1 << 2);
    pub const VERIFY_LOW_S: ScriptFlags = ScriptFlags(1 << 3);
    pub const VERIFY_NULLDUMMY: ScriptFlags = ScriptFlags(1 << 4);
    pub const VERIFY_SIGPUSHONLY: ScriptFlags = ScriptFlags(1 << 5);
    pub const VERIFY_MINIMALDATA: ScriptFlags = ScriptFlags(1 << 6);
    pub const VERIFY_DISCOURAGE_UPGRADABLE_NOPS: ScriptFlags = ScriptFlags(1 << 7);
    pub const VERIFY_CLEANSTACK: ScriptFlags = ScriptFlags(1 << 8);
    pub const VERIFY_CHECKLOCKTIMEVERIFY: ScriptFlags = ScriptFlags(1 << 9);
    pub const VERIFY_CHECKSEQUENCEVERIFY: ScriptFlags = ScriptFlags(1 << 10);
    pub const VERIFY_SIGHASH_FORKID: ScriptFlags = ScriptFlags(1 << 16);

    pub const fn from_bits(bits: u32) -> Self {
        ScriptFlags(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: ScriptFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for ScriptFlags {
    type Output = ScriptFlags;

    fn bitor(self, rhs: ScriptFlags) -> ScriptFlags {
        ScriptFlags(self.0 | rhs.0)
    }
}
