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

/// A monetary amount in satoshi.
///
/// All arithmetic is checked: the operators return `Option` and the caller
/// decides how an overflow is reported. The value may be negative, which is
/// used for operator fee deltas.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    atoms: i64,
}

impl Amount {
    pub const ZERO: Amount = Amount::from_atoms(0);

    pub const fn from_atoms(atoms: i64) -> Self {
        Amount { atoms }
    }

    pub const fn into_atoms(self) -> i64 {
        self.atoms
    }

    pub const fn is_negative(self) -> bool {
        self.atoms < 0
    }
}

impl std::ops::Add for Amount {
    type Output = Option<Amount>;

    fn add(self, other: Amount) -> Self::Output {
        self.atoms.checked_add(other.atoms).map(Amount::from_atoms)
    }
}

impl std::ops::Sub for Amount {
    type Output = Option<Amount>;

    fn sub(self, other: Amount) -> Self::Output {
        self.atoms.checked_sub(other.atoms).map(Amount::from_atoms)
    }
}

impl std::ops::Mul<i64> for Amount {
    type Output = Option<Amount>;

    fn mul(self, rhs: i64) -> Self::Output {
        self.atoms.checked_mul(rhs).map(Amount::from_atoms)
    }
}

impl std::ops::Div<i64> for Amount {
    type Output = Option<Amount>;

    fn div(self, rhs: i64) -> Self::Output {
        self.atoms.checked_div(rhs).map(Amount::from_atoms)
    }
}

impl std::iter::Sum<Amount> for Option<Amount> {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Some(Amount::ZERO), |acc, x| acc.and_then(|acc| acc + x))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.atoms)
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount{{{}}}", self.atoms)
    }
}
